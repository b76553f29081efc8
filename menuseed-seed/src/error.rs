//! Error types for menuseed-seed.

use std::fmt;

use thiserror::Error;

use menuseed_core::{BucketId, CollectionId};
use menuseed_store::StoreError;

use crate::report::Stage;

/// A remote resource the pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Collection(CollectionId),
    Bucket(BucketId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Collection(id) => write!(f, "collection `{id}`"),
            Resource::Bucket(id) => write!(f, "bucket `{id}`"),
        }
    }
}

/// Fatal, stage-ending failures. Per-item problems never surface here; they
/// are recorded in the [`RunReport`](crate::report::RunReport).
#[derive(Debug, Error)]
pub enum SeedError {
    /// A required collection or bucket is missing or unreachable.
    #[error("preflight failed: {resource} is unreachable: {source}")]
    Preflight {
        resource: Resource,
        #[source]
        source: StoreError,
    },

    /// A collection could not be enumerated.
    #[error("{stage}: cannot list {resource}: {source}")]
    List {
        stage: Stage,
        resource: Resource,
        #[source]
        source: StoreError,
    },

    /// A record every later stage depends on could not be created.
    #[error("{stage}: failed to create '{item}': {source}")]
    Create {
        stage: Stage,
        item: String,
        #[source]
        source: StoreError,
    },

    /// A stage expected to produce records produced none.
    #[error("{stage} produced no usable records")]
    EmptyResult { stage: Stage },
}

impl SeedError {
    /// The stage the failure originated in.
    pub fn stage(&self) -> Stage {
        match self {
            SeedError::Preflight { .. } => Stage::Verifying,
            SeedError::List { stage, .. }
            | SeedError::Create { stage, .. }
            | SeedError::EmptyResult { stage } => *stage,
        }
    }
}

/// Why a single asset could not be moved into the bucket.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to upload {url}: {source}")]
    Upload {
        url: String,
        #[source]
        source: StoreError,
    },
}
