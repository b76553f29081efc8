//! menuseed core library: catalog types, seed target configuration, errors.
//!
//! Public API surface:
//! - [`types`]: dataset structs and identifier newtypes
//! - [`dataset`]: the built-in catalog and dataset linting
//! - [`config`]: load / validate / save the seed target config
//! - [`error`]: [`ConfigError`], [`DatasetError`]

pub mod config;
pub mod dataset;
pub mod error;
pub mod types;

pub use config::{Collections, Pacing, SeedConfig};
pub use dataset::DatasetWarning;
pub use error::{ConfigError, DatasetError};
pub use types::{
    BucketId, Category, CollectionId, Customization, CustomizationType, MenuItem, RecordId,
    SourceDataset,
};
