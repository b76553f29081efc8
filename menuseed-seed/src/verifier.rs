//! Preflight: confirm every collection and the bucket answer a bounded probe
//! before anything is mutated.

use serde::Serialize;

use menuseed_core::{BucketId, Collections};
use menuseed_store::{DocumentStore, ObjectStore, Query, StoreError};

use crate::error::{Resource, SeedError};

/// Everything a run writes to, bundled with the handles used to reach it.
#[derive(Clone, Copy)]
pub struct Target<'a> {
    pub documents: &'a dyn DocumentStore,
    pub objects: &'a dyn ObjectStore,
    pub collections: &'a Collections,
    pub bucket: &'a BucketId,
}

impl<'a> Target<'a> {
    /// Every resource in create-phase order, bucket last.
    pub fn resources(&self) -> Vec<Resource> {
        let mut out: Vec<Resource> = self
            .collections
            .in_dependency_order()
            .into_iter()
            .map(|c| Resource::Collection(c.clone()))
            .collect();
        out.push(Resource::Bucket(self.bucket.clone()));
        out
    }
}

/// Result of probing one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceProbe {
    pub resource: String,
    /// Total record count the backend reported.
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceProbe {
    pub fn is_reachable(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Verifier<'a> {
    target: Target<'a>,
}

impl<'a> Verifier<'a> {
    pub fn new(target: Target<'a>) -> Self {
        Self { target }
    }

    /// Fetch at most one record from `resource` and return the reported total.
    pub fn probe(&self, resource: &Resource) -> Result<u64, StoreError> {
        let queries = [Query::limit(1)];
        match resource {
            Resource::Collection(id) => self
                .target
                .documents
                .list_documents(id, &queries)
                .map(|l| l.total),
            Resource::Bucket(id) => self.target.objects.list_files(id, &queries).map(|l| l.total),
        }
    }

    /// Probe every resource, stopping at the first one that does not answer.
    pub fn verify(&self) -> Result<Vec<ResourceProbe>, SeedError> {
        let mut probes = Vec::new();
        for resource in self.target.resources() {
            let total = self.probe(&resource).map_err(|source| SeedError::Preflight {
                resource: resource.clone(),
                source,
            })?;
            tracing::debug!("{resource} reachable ({total} records)");
            probes.push(ResourceProbe {
                resource: resource.to_string(),
                total: Some(total),
                error: None,
            });
        }
        tracing::info!("preflight ok: {} resources reachable", probes.len());
        Ok(probes)
    }

    /// Probe every resource and report each one, failures included.
    pub fn survey(&self) -> Vec<ResourceProbe> {
        self.target
            .resources()
            .into_iter()
            .map(|resource| match self.probe(&resource) {
                Ok(total) => ResourceProbe {
                    resource: resource.to_string(),
                    total: Some(total),
                    error: None,
                },
                Err(e) => ResourceProbe {
                    resource: resource.to_string(),
                    total: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }
}
