pub mod clear;
pub mod collections;
pub mod dataset;
pub mod init;
pub mod seed;
pub mod verify;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use menuseed_core::{config, SeedConfig, SourceDataset};
use menuseed_seed::{PipelineOptions, Target};
use menuseed_store::AppwriteClient;

/// A resolved config plus the client built from it.
pub struct Session {
    pub config: SeedConfig,
    pub client: AppwriteClient,
}

impl Session {
    pub fn open(explicit: Option<&Path>) -> Result<Self> {
        let config = config::resolve(explicit)
            .context("failed to load seed config; run `menuseed init` first")?;
        tracing::debug!(
            "target {} (project {}, database {})",
            config.endpoint,
            config.project_id,
            config.database_id
        );
        let client = AppwriteClient::new(&config);
        Ok(Self { config, client })
    }

    pub fn target(&self) -> Target<'_> {
        Target {
            documents: &self.client,
            objects: &self.client,
            collections: &self.config.collections,
            bucket: &self.config.bucket_id,
        }
    }

    pub fn options(&self) -> PipelineOptions {
        PipelineOptions::from_pacing(&self.config.pacing)
    }
}

/// The built-in catalog, or the file at `path`.
pub fn load_dataset(path: Option<&PathBuf>) -> Result<SourceDataset> {
    match path {
        Some(path) => SourceDataset::load_at(path)
            .with_context(|| format!("failed to load dataset '{}'", path.display())),
        None => SourceDataset::builtin().context("built-in catalog is malformed"),
    }
}
