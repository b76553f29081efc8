//! `menuseed init --project <id> --database <id> --bucket <id>`

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use menuseed_core::{config, SeedConfig};

/// Write a config template for the seed target.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Backend project identifier.
    #[arg(long, short = 'p')]
    pub project: String,

    /// Database holding the catalog collections.
    #[arg(long, short = 'd')]
    pub database: String,

    /// Storage bucket for menu images.
    #[arg(long, short = 'b')]
    pub bucket: String,

    /// REST endpoint, e.g. https://cloud.appwrite.io/v1.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let mut cfg = SeedConfig::template(&self.project, &self.database, &self.bucket);
        if let Some(endpoint) = self.endpoint {
            cfg.endpoint = endpoint;
        }
        cfg.validate().context("refusing to write an invalid config")?;

        let path = match explicit {
            Some(path) => {
                if path.exists() && !self.force {
                    bail!(
                        "config already exists at {} (use --force to overwrite)",
                        path.display()
                    );
                }
                config::save_file(path, &cfg)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                path.to_path_buf()
            }
            None => {
                let home = dirs::home_dir().context("could not determine home directory")?;
                config::init_at(&home, &cfg, self.force).context("failed to write config")?
            }
        };

        println!("✓ Wrote seed config to {}", path.display());
        println!("  Set MENUSEED_API_KEY (or add api_key to the file) before seeding.");
        Ok(())
    }
}
