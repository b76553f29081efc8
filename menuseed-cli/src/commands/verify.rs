//! `menuseed verify`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use menuseed_seed::Pipeline;
use menuseed_store::HttpFetcher;

use super::Session;

/// Run the preflight only.
#[derive(Args, Debug)]
pub struct VerifyArgs {}

impl VerifyArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let session = Session::open(explicit)?;
        let fetcher = HttpFetcher::new();
        let probes = Pipeline::new(session.target(), &fetcher, session.options())
            .verify()
            .context("preflight failed")?;

        for probe in &probes {
            println!(
                "{} {} ({} records)",
                "✓".green().bold(),
                probe.resource,
                probe.total.unwrap_or_default()
            );
        }
        println!("All {} resources reachable.", probes.len());
        Ok(())
    }
}
