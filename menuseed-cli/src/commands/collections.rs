//! `menuseed collections`

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use menuseed_seed::Verifier;

use super::Session;

/// Show record counts for each configured collection and the bucket.
#[derive(Args, Debug)]
pub struct CollectionsArgs {}

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "resource")]
    resource: String,
    #[tabled(rename = "records")]
    records: String,
    #[tabled(rename = "status")]
    status: String,
}

impl CollectionsArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let session = Session::open(explicit)?;
        let probes = Verifier::new(session.target()).survey();

        let unreachable = probes.iter().filter(|p| !p.is_reachable()).count();
        let rows: Vec<ProbeRow> = probes
            .into_iter()
            .map(|p| ProbeRow {
                resource: p.resource,
                records: p.total.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
                status: match p.error {
                    None => "ok".green().to_string(),
                    Some(e) => e.red().to_string(),
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        if unreachable > 0 {
            bail!("{unreachable} resources are unreachable");
        }
        Ok(())
    }
}
