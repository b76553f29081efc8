//! `menuseed clear --yes`

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use menuseed_seed::{ClearReport, Pipeline};
use menuseed_store::HttpFetcher;

use super::Session;

/// Delete every seeded document and file without reseeding.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm the deletion.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Tabled)]
struct ClearRow {
    #[tabled(rename = "resource")]
    resource: String,
    #[tabled(rename = "deleted")]
    deleted: usize,
    #[tabled(rename = "failed")]
    failed: usize,
    #[tabled(rename = "note")]
    note: String,
}

impl ClearArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        if !self.yes {
            bail!("clear deletes every catalog document and image; re-run with --yes to confirm");
        }
        let session = Session::open(explicit)?;
        let fetcher = HttpFetcher::new();
        let report = Pipeline::new(session.target(), &fetcher, session.options())
            .clear_only()
            .context("clear aborted")?;

        print_clear(&report);
        Ok(())
    }
}

fn print_clear(report: &ClearReport) {
    let mut rows: Vec<ClearRow> = report
        .collections
        .iter()
        .map(|c| ClearRow {
            resource: c.collection.to_string(),
            deleted: c.deleted,
            failed: c.failed,
            note: c.list_error.clone().unwrap_or_default(),
        })
        .collect();
    if let Some(b) = &report.bucket {
        rows.push(ClearRow {
            resource: format!("{} (bucket)", b.bucket),
            deleted: b.deleted,
            failed: b.failed,
            note: b.list_error.clone().unwrap_or_default(),
        });
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if report.failed() == 0 && report.list_failures() == 0 {
        println!("{} cleared {} records", "✓".green().bold(), report.deleted());
    } else {
        println!(
            "{} cleared {} records; {} could not be deleted",
            "~".yellow().bold(),
            report.deleted(),
            report.failed()
        );
    }
}
