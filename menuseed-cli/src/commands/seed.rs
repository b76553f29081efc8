//! `menuseed seed [--dataset <path>] [--skip-clear] [--json]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use menuseed_seed::{Pipeline, RunReport, RunStatus, StageTally};
use menuseed_store::HttpFetcher;

use super::{load_dataset, Session};

/// Clear the target and seed the catalog.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// YAML or JSON dataset to seed instead of the built-in catalog.
    #[arg(long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Keep existing records and rely on name reconciliation.
    #[arg(long)]
    pub skip_clear: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SeedArgs {
    pub fn run(self, explicit: Option<&Path>) -> Result<()> {
        let dataset = load_dataset(self.dataset.as_ref())?;
        for warning in dataset.lint() {
            tracing::warn!("dataset: {warning}");
        }

        let session = Session::open(explicit)?;
        let fetcher = HttpFetcher::new();
        let mut options = session.options();
        options.skip_clear = self.skip_clear;

        let mut pipeline = Pipeline::new(session.target(), &fetcher, options);
        let report = match pipeline.run(&dataset) {
            Ok(report) => report,
            Err(err) => {
                if let Some(partial) = pipeline.partial_report() {
                    print_partial(partial, self.json)?;
                }
                return Err(anyhow::Error::new(err)
                    .context(format!("seed run aborted ({})", pipeline.stage())));
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize run report")?
            );
            return Ok(());
        }
        print_report(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct TallyRow {
    #[tabled(rename = "entity")]
    entity: &'static str,
    #[tabled(rename = "created")]
    created: usize,
    #[tabled(rename = "reused")]
    reused: usize,
    #[tabled(rename = "skipped")]
    skipped: usize,
    #[tabled(rename = "failed")]
    failed: usize,
}

impl TallyRow {
    fn new(entity: &'static str, tally: &StageTally) -> Self {
        Self {
            entity,
            created: tally.created,
            reused: tally.reused,
            skipped: tally.skipped,
            failed: tally.failed,
        }
    }
}

/// What an aborted run already changed. JSON goes to stdout; the summary
/// goes to stderr next to the error.
fn print_partial(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("failed to serialize run report")?
        );
        return Ok(());
    }
    if let Some(clear) = &report.clear {
        eprintln!(
            "{} cleared {} records before the abort ({} delete failures)",
            "!".yellow().bold(),
            clear.deleted(),
            clear.failed()
        );
    }
    let created = report.categories.created
        + report.customizations.created
        + report.menu_items.created
        + report.links.created;
    if created > 0 {
        eprintln!("{} created {created} records before the abort", "!".yellow().bold());
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "Run started {}",
        report
            .started_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(clear) = &report.clear {
        println!(
            "Cleared {} records ({} delete failures, {} unlistable resources)",
            clear.deleted(),
            clear.failed(),
            clear.list_failures()
        );
    }

    let rows = vec![
        TallyRow::new("categories", &report.categories),
        TallyRow::new("customizations", &report.customizations),
        TallyRow::new("menu items", &report.menu_items),
        TallyRow::new("links", &report.links),
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if report.asset_fallbacks > 0 {
        println!(
            "{} menu items kept their source image URL",
            report.asset_fallbacks
        );
    }
    for issue in &report.issues {
        println!(
            "  {} {} '{}': {}",
            "!".yellow().bold(),
            issue.entity,
            issue.item,
            issue.reason
        );
    }

    let elapsed = report
        .finished_at
        .map(|end| (end - report.started_at).num_milliseconds())
        .unwrap_or_default();
    match report.status() {
        RunStatus::Success => println!("{} seeded in {elapsed} ms", "✓".green().bold()),
        RunStatus::PartialSuccess => println!(
            "{} seeded with {} issues in {elapsed} ms; review them before relying on the catalog",
            "~".yellow().bold(),
            report.issues.len()
        ),
    }
}
