//! `menuseed dataset [--dataset <path>] [--json]`

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use menuseed_core::SourceDataset;

use super::load_dataset;

/// Summarize and lint a dataset without touching the network.
#[derive(Args, Debug)]
pub struct DatasetArgs {
    /// YAML or JSON dataset to inspect instead of the built-in catalog.
    #[arg(long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct DatasetSummaryJson {
    categories: usize,
    customizations: usize,
    menu_items: usize,
    links: usize,
    customizations_by_type: BTreeMap<String, usize>,
    warnings: Vec<String>,
}

#[derive(Tabled)]
struct MenuRow {
    #[tabled(rename = "item")]
    name: String,
    #[tabled(rename = "category")]
    category: String,
    #[tabled(rename = "price")]
    price: String,
    #[tabled(rename = "customizations")]
    customizations: usize,
}

impl DatasetArgs {
    pub fn run(self) -> Result<()> {
        let dataset = load_dataset(self.dataset.as_ref())?;
        let warnings: Vec<String> = dataset.lint().iter().map(ToString::to_string).collect();

        if self.json {
            let payload = DatasetSummaryJson {
                categories: dataset.categories.len(),
                customizations: dataset.customizations.len(),
                menu_items: dataset.menu.len(),
                links: dataset.link_count(),
                customizations_by_type: by_type(&dataset),
                warnings,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload)
                    .context("failed to serialize dataset summary")?
            );
            return Ok(());
        }

        print_summary(&dataset, &warnings);
        Ok(())
    }
}

fn by_type(dataset: &SourceDataset) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for custom in &dataset.customizations {
        *counts.entry(custom.kind.to_string()).or_insert(0) += 1;
    }
    counts
}

fn print_summary(dataset: &SourceDataset, warnings: &[String]) {
    println!(
        "{} categories | {} customizations | {} menu items | {} links",
        dataset.categories.len(),
        dataset.customizations.len(),
        dataset.menu.len(),
        dataset.link_count()
    );
    let types: Vec<String> = by_type(dataset)
        .into_iter()
        .map(|(kind, n)| format!("{kind} {n}"))
        .collect();
    if !types.is_empty() {
        println!("Customization types: {}", types.join(", "));
    }

    if !dataset.menu.is_empty() {
        let rows: Vec<MenuRow> = dataset
            .menu
            .iter()
            .map(|item| MenuRow {
                name: item.name.clone(),
                category: item.category_name.clone(),
                price: format!("{:.2}", item.price),
                customizations: item.customizations.len(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    if warnings.is_empty() {
        println!("{} no dataset warnings", "✓".green().bold());
    } else {
        for w in warnings {
            println!("  {} {w}", "!".yellow().bold());
        }
    }
}
