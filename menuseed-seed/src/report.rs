//! Run bookkeeping: stages, per-item outcomes, and the final report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use menuseed_core::{BucketId, CollectionId, RecordId};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Orchestrator state.
///
/// `Idle → Verifying → Clearing → SeedingCategories → SeedingCustomizations
/// → SeedingMenu → SeedingLinks → Done`, with `Failed` reachable from any
/// stage that raises a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Verifying,
    Clearing,
    SeedingCategories,
    SeedingCustomizations,
    SeedingMenu,
    SeedingLinks,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Idle => "idle",
            Stage::Verifying => "verifying",
            Stage::Clearing => "clearing",
            Stage::SeedingCategories => "seeding categories",
            Stage::SeedingCustomizations => "seeding customizations",
            Stage::SeedingMenu => "seeding menu items",
            Stage::SeedingLinks => "seeding menu customization links",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Item outcomes
// ---------------------------------------------------------------------------

/// Entity kinds the pipeline writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Customization,
    MenuItem,
    Link,
    Document,
    File,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Category => "category",
            EntityKind::Customization => "customization",
            EntityKind::MenuItem => "menu item",
            EntityKind::Link => "link",
            EntityKind::Document => "document",
            EntityKind::File => "file",
        };
        f.write_str(label)
    }
}

/// Result of attempting one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// A new record was written.
    Created { id: RecordId },
    /// An existing record with the same natural key was adopted.
    Reused { id: RecordId },
    /// The record was deliberately not attempted.
    Skipped { reason: String },
    /// The attempt was made and the store rejected it.
    Failed { reason: String },
}

impl ItemOutcome {
    /// The store identity, for outcomes that have one.
    pub fn id(&self) -> Option<&RecordId> {
        match self {
            ItemOutcome::Created { id } | ItemOutcome::Reused { id } => Some(id),
            _ => None,
        }
    }
}

/// Counts of outcomes for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageTally {
    pub created: usize,
    pub reused: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageTally {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Created { .. } => self.created += 1,
            ItemOutcome::Reused { .. } => self.reused += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Records that now exist in the store.
    pub fn usable(&self) -> usize {
        self.created + self.reused
    }

    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.failed == 0
    }
}

/// Classification of a report issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Skipped,
    Failed,
    /// The source image URL was stored instead of an uploaded copy.
    AssetFallback,
    /// A collection or bucket could not be enumerated while clearing.
    ListFailure,
}

/// One thing a human may want to follow up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub entity: EntityKind,
    pub item: String,
    pub kind: IssueKind,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Clear phase
// ---------------------------------------------------------------------------

/// Clear-phase results for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionClear {
    pub collection: CollectionId,
    pub deleted: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_error: Option<String>,
}

/// Clear-phase results for the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketClear {
    pub bucket: BucketId,
    pub deleted: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_error: Option<String>,
}

/// Everything the clear phase did, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub collections: Vec<CollectionClear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BucketClear>,
}

impl ClearReport {
    pub fn deleted(&self) -> usize {
        self.collections.iter().map(|c| c.deleted).sum::<usize>()
            + self.bucket.as_ref().map_or(0, |b| b.deleted)
    }

    pub fn failed(&self) -> usize {
        self.collections.iter().map(|c| c.failed).sum::<usize>()
            + self.bucket.as_ref().map_or(0, |b| b.failed)
    }

    pub fn list_failures(&self) -> usize {
        self.collections
            .iter()
            .filter(|c| c.list_error.is_some())
            .count()
            + self
                .bucket
                .as_ref()
                .map_or(0, |b| usize::from(b.list_error.is_some()))
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Overall verdict of a run that reached `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialSuccess,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("success"),
            RunStatus::PartialSuccess => f.write_str("partial success"),
        }
    }
}

/// Aggregate record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stages: Vec<Stage>,
    pub clear: Option<ClearReport>,
    pub categories: StageTally,
    pub customizations: StageTally,
    pub menu_items: StageTally,
    pub links: StageTally,
    pub asset_fallbacks: usize,
    pub issues: Vec<Issue>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
            clear: None,
            categories: StageTally::default(),
            customizations: StageTally::default(),
            menu_items: StageTally::default(),
            links: StageTally::default(),
            asset_fallbacks: 0,
            issues: Vec::new(),
        }
    }

    /// Count `outcome` against `entity` and keep an issue for anything that
    /// did not land.
    pub fn record(&mut self, entity: EntityKind, item: &str, outcome: &ItemOutcome) {
        if let Some(tally) = self.tally_mut(entity) {
            tally.record(outcome);
        }
        let (kind, reason) = match outcome {
            ItemOutcome::Skipped { reason } => (IssueKind::Skipped, reason),
            ItemOutcome::Failed { reason } => (IssueKind::Failed, reason),
            _ => return,
        };
        self.issues.push(Issue {
            entity,
            item: item.to_string(),
            kind,
            reason: reason.clone(),
        });
    }

    /// Note that `item` kept its source image URL.
    pub fn record_fallback(&mut self, item: &str, reason: String) {
        self.asset_fallbacks += 1;
        self.issues.push(Issue {
            entity: EntityKind::MenuItem,
            item: item.to_string(),
            kind: IssueKind::AssetFallback,
            reason,
        });
    }

    /// Fold a finished clear phase into the report.
    pub fn record_clear(&mut self, clear: ClearReport) {
        for c in &clear.collections {
            if let Some(reason) = &c.list_error {
                self.issues.push(Issue {
                    entity: EntityKind::Document,
                    item: c.collection.to_string(),
                    kind: IssueKind::ListFailure,
                    reason: reason.clone(),
                });
            }
        }
        if let Some(b) = &clear.bucket {
            if let Some(reason) = &b.list_error {
                self.issues.push(Issue {
                    entity: EntityKind::File,
                    item: b.bucket.to_string(),
                    kind: IssueKind::ListFailure,
                    reason: reason.clone(),
                });
            }
        }
        self.clear = Some(clear);
    }

    fn tally_mut(&mut self, entity: EntityKind) -> Option<&mut StageTally> {
        match entity {
            EntityKind::Category => Some(&mut self.categories),
            EntityKind::Customization => Some(&mut self.customizations),
            EntityKind::MenuItem => Some(&mut self.menu_items),
            EntityKind::Link => Some(&mut self.links),
            EntityKind::Document | EntityKind::File => None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Issues of one kind, in the order they were recorded.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn status(&self) -> RunStatus {
        let clear_clean = self
            .clear
            .as_ref()
            .map_or(true, |c| c.failed() == 0 && c.list_failures() == 0);
        let clean = clear_clean
            && self.asset_fallbacks == 0
            && self.categories.is_clean()
            && self.customizations.is_clean()
            && self.menu_items.is_clean()
            && self.links.is_clean();
        if clean {
            RunStatus::Success
        } else {
            RunStatus::PartialSuccess
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tallies_and_keeps_issues_for_misses_only() {
        let mut report = RunReport::new();
        report.record(
            EntityKind::Customization,
            "Bacon",
            &ItemOutcome::Created {
                id: RecordId::from("c1"),
            },
        );
        report.record(
            EntityKind::Customization,
            "Olives",
            &ItemOutcome::Reused {
                id: RecordId::from("c2"),
            },
        );
        report.record(
            EntityKind::Customization,
            "Bad",
            &ItemOutcome::Skipped {
                reason: "price must be >= 0".into(),
            },
        );
        assert_eq!(report.customizations.usable(), 2);
        assert_eq!(report.customizations.skipped, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].item, "Bad");
        assert_eq!(report.status(), RunStatus::PartialSuccess);
    }

    #[test]
    fn clean_report_is_success() {
        let mut report = RunReport::new();
        report.record_clear(ClearReport::default());
        report.record(
            EntityKind::Link,
            "a → b",
            &ItemOutcome::Created {
                id: RecordId::from("l1"),
            },
        );
        assert_eq!(report.status(), RunStatus::Success);
    }

    #[test]
    fn fallback_alone_makes_run_partial() {
        let mut report = RunReport::new();
        report.record_fallback("Classic", "fetch failed".into());
        assert_eq!(report.asset_fallbacks, 1);
        assert_eq!(report.status(), RunStatus::PartialSuccess);
    }

    #[test]
    fn list_failures_surface_as_issues() {
        let mut report = RunReport::new();
        report.record_clear(ClearReport {
            collections: vec![CollectionClear {
                collection: CollectionId::from("menu"),
                deleted: 0,
                failed: 0,
                list_error: Some("500".into()),
            }],
            bucket: None,
        });
        assert_eq!(report.issues_of(IssueKind::ListFailure).count(), 1);
        assert_eq!(report.status(), RunStatus::PartialSuccess);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_string(&ItemOutcome::Skipped {
            reason: "x".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"outcome":"skipped","reason":"x"}"#);
    }
}
