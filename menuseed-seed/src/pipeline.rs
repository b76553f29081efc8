//! Run orchestration: preflight, clear, then the four create stages.

use std::time::Duration;

use menuseed_core::{Pacing, SourceDataset};
use menuseed_store::AssetFetcher;

use crate::error::SeedError;
use crate::reconciler::{ClearPacing, Reconciler};
use crate::report::{ClearReport, RunReport, Stage};
use crate::seeder::Seeder;
use crate::verifier::{ResourceProbe, Target, Verifier};

/// Knobs for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Leave existing records in place and rely on name reconciliation.
    pub skip_clear: bool,
    pub page_size: u32,
    pub delete_delay: Duration,
    pub delete_batch_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_pacing(&Pacing::default())
    }
}

impl PipelineOptions {
    pub fn from_pacing(pacing: &Pacing) -> Self {
        Self {
            skip_clear: false,
            page_size: pacing.page_size,
            delete_delay: Duration::from_millis(pacing.delete_delay_ms),
            delete_batch_size: pacing.delete_batch_size,
        }
    }

    fn clear_pacing(&self) -> ClearPacing {
        ClearPacing {
            page_size: self.page_size,
            delete_delay: self.delete_delay,
            delete_batch_size: self.delete_batch_size,
        }
    }
}

/// Drives one seeding run through its stages.
///
/// ```text
/// Idle → Verifying → Clearing → SeedingCategories → SeedingCustomizations
///      → SeedingMenu → SeedingLinks → Done
/// ```
///
/// Any fatal error moves the pipeline to `Failed` and is returned to the
/// caller. Everything else lands in the [`RunReport`]. The report of an
/// aborted run stays readable through [`Pipeline::partial_report`].
pub struct Pipeline<'a> {
    target: Target<'a>,
    fetcher: &'a dyn AssetFetcher,
    options: PipelineOptions,
    stage: Stage,
    aborted: Option<RunReport>,
}

impl<'a> Pipeline<'a> {
    pub fn new(target: Target<'a>, fetcher: &'a dyn AssetFetcher, options: PipelineOptions) -> Self {
        Self {
            target,
            fetcher,
            options,
            stage: Stage::Idle,
            aborted: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// What the last [`run`](Self::run) did before a fatal error, including
    /// clear-phase deletions. `None` after a run that completed.
    pub fn partial_report(&self) -> Option<&RunReport> {
        self.aborted.as_ref()
    }

    fn enter(&mut self, stage: Stage, report: &mut RunReport) {
        tracing::info!("{stage}");
        self.stage = stage;
        report.stages.push(stage);
    }

    fn fail(&mut self, err: SeedError, report: &mut RunReport) -> SeedError {
        tracing::error!("run failed during {}: {err}", err.stage());
        self.enter(Stage::Failed, report);
        report.finish();
        err
    }

    /// Full run against `dataset`. Id maps live only for the duration of
    /// this call.
    pub fn run(&mut self, dataset: &SourceDataset) -> Result<RunReport, SeedError> {
        self.aborted = None;
        let mut report = RunReport::new();
        match self.run_stages(dataset, &mut report) {
            Ok(()) => {
                self.enter(Stage::Done, &mut report);
                report.finish();
                tracing::info!("run finished: {}", report.status());
                Ok(report)
            }
            Err(err) => {
                let err = self.fail(err, &mut report);
                self.aborted = Some(report);
                Err(err)
            }
        }
    }

    fn run_stages(&mut self, dataset: &SourceDataset, report: &mut RunReport) -> Result<(), SeedError> {
        self.enter(Stage::Verifying, report);
        Verifier::new(self.target).verify()?;

        if self.options.skip_clear {
            tracing::info!("clear phase skipped");
        } else {
            self.enter(Stage::Clearing, report);
            let clear = Reconciler::new(self.target, self.options.clear_pacing()).clear();
            report.record_clear(clear);
        }

        let seeder = Seeder::new(self.target, self.fetcher, self.options.page_size);

        self.enter(Stage::SeedingCategories, report);
        let categories = seeder.seed_categories(&dataset.categories, report)?;

        self.enter(Stage::SeedingCustomizations, report);
        let customizations = seeder.seed_customizations(&dataset.customizations, report)?;

        self.enter(Stage::SeedingMenu, report);
        let menu = seeder.seed_menu(&dataset.menu, &categories, report)?;

        self.enter(Stage::SeedingLinks, report);
        seeder.seed_links(&menu, &customizations, report);
        Ok(())
    }

    /// Preflight only.
    pub fn verify(&mut self) -> Result<Vec<ResourceProbe>, SeedError> {
        let mut report = RunReport::new();
        self.enter(Stage::Verifying, &mut report);
        match Verifier::new(self.target).verify() {
            Ok(probes) => {
                self.stage = Stage::Done;
                Ok(probes)
            }
            Err(err) => Err(self.fail(err, &mut report)),
        }
    }

    /// Preflight, then the clear phase, with no create stages.
    pub fn clear_only(&mut self) -> Result<ClearReport, SeedError> {
        let mut report = RunReport::new();
        self.enter(Stage::Verifying, &mut report);
        if let Err(err) = Verifier::new(self.target).verify() {
            return Err(self.fail(err, &mut report));
        }
        self.enter(Stage::Clearing, &mut report);
        let clear = Reconciler::new(self.target, self.options.clear_pacing()).clear();
        self.stage = Stage::Done;
        Ok(clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_pacing() {
        let pacing = Pacing {
            page_size: 50,
            delete_delay_ms: 250,
            delete_batch_size: 4,
        };
        let opts = PipelineOptions::from_pacing(&pacing);
        assert!(!opts.skip_clear);
        assert_eq!(opts.page_size, 50);
        assert_eq!(opts.delete_delay, Duration::from_millis(250));
        assert_eq!(opts.delete_batch_size, 4);
    }
}
