//! # menuseed-seed
//!
//! The catalog seeding pipeline: preflight, clear, and the ordered create
//! stages, driven by [`Pipeline`] and summarized in a [`RunReport`].

pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod report;
pub mod seeder;
pub mod uploader;
pub mod verifier;

pub use error::{AssetError, Resource, SeedError};
pub use pipeline::{Pipeline, PipelineOptions};
pub use reconciler::{ClearPacing, Reconciler};
pub use report::{
    ClearReport, EntityKind, Issue, IssueKind, ItemOutcome, RunReport, RunStatus, Stage, StageTally,
};
pub use seeder::{IdMap, SeededMenuItem, Seeder};
pub use uploader::{AssetUploader, UploadedAsset};
pub use verifier::{ResourceProbe, Target, Verifier};
