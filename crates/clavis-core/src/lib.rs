//! clavis-core library.
//!
//! Merges AI-generated candidate projects into existing identification keys
//! without losing data. Start at [`merge_projects`].
//!
//! # Conventions
//!
//! - **Errors**: the merge itself is total and never fails. Safety-Gate
//!   refusals are [`gate::Rejection`] values inside the [`MergeReport`].
//!   File and config loading use `anyhow::Result`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod idmap;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod reconcile;
pub mod report;
pub mod sanitize;
pub mod traits;

pub use reconcile::{MergeOutcome, merge_projects, merge_projects_preserving_data, merge_projects_with};
pub use report::MergeReport;
