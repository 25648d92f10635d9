//! `clv merge`: merge an AI-generated candidate into an existing key.
//!
//! The candidate is read leniently, the existing project strictly. The
//! merged project goes to `--out` (or stdout) and the report to stdout (or
//! stderr when stdout carries the project).

use super::{digest, fail, load_candidate, load_project, write_project};
use crate::output::{OutputMode, pretty_kv, pretty_section, render, render_to};
use clap::Args;
use clavis_core::error::ErrorCode;
use clavis_core::ingest::IngestReport;
use clavis_core::model::Project;
use clavis_core::policy::MergePolicy;
use clavis_core::{MergeReport, merge_projects_with};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
#[command(
    about = "Merge a candidate project into an existing one",
    long_about = "Merge an AI-generated candidate project into an existing identification key.\n\n\
                  Existing entities, features and trait values are never lost. A candidate with\n\
                  no entities or no features is refused and the existing project is kept.",
    after_help = "EXAMPLES:\n    # Merge and write the result to a file\n    clv merge --existing key.json --candidate ai.json --out merged.json\n\n\
                  # Merged project on stdout, report on stderr\n    clv merge --existing key.json --candidate ai.json > merged.json\n\n\
                  # Machine-readable output\n    clv merge --existing key.json --candidate ai.json --out merged.json --json"
)]
pub struct MergeArgs {
    /// Existing project JSON.
    #[arg(long, value_name = "FILE")]
    pub existing: PathBuf,

    /// Candidate project JSON produced by the model.
    #[arg(long, value_name = "FILE")]
    pub candidate: PathBuf,

    /// Where to write the merged project (stdout when omitted).
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct MergeOutput {
    pub merged: bool,
    pub changed: bool,
    pub existing_digest: String,
    pub merged_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
    pub report: MergeReport,
    pub ingest: IngestReport,
    /// Present in JSON mode when no `--out` was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

pub fn run_merge(args: &MergeArgs, output: OutputMode, policy: &MergePolicy) -> anyhow::Result<()> {
    let existing = load_project(&args.existing, output)?;
    let (candidate, ingest) = load_candidate(&args.candidate, output)?;
    if !ingest.malformed_traits.is_empty() {
        info!(
            entities = ingest.malformed_traits.len(),
            "candidate trait payloads ignored"
        );
    }

    let outcome = merge_projects_with(&candidate, &existing, policy);
    let existing_digest = digest(&existing)?;
    let merged_digest = digest(&outcome.project)?;

    let mut result = MergeOutput {
        merged: outcome.report.merged(),
        changed: existing_digest != merged_digest,
        existing_digest,
        merged_digest,
        out: args.out.as_ref().map(|p| p.display().to_string()),
        report: outcome.report,
        ingest,
        project: None,
    };

    match (&args.out, output) {
        (Some(path), _) => {
            write_project(&outcome.project, Some(path), output)?;
            render(output, &result, render_human)?;
        }
        (None, OutputMode::Json) => {
            result.project = Some(outcome.project);
            render(output, &result, render_human)?;
        }
        (None, _) => {
            write_project(&outcome.project, None, output)?;
            render_to(&mut io::stderr().lock(), output, &result, render_human)?;
        }
    }

    match result.report.rejection {
        Some(rejection) => Err(fail(output, ErrorCode::from(rejection), rejection.reason())),
        None => Ok(()),
    }
}

fn render_human(result: &MergeOutput, w: &mut dyn Write) -> io::Result<()> {
    let report = &result.report;
    pretty_section(w, "Merge")?;
    pretty_kv(w, "result", report.summary())?;
    pretty_kv(w, "changed", if result.changed { "yes" } else { "no" })?;
    pretty_kv(w, "digest", &result.merged_digest)?;
    if let Some(ref out) = result.out {
        pretty_kv(w, "written", out)?;
    }
    if report.merged() {
        pretty_kv(
            w,
            "traits",
            format!(
                "{} filled, {} kept, {} new-feature, {} dropped features, {} dropped states",
                report.traits.filled,
                report.traits.kept_existing,
                report.traits.new_feature,
                report.traits.dropped_features,
                report.traits.dropped_states
            ),
        )?;
        if !report.sanitize.is_clean() {
            pretty_kv(
                w,
                "sanitized",
                format!(
                    "{} stale trait entries, {} stale state ids, {} duplicate entities, {} duplicate features",
                    report.sanitize.stale_trait_entries,
                    report.sanitize.stale_state_ids,
                    report.sanitize.duplicate_entities,
                    report.sanitize.duplicate_features
                ),
            )?;
        }
    }
    if !result.ingest.malformed_traits.is_empty() {
        pretty_kv(
            w,
            "ignored",
            format!("malformed traits on {}", result.ingest.malformed_traits.join(", ")),
        )?;
    }
    Ok(())
}
