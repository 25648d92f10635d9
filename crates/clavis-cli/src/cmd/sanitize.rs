use super::{load_candidate, write_project};
use crate::output::{OutputMode, pretty_kv, pretty_section, render, render_to};
use clap::Args;
use clavis_core::model::Project;
use clavis_core::report::SanitizeReport;
use clavis_core::sanitize::sanitize;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(
    about = "Repair a project's ids and trait references",
    long_about = "Drop duplicate features, states and entities (first occurrence wins) and\n\
                  remove trait references to features or states that do not exist.",
    after_help = "EXAMPLES:\n    # Repair in place\n    clv sanitize key.json --out key.json\n\n\
                  # Machine-readable report\n    clv sanitize key.json --out clean.json --json"
)]
pub struct SanitizeArgs {
    /// Project JSON to repair.
    #[arg(value_name = "FILE")]
    pub project: PathBuf,

    /// Where to write the repaired project (stdout when omitted).
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SanitizeOutput {
    pub clean: bool,
    pub entities: usize,
    pub features: usize,
    pub report: SanitizeReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

pub fn run_sanitize(args: &SanitizeArgs, output: OutputMode) -> anyhow::Result<()> {
    // Damaged files are the point of this command, so read them leniently.
    let (project, _) = load_candidate(&args.project, output)?;
    let (repaired, report) = sanitize(&project);

    let mut result = SanitizeOutput {
        clean: report.is_clean(),
        entities: repaired.entities.len(),
        features: repaired.features.len(),
        report,
        project: None,
    };

    match (&args.out, output) {
        (Some(path), _) => {
            write_project(&repaired, Some(path), output)?;
            render(output, &result, render_human)
        }
        (None, OutputMode::Json) => {
            result.project = Some(repaired);
            render(output, &result, render_human)
        }
        (None, _) => {
            write_project(&repaired, None, output)?;
            render_to(&mut io::stderr().lock(), output, &result, render_human)
        }
    }
}

fn render_human(result: &SanitizeOutput, w: &mut dyn Write) -> io::Result<()> {
    let report = &result.report;
    pretty_section(w, "Sanitize")?;
    if result.clean {
        pretty_kv(w, "result", "already clean")?;
    } else {
        pretty_kv(
            w,
            "duplicates",
            format!(
                "{} entities, {} features, {} states",
                report.duplicate_entities, report.duplicate_features, report.duplicate_states
            ),
        )?;
        pretty_kv(
            w,
            "stale",
            format!(
                "{} trait entries, {} state ids",
                report.stale_trait_entries, report.stale_state_ids
            ),
        )?;
    }
    pretty_kv(
        w,
        "final",
        format!("{} entities, {} features", result.entities, result.features),
    )
}
