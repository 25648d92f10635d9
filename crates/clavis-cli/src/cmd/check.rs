use super::{fail, load_project};
use crate::output::{OutputMode, render};
use clap::Args;
use clavis_core::error::ErrorCode;
use clavis_core::gate::can_merge;
use clavis_core::sanitize::{Violation, violations};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(
    about = "Check a project without changing it",
    long_about = "Run the safety gate and list every broken project invariant.\n\n\
                  Exits non-zero when the project has invariant violations.",
    after_help = "EXAMPLES:\n    # Check a stored key\n    clv check key.json\n\n\
                  # Machine-readable output\n    clv check key.json --json"
)]
pub struct CheckArgs {
    /// Project JSON to check.
    #[arg(value_name = "FILE")]
    pub project: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    /// `true` when the project would pass the safety gate as a candidate.
    pub mergeable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<&'static str>,
    pub violations: Vec<Violation>,
}

pub fn run_check(args: &CheckArgs, output: OutputMode) -> anyhow::Result<()> {
    let project = load_project(&args.project, output)?;
    let gate = can_merge(&project).err();
    let result = CheckOutput {
        mergeable: gate.is_none(),
        gate: gate.map(|rejection| rejection.reason()),
        violations: violations(&project),
    };

    render(output, &result, |r, w| {
        match r.gate {
            Some(reason) => writeln!(w, "gate: refused ({reason})")?,
            None => writeln!(w, "gate: ok")?,
        }
        if r.violations.is_empty() {
            writeln!(w, "invariants: ok")?;
        } else {
            writeln!(w, "invariants: {} violation(s)", r.violations.len())?;
            for violation in &r.violations {
                writeln!(w, "  - {violation}")?;
            }
        }
        Ok(())
    })?;

    if result.violations.is_empty() {
        Ok(())
    } else {
        Err(fail(
            output,
            ErrorCode::InvariantViolation,
            format!("{} problem(s)", result.violations.len()),
        ))
    }
}
