pub mod check;
pub mod completions;
pub mod match_cmd;
pub mod merge;
pub mod sanitize;

use crate::output::{CliError, OutputMode, render_error};
use anyhow::Context;
use clavis_core::error::ErrorCode;
use clavis_core::ingest::{IngestReport, project_from_str};
use clavis_core::model::Project;
use std::io::Write;
use std::path::Path;

/// Render a coded error to stderr and turn it into the handler's error.
pub fn fail(output: OutputMode, code: ErrorCode, detail: impl AsRef<str>) -> anyhow::Error {
    let detail = detail.as_ref();
    if let Err(err) = render_error(output, &CliError::from_code(code, detail)) {
        tracing::warn!("unable to render error: {err}");
    }
    anyhow::anyhow!("{code}: {}", CliError::from_code(code, detail).message)
}

fn read(path: &Path, output: OutputMode) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|err| fail(output, ErrorCode::ProjectFileUnreadable, format!("{}: {err}", path.display())))
}

/// Load a stored project. Stored projects must deserialize as-is.
pub fn load_project(path: &Path, output: OutputMode) -> anyhow::Result<Project> {
    let raw = read(path, output)?;
    serde_json::from_str(&raw)
        .map_err(|err| fail(output, ErrorCode::InvalidProjectJson, format!("{}: {err}", path.display())))
}

/// Load an AI-produced project leniently.
pub fn load_candidate(path: &Path, output: OutputMode) -> anyhow::Result<(Project, IngestReport)> {
    let raw = read(path, output)?;
    project_from_str(&raw)
        .map_err(|err| fail(output, ErrorCode::InvalidProjectJson, format!("{}: {err}", path.display())))
}

/// Write `project` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_project(project: &Project, path: Option<&Path>, output: OutputMode) -> anyhow::Result<()> {
    let mut body = serde_json::to_string_pretty(project).context("serialize project")?;
    body.push('\n');
    let written = match path {
        Some(path) => std::fs::write(path, body),
        None => std::io::stdout().lock().write_all(body.as_bytes()),
    };
    written.map_err(|err| fail(output, ErrorCode::OutputWriteFailed, err.to_string()))
}

/// blake3 digest of the project's canonical JSON.
pub fn digest(project: &Project) -> anyhow::Result<String> {
    let bytes = serde_json::to_vec(project).context("serialize project for digest")?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
