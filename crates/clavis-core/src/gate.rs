//! Pre-merge Safety Gate.
//!
//! Only catches the catastrophic responses: a candidate with no entities or
//! no features at all. A candidate with fewer entities than the existing
//! project passes; the reconciler appends every unmatched existing entity,
//! so partial responses are already safe and must not be thrown away here.

use serde::Serialize;

use crate::model::Project;

/// Why the gate refused a candidate. The caller keeps the existing project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
pub enum Rejection {
    /// The candidate carries no entities.
    #[serde(rename = "empty-ai-response")]
    #[error("candidate has no entities (empty-ai-response)")]
    EmptyResponse,
    /// The candidate carries no features.
    #[serde(rename = "no-features")]
    #[error("candidate has no features (no-features)")]
    NoFeatures,
}

impl Rejection {
    /// Stable reason string.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::EmptyResponse => "empty-ai-response",
            Self::NoFeatures => "no-features",
        }
    }
}

/// Decide whether `candidate` may be merged.
///
/// # Errors
///
/// Returns the [`Rejection`] when the candidate is structurally empty.
pub fn can_merge(candidate: &Project) -> Result<(), Rejection> {
    if candidate.entities.is_empty() {
        return Err(Rejection::EmptyResponse);
    }
    if candidate.features.is_empty() {
        return Err(Rejection::NoFeatures);
    }
    Ok(())
}
