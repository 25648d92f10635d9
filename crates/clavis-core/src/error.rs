use std::fmt;

use crate::gate::Rejection;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ProjectFileUnreadable,
    InvalidProjectJson,
    EmptyCandidate,
    CandidateWithoutFeatures,
    InvariantViolation,
    OutputWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ProjectFileUnreadable => "E2001",
            Self::InvalidProjectJson => "E2002",
            Self::EmptyCandidate => "E3001",
            Self::CandidateWithoutFeatures => "E3002",
            Self::InvariantViolation => "E4001",
            Self::OutputWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ProjectFileUnreadable => "Project file unreadable",
            Self::InvalidProjectJson => "Invalid project JSON",
            Self::EmptyCandidate => "Candidate has no entities",
            Self::CandidateWithoutFeatures => "Candidate has no features",
            Self::InvariantViolation => "Project invariants violated",
            Self::OutputWriteFailed => "Output write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .clavis/config.toml and retry."),
            Self::ProjectFileUnreadable => Some("Check the path and read permissions."),
            Self::InvalidProjectJson => {
                Some("Existing projects must be valid project JSON; candidates must be a JSON object.")
            }
            Self::EmptyCandidate => {
                Some("The generated response was empty. Regenerate it; nothing was changed.")
            }
            Self::CandidateWithoutFeatures => {
                Some("Ask for features alongside entities; nothing was changed.")
            }
            Self::InvariantViolation => Some("Run `clv sanitize` to repair the project."),
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl From<Rejection> for ErrorCode {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::EmptyResponse => Self::EmptyCandidate,
            Rejection::NoFeatures => Self::CandidateWithoutFeatures,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
