use thiserror::Error;

/// One violation found while validating a parsed plan against the action schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanViolation {
    UnknownKind { index: usize, kind: String },
    MissingParameter { index: usize, kind: &'static str, key: &'static str },
    UnknownParameter { index: usize, kind: &'static str, key: String },
    InvalidValue { index: usize, kind: &'static str, key: String },
}

impl std::fmt::Display for PlanViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanViolation::UnknownKind { index, kind } => {
                write!(f, "step {}: unknown action kind '{kind}'", index + 1)
            }
            PlanViolation::MissingParameter { index, kind, key } => {
                write!(
                    f,
                    "step {}: action '{kind}' missing required parameter '{key}'",
                    index + 1
                )
            }
            PlanViolation::UnknownParameter { index, kind, key } => {
                write!(
                    f,
                    "step {}: action '{kind}' has unknown parameter '{key}'",
                    index + 1
                )
            }
            PlanViolation::InvalidValue { index, kind, key } => {
                write!(
                    f,
                    "step {}: action '{kind}' parameter '{key}' has the wrong type",
                    index + 1
                )
            }
        }
    }
}

fn render_violations(violations: &[PlanViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum DeskPilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("AI backend error: {0}")]
    LlmBackend(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Plan validation failed: {}", render_violations(.0))]
    InvalidPlan(Vec<PlanViolation>),

    #[error("No actionable intent in command")]
    NoActionableIntent,

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Task not found: {0}")]
    TaskNotFound(uuid::Uuid),

    #[error("Task error: {0}")]
    Task(String),

    #[error("Task cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl serde::Serialize for DeskPilotError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type DeskPilotResult<T> = Result<T, DeskPilotError>;
