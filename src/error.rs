use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("malformed input {source_name}: {reason}")]
    MalformedInput { source_name: String, reason: String },

    #[error("missing field `{field}` in play records")]
    MissingField { field: &'static str },

    #[error("number of top artists must be between 1 and 50, got {0}")]
    InvalidTopCount(usize),

    #[error("invalid year windows: {0}")]
    InvalidWindows(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    pub(crate) fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
