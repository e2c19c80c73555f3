use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while building, dispatching, or applying a plan request
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("A plan request is already in progress")]
    ConcurrentRequest,

    #[error("Scheduling service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Scheduling service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Malformed plan: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PlannerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PlannerError::Validation(msg.into())
    }

    /// True for failures that happened after the request left the process
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PlannerError::Service { .. }
                | PlannerError::Transport(_)
                | PlannerError::Timeout(_)
                | PlannerError::Decode(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}
