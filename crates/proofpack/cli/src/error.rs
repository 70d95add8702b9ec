//! CLI error types

use proofpack_types::ProofError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Pipeline failure
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CliError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl CliError {
    pub fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }

    /// Process exit code. 0, 1 and 2 are reserved for verification verdicts.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_)
            | CliError::InvalidInput(_)
            | CliError::Proof(ProofError::InvalidConfig(_))
            | CliError::Proof(ProofError::InvalidPath { .. }) => 64,
            CliError::Proof(_) | CliError::Io { .. } | CliError::Json(_) => 3,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
