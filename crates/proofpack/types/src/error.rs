use std::path::PathBuf;

/// Errors raised while building or opening a proof package.
///
/// Construction-side failures abort the run; the verifier turns the
/// recoverable ones into findings instead of propagating them.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("artifact unreadable: {path}: {source}")]
    ArtifactUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("partial catalog at {path}: {reason}")]
    PartialCatalog { path: String, reason: String },

    #[error("artifact changed since it was cataloged: {path}")]
    ArtifactChanged { path: String },

    #[error("duplicate catalog path: {0}")]
    DuplicatePath(String),

    #[error("invalid artifact path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    #[error("decryption failure: {0}")]
    DecryptionFailure(String),

    #[error("sealed bundle corrupt: {0}")]
    BundleCorrupt(String),

    #[error("manifest corrupt: {0}")]
    ManifestCorrupt(String),

    #[error("digest mismatch for {subject}: expected {expected}, computed {computed}")]
    DigestMismatch {
        subject: String,
        expected: String,
        computed: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("proof package already exists: {}", .0.display())]
    PackageExists(PathBuf),

    #[error("failed to emit {}: {source}", path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ProofError {
    pub fn unreadable(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ArtifactUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn partial(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::PartialCatalog {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn emit(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Emit {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ProofError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias used across the proofpack crates.
pub type Result<T> = std::result::Result<T, ProofError>;
