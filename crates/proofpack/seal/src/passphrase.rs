use proofpack_types::{ProofError, Result};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// Sealing secret, wiped from memory on drop.
///
/// Only ever obtained out of band (environment variable or file). It has
/// no serde impls and its `Debug` output is redacted.
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Read from environment variable `var`. `Ok(None)` when unset.
    pub fn from_env(var: &str) -> Result<Option<Self>> {
        match std::env::var(var) {
            Ok(value) => Ok(Some(Self::new(value))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ProofError::InvalidConfig(format!(
                "passphrase variable {var} is not valid UTF-8"
            ))),
        }
    }

    /// Read from a file; one trailing line ending is stripped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            ProofError::InvalidConfig(format!(
                "cannot read passphrase file {}: {}",
                path.display(),
                e.kind()
            ))
        })?);
        let trimmed = raw
            .strip_suffix("\r\n")
            .or_else(|| raw.strip_suffix('\n'))
            .unwrap_or(&raw);
        Ok(Self::new(trimmed))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}
