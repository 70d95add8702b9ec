//! Command implementations

pub mod build;
pub mod classify;
pub mod inspect;
pub mod verify;

use crate::error::{CliError, CliResult};
use clap::Args;
use proofpack_seal::Passphrase;
use std::path::{Path, PathBuf};

/// Where the sealing passphrase comes from. Never from configuration.
#[derive(Args, Debug)]
pub struct PassphraseArgs {
    /// Environment variable holding the passphrase
    #[arg(long, default_value = "PROOFPACK_PASSPHRASE")]
    pub passphrase_env: String,

    /// File whose contents are the passphrase
    #[arg(long, conflicts_with = "passphrase_env")]
    pub passphrase_file: Option<PathBuf>,
}

impl PassphraseArgs {
    pub fn resolve(&self) -> CliResult<Option<Passphrase>> {
        let passphrase = match &self.passphrase_file {
            Some(path) => Some(Passphrase::from_file(path)?),
            None => Passphrase::from_env(&self.passphrase_env)?,
        };
        Ok(passphrase.filter(|p| !p.is_empty()))
    }
}

pub(crate) fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| CliError::io(path.display(), e))
}

/// `Ok(None)` when the file does not exist.
pub(crate) fn read_optional(path: &Path) -> CliResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CliError::io(path.display(), e)),
    }
}
