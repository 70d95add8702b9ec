use crate::digest::DigestSet;
use crate::path::ArtifactPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Receipt format understood by this build.
pub const SEAL_RECEIPT_FORMAT: &str = "proofpack-seal/1";

/// Cipher suite used for the sealed bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SealAlgorithm {
    /// Argon2id key derivation, ChaCha20-Poly1305 AEAD.
    #[serde(rename = "argon2id+chacha20poly1305")]
    Argon2idChaCha20Poly1305,
}

impl fmt::Display for SealAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SealAlgorithm::Argon2idChaCha20Poly1305 => f.write_str("argon2id+chacha20poly1305"),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_lanes")]
    pub lanes: u8,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            lanes: default_lanes(),
        }
    }
}

fn default_memory_kib() -> u32 {
    64 * 1024
}

fn default_iterations() -> u32 {
    3
}

fn default_lanes() -> u8 {
    4
}

/// Public description of a sealed bundle.
///
/// Lets third parties confirm the ciphertext is untouched without
/// decrypting it. Never carries key material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealReceipt {
    pub format: String,
    pub algorithm: SealAlgorithm,
    pub kdf: KdfParams,
    pub ciphertext_digest: DigestSet,
    pub ciphertext_len: u64,
    pub sealed_entries: Vec<ArtifactPath>,
}
