//! Passphrase-keyed AEAD envelope.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! magic      "PPKSEAL1"   8
//! version    u16          2
//! kdf id     u8           1   (1 = Argon2id v19)
//! memory KiB u32          4
//! iterations u32          4
//! lanes      u8           1
//! salt                    16
//! aead id    u8           1   (1 = ChaCha20-Poly1305)
//! nonce                   12
//! ciphertext + tag        N + 16
//! ```
//!
//! The whole header is bound as associated data, so editing any header
//! byte fails authentication.

use crate::passphrase::Passphrase;
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use proofpack_types::{KdfParams, ProofError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

const MAGIC: &[u8; 8] = b"PPKSEAL1";
const VERSION: u16 = 1;
const KDF_ARGON2ID: u8 = 1;
const AEAD_CHACHA20POLY1305: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// Encoded header length in bytes.
pub const HEADER_LEN: usize = 8 + 2 + 1 + 4 + 4 + 1 + SALT_LEN + 1 + NONCE_LEN;

// 4 GiB; a larger claim in a header is treated as corruption.
const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Decoded envelope header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub kdf: KdfParams,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
}

impl EnvelopeHeader {
    fn fresh(kdf: KdfParams) -> Self {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);
        Self { kdf, salt, nonce }
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.push(KDF_ARGON2ID);
        out.extend_from_slice(&self.kdf.memory_kib.to_be_bytes());
        out.extend_from_slice(&self.kdf.iterations.to_be_bytes());
        out.push(self.kdf.lanes);
        out.extend_from_slice(&self.salt);
        out.push(AEAD_CHACHA20POLY1305);
        out.extend_from_slice(&self.nonce);
        out
    }

    /// Parse the header, returning it with the remaining ciphertext.
    pub fn parse(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let corrupt = |msg: String| ProofError::BundleCorrupt(msg);

        if bytes.len() < HEADER_LEN + TAG_LEN {
            return Err(corrupt(format!(
                "bundle is {} bytes, shorter than header and tag",
                bytes.len()
            )));
        }
        if &bytes[..8] != MAGIC {
            return Err(corrupt("bad magic".into()));
        }

        let mut cursor = Cursor { bytes, pos: 8 };
        let version = u16::from_be_bytes(cursor.take::<2>());
        if version != VERSION {
            return Err(corrupt(format!("unsupported envelope version {version}")));
        }
        let kdf_id = cursor.take::<1>()[0];
        if kdf_id != KDF_ARGON2ID {
            return Err(corrupt(format!("unknown kdf id {kdf_id}")));
        }
        let memory_kib = u32::from_be_bytes(cursor.take::<4>());
        let iterations = u32::from_be_bytes(cursor.take::<4>());
        let lanes = cursor.take::<1>()[0];
        let salt = cursor.take::<SALT_LEN>();
        let aead_id = cursor.take::<1>()[0];
        if aead_id != AEAD_CHACHA20POLY1305 {
            return Err(corrupt(format!("unknown aead id {aead_id}")));
        }
        let nonce = cursor.take::<NONCE_LEN>();

        if memory_kib > MAX_MEMORY_KIB || iterations == 0 || lanes == 0 {
            return Err(corrupt("implausible kdf parameters".into()));
        }

        let header = Self {
            kdf: KdfParams {
                memory_kib,
                iterations,
                lanes,
            },
            salt,
            nonce,
        };
        Ok((header, &bytes[HEADER_LEN..]))
    }
}

/// Fixed-offset reader over a slice already checked to be long enough.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
}

fn derive_key(
    passphrase: &Passphrase,
    salt: &[u8],
    kdf: KdfParams,
) -> std::result::Result<Zeroizing<[u8; KEY_LEN]>, String> {
    let params = Params::new(
        kdf.memory_kib,
        kdf.iterations,
        u32::from(kdf.lanes),
        Some(KEY_LEN),
    )
    .map_err(|e| format!("argon2 parameters: {e}"))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|e| format!("argon2 derivation: {e}"))?;
    Ok(key)
}

/// Encrypt `plaintext` under a key derived from `passphrase`.
pub fn seal_bytes(plaintext: &[u8], passphrase: &Passphrase, kdf: KdfParams) -> Result<Vec<u8>> {
    if passphrase.is_empty() {
        return Err(ProofError::EncryptionFailure("empty passphrase".into()));
    }

    let header = EnvelopeHeader::fresh(kdf);
    let aad = header.encode();
    let key = derive_key(passphrase, &header.salt, kdf).map_err(ProofError::EncryptionFailure)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&header.nonce),
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| ProofError::EncryptionFailure("aead encryption failed".into()))?;

    let mut out = aad;
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Authenticate and decrypt an envelope.
///
/// A malformed header is `BundleCorrupt`; a wrong passphrase or any
/// modified byte is `DecryptionFailure` and yields no plaintext.
pub fn open_bytes(envelope: &[u8], passphrase: &Passphrase) -> Result<Zeroizing<Vec<u8>>> {
    let (header, ciphertext) = EnvelopeHeader::parse(envelope)?;
    let aad = &envelope[..HEADER_LEN];
    let key = derive_key(passphrase, &header.salt, header.kdf).map_err(ProofError::BundleCorrupt)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    cipher
        .decrypt(
            Nonce::from_slice(&header.nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| {
            ProofError::DecryptionFailure(
                "authentication failed: wrong passphrase or modified bundle".into(),
            )
        })
}
