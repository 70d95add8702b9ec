#![deny(unsafe_code)]
//! # proofpack-seal
//!
//! Encrypts the restricted and private tiers of a catalog into a single
//! bundle that only the passphrase holder can open.
//!
//! ## Key Types
//!
//! - [`Passphrase`] — zeroizing secret, supplied out of band
//! - [`Sealer`] — re-reads sealed artifacts, archives, encrypts, and issues a receipt
//! - [`SealedBundle`] — envelope bytes plus [`proofpack_types::SealReceipt`]
//! - [`unseal`] — authenticate, decrypt, and unpack a bundle

pub mod archive;
pub mod envelope;
pub mod passphrase;
pub mod sealer;

pub use archive::SealedContents;
pub use envelope::{EnvelopeHeader, HEADER_LEN};
pub use passphrase::Passphrase;
pub use sealer::{ciphertext_digest, unseal, SealedBundle, Sealer, RECEIPT_ALGORITHMS};
