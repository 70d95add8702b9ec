#![deny(unsafe_code)]
//! # proofpack-hash
//!
//! Digest computation for provenance catalogs.
//!
//! ## Key Types
//!
//! - [`HashEngine`] — streams an artifact once, feeding every configured hasher
//! - [`aggregate`] — order-independent hash-of-hashes over labelled digests
//! - [`digest`] — single-shot digest of a byte slice

pub mod aggregate;
pub mod engine;

pub use aggregate::aggregate;
pub use engine::{digest, HashEngine};
