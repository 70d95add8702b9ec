#![deny(unsafe_code)]
//! # proofpack-manifest
//!
//! Turns a catalog into a canonical manifest and a tamper-evident proof
//! record, and writes the finished package to disk.
//!
//! ## Key Types
//!
//! - [`ProofPipeline`] — catalog, seal, and summarize a source in one pass
//! - [`ProofPackage`] — in-memory result of a run
//! - [`PackageWriter`] — atomic emission to a fresh directory
//! - [`canonical_bytes`] / [`manifest_digest`] — digest-bearing manifest form
//! - [`AuditTrail`] — hash-chained run events, written as `audit.jsonl`

pub mod audit;
pub mod builder;
pub mod canonical;
pub mod emit;
pub mod pipeline;

pub use audit::{AuditEvent, AuditStage, AuditTrail};
pub use builder::{build_proof, combined_digest, manifest_from_catalog};
pub use canonical::{canonical_bytes, manifest_digest};
pub use emit::{
    PackageWriter, AUDIT_FILE, BUNDLE_FILE, DISCLOSED_DIR, MANIFEST_FILE, PROOF_FILE, RECEIPT_FILE,
};
pub use pipeline::{ProofPackage, ProofPipeline};
