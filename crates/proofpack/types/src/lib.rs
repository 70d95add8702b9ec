#![deny(unsafe_code)]
//! # proofpack-types
//!
//! Shared data model for provenance proof packages.
//!
//! ## Key Types
//!
//! - [`DisclosureTier`] — Public / PublicSignature / Restricted / Private
//! - [`ArtifactPath`] — validated root-relative path, the catalog sort key
//! - [`DigestSet`] — named digests over one artifact
//! - [`ProvenanceEntry`] — one cataloged artifact
//! - [`Manifest`] — path-sorted catalog plus run metadata
//! - [`ProofRecord`] — the publishable tamper-evident summary
//! - [`SealReceipt`] — public description of the sealed bundle
//! - [`ProofConfig`] — explicit pipeline configuration
//! - [`ProofError`] — error taxonomy shared by every stage

pub mod config;
pub mod digest;
pub mod entry;
pub mod error;
pub mod manifest;
pub mod path;
pub mod proof;
pub mod seal;
pub mod tier;

pub use config::{HashingConfig, ProofConfig, RunConfig, SealConfig, TierRule};
pub use digest::{Digest, DigestAlgorithm, DigestSet};
pub use entry::ProvenanceEntry;
pub use error::{ProofError, Result};
pub use manifest::{Manifest, ManifestHeader, RunMetadata, MANIFEST_FORMAT_VERSION};
pub use path::ArtifactPath;
pub use proof::{ProofRecord, VerificationDescriptor, PROOF_VERSION};
pub use seal::{KdfParams, SealAlgorithm, SealReceipt, SEAL_RECEIPT_FORMAT};
pub use tier::{DisclosureTier, LayerDisposition};
