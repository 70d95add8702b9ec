#![deny(unsafe_code)]
//! # proofpack-verify
//!
//! Re-derives a proof record from its inputs and reports, per artifact,
//! what matched and what did not.
//!
//! ## Key Types
//!
//! - [`Verifier`] — builder over the available inputs; `verify` never fails
//! - [`VerificationReport`] — per-entry statuses, findings, and the verdict
//! - [`Verdict`] — `Verified`, `MismatchFound`, or `InputsUnavailable`

pub mod report;
pub mod verifier;

pub use report::{
    ContentOrigin, EntryReport, EntryStatus, Finding, FindingKind, Severity, Verdict,
    VerificationReport,
};
pub use verifier::Verifier;
