//! Verification report model.

use proofpack_types::{ArtifactPath, Digest, DigestAlgorithm, DisclosureTier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a finding weighs on the verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Unavailable,
    Mismatch,
}

/// Every problem the verifier can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    ProofCorrupt,
    ManifestCorrupt,
    ReceiptCorrupt,
    ManifestDigestMismatch,
    HeaderMismatch,
    CombinedDigestMismatch,
    AuxiliaryChecksumMismatch,
    CiphertextMismatch,
    BundleCorrupt,
    DecryptionFailure,
    PassphraseMissing,
    ArtifactMismatch,
    ArtifactMissing,
    ArtifactUnreadable,
    UnexpectedBundleEntry,
    UnexpectedArtifact,
    RootUnavailable,
    NoContentSource,
    /// A package file that could not be read, or a requested one that is absent.
    PackageFileUnavailable,
}

impl FindingKind {
    pub fn severity(self) -> Severity {
        use FindingKind::*;
        match self {
            ProofCorrupt
            | ManifestCorrupt
            | ReceiptCorrupt
            | ManifestDigestMismatch
            | HeaderMismatch
            | CombinedDigestMismatch
            | AuxiliaryChecksumMismatch
            | CiphertextMismatch
            | BundleCorrupt
            | ArtifactMismatch
            | ArtifactMissing
            | UnexpectedBundleEntry => Severity::Mismatch,
            // Without a receipt a failed tag cannot be told apart from a
            // wrong passphrase.
            DecryptionFailure
            | PassphraseMissing
            | ArtifactUnreadable
            | RootUnavailable
            | NoContentSource
            | PackageFileUnavailable => Severity::Unavailable,
            UnexpectedArtifact => Severity::Info,
        }
    }
}

/// One reported problem, attributed to a subject (an artifact path or a
/// package component).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub subject: String,
    pub detail: String,
}

impl Finding {
    pub fn new(kind: FindingKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

/// Outcome for one artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Matched,
    Mismatch { algorithms: Vec<DigestAlgorithm> },
    Missing,
    Unreadable { reason: String },
    /// No supplied input covers this artifact's tier.
    Unavailable,
    /// Present in an input but not listed in the manifest.
    Unexpected,
}

/// Where an artifact's content was checked from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    Root,
    Bundle,
    Disclosed,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    pub path: ArtifactPath,
    /// `None` for unexpected artifacts.
    pub tier: Option<DisclosureTier>,
    pub origin: ContentOrigin,
    #[serde(flatten)]
    pub status: EntryStatus,
}

/// Overall result and its process exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    MismatchFound,
    InputsUnavailable,
}

impl Verdict {
    /// A mismatch outranks unavailable inputs.
    pub fn from_findings(findings: &[Finding]) -> Self {
        match findings.iter().map(|f| f.severity).max() {
            Some(Severity::Mismatch) => Verdict::MismatchFound,
            Some(Severity::Unavailable) => Verdict::InputsUnavailable,
            Some(Severity::Info) | None => Verdict::Verified,
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Verified => 0,
            Verdict::MismatchFound => 1,
            Verdict::InputsUnavailable => 2,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Verified => f.write_str("verified"),
            Verdict::MismatchFound => f.write_str("mismatch found"),
            Verdict::InputsUnavailable => f.write_str("inputs unavailable"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verdict: Verdict,
    pub anchor_id: Option<String>,
    pub recorded_combined: Option<Digest>,
    pub recomputed_combined: Option<Digest>,
    pub entries: Vec<EntryReport>,
    pub findings: Vec<Finding>,
}

impl VerificationReport {
    /// A report for a run that never reached the verifier, such as a package
    /// missing its proof.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        Self {
            verdict: Verdict::from_findings(&findings),
            anchor_id: None,
            recorded_combined: None,
            recomputed_combined: None,
            entries: Vec::new(),
            findings,
        }
    }

    /// Add a finding raised outside the verifier and re-derive the verdict.
    pub fn push_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
        self.verdict = Verdict::from_findings(&self.findings);
    }

    pub fn entry(&self, path: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.path.as_str() == path)
    }

    /// Entries whose content differs from, or is absent against, the manifest.
    pub fn mismatched_entries(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, EntryStatus::Mismatch { .. } | EntryStatus::Missing))
    }

    pub fn matched_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Matched)
            .count()
    }

    pub fn has_finding(&self, kind: FindingKind) -> bool {
        self.findings.iter().any(|f| f.kind == kind)
    }
}
