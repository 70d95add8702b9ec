use crate::digest::DigestAlgorithm;
use crate::entry::ProvenanceEntry;
use crate::error::{ProofError, Result};
use crate::path::ArtifactPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Manifest format understood by this build.
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Run metadata supplied by the caller. Nothing here is read from the
/// environment by the pipeline itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub timestamp: DateTime<Utc>,
    pub revision_id: Option<String>,
    pub anchor_id: String,
    pub patent_flag: bool,
}

impl RunMetadata {
    pub fn new(timestamp: DateTime<Utc>, anchor_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            revision_id: None,
            anchor_id: anchor_id.into(),
            patent_flag: false,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision_id = Some(revision.into());
        self
    }

    pub fn with_patent_flag(mut self, flag: bool) -> Self {
        self.patent_flag = flag;
        self
    }
}

/// Header block of a manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub format_version: u32,
    pub timestamp: DateTime<Utc>,
    pub revision_id: Option<String>,
    pub anchor_id: String,
    pub patent_flag: bool,
    /// Algorithm used for the manifest digest and every aggregate.
    pub primary_algorithm: DigestAlgorithm,
    /// Designated primary results file, if any.
    pub results_path: Option<ArtifactPath>,
}

/// Path-sorted catalog of every artifact plus run metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub header: ManifestHeader,
    pub entries: Vec<ProvenanceEntry>,
}

impl Manifest {
    pub fn entry(&self, path: &ArtifactPath) -> Option<&ProvenanceEntry> {
        self.entries
            .binary_search_by(|e| e.path.cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn results_entry(&self) -> Option<&ProvenanceEntry> {
        self.header.results_path.as_ref().and_then(|p| self.entry(p))
    }

    pub fn sealed_entries(&self) -> impl Iterator<Item = &ProvenanceEntry> {
        self.entries.iter().filter(|e| e.is_sealed())
    }

    /// Shape validation for a manifest read back from disk.
    pub fn validate(&self) -> Result<()> {
        let corrupt = |msg: String| Err(ProofError::ManifestCorrupt(msg));

        if self.header.format_version != MANIFEST_FORMAT_VERSION {
            return corrupt(format!(
                "unsupported format version {}",
                self.header.format_version
            ));
        }
        if self.header.anchor_id.trim().is_empty() {
            return corrupt("empty anchor id".into());
        }
        if !self.header.primary_algorithm.is_cryptographic() {
            return corrupt(format!(
                "primary algorithm {} is not cryptographic",
                self.header.primary_algorithm
            ));
        }
        for pair in self.entries.windows(2) {
            if pair[0].path >= pair[1].path {
                return corrupt(format!(
                    "entries not strictly sorted at {} / {}",
                    pair[0].path, pair[1].path
                ));
            }
        }
        for entry in &self.entries {
            if entry.digest.get(self.header.primary_algorithm).is_none() {
                return corrupt(format!(
                    "{} has no {} digest",
                    entry.path, self.header.primary_algorithm
                ));
            }
            for (alg, digest) in entry.digest.iter() {
                if digest.as_bytes().len() != alg.output_len() {
                    return corrupt(format!("{} has a malformed {} digest", entry.path, alg));
                }
            }
        }
        if let Some(results) = &self.header.results_path {
            if self.entry(results).is_none() {
                return corrupt(format!("results file {} is not cataloged", results));
            }
        }
        Ok(())
    }
}
