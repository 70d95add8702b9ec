use crate::digest::{Digest, DigestAlgorithm};
use crate::error::{ProofError, Result};
use crate::tier::{DisclosureTier, LayerDisposition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proof record format understood by this build.
pub const PROOF_VERSION: &str = "1";

/// The terminal, publishable summary of one run.
///
/// Every field is derived from the manifest; changing any cataloged
/// artifact changes at least `manifest_digest` and `combined_digest`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub proof_version: String,
    /// Algorithm behind every digest below except the auxiliary checksum.
    pub algorithm: DigestAlgorithm,
    pub results_digest: Option<Digest>,
    pub manifest_digest: Digest,
    /// Hash-of-hashes over the manifest and results digests.
    pub combined_digest: Digest,
    /// CRC32 over the same inputs as `combined_digest`.
    pub auxiliary_checksum: Digest,
    pub anchor_id: String,
    pub patent_flag: bool,
    pub disclosure_layers: BTreeMap<DisclosureTier, LayerDisposition>,
    pub entry_count: usize,
    pub timestamp: DateTime<Utc>,
    pub verification: VerificationDescriptor,
}

/// How a reader re-derives `combined_digest` from a package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDescriptor {
    pub method: String,
    pub expected_digest: Digest,
    pub command: String,
}

impl VerificationDescriptor {
    pub const COMMAND: &'static str = "proofpack verify --package <package> --root <tree>";

    pub fn new(algorithm: DigestAlgorithm, combined_digest: &Digest) -> Self {
        Self {
            method: format!(
                "{algorithm} over the compact JSON manifest without modified times, \
                 then {algorithm} over the manifest and results digests sorted by key"
            ),
            expected_digest: combined_digest.clone(),
            command: Self::COMMAND.to_string(),
        }
    }
}

impl ProofRecord {
    pub fn validate(&self) -> Result<()> {
        if self.proof_version != PROOF_VERSION {
            return Err(ProofError::ManifestCorrupt(format!(
                "unsupported proof version {:?}",
                self.proof_version
            )));
        }
        let expected = self.algorithm.output_len();
        for (name, digest) in [
            ("manifest_digest", Some(&self.manifest_digest)),
            ("combined_digest", Some(&self.combined_digest)),
            ("results_digest", self.results_digest.as_ref()),
        ] {
            if let Some(d) = digest {
                if d.as_bytes().len() != expected {
                    return Err(ProofError::ManifestCorrupt(format!(
                        "{name} has length {} for {}",
                        d.as_bytes().len(),
                        self.algorithm
                    )));
                }
            }
        }
        if self.auxiliary_checksum.as_bytes().len() != DigestAlgorithm::Crc32.output_len() {
            return Err(ProofError::ManifestCorrupt(
                "auxiliary_checksum is not a crc32".into(),
            ));
        }
        if self.verification != VerificationDescriptor::new(self.algorithm, &self.combined_digest) {
            return Err(ProofError::ManifestCorrupt(
                "verification descriptor does not match the record".into(),
            ));
        }
        for tier in DisclosureTier::ALL {
            match self.disclosure_layers.get(&tier) {
                Some(d) if *d == tier.disposition() => {}
                Some(d) => {
                    return Err(ProofError::ManifestCorrupt(format!(
                        "tier {tier} declared {d}, expected {}",
                        tier.disposition()
                    )))
                }
                None => {
                    return Err(ProofError::ManifestCorrupt(format!(
                        "tier {tier} missing from disclosure layers"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Every tier with its disposition.
    pub fn standard_layers() -> BTreeMap<DisclosureTier, LayerDisposition> {
        DisclosureTier::ALL
            .into_iter()
            .map(|t| (t, t.disposition()))
            .collect()
    }
}
