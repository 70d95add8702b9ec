use crate::digest::{DigestAlgorithm, DigestSet};
use crate::path::ArtifactPath;
use crate::tier::DisclosureTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cataloged artifact. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub path: ArtifactPath,
    /// Byte count actually hashed.
    pub size: u64,
    pub tier: DisclosureTier,
    pub digest: DigestSet,
    pub modified_time: DateTime<Utc>,
}

impl ProvenanceEntry {
    pub fn new(
        path: ArtifactPath,
        size: u64,
        tier: DisclosureTier,
        digest: DigestSet,
        modified_time: DateTime<Utc>,
    ) -> Self {
        Self {
            path,
            size,
            tier,
            digest,
            modified_time,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.tier.is_sealed()
    }

    /// Digest under `algorithm`, hex encoded.
    pub fn digest_hex(&self, algorithm: DigestAlgorithm) -> Option<String> {
        self.digest.get(algorithm).map(|d| d.to_hex())
    }
}
