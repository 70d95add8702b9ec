//! Canonical manifest serialization.
//!
//! The digest-bearing form is compact JSON of the header and, per entry,
//! `path`, `size`, `tier` and `digest`. Field order is fixed by struct
//! declaration and digest maps are ordered, so equal manifests always
//! serialize to equal bytes. Modified times are left out: they describe
//! the checkout, not the artifact.

use proofpack_hash::digest;
use proofpack_types::{ArtifactPath, Digest, DigestSet, DisclosureTier, Manifest, ManifestHeader, Result};
use serde::Serialize;

#[derive(Serialize)]
struct CanonicalManifest<'a> {
    header: &'a ManifestHeader,
    entries: Vec<CanonicalEntry<'a>>,
}

#[derive(Serialize)]
struct CanonicalEntry<'a> {
    path: &'a ArtifactPath,
    size: u64,
    tier: DisclosureTier,
    digest: &'a DigestSet,
}

pub fn canonical_bytes(manifest: &Manifest) -> Result<Vec<u8>> {
    let canonical = CanonicalManifest {
        header: &manifest.header,
        entries: manifest
            .entries
            .iter()
            .map(|e| CanonicalEntry {
                path: &e.path,
                size: e.size,
                tier: e.tier,
                digest: &e.digest,
            })
            .collect(),
    };
    Ok(serde_json::to_vec(&canonical)?)
}

/// Primary-algorithm digest of the canonical form.
pub fn manifest_digest(manifest: &Manifest) -> Result<Digest> {
    let bytes = canonical_bytes(manifest)?;
    Ok(digest(manifest.header.primary_algorithm, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proofpack_types::{DigestAlgorithm, ProvenanceEntry, MANIFEST_FORMAT_VERSION};

    fn manifest() -> Manifest {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let entry = |path: &str, byte: u8, tier| {
            let d: DigestSet = [(DigestAlgorithm::Sha256, Digest::from_bytes(vec![byte; 32]))]
                .into_iter()
                .collect();
            ProvenanceEntry::new(ArtifactPath::new(path).unwrap(), 3, tier, d, ts)
        };
        Manifest {
            header: ManifestHeader {
                format_version: MANIFEST_FORMAT_VERSION,
                timestamp: ts,
                revision_id: Some("abc123".into()),
                anchor_id: "TRGB-2025".into(),
                patent_flag: false,
                primary_algorithm: DigestAlgorithm::Sha256,
                results_path: None,
            },
            entries: vec![
                entry("a.txt", 1, DisclosureTier::Public),
                entry("b.key", 2, DisclosureTier::Private),
            ],
        }
    }

    #[test]
    fn canonical_form_is_compact_and_ordered() {
        let text = String::from_utf8(canonical_bytes(&manifest()).unwrap()).unwrap();
        assert!(!text.contains('\n'));
        assert!(!text.contains("modified_time"));
        let header_at = text.find("\"header\"").unwrap();
        let entries_at = text.find("\"entries\"").unwrap();
        assert!(header_at < entries_at);
        assert!(text.find("a.txt").unwrap() < text.find("b.key").unwrap());
    }

    #[test]
    fn modified_time_does_not_change_digest() {
        let original = manifest();
        let mut touched = original.clone();
        touched.entries[0].modified_time = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            manifest_digest(&original).unwrap(),
            manifest_digest(&touched).unwrap()
        );
    }

    #[test]
    fn any_recorded_field_changes_digest() {
        let base = manifest_digest(&manifest()).unwrap();

        let mut m = manifest();
        m.entries[1].tier = DisclosureTier::Restricted;
        assert_ne!(base, manifest_digest(&m).unwrap());

        let mut m = manifest();
        m.header.patent_flag = true;
        assert_ne!(base, manifest_digest(&m).unwrap());

        let mut m = manifest();
        m.entries[0].size = 4;
        assert_ne!(base, manifest_digest(&m).unwrap());
    }
}
