use crate::canonical::manifest_digest;
use proofpack_catalog::Catalog;
use proofpack_hash::aggregate;
use proofpack_types::{
    ArtifactPath, Digest, DigestAlgorithm, Manifest, ManifestHeader, ProofError, ProofRecord,
    Result, RunMetadata, VerificationDescriptor, MANIFEST_FORMAT_VERSION, PROOF_VERSION,
};

/// Build the manifest for a finished catalog.
///
/// `results_path`, when given, must name a cataloged artifact.
pub fn manifest_from_catalog(
    catalog: &Catalog,
    metadata: &RunMetadata,
    primary: DigestAlgorithm,
    results_path: Option<&ArtifactPath>,
) -> Result<Manifest> {
    if metadata.anchor_id.trim().is_empty() {
        return Err(ProofError::InvalidConfig("anchor id is empty".into()));
    }
    if let Some(results) = results_path {
        if catalog.get(results).is_none() {
            return Err(ProofError::InvalidConfig(format!(
                "results file {results} is not among the cataloged artifacts"
            )));
        }
    }
    if let Some(entry) = catalog.entries().iter().find(|e| e.digest.get(primary).is_none()) {
        return Err(ProofError::InvalidConfig(format!(
            "{} has no {primary} digest",
            entry.path
        )));
    }

    Ok(Manifest {
        header: ManifestHeader {
            format_version: MANIFEST_FORMAT_VERSION,
            timestamp: metadata.timestamp,
            revision_id: metadata.revision_id.clone(),
            anchor_id: metadata.anchor_id.clone(),
            patent_flag: metadata.patent_flag,
            primary_algorithm: primary,
            results_path: results_path.cloned(),
        },
        entries: catalog.entries().to_vec(),
    })
}

/// Hash-of-hashes over the manifest digest and, when present, the results
/// digest.
pub fn combined_digest(
    algorithm: DigestAlgorithm,
    manifest_digest: &Digest,
    results_digest: Option<&Digest>,
) -> Digest {
    let mut items = vec![("manifest", manifest_digest)];
    if let Some(results) = results_digest {
        items.push(("results", results));
    }
    aggregate(algorithm, items)
}

/// Derive the proof record from a manifest.
pub fn build_proof(manifest: &Manifest) -> Result<ProofRecord> {
    let primary = manifest.header.primary_algorithm;
    let manifest_digest = manifest_digest(manifest)?;

    let results_digest = match &manifest.header.results_path {
        None => None,
        Some(path) => {
            let entry = manifest.entry(path).ok_or_else(|| {
                ProofError::ManifestCorrupt(format!("results file {path} is not cataloged"))
            })?;
            let digest = entry.digest.get(primary).ok_or_else(|| {
                ProofError::ManifestCorrupt(format!("results file {path} has no {primary} digest"))
            })?;
            Some(digest.clone())
        }
    };

    let combined = combined_digest(primary, &manifest_digest, results_digest.as_ref());
    let auxiliary = combined_digest(DigestAlgorithm::Crc32, &manifest_digest, results_digest.as_ref());

    tracing::debug!(
        manifest = %manifest_digest.short(),
        combined = %combined.short(),
        "proof record derived"
    );

    Ok(ProofRecord {
        proof_version: PROOF_VERSION.to_string(),
        algorithm: primary,
        results_digest,
        manifest_digest,
        verification: VerificationDescriptor::new(primary, &combined),
        combined_digest: combined,
        auxiliary_checksum: auxiliary,
        anchor_id: manifest.header.anchor_id.clone(),
        patent_flag: manifest.header.patent_flag,
        disclosure_layers: ProofRecord::standard_layers(),
        entry_count: manifest.entries.len(),
        timestamp: manifest.header.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proofpack_catalog::{CatalogScanner, MemorySource};
    use proofpack_hash::digest;
    use proofpack_types::{DisclosureTier, LayerDisposition, ProofConfig};

    fn metadata() -> RunMetadata {
        RunMetadata::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(), "TRGB-2025")
    }

    fn catalog() -> Catalog {
        let source = MemorySource::from_files([
            ("a.txt", b"hello".to_vec()),
            ("results.json", br#"{"h0": 67.96}"#.to_vec()),
        ])
        .unwrap();
        CatalogScanner::from_config(&ProofConfig::default())
            .unwrap()
            .scan(&source)
            .unwrap()
    }

    fn results() -> ArtifactPath {
        ArtifactPath::new("results.json").unwrap()
    }

    #[test]
    fn proof_links_manifest_and_results() {
        let manifest =
            manifest_from_catalog(&catalog(), &metadata(), DigestAlgorithm::Sha3_512, Some(&results()))
                .unwrap();
        let proof = build_proof(&manifest).unwrap();
        proof.validate().unwrap();

        let expected_results = digest(DigestAlgorithm::Sha3_512, br#"{"h0": 67.96}"#);
        assert_eq!(proof.results_digest.as_ref(), Some(&expected_results));
        assert_eq!(proof.manifest_digest, manifest_digest(&manifest).unwrap());
        assert_eq!(
            proof.combined_digest,
            combined_digest(DigestAlgorithm::Sha3_512, &proof.manifest_digest, Some(&expected_results))
        );
        assert_eq!(proof.auxiliary_checksum.as_bytes().len(), 4);
        assert_eq!(proof.verification.expected_digest, proof.combined_digest);
        assert_eq!(proof.entry_count, 2);
        assert_eq!(proof.anchor_id, "TRGB-2025");
        assert_eq!(
            proof.disclosure_layers[&DisclosureTier::Private],
            LayerDisposition::Sealed
        );
    }

    #[test]
    fn without_results_combined_covers_manifest_only() {
        let manifest =
            manifest_from_catalog(&catalog(), &metadata(), DigestAlgorithm::Sha3_512, None).unwrap();
        let proof = build_proof(&manifest).unwrap();
        assert!(proof.results_digest.is_none());
        assert_eq!(
            proof.combined_digest,
            digest(DigestAlgorithm::Sha3_512, proof.manifest_digest.as_bytes())
        );
    }

    #[test]
    fn unknown_results_path_is_invalid_config() {
        let missing = ArtifactPath::new("missing.json").unwrap();
        let err = manifest_from_catalog(&catalog(), &metadata(), DigestAlgorithm::Sha3_512, Some(&missing))
            .unwrap_err();
        assert!(matches!(err, ProofError::InvalidConfig(_)));
    }

    #[test]
    fn primary_must_be_catalogued() {
        let err = manifest_from_catalog(&catalog(), &metadata(), DigestAlgorithm::Blake3, None)
            .unwrap_err();
        assert!(matches!(err, ProofError::InvalidConfig(_)));
    }

    #[test]
    fn patent_flag_flows_through() {
        let meta = metadata().with_patent_flag(true).with_revision("deadbeef");
        let manifest =
            manifest_from_catalog(&catalog(), &meta, DigestAlgorithm::Sha3_512, None).unwrap();
        assert_eq!(manifest.header.revision_id.as_deref(), Some("deadbeef"));
        assert!(build_proof(&manifest).unwrap().patent_flag);
    }
}
