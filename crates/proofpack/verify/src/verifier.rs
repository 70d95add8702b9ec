//! Independent re-derivation of a proof record.
//!
//! The verifier never fails: every problem it meets becomes a [`Finding`]
//! and the [`Verdict`] is derived from the worst of them.

use crate::report::{
    ContentOrigin, EntryReport, EntryStatus, Finding, FindingKind, Verdict, VerificationReport,
};
use proofpack_catalog::ArtifactSource;
use proofpack_hash::HashEngine;
use proofpack_manifest::{
    combined_digest, manifest_digest, BUNDLE_FILE, DISCLOSED_DIR, MANIFEST_FILE, PROOF_FILE,
    RECEIPT_FILE,
};
use proofpack_seal::{ciphertext_digest, unseal, Passphrase, SealedContents};
use proofpack_types::{
    ArtifactPath, Digest, DigestAlgorithm, DigestSet, Manifest, ProofError, ProofRecord,
    ProvenanceEntry, SealReceipt, SEAL_RECEIPT_FORMAT,
};
use std::collections::BTreeSet;

/// Inputs to one verification run.
///
/// Supply a plaintext root, a sealed bundle with its passphrase, or both.
/// Sealed tiers are checked against the opened bundle when there is one and
/// against the root otherwise. `PublicSignature` artifacts can also be
/// checked against a package's disclosed directory.
#[derive(Clone, Copy, Default)]
pub struct Verifier<'a> {
    root: Option<&'a dyn ArtifactSource>,
    disclosed: Option<&'a dyn ArtifactSource>,
    bundle: Option<&'a [u8]>,
    receipt: Option<&'a [u8]>,
    passphrase: Option<&'a Passphrase>,
}

/// A source together with the paths it currently holds.
struct Listing<'a> {
    source: &'a dyn ArtifactSource,
    paths: BTreeSet<ArtifactPath>,
    origin: ContentOrigin,
}

type Observation = Option<(DigestSet, u64)>;

impl<'a> Verifier<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: &'a dyn ArtifactSource) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_disclosed(mut self, disclosed: &'a dyn ArtifactSource) -> Self {
        self.disclosed = Some(disclosed);
        self
    }

    pub fn with_bundle(mut self, bytes: &'a [u8], passphrase: Option<&'a Passphrase>) -> Self {
        self.bundle = Some(bytes);
        self.passphrase = passphrase;
        self
    }

    pub fn with_receipt(mut self, receipt: &'a [u8]) -> Self {
        self.receipt = Some(receipt);
        self
    }

    pub fn verify(&self, manifest_bytes: &[u8], proof_bytes: &[u8]) -> VerificationReport {
        let mut findings = Vec::new();

        let proof = match parse_proof(proof_bytes) {
            Ok(proof) => proof,
            Err(e) => {
                findings.push(Finding::new(FindingKind::ProofCorrupt, PROOF_FILE, e.to_string()));
                return finish(None, None, Vec::new(), findings);
            }
        };
        let manifest = match parse_manifest(manifest_bytes) {
            Ok(manifest) => manifest,
            Err(e) => {
                findings.push(Finding::new(
                    FindingKind::ManifestCorrupt,
                    MANIFEST_FILE,
                    e.to_string(),
                ));
                return finish(Some(&proof), None, Vec::new(), findings);
            }
        };
        let primary = manifest.header.primary_algorithm;
        tracing::info!(
            anchor = %proof.anchor_id,
            entries = manifest.entries.len(),
            "verifying proof package"
        );

        match manifest_digest(&manifest) {
            Ok(recorded) if recorded != proof.manifest_digest => findings.push(Finding::new(
                FindingKind::ManifestDigestMismatch,
                MANIFEST_FILE,
                mismatch_detail("manifest", &proof.manifest_digest, &recorded),
            )),
            Ok(_) => {}
            Err(e) => {
                findings.push(Finding::new(
                    FindingKind::ManifestCorrupt,
                    MANIFEST_FILE,
                    e.to_string(),
                ));
                return finish(Some(&proof), None, Vec::new(), findings);
            }
        }
        check_header(&manifest, &proof, &mut findings);

        let engine = match HashEngine::new(
            std::iter::once(primary).chain(manifest.entries.iter().flat_map(|e| e.digest.algorithms())),
        ) {
            Ok(engine) => engine,
            Err(e) => {
                findings.push(Finding::new(
                    FindingKind::ManifestCorrupt,
                    MANIFEST_FILE,
                    e.to_string(),
                ));
                return finish(Some(&proof), None, Vec::new(), findings);
            }
        };

        let opened = self.open_bundle(&manifest, &mut findings);
        let root = self.root.and_then(|s| {
            list(s, ContentOrigin::Root, "plaintext root", &mut findings)
        });
        let disclosed = self.disclosed.and_then(|s| {
            list(s, ContentOrigin::Disclosed, DISCLOSED_DIR, &mut findings)
        });
        if self.root.is_none() && self.bundle.is_none() && self.disclosed.is_none() {
            findings.push(Finding::new(
                FindingKind::NoContentSource,
                "inputs",
                "neither a plaintext root nor a sealed bundle was supplied",
            ));
        }

        let mut entries = Vec::with_capacity(manifest.entries.len());
        let mut observations = Vec::with_capacity(manifest.entries.len());
        for entry in &manifest.entries {
            let (origin, status, observed) = if entry.is_sealed() && opened.is_some() {
                let contents = opened.as_ref().map(|c| c.get(&entry.path));
                match contents.flatten() {
                    Some(bytes) => {
                        let set = engine.digest_bytes(bytes);
                        let size = bytes.len() as u64;
                        (ContentOrigin::Bundle, compare(entry, &set, size), Some((set, size)))
                    }
                    None => (ContentOrigin::Bundle, EntryStatus::Missing, None),
                }
            } else if let Some(root) = &root {
                let (status, observed) = check_listing(&engine, root, entry);
                (root.origin, status, observed)
            } else if let (Some(disclosed), true) = (&disclosed, entry.tier.discloses_content()) {
                let (status, observed) = check_listing(&engine, disclosed, entry);
                (disclosed.origin, status, observed)
            } else {
                (ContentOrigin::None, EntryStatus::Unavailable, None)
            };

            record_status(entry, origin, &status, &mut findings);
            entries.push(EntryReport {
                path: entry.path.clone(),
                tier: Some(entry.tier),
                origin,
                status,
            });
            observations.push(observed);
        }

        report_unexpected(&manifest, opened.as_ref(), [&root, &disclosed], &mut entries, &mut findings);

        let recomputed = recompute(&manifest, &observations, &proof, &mut findings);
        finish(Some(&proof), recomputed, entries, findings)
    }

    /// Check the receipt, then try to decrypt.
    fn open_bundle(&self, manifest: &Manifest, findings: &mut Vec<Finding>) -> Option<SealedContents> {
        let bytes = self.bundle?;
        if let Some(raw) = self.receipt {
            match serde_json::from_slice::<SealReceipt>(raw) {
                Ok(receipt) => check_receipt(&receipt, bytes, manifest, findings),
                Err(e) => findings.push(Finding::new(
                    FindingKind::ReceiptCorrupt,
                    RECEIPT_FILE,
                    e.to_string(),
                )),
            }
        }

        let Some(passphrase) = self.passphrase else {
            findings.push(Finding::new(
                FindingKind::PassphraseMissing,
                BUNDLE_FILE,
                "a sealed bundle was supplied without a passphrase",
            ));
            return None;
        };
        match unseal(bytes, passphrase) {
            Ok(contents) => {
                tracing::debug!(entries = contents.len(), "sealed bundle opened");
                Some(contents)
            }
            Err(e @ ProofError::BundleCorrupt(_)) => {
                findings.push(Finding::new(FindingKind::BundleCorrupt, BUNDLE_FILE, e.to_string()));
                None
            }
            Err(e) => {
                findings.push(Finding::new(
                    FindingKind::DecryptionFailure,
                    BUNDLE_FILE,
                    e.to_string(),
                ));
                None
            }
        }
    }
}

fn parse_proof(bytes: &[u8]) -> Result<ProofRecord, ProofError> {
    let proof: ProofRecord = serde_json::from_slice(bytes)?;
    proof.validate()?;
    Ok(proof)
}

fn parse_manifest(bytes: &[u8]) -> Result<Manifest, ProofError> {
    let manifest: Manifest =
        serde_json::from_slice(bytes).map_err(|e| ProofError::ManifestCorrupt(e.to_string()))?;
    manifest.validate()?;
    Ok(manifest)
}

fn mismatch_detail(subject: &str, expected: &Digest, computed: &Digest) -> String {
    ProofError::DigestMismatch {
        subject: subject.to_string(),
        expected: expected.to_hex(),
        computed: computed.to_hex(),
    }
    .to_string()
}

/// Fields the proof repeats from the manifest header must agree.
fn check_header(manifest: &Manifest, proof: &ProofRecord, findings: &mut Vec<Finding>) {
    let header = &manifest.header;
    let mut differ = |field: &str, recorded: String, proof_value: String| {
        findings.push(Finding::new(
            FindingKind::HeaderMismatch,
            field,
            format!("manifest has {recorded}, proof has {proof_value}"),
        ));
    };

    if header.primary_algorithm != proof.algorithm {
        differ("algorithm", header.primary_algorithm.to_string(), proof.algorithm.to_string());
    }
    if header.anchor_id != proof.anchor_id {
        differ("anchor_id", header.anchor_id.clone(), proof.anchor_id.clone());
    }
    if header.patent_flag != proof.patent_flag {
        differ("patent_flag", header.patent_flag.to_string(), proof.patent_flag.to_string());
    }
    if header.timestamp != proof.timestamp {
        differ("timestamp", header.timestamp.to_rfc3339(), proof.timestamp.to_rfc3339());
    }
    if manifest.entries.len() != proof.entry_count {
        differ(
            "entry_count",
            manifest.entries.len().to_string(),
            proof.entry_count.to_string(),
        );
    }

    let recorded_results = manifest
        .results_entry()
        .and_then(|e| e.digest.get(header.primary_algorithm));
    if recorded_results != proof.results_digest.as_ref() {
        let show = |d: Option<&Digest>| d.map_or_else(|| "none".to_string(), Digest::to_hex);
        differ(
            "results_digest",
            show(recorded_results),
            show(proof.results_digest.as_ref()),
        );
    }
}

fn check_receipt(
    receipt: &SealReceipt,
    bytes: &[u8],
    manifest: &Manifest,
    findings: &mut Vec<Finding>,
) {
    if receipt.format != SEAL_RECEIPT_FORMAT {
        findings.push(Finding::new(
            FindingKind::ReceiptCorrupt,
            RECEIPT_FILE,
            format!("unsupported receipt format {:?}", receipt.format),
        ));
        return;
    }
    if receipt.ciphertext_len != bytes.len() as u64 {
        findings.push(Finding::new(
            FindingKind::CiphertextMismatch,
            BUNDLE_FILE,
            format!(
                "receipt records {} bytes, bundle has {}",
                receipt.ciphertext_len,
                bytes.len()
            ),
        ));
    }
    let differing = receipt.ciphertext_digest.mismatched(&ciphertext_digest(bytes));
    if !differing.is_empty() {
        findings.push(Finding::new(
            FindingKind::CiphertextMismatch,
            BUNDLE_FILE,
            format!("ciphertext {} differs from the receipt", join(&differing)),
        ));
    }
    let expected: Vec<&ArtifactPath> = manifest.sealed_entries().map(|e| &e.path).collect();
    let listed: Vec<&ArtifactPath> = receipt.sealed_entries.iter().collect();
    if expected != listed {
        findings.push(Finding::new(
            FindingKind::ReceiptCorrupt,
            RECEIPT_FILE,
            "sealed entry list differs from the manifest",
        ));
    }
}

fn list<'a>(
    source: &'a dyn ArtifactSource,
    origin: ContentOrigin,
    subject: &str,
    findings: &mut Vec<Finding>,
) -> Option<Listing<'a>> {
    match source.list() {
        Ok(metas) => Some(Listing {
            source,
            paths: metas.into_iter().map(|m| m.path).collect(),
            origin,
        }),
        Err(e) => {
            findings.push(Finding::new(FindingKind::RootUnavailable, subject, e.to_string()));
            None
        }
    }
}

fn check_listing(
    engine: &HashEngine,
    listing: &Listing<'_>,
    entry: &ProvenanceEntry,
) -> (EntryStatus, Observation) {
    if !listing.paths.contains(&entry.path) {
        return (EntryStatus::Missing, None);
    }
    let observed = listing
        .source
        .open(&entry.path)
        .and_then(|reader| engine.digest_reader(entry.path.as_str(), reader));
    match observed {
        Ok((set, size)) => (compare(entry, &set, size), Some((set, size))),
        Err(e) => (
            EntryStatus::Unreadable {
                reason: e.to_string(),
            },
            None,
        ),
    }
}

fn compare(entry: &ProvenanceEntry, observed: &DigestSet, size: u64) -> EntryStatus {
    let algorithms = entry.digest.mismatched(observed);
    if algorithms.is_empty() && size == entry.size {
        EntryStatus::Matched
    } else {
        EntryStatus::Mismatch { algorithms }
    }
}

fn record_status(
    entry: &ProvenanceEntry,
    origin: ContentOrigin,
    status: &EntryStatus,
    findings: &mut Vec<Finding>,
) {
    let subject = entry.path.as_str();
    let finding = match status {
        EntryStatus::Matched => {
            tracing::debug!(path = subject, "artifact matched");
            return;
        }
        EntryStatus::Unavailable => {
            tracing::debug!(path = subject, tier = %entry.tier, "no input covers artifact");
            return;
        }
        EntryStatus::Unexpected => return,
        EntryStatus::Mismatch { algorithms } if algorithms.is_empty() => {
            Finding::new(FindingKind::ArtifactMismatch, subject, "size differs")
        }
        EntryStatus::Mismatch { algorithms } => Finding::new(
            FindingKind::ArtifactMismatch,
            subject,
            format!("{} differs", join(algorithms)),
        ),
        EntryStatus::Missing => Finding::new(
            FindingKind::ArtifactMissing,
            subject,
            match origin {
                ContentOrigin::Bundle => "absent from the sealed bundle",
                ContentOrigin::Disclosed => "absent from the disclosed directory",
                ContentOrigin::Root | ContentOrigin::None => "absent from the plaintext root",
            },
        ),
        EntryStatus::Unreadable { reason } => {
            Finding::new(FindingKind::ArtifactUnreadable, subject, reason.clone())
        }
    };
    tracing::warn!(path = subject, kind = ?finding.kind, detail = %finding.detail, "artifact check failed");
    findings.push(finding);
}

/// Files in an input that the manifest does not list.
///
/// Extra plaintext files are informational. An extra bundle entry means
/// the bundle was built from a different catalog.
fn report_unexpected(
    manifest: &Manifest,
    opened: Option<&SealedContents>,
    listings: [&Option<Listing<'_>>; 2],
    entries: &mut Vec<EntryReport>,
    findings: &mut Vec<Finding>,
) {
    if let Some(contents) = opened {
        for path in contents.keys() {
            if manifest.entry(path).map_or(true, |e| !e.is_sealed()) {
                findings.push(Finding::new(
                    FindingKind::UnexpectedBundleEntry,
                    path.as_str(),
                    "sealed bundle holds an artifact the manifest does not seal",
                ));
                entries.push(EntryReport {
                    path: path.clone(),
                    tier: manifest.entry(path).map(|e| e.tier),
                    origin: ContentOrigin::Bundle,
                    status: EntryStatus::Unexpected,
                });
            }
        }
    }
    for listing in listings.into_iter().flatten() {
        for path in listing.paths.iter().filter(|p| manifest.entry(p).is_none()) {
            findings.push(Finding::new(
                FindingKind::UnexpectedArtifact,
                path.as_str(),
                "not listed in the manifest",
            ));
            entries.push(EntryReport {
                path: path.clone(),
                tier: None,
                origin: listing.origin,
                status: EntryStatus::Unexpected,
            });
        }
    }
}

/// Rebuild the manifest from what was observed and re-derive the combined
/// digest. Entries that could not be observed keep their recorded digests.
fn recompute(
    manifest: &Manifest,
    observations: &[Observation],
    proof: &ProofRecord,
    findings: &mut Vec<Finding>,
) -> Option<Digest> {
    let primary = manifest.header.primary_algorithm;
    let mut observed = manifest.clone();
    for (entry, seen) in observed.entries.iter_mut().zip(observations) {
        if let Some((set, size)) = seen {
            entry.digest = entry
                .digest
                .algorithms()
                .filter_map(|alg| set.get(alg).map(|d| (alg, d.clone())))
                .collect();
            entry.size = *size;
        }
    }

    let manifest_digest = match manifest_digest(&observed) {
        Ok(d) => d,
        Err(e) => {
            findings.push(Finding::new(FindingKind::ManifestCorrupt, MANIFEST_FILE, e.to_string()));
            return None;
        }
    };
    let results = observed
        .results_entry()
        .and_then(|e| e.digest.get(primary))
        .cloned();

    let combined = combined_digest(primary, &manifest_digest, results.as_ref());
    if combined != proof.combined_digest {
        findings.push(Finding::new(
            FindingKind::CombinedDigestMismatch,
            PROOF_FILE,
            mismatch_detail("combined digest", &proof.combined_digest, &combined),
        ));
    }
    let auxiliary = combined_digest(DigestAlgorithm::Crc32, &manifest_digest, results.as_ref());
    if auxiliary != proof.auxiliary_checksum {
        findings.push(Finding::new(
            FindingKind::AuxiliaryChecksumMismatch,
            PROOF_FILE,
            mismatch_detail("auxiliary checksum", &proof.auxiliary_checksum, &auxiliary),
        ));
    }
    Some(combined)
}

fn join(algorithms: &[DigestAlgorithm]) -> String {
    algorithms
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn finish(
    proof: Option<&ProofRecord>,
    recomputed: Option<Digest>,
    entries: Vec<EntryReport>,
    findings: Vec<Finding>,
) -> VerificationReport {
    let verdict = Verdict::from_findings(&findings);
    tracing::info!(
        %verdict,
        findings = findings.len(),
        entries = entries.len(),
        "verification finished"
    );
    VerificationReport {
        verdict,
        anchor_id: proof.map(|p| p.anchor_id.clone()),
        recorded_combined: proof.map(|p| p.combined_digest.clone()),
        recomputed_combined: recomputed,
        entries,
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proofpack_catalog::MemorySource;
    use proofpack_manifest::{ProofPackage, ProofPipeline};
    use proofpack_types::{KdfParams, ProofConfig, RunMetadata};

    fn package(source: &MemorySource) -> ProofPackage {
        let mut config = ProofConfig::default();
        config.seal.kdf = KdfParams {
            memory_kib: 64,
            iterations: 1,
            lanes: 1,
        };
        let metadata =
            RunMetadata::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(), "TRGB-2025");
        ProofPipeline::new(config)
            .unwrap()
            .assemble(source, &metadata, Some(&Passphrase::new("correct")))
            .unwrap()
    }

    fn source() -> MemorySource {
        MemorySource::from_files([("a.txt", b"x".to_vec()), ("b.key", b"secret".to_vec())])
            .unwrap()
    }

    fn bytes(package: &ProofPackage) -> (Vec<u8>, Vec<u8>) {
        (
            serde_json::to_vec(&package.manifest).unwrap(),
            serde_json::to_vec(&package.proof).unwrap(),
        )
    }

    #[test]
    fn garbage_proof_is_reported_not_thrown() {
        let source = source();
        let (manifest, _) = bytes(&package(&source));
        let report = Verifier::new().with_root(&source).verify(&manifest, b"{not json");
        assert_eq!(report.verdict, Verdict::MismatchFound);
        assert!(report.has_finding(FindingKind::ProofCorrupt));
        assert!(report.entries.is_empty());
    }

    #[test]
    fn edited_header_field_is_caught() {
        let source = source();
        let package = package(&source);
        let mut manifest = package.manifest.clone();
        manifest.header.anchor_id = "OTHER".into();
        let (_, proof) = bytes(&package);

        let report = Verifier::new()
            .with_root(&source)
            .verify(&serde_json::to_vec(&manifest).unwrap(), &proof);
        assert!(report.has_finding(FindingKind::ManifestDigestMismatch));
        assert!(report.findings.iter().any(|f| f.kind == FindingKind::HeaderMismatch
            && f.subject == "anchor_id"));
        assert_eq!(report.verdict, Verdict::MismatchFound);
    }

    #[test]
    fn forged_combined_digest_is_caught() {
        let source = source();
        let package = package(&source);
        let (manifest, _) = bytes(&package);
        let forged = Digest::from_bytes(vec![0; package.proof.combined_digest.as_bytes().len()]);

        let mut stale = package.proof.clone();
        stale.combined_digest = forged.clone();
        let report = Verifier::new()
            .with_root(&source)
            .verify(&manifest, &serde_json::to_vec(&stale).unwrap());
        assert!(report.has_finding(FindingKind::ProofCorrupt));

        let mut consistent = stale;
        consistent.verification.expected_digest = forged;
        let report = Verifier::new()
            .with_root(&source)
            .verify(&manifest, &serde_json::to_vec(&consistent).unwrap());
        assert!(report.has_finding(FindingKind::CombinedDigestMismatch));
        assert_eq!(report.verdict, Verdict::MismatchFound);
    }

    #[test]
    fn no_inputs_is_unavailable() {
        let (manifest, proof) = bytes(&package(&source()));
        let report = Verifier::new().verify(&manifest, &proof);
        assert_eq!(report.verdict, Verdict::InputsUnavailable);
        assert!(report.has_finding(FindingKind::NoContentSource));
        // Nothing observed, so the recorded digests reproduce the proof.
        assert_eq!(report.recomputed_combined, report.recorded_combined);
    }

    #[test]
    fn bundle_without_passphrase_is_unavailable() {
        let source = source();
        let package = package(&source);
        let (manifest, proof) = bytes(&package);
        let bundle = package.bundle.as_ref().unwrap();
        let report = Verifier::new()
            .with_bundle(&bundle.bytes, None)
            .verify(&manifest, &proof);
        assert_eq!(report.verdict, Verdict::InputsUnavailable);
        assert!(report.has_finding(FindingKind::PassphraseMissing));
    }

    #[test]
    fn extra_root_file_is_informational() {
        let mut source = source();
        let (manifest, proof) = bytes(&package(&source));
        source.insert(ArtifactPath::new("notes/new.md").unwrap(), b"later".to_vec());

        let report = Verifier::new().with_root(&source).verify(&manifest, &proof);
        assert_eq!(report.verdict, Verdict::Verified);
        assert_eq!(
            report.entry("notes/new.md").map(|e| &e.status),
            Some(&EntryStatus::Unexpected)
        );
    }
}
