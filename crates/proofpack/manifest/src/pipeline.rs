//! Two-phase proof construction.
//!
//! [`ProofPipeline::assemble`] reads the source once into an immutable
//! [`ProofPackage`]; [`crate::emit::PackageWriter`] then writes it out. The
//! pipeline sees only its [`ProofConfig`] and the caller's arguments.

use crate::audit::{AuditStage, AuditTrail};
use crate::builder::{build_proof, manifest_from_catalog};
use proofpack_catalog::{read_verified, ArtifactSource, Catalog, CatalogScanner};
use proofpack_seal::{Passphrase, SealedBundle, Sealer};
use proofpack_types::{
    ArtifactPath, DigestAlgorithm, Manifest, ProofConfig, ProofError, ProofRecord, Result,
    RunMetadata,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Everything one run publishes, held in memory until emission.
#[derive(Clone, Debug)]
pub struct ProofPackage {
    pub manifest: Manifest,
    pub proof: ProofRecord,
    pub bundle: Option<SealedBundle>,
    /// Content of `PublicSignature` artifacts, published verbatim.
    pub disclosed: BTreeMap<ArtifactPath, Vec<u8>>,
    pub audit: AuditTrail,
}

/// Catalog, seal, and summarize an artifact source.
#[derive(Clone, Debug)]
pub struct ProofPipeline {
    config: ProofConfig,
    scanner: CatalogScanner,
    sealer: Sealer,
    results_path: Option<ArtifactPath>,
}

impl ProofPipeline {
    pub fn new(config: ProofConfig) -> Result<Self> {
        config.validate()?;
        let scanner = CatalogScanner::from_config(&config)?;
        let sealer = Sealer::from_config(&config);
        let results_path = config
            .run
            .results_path
            .as_deref()
            .map(ArtifactPath::new)
            .transpose()
            .map_err(|e| ProofError::InvalidConfig(format!("run.results_path: {e}")))?;
        Ok(Self {
            config,
            scanner,
            sealer,
            results_path,
        })
    }

    pub fn config(&self) -> &ProofConfig {
        &self.config
    }

    pub fn scanner(&self) -> &CatalogScanner {
        &self.scanner
    }

    /// Build the full package for `source`.
    ///
    /// A passphrase is required only when the catalog holds restricted or
    /// private artifacts.
    pub fn assemble<S: ArtifactSource + ?Sized>(
        &self,
        source: &S,
        metadata: &RunMetadata,
        passphrase: Option<&Passphrase>,
    ) -> Result<ProofPackage> {
        let mut audit = AuditTrail::new();
        audit.record(
            AuditStage::Started,
            "proof run started",
            [
                ("anchor_id", Value::from(metadata.anchor_id.as_str())),
                ("revision_id", Value::from(metadata.revision_id.as_deref())),
                ("patent_flag", Value::from(metadata.patent_flag)),
                ("run_timestamp", Value::from(metadata.timestamp.to_rfc3339())),
            ],
        )?;

        let catalog = self.scanner.scan(source)?;
        audit.record(
            AuditStage::Scanned,
            "catalog scanned",
            [
                ("entries", Value::from(catalog.len())),
                ("bytes", Value::from(catalog.entries().iter().map(|e| e.size).sum::<u64>())),
                ("tiers", serde_json::to_value(catalog.tier_counts())?),
            ],
        )?;

        let manifest = manifest_from_catalog(
            &catalog,
            metadata,
            self.config.hashing.primary,
            self.results_path.as_ref(),
        )?;

        let bundle = self.sealer.seal(&catalog, source, passphrase)?;
        match &bundle {
            Some(bundle) => audit.record(
                AuditStage::Sealed,
                "restricted and private tiers sealed",
                [
                    ("sealed_entries", Value::from(bundle.receipt.sealed_entries.len())),
                    ("ciphertext_len", Value::from(bundle.receipt.ciphertext_len)),
                    (
                        "ciphertext_sha256",
                        Value::from(
                            bundle
                                .receipt
                                .ciphertext_digest
                                .get(DigestAlgorithm::Sha256)
                                .map(|d| d.to_hex()),
                        ),
                    ),
                ],
            )?,
            None => audit.record(
                AuditStage::Sealed,
                "nothing to seal",
                Vec::<(&str, Value)>::new(),
            )?,
        }

        let disclosed = collect_disclosed(&catalog, source)?;
        audit.record(
            AuditStage::Disclosed,
            "public-signature artifacts collected",
            [("disclosed_entries", Value::from(disclosed.len()))],
        )?;

        let proof = build_proof(&manifest)?;
        audit.record(
            AuditStage::ProofBuilt,
            "proof record derived",
            [
                ("algorithm", Value::from(proof.algorithm.to_string())),
                ("manifest_digest", Value::from(proof.manifest_digest.to_hex())),
                ("combined_digest", Value::from(proof.combined_digest.to_hex())),
                ("auxiliary_checksum", Value::from(proof.auxiliary_checksum.to_hex())),
            ],
        )?;

        tracing::info!(
            entries = proof.entry_count,
            sealed = bundle.as_ref().map_or(0, |b| b.receipt.sealed_entries.len()),
            disclosed = disclosed.len(),
            combined = %proof.combined_digest.short(),
            "proof package assembled"
        );

        Ok(ProofPackage {
            manifest,
            proof,
            bundle,
            disclosed,
            audit,
        })
    }
}

fn collect_disclosed<S: ArtifactSource + ?Sized>(
    catalog: &Catalog,
    source: &S,
) -> Result<BTreeMap<ArtifactPath, Vec<u8>>> {
    let mut out = BTreeMap::new();
    for entry in catalog.disclosed() {
        let mut content = Vec::new();
        read_verified(source, entry, &mut content)?;
        out.insert(entry.path.clone(), content);
    }
    Ok(out)
}
