use crate::archive::{read_archive, write_archive, SealedContents};
use crate::envelope::{open_bytes, seal_bytes};
use crate::passphrase::Passphrase;
use proofpack_catalog::{read_verified, ArtifactSource, Catalog};
use proofpack_hash::digest;
use proofpack_types::{
    DigestAlgorithm, DigestSet, KdfParams, ProofConfig, ProofError,
    ProvenanceEntry, Result, SealAlgorithm, SealReceipt, SEAL_RECEIPT_FORMAT,
};
use zeroize::Zeroizing;

/// Algorithms recorded over the ciphertext in a [`SealReceipt`].
pub const RECEIPT_ALGORITHMS: [DigestAlgorithm; 2] =
    [DigestAlgorithm::Sha3_512, DigestAlgorithm::Sha256];

/// Envelope bytes plus their public receipt.
#[derive(Clone, Debug)]
pub struct SealedBundle {
    pub bytes: Vec<u8>,
    pub receipt: SealReceipt,
}

/// Packs the sealed tiers of a catalog into one encrypted bundle.
#[derive(Clone, Debug)]
pub struct Sealer {
    kdf: KdfParams,
}

impl Sealer {
    pub fn new(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    pub fn from_config(config: &ProofConfig) -> Self {
        Self::new(config.seal.kdf)
    }

    /// Seal every restricted and private entry of `catalog`.
    ///
    /// Returns `Ok(None)` when nothing needs sealing. Each entry is read
    /// again and must still match its cataloged digests, otherwise the
    /// run fails with `ArtifactChanged`.
    pub fn seal<S: ArtifactSource + ?Sized>(
        &self,
        catalog: &Catalog,
        source: &S,
        passphrase: Option<&Passphrase>,
    ) -> Result<Option<SealedBundle>> {
        let sealed: Vec<&ProvenanceEntry> = catalog.sealed().collect();
        if sealed.is_empty() {
            tracing::info!("no restricted or private artifacts; skipping seal");
            return Ok(None);
        }
        let passphrase = passphrase.ok_or_else(|| {
            ProofError::EncryptionFailure(format!(
                "{} artifacts need sealing but no passphrase was supplied",
                sealed.len()
            ))
        })?;

        let mut contents = SealedContents::new();
        for entry in &sealed {
            let content = reread(source, entry)?;
            contents.insert(entry.path.clone(), content);
        }

        let archive = write_archive(&contents)?;
        let bytes = seal_bytes(&archive, passphrase, self.kdf)?;
        let receipt = SealReceipt {
            format: SEAL_RECEIPT_FORMAT.to_string(),
            algorithm: SealAlgorithm::Argon2idChaCha20Poly1305,
            kdf: self.kdf,
            ciphertext_digest: ciphertext_digest(&bytes),
            ciphertext_len: bytes.len() as u64,
            sealed_entries: contents.keys().cloned().collect(),
        };

        tracing::info!(
            entries = receipt.sealed_entries.len(),
            bytes = receipt.ciphertext_len,
            "sealed bundle built"
        );
        Ok(Some(SealedBundle { bytes, receipt }))
    }
}

fn reread<S: ArtifactSource + ?Sized>(
    source: &S,
    entry: &ProvenanceEntry,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut content = Zeroizing::new(Vec::new());
    read_verified(source, entry, &mut content)?;
    tracing::debug!(path = %entry.path, "sealing artifact");
    Ok(content)
}

/// Receipt digests over raw envelope bytes.
pub fn ciphertext_digest(bytes: &[u8]) -> DigestSet {
    RECEIPT_ALGORITHMS
        .iter()
        .map(|alg| (*alg, digest(*alg, bytes)))
        .collect()
}

/// Decrypt a bundle into its path → content map.
pub fn unseal(bytes: &[u8], passphrase: &Passphrase) -> Result<SealedContents> {
    let archive = open_bytes(bytes, passphrase)?;
    read_archive(&archive)
}
