use crate::catalog::Catalog;
use crate::source::{ArtifactMeta, ArtifactSource};
use proofpack_classify::DisclosureClassifier;
use proofpack_hash::{digest, HashEngine};
use proofpack_types::{ProofConfig, ProofError, ProvenanceEntry, Result};
use rayon::prelude::*;
use std::io::Read;

/// Hashes and classifies every artifact of a source into a [`Catalog`].
///
/// Hashing runs on a dedicated, bounded rayon pool. Each worker owns its
/// artifact and returns its own entry; ordering happens after collection.
#[derive(Clone, Debug)]
pub struct CatalogScanner {
    engine: HashEngine,
    classifier: DisclosureClassifier,
    workers: usize,
}

impl CatalogScanner {
    pub fn new(engine: HashEngine, classifier: DisclosureClassifier) -> Self {
        Self {
            engine,
            classifier,
            workers: default_workers(),
        }
    }

    pub fn from_config(config: &ProofConfig) -> Result<Self> {
        let engine = HashEngine::new(config.algorithms())?;
        let classifier = DisclosureClassifier::from_config(config)?;
        let mut scanner = Self::new(engine, classifier);
        if let Some(workers) = config.hashing.workers {
            scanner = scanner.with_workers(workers);
        }
        Ok(scanner)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn engine(&self) -> &HashEngine {
        &self.engine
    }

    pub fn classifier(&self) -> &DisclosureClassifier {
        &self.classifier
    }

    /// Catalog every artifact in `source`.
    ///
    /// Any artifact that cannot be read completely fails the whole scan
    /// with `PartialCatalog`.
    pub fn scan<S: ArtifactSource + ?Sized>(&self, source: &S) -> Result<Catalog> {
        let listed = source.list()?;
        tracing::info!(artifacts = listed.len(), workers = self.workers, "cataloging");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("proofpack-hash-{i}"))
            .build()
            .map_err(|e| ProofError::InvalidConfig(format!("hash worker pool: {e}")))?;

        let results: Vec<Result<ProvenanceEntry>> = pool.install(|| {
            listed
                .par_iter()
                .map(|meta| self.catalog_one(source, meta))
                .collect()
        });

        let entries = results.into_iter().collect::<Result<Vec<_>>>()?;
        let catalog = Catalog::from_entries(entries)?;
        tracing::info!(entries = catalog.len(), "catalog complete");
        Ok(catalog)
    }

    fn catalog_one<S: ArtifactSource + ?Sized>(
        &self,
        source: &S,
        meta: &ArtifactMeta,
    ) -> Result<ProvenanceEntry> {
        let path = meta.path.as_str();
        let reader = source.open(&meta.path).map_err(|e| as_partial(path, e))?;
        let (digest, size) = self
            .engine
            .digest_reader(path, reader)
            .map_err(|e| as_partial(path, e))?;
        if size != meta.size {
            return Err(ProofError::partial(
                path,
                format!("changed during scan: listed {} bytes, read {}", meta.size, size),
            ));
        }

        let tier = self.classifier.classify(&meta.path);
        tracing::debug!(path, %tier, size, "cataloged artifact");
        Ok(ProvenanceEntry::new(
            meta.path.clone(),
            size,
            tier,
            digest,
            meta.modified,
        ))
    }
}

/// Read an already-cataloged artifact into `buf` and confirm it still
/// matches its entry. Any difference is `ArtifactChanged`.
pub fn read_verified<S: ArtifactSource + ?Sized>(
    source: &S,
    entry: &ProvenanceEntry,
    buf: &mut Vec<u8>,
) -> Result<()> {
    buf.clear();
    buf.reserve(entry.size as usize);
    source
        .open(&entry.path)?
        .read_to_end(buf)
        .map_err(|e| ProofError::unreadable(entry.path.as_str(), e))?;

    let unchanged = buf.len() as u64 == entry.size
        && entry
            .digest
            .iter()
            .all(|(alg, recorded)| digest(alg, buf) == *recorded);
    if !unchanged {
        return Err(ProofError::ArtifactChanged {
            path: entry.path.to_string(),
        });
    }
    Ok(())
}

fn as_partial(path: &str, err: ProofError) -> ProofError {
    match err {
        e @ ProofError::PartialCatalog { .. } => e,
        other => ProofError::partial(path, other),
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
