use proofpack_types::{ArtifactPath, DisclosureTier, ProofError, ProvenanceEntry, Result};
use std::collections::BTreeMap;

/// Immutable, path-sorted set of cataloged artifacts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<ProvenanceEntry>,
}

impl Catalog {
    /// Sort by path and reject duplicates.
    pub fn from_entries(mut entries: Vec<ProvenanceEntry>) -> Result<Self> {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        if let Some(pair) = entries.windows(2).find(|w| w[0].path == w[1].path) {
            return Err(ProofError::DuplicatePath(pair[0].path.to_string()));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ProvenanceEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ProvenanceEntry> {
        self.entries
    }

    pub fn get(&self, path: &ArtifactPath) -> Option<&ProvenanceEntry> {
        self.entries
            .binary_search_by(|e| e.path.cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose content goes into the sealed bundle.
    pub fn sealed(&self) -> impl Iterator<Item = &ProvenanceEntry> {
        self.entries.iter().filter(|e| e.tier.is_sealed())
    }

    /// Entries whose content is published in the clear.
    pub fn disclosed(&self) -> impl Iterator<Item = &ProvenanceEntry> {
        self.entries.iter().filter(|e| e.tier.discloses_content())
    }

    pub fn tier_counts(&self) -> BTreeMap<DisclosureTier, usize> {
        let mut counts: BTreeMap<DisclosureTier, usize> =
            DisclosureTier::ALL.into_iter().map(|t| (t, 0)).collect();
        for entry in &self.entries {
            *counts.entry(entry.tier).or_default() += 1;
        }
        counts
    }
}
