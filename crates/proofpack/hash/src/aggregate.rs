use crate::engine::Hasher;
use proofpack_types::{Digest, DigestAlgorithm};

/// Hash-of-hashes over labelled digests.
///
/// Items are sorted by key (ties broken on digest bytes) before their raw
/// digest bytes are concatenated and hashed, so the caller's iteration
/// order never leaks into the result.
pub fn aggregate<'a, K, I>(algorithm: DigestAlgorithm, items: I) -> Digest
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, &'a Digest)>,
{
    let mut items: Vec<(K, &Digest)> = items.into_iter().collect();
    items.sort_by(|a, b| {
        a.0.as_ref()
            .cmp(b.0.as_ref())
            .then_with(|| a.1.as_bytes().cmp(b.1.as_bytes()))
    });

    let mut hasher = Hasher::new(algorithm);
    for (_, digest) in &items {
        hasher.update(digest.as_bytes());
    }
    hasher.finalize()
}
