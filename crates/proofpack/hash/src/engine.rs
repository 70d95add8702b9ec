use proofpack_types::{Digest, DigestAlgorithm, DigestSet, ProofError, Result};
use sha2::Digest as _;
use std::io::{ErrorKind, Read};

const CHUNK_SIZE: usize = 64 * 1024;

/// Streaming state for one algorithm.
pub(crate) enum Hasher {
    Sha3_512(sha3::Sha3_512),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
    Crc32(crc32fast::Hasher),
}

impl Hasher {
    pub(crate) fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha3_512 => Hasher::Sha3_512(sha3::Sha3_512::new()),
            DigestAlgorithm::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
            DigestAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
            DigestAlgorithm::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha3_512(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Blake3(h) => {
                h.update(data);
            }
            Hasher::Crc32(h) => h.update(data),
        }
    }

    pub(crate) fn finalize(self) -> Digest {
        match self {
            Hasher::Sha3_512(h) => Digest::from_bytes(h.finalize().to_vec()),
            Hasher::Sha256(h) => Digest::from_bytes(h.finalize().to_vec()),
            Hasher::Blake3(h) => Digest::from_bytes(h.finalize().as_bytes().to_vec()),
            Hasher::Crc32(h) => Digest::from_bytes(h.finalize().to_be_bytes().to_vec()),
        }
    }
}

/// Single-shot digest of an in-memory buffer.
pub fn digest(algorithm: DigestAlgorithm, bytes: &[u8]) -> Digest {
    let mut h = Hasher::new(algorithm);
    h.update(bytes);
    h.finalize()
}

/// Computes a fixed set of named digests over byte streams.
///
/// Pure: the output depends only on the input bytes and the configured
/// algorithm list.
#[derive(Clone, Debug)]
pub struct HashEngine {
    algorithms: Vec<DigestAlgorithm>,
}

impl HashEngine {
    pub fn new(algorithms: impl IntoIterator<Item = DigestAlgorithm>) -> Result<Self> {
        let mut list: Vec<DigestAlgorithm> = Vec::new();
        for alg in algorithms {
            if !list.contains(&alg) {
                list.push(alg);
            }
        }
        if list.is_empty() {
            return Err(ProofError::InvalidConfig(
                "hash engine needs at least one algorithm".into(),
            ));
        }
        if !list.iter().any(|a| a.is_cryptographic()) {
            return Err(ProofError::InvalidConfig(
                "hash engine needs at least one cryptographic algorithm".into(),
            ));
        }
        Ok(Self { algorithms: list })
    }

    pub fn algorithms(&self) -> &[DigestAlgorithm] {
        &self.algorithms
    }

    /// Stream `reader` to exhaustion, returning the digest set and the
    /// number of bytes consumed.
    ///
    /// Any read failure is reported as `ArtifactUnreadable` for `path`.
    pub fn digest_reader<R: Read>(&self, path: &str, mut reader: R) -> Result<(DigestSet, u64)> {
        let mut hashers: Vec<(DigestAlgorithm, Hasher)> = self
            .algorithms
            .iter()
            .map(|a| (*a, Hasher::new(*a)))
            .collect();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total: u64 = 0;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProofError::unreadable(path, e)),
            };
            for (_, h) in hashers.iter_mut() {
                h.update(&buf[..n]);
            }
            total += n as u64;
        }

        tracing::trace!(path, bytes = total, "digested artifact");
        let set = hashers
            .into_iter()
            .map(|(alg, h)| (alg, h.finalize()))
            .collect();
        Ok((set, total))
    }

    pub fn digest_bytes(&self, bytes: &[u8]) -> DigestSet {
        self.algorithms
            .iter()
            .map(|alg| (*alg, digest(*alg, bytes)))
            .collect()
    }
}
