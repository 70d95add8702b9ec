use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Digest algorithms the hash engine can compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "sha3-512")]
    Sha3_512,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "blake3")]
    Blake3,
    /// Fast corruption checksum; carries no collision resistance.
    #[serde(rename = "crc32")]
    Crc32,
}

impl DigestAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha3_512 => "sha3-512",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Blake3 => "blake3",
            DigestAlgorithm::Crc32 => "crc32",
        }
    }

    /// Output length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha3_512 => 64,
            DigestAlgorithm::Sha256 | DigestAlgorithm::Blake3 => 32,
            DigestAlgorithm::Crc32 => 4,
        }
    }

    /// Whether the digest may back a collision-resistance claim.
    pub fn is_cryptographic(self) -> bool {
        !matches!(self, DigestAlgorithm::Crc32)
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha3-512" | "sha3_512" => Ok(DigestAlgorithm::Sha3_512),
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            "crc32" => Ok(DigestAlgorithm::Crc32),
            other => Err(format!("unknown digest algorithm: {other}")),
        }
    }
}

/// Raw digest bytes, serialized as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s).map(Self)
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        hex[..hex.len().min(16)].to_string()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(serde::de::Error::custom("empty digest"));
        }
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Named digests over one byte stream, ordered by algorithm.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestSet(BTreeMap<DigestAlgorithm, Digest>);

impl DigestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, algorithm: DigestAlgorithm, digest: Digest) {
        self.0.insert(algorithm, digest);
    }

    pub fn get(&self, algorithm: DigestAlgorithm) -> Option<&Digest> {
        self.0.get(&algorithm)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = DigestAlgorithm> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DigestAlgorithm, &Digest)> {
        self.0.iter().map(|(a, d)| (*a, d))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Algorithms present in `self` whose digest differs from (or is
    /// absent in) `observed`.
    pub fn mismatched(&self, observed: &DigestSet) -> Vec<DigestAlgorithm> {
        self.0
            .iter()
            .filter(|(alg, digest)| observed.get(**alg) != Some(*digest))
            .map(|(alg, _)| *alg)
            .collect()
    }
}

impl FromIterator<(DigestAlgorithm, Digest)> for DigestSet {
    fn from_iter<I: IntoIterator<Item = (DigestAlgorithm, Digest)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
