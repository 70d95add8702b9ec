//! Pipeline configuration model.
//!
//! The pipeline receives a [`ProofConfig`] value at construction and never
//! consults process-wide state. Loading from files and the environment is
//! the binary's job.

use crate::digest::DigestAlgorithm;
use crate::error::{ProofError, Result};
use crate::path::ArtifactPath;
use crate::seal::KdfParams;
use crate::tier::DisclosureTier;
use serde::{Deserialize, Serialize};

/// One classification rule. Rules are evaluated in order; first match wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    pub pattern: String,
    pub tier: DisclosureTier,
}

impl TierRule {
    pub fn new(pattern: impl Into<String>, tier: DisclosureTier) -> Self {
        Self {
            pattern: pattern.into(),
            tier,
        }
    }
}

/// Top-level configuration.
///
/// Unknown keys are rejected so that secrets such as a passphrase can
/// never ride along in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProofConfig {
    /// Project-specific rules, evaluated before the built-in table.
    #[serde(default)]
    pub rules: Vec<TierRule>,

    /// Append the built-in rule table after `rules`.
    #[serde(default = "default_true")]
    pub use_default_rules: bool,

    /// Glob patterns never cataloged (e.g. VCS metadata).
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub hashing: HashingConfig,

    #[serde(default)]
    pub seal: SealConfig,

    #[serde(default)]
    pub run: RunConfig,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            use_default_rules: true,
            exclude: default_exclude(),
            hashing: HashingConfig::default(),
            seal: SealConfig::default(),
            run: RunConfig::default(),
        }
    }
}

/// Hash engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<DigestAlgorithm>,

    /// Algorithm for the manifest digest and all aggregates.
    #[serde(default = "default_primary")]
    pub primary: DigestAlgorithm,

    /// Hashing worker pool size; `None` uses available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithms: default_algorithms(),
            primary: default_primary(),
            workers: None,
        }
    }
}

/// Sealer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SealConfig {
    #[serde(default)]
    pub kdf: KdfParams,
}

/// Per-run defaults; command-line flags override these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub anchor_id: Option<String>,

    #[serde(default)]
    pub patent_flag: bool,

    /// Primary results file, relative to the scan root.
    #[serde(default)]
    pub results_path: Option<String>,

    #[serde(default)]
    pub revision_id: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_exclude() -> Vec<String> {
    vec![".git/**".to_string(), "**/.DS_Store".to_string()]
}

fn default_algorithms() -> Vec<DigestAlgorithm> {
    vec![
        DigestAlgorithm::Sha3_512,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Crc32,
    ]
}

fn default_primary() -> DigestAlgorithm {
    DigestAlgorithm::Sha3_512
}

impl ProofConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ProofError::InvalidConfig(msg));

        let hashing = &self.hashing;
        if hashing.algorithms.is_empty() {
            return invalid("hashing.algorithms is empty".into());
        }
        if !hashing.primary.is_cryptographic() {
            return invalid(format!(
                "hashing.primary must be cryptographic, got {}",
                hashing.primary
            ));
        }
        if !hashing.algorithms.contains(&hashing.primary) {
            return invalid(format!(
                "hashing.algorithms must include the primary algorithm {}",
                hashing.primary
            ));
        }
        if hashing.workers == Some(0) {
            return invalid("hashing.workers must be at least 1".into());
        }

        let kdf = &self.seal.kdf;
        if kdf.iterations == 0 {
            return invalid("seal.kdf.iterations must be at least 1".into());
        }
        if kdf.lanes == 0 {
            return invalid("seal.kdf.lanes must be at least 1".into());
        }
        if kdf.memory_kib < 8 * u32::from(kdf.lanes) {
            return invalid(format!(
                "seal.kdf.memory_kib must be at least {} for {} lanes",
                8 * u32::from(kdf.lanes),
                kdf.lanes
            ));
        }

        if let Some(results) = &self.run.results_path {
            ArtifactPath::new(results.clone())
                .map_err(|e| ProofError::InvalidConfig(format!("run.results_path: {e}")))?;
        }
        if let Some(anchor) = &self.run.anchor_id {
            if anchor.trim().is_empty() {
                return invalid("run.anchor_id is empty".into());
            }
        }
        Ok(())
    }

    /// Hash engine algorithm list with duplicates removed, order kept.
    pub fn algorithms(&self) -> Vec<DigestAlgorithm> {
        let mut out = Vec::with_capacity(self.hashing.algorithms.len());
        for alg in &self.hashing.algorithms {
            if !out.contains(alg) {
                out.push(*alg);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ProofConfig::default();
        config.validate().unwrap();
        assert!(config.use_default_rules);
        assert_eq!(config.hashing.primary, DigestAlgorithm::Sha3_512);
        assert!(config.exclude.iter().any(|e| e == ".git/**"));
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: ProofConfig = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();
        assert_eq!(config.hashing.algorithms.len(), 3);
    }

    #[test]
    fn passphrase_key_is_rejected() {
        let err = serde_json::from_str::<ProofConfig>(r#"{"passphrase": "correct"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn primary_must_be_listed_and_cryptographic() {
        let mut config = ProofConfig::default();
        config.hashing.primary = DigestAlgorithm::Blake3;
        assert!(config.validate().is_err());

        config.hashing.algorithms.push(DigestAlgorithm::Blake3);
        config.validate().unwrap();

        config.hashing.primary = DigestAlgorithm::Crc32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let mut config = ProofConfig::default();
        config.hashing.workers = Some(0);
        assert!(matches!(config.validate(), Err(ProofError::InvalidConfig(_))));
    }

    #[test]
    fn kdf_floor_enforced() {
        let mut config = ProofConfig::default();
        config.seal.kdf = KdfParams {
            memory_kib: 16,
            iterations: 1,
            lanes: 4,
        };
        assert!(config.validate().is_err());
        config.seal.kdf.memory_kib = 32;
        config.validate().unwrap();
    }

    #[test]
    fn results_path_must_be_relative() {
        let mut config = ProofConfig::default();
        config.run.results_path = Some("/abs/results.json".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn algorithms_dedup_keeps_order() {
        let mut config = ProofConfig::default();
        config.hashing.algorithms = vec![
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha3_512,
            DigestAlgorithm::Sha256,
        ];
        assert_eq!(
            config.algorithms(),
            vec![DigestAlgorithm::Sha256, DigestAlgorithm::Sha3_512]
        );
    }

    #[test]
    fn rules_parse_in_order() {
        let config: ProofConfig = serde_json::from_str(
            r#"{"rules": [
                {"pattern": "src/**", "tier": "restricted"},
                {"pattern": "**/*.pyi", "tier": "public-signature"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(config.rules[0].tier, DisclosureTier::Restricted);
        assert_eq!(config.rules[1].pattern, "**/*.pyi");
    }
}
