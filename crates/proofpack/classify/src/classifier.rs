//! Disclosure tier classification.
//!
//! Rules are evaluated in declaration order and the first match wins. An
//! artifact no rule matches is `Private`: unknown files are sealed, never
//! published.

use crate::pattern::PathPattern;
use proofpack_types::{ArtifactPath, DisclosureTier, ProofConfig, Result, TierRule};

/// Assigns each artifact path exactly one [`DisclosureTier`].
#[derive(Clone, Debug)]
pub struct DisclosureClassifier {
    rules: Vec<(PathPattern, DisclosureTier)>,
}

impl DisclosureClassifier {
    /// Compile `rules` in order. Any pattern that fails to compile rejects
    /// the whole table.
    pub fn new(rules: &[TierRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| Ok((PathPattern::new(&rule.pattern)?, rule.tier)))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(rules = rules.len(), "disclosure classifier compiled");
        Ok(Self { rules })
    }

    /// Custom rules first, then the built-in table when enabled.
    pub fn from_config(config: &ProofConfig) -> Result<Self> {
        let mut rules = config.rules.clone();
        if config.use_default_rules {
            rules.extend(default_rules());
        }
        Self::new(&rules)
    }

    pub fn classify(&self, path: &ArtifactPath) -> DisclosureTier {
        self.matching_rule(path)
            .map(|(_, tier)| tier)
            .unwrap_or(DisclosureTier::Private)
    }

    /// The pattern and tier of the first rule matching `path`, if any.
    pub fn matching_rule(&self, path: &ArtifactPath) -> Option<(&str, DisclosureTier)> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path.as_str()))
            .map(|(pattern, tier)| (pattern.as_str(), *tier))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Built-in rule table for research artifact trees.
///
/// Interface and schema files publish their content, documentation and
/// result files publish a hash, source code is restricted, and data or
/// key material is private.
pub fn default_rules() -> Vec<TierRule> {
    use DisclosureTier::*;

    let table: &[(&str, DisclosureTier)] = &[
        ("**/*.schema.json", PublicSignature),
        ("**/*.pyi", PublicSignature),
        ("**/*.proto", PublicSignature),
        ("**/*.h", PublicSignature),
        ("**/*.d.ts", PublicSignature),
        ("**/*.openapi.yaml", PublicSignature),
        ("**/*.md", Public),
        ("**/*.rst", Public),
        ("**/*.txt", Public),
        ("**/*.pdf", Public),
        ("**/*.json", Public),
        ("**/*.py", Restricted),
        ("**/*.rs", Restricted),
        ("**/*.ipynb", Restricted),
        ("**/*.jl", Restricted),
        ("**/*.c", Restricted),
        ("**/*.cpp", Restricted),
        ("**/*.sh", Restricted),
        ("**/*.fits", Private),
        ("**/*.csv", Private),
        ("**/*.npy", Private),
        ("**/*.npz", Private),
        ("**/*.h5", Private),
        ("**/*.hdf5", Private),
        ("**/*.parquet", Private),
        ("**/*.dat", Private),
        ("**/*.key", Private),
        ("**/*.pem", Private),
    ];

    table
        .iter()
        .map(|(pattern, tier)| TierRule::new(*pattern, *tier))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn path(s: &str) -> ArtifactPath {
        ArtifactPath::new(s).unwrap()
    }

    fn defaults() -> DisclosureClassifier {
        DisclosureClassifier::new(&default_rules()).unwrap()
    }

    #[test]
    fn default_table_assignments() {
        let c = defaults();
        assert_eq!(c.classify(&path("a.txt")), DisclosureTier::Public);
        assert_eq!(c.classify(&path("results.json")), DisclosureTier::Public);
        assert_eq!(c.classify(&path("api/model.schema.json")), DisclosureTier::PublicSignature);
        assert_eq!(c.classify(&path("stubs/fit.pyi")), DisclosureTier::PublicSignature);
        assert_eq!(c.classify(&path("src/fit.py")), DisclosureTier::Restricted);
        assert_eq!(c.classify(&path("notebooks/run.ipynb")), DisclosureTier::Restricted);
        assert_eq!(c.classify(&path("data/shear.fits")), DisclosureTier::Private);
        assert_eq!(c.classify(&path("b.key")), DisclosureTier::Private);
    }

    #[test]
    fn unmatched_path_fails_closed() {
        let c = defaults();
        assert_eq!(c.classify(&path("mystery.bin")), DisclosureTier::Private);
        assert_eq!(c.classify(&path("Makefile")), DisclosureTier::Private);

        let empty = DisclosureClassifier::new(&[]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.classify(&path("README.md")), DisclosureTier::Private);
    }

    #[test]
    fn first_match_wins() {
        let rules = vec![
            TierRule::new("secret/**", DisclosureTier::Private),
            TierRule::new("**/*.md", DisclosureTier::Public),
        ];
        let c = DisclosureClassifier::new(&rules).unwrap();
        assert_eq!(c.classify(&path("secret/notes.md")), DisclosureTier::Private);
        assert_eq!(c.classify(&path("docs/notes.md")), DisclosureTier::Public);
        assert_eq!(
            c.matching_rule(&path("secret/notes.md")),
            Some(("secret/**", DisclosureTier::Private))
        );
    }

    #[test]
    fn custom_rules_precede_defaults() {
        let mut config = ProofConfig::default();
        config.rules = vec![TierRule::new("results/**", DisclosureTier::Public)];
        let c = DisclosureClassifier::from_config(&config).unwrap();
        assert_eq!(c.classify(&path("results/table.csv")), DisclosureTier::Public);
        assert_eq!(c.classify(&path("raw/table.csv")), DisclosureTier::Private);
        assert_eq!(c.len(), 1 + default_rules().len());
    }

    #[test]
    fn defaults_can_be_disabled() {
        let mut config = ProofConfig::default();
        config.use_default_rules = false;
        config.rules = vec![TierRule::new("**/*.py", DisclosureTier::Public)];
        let c = DisclosureClassifier::from_config(&config).unwrap();
        assert_eq!(c.classify(&path("fit.py")), DisclosureTier::Public);
        assert_eq!(c.classify(&path("README.md")), DisclosureTier::Private);
    }

    #[test]
    fn bad_pattern_rejects_table() {
        let rules = vec![
            TierRule::new("**/*.md", DisclosureTier::Public),
            TierRule::new("", DisclosureTier::Public),
        ];
        assert!(DisclosureClassifier::new(&rules).is_err());
    }

    fn artifact_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9_-]{1,8}(\\.[a-z0-9]{1,6})?", 1..5)
            .prop_map(|parts| parts.join("/"))
    }

    proptest! {
        #[test]
        fn classification_is_pure(raw in artifact_path()) {
            let p = path(&raw);
            let first = defaults();
            let second = defaults();
            let tier = first.classify(&p);
            prop_assert_eq!(tier, first.classify(&p));
            prop_assert_eq!(tier, second.classify(&p));
        }

        #[test]
        fn classification_depends_only_on_path(raw in artifact_path(), other in artifact_path()) {
            let c = defaults();
            let p = path(&raw);
            let before = c.classify(&p);
            let _ = c.classify(&path(&other));
            prop_assert_eq!(before, c.classify(&p));
        }
    }
}
