use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidentiality classification of an artifact.
///
/// Ordered from most to least disclosed. `Restricted` and `Private`
/// content only ever leaves the scan root inside the sealed bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisclosureTier {
    /// Hash only; no content is disclosed.
    Public,
    /// Interface and schema definitions, no logic. Content is disclosed.
    PublicSignature,
    /// Algorithms and methods. Content is sealed.
    Restricted,
    /// Raw data. Content is sealed.
    Private,
}

/// How a tier's layer appears in the published package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerDisposition {
    Public,
    Sealed,
}

impl DisclosureTier {
    pub const ALL: [DisclosureTier; 4] = [
        DisclosureTier::Public,
        DisclosureTier::PublicSignature,
        DisclosureTier::Restricted,
        DisclosureTier::Private,
    ];

    pub fn is_sealed(self) -> bool {
        matches!(self.disposition(), LayerDisposition::Sealed)
    }

    /// Whether the raw content is copied into the package's `disclosed/` layer.
    pub fn discloses_content(self) -> bool {
        match self {
            DisclosureTier::PublicSignature => true,
            DisclosureTier::Public | DisclosureTier::Restricted | DisclosureTier::Private => false,
        }
    }

    pub fn disposition(self) -> LayerDisposition {
        match self {
            DisclosureTier::Public | DisclosureTier::PublicSignature => LayerDisposition::Public,
            DisclosureTier::Restricted | DisclosureTier::Private => LayerDisposition::Sealed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisclosureTier::Public => "public",
            DisclosureTier::PublicSignature => "public-signature",
            DisclosureTier::Restricted => "restricted",
            DisclosureTier::Private => "private",
        }
    }
}

impl fmt::Display for DisclosureTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LayerDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerDisposition::Public => f.write_str("public"),
            LayerDisposition::Sealed => f.write_str("sealed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_tiers() {
        assert!(!DisclosureTier::Public.is_sealed());
        assert!(!DisclosureTier::PublicSignature.is_sealed());
        assert!(DisclosureTier::Restricted.is_sealed());
        assert!(DisclosureTier::Private.is_sealed());
    }

    #[test]
    fn only_signatures_disclose_content() {
        let disclosed: Vec<_> = DisclosureTier::ALL
            .into_iter()
            .filter(|t| t.discloses_content())
            .collect();
        assert_eq!(disclosed, vec![DisclosureTier::PublicSignature]);
    }

    #[test]
    fn ordering_most_to_least_disclosed() {
        assert!(DisclosureTier::Public < DisclosureTier::PublicSignature);
        assert!(DisclosureTier::PublicSignature < DisclosureTier::Restricted);
        assert!(DisclosureTier::Restricted < DisclosureTier::Private);
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&DisclosureTier::PublicSignature).unwrap();
        assert_eq!(json, "\"public-signature\"");
        let back: DisclosureTier = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(back, DisclosureTier::Private);
        assert_eq!(
            serde_json::to_string(&LayerDisposition::Sealed).unwrap(),
            "\"sealed\""
        );
    }

    #[test]
    fn display_matches_serde() {
        for tier in DisclosureTier::ALL {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{}\"", tier));
        }
    }
}
