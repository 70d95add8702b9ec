use crate::error::{ProofError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// A validated, `/`-separated path relative to the scan root.
///
/// Ordering is byte-wise on the string form; that order is the catalog
/// sort key and the order every aggregate digest is taken in.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let invalid = |reason: &str| ProofError::InvalidPath {
            path: path.clone(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        if path.starts_with('/') {
            return Err(invalid("absolute path"));
        }
        if path.contains('\\') {
            return Err(invalid("backslash separator"));
        }
        for component in path.split('/') {
            match component {
                "" => return Err(invalid("empty component")),
                "." | ".." => return Err(invalid("relative component")),
                _ => {}
            }
        }
        Ok(Self(path))
    }

    /// Build from a filesystem path relative to the scan root.
    pub fn from_relative(rel: &Path) -> Result<Self> {
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| ProofError::InvalidPath {
                        path: rel.to_string_lossy().into_owned(),
                        reason: "not valid UTF-8".into(),
                    })?;
                    parts.push(part);
                }
                _ => {
                    return Err(ProofError::InvalidPath {
                        path: rel.to_string_lossy().into_owned(),
                        reason: "not a plain relative path".into(),
                    })
                }
            }
        }
        Self::new(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactPath({})", self.0)
    }
}

impl AsRef<str> for ArtifactPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ArtifactPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ArtifactPath::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative() {
        let p = ArtifactPath::new("src/model/fit.py").unwrap();
        assert_eq!(p.as_str(), "src/model/fit.py");
        assert_eq!(p.file_name(), "fit.py");
    }

    #[test]
    fn rejects_escapes_and_absolutes() {
        for bad in ["", "/etc/passwd", "../up", "a/../b", "a//b", "a/./b", "dir/", "a\\b"] {
            assert!(ArtifactPath::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn from_relative_joins_with_slash() {
        let rel = Path::new("data").join("raw").join("x.csv");
        let p = ArtifactPath::from_relative(&rel).unwrap();
        assert_eq!(p.as_str(), "data/raw/x.csv");
    }

    #[test]
    fn orders_bytewise() {
        let mut paths = vec![
            ArtifactPath::new("b.key").unwrap(),
            ArtifactPath::new("a.txt").unwrap(),
            ArtifactPath::new("B.txt").unwrap(),
            ArtifactPath::new("a/z.txt").unwrap(),
        ];
        paths.sort();
        let names: Vec<_> = paths.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["B.txt", "a.txt", "a/z.txt", "b.key"]);
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<ArtifactPath>("\"ok/path\"").is_ok());
        assert!(serde_json::from_str::<ArtifactPath>("\"../escape\"").is_err());
    }
}
