//! Where artifact bytes come from.
//!
//! The scanner, sealer and verifier only ever see an [`ArtifactSource`],
//! so the same pipeline runs against a directory tree or an in-memory set.

use chrono::{DateTime, Utc};
use proofpack_classify::PathPattern;
use proofpack_types::{ArtifactPath, ProofError, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Listing record for one artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactMeta {
    pub path: ArtifactPath,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// A read-only set of artifacts addressed by relative path.
pub trait ArtifactSource: Send + Sync {
    /// Every artifact, in path order.
    fn list(&self) -> Result<Vec<ArtifactMeta>>;

    /// Open one artifact for streaming.
    fn open(&self, path: &ArtifactPath) -> Result<Box<dyn Read + Send + '_>>;
}

/// Directory tree rooted at a scan root.
///
/// Symlinks are never followed. Symlinks, special files and names that are
/// not UTF-8 abort the listing with `PartialCatalog` rather than being
/// skipped, so a catalog is either complete or absent.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
    exclude: Vec<PathPattern>,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ProofError::InvalidConfig(format!(
                "scan root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            exclude: Vec::new(),
        })
    }

    /// Skip paths matching any of `patterns`. A directory is pruned when
    /// `dir/` itself matches, so `.git/**` never descends into `.git`.
    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self> {
        self.exclude = patterns
            .iter()
            .map(|p| PathPattern::new(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn excluded(&self, rel: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(rel))
    }

    fn relative(&self, path: &Path) -> Result<ArtifactPath> {
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|e| ProofError::partial(path.display().to_string(), e))?;
        ArtifactPath::from_relative(rel)
            .map_err(|e| ProofError::partial(rel.display().to_string(), e))
    }
}

impl ArtifactSource for FsSource {
    fn list(&self) -> Result<Vec<ArtifactMeta>> {
        let mut out = Vec::new();
        let mut walk = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walk.next() {
            let entry = entry.map_err(|e| {
                let at = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.root.display().to_string());
                ProofError::partial(at, e)
            })?;
            if entry.depth() == 0 {
                continue;
            }

            let path = self.relative(entry.path())?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if self.excluded(&format!("{path}/")) {
                    tracing::debug!(%path, "excluded directory");
                    walk.skip_current_dir();
                }
                continue;
            }
            if self.excluded(path.as_str()) {
                tracing::debug!(%path, "excluded artifact");
                continue;
            }
            if file_type.is_symlink() {
                return Err(ProofError::partial(path.as_str(), "symbolic link"));
            }
            if !file_type.is_file() {
                return Err(ProofError::partial(path.as_str(), "not a regular file"));
            }

            let metadata = entry
                .metadata()
                .map_err(|e| ProofError::partial(path.as_str(), e))?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .map_err(|e| ProofError::partial(path.as_str(), e))?;

            out.push(ArtifactMeta {
                path,
                size: metadata.len(),
                modified,
            });
        }

        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn open(&self, path: &ArtifactPath) -> Result<Box<dyn Read + Send + '_>> {
        let full = path
            .as_str()
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part));
        let file = File::open(&full).map_err(|e| ProofError::unreadable(path.as_str(), e))?;
        Ok(Box::new(file))
    }
}

/// In-memory artifact set.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: BTreeMap<ArtifactPath, (Vec<u8>, DateTime<Utc>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, content)` pairs; a later pair replaces an earlier
    /// one with the same path.
    pub fn from_files<I, P, C>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut source = Self::new();
        for (path, content) in files {
            source.insert(ArtifactPath::new(path)?, content);
        }
        Ok(source)
    }

    /// Insert or replace an artifact. Modified time is the Unix epoch.
    pub fn insert(&mut self, path: ArtifactPath, content: impl Into<Vec<u8>>) {
        self.insert_at(path, content, DateTime::<Utc>::default());
    }

    pub fn insert_at(
        &mut self,
        path: ArtifactPath,
        content: impl Into<Vec<u8>>,
        modified: DateTime<Utc>,
    ) {
        self.files.insert(path, (content.into(), modified));
    }

    pub fn remove(&mut self, path: &ArtifactPath) -> Option<Vec<u8>> {
        self.files.remove(path).map(|(content, _)| content)
    }

    pub fn get(&self, path: &ArtifactPath) -> Option<&[u8]> {
        self.files.get(path).map(|(content, _)| content.as_slice())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ArtifactSource for MemorySource {
    fn list(&self) -> Result<Vec<ArtifactMeta>> {
        Ok(self
            .files
            .iter()
            .map(|(path, (content, modified))| ArtifactMeta {
                path: path.clone(),
                size: content.len() as u64,
                modified: *modified,
            })
            .collect())
    }

    fn open(&self, path: &ArtifactPath) -> Result<Box<dyn Read + Send + '_>> {
        match self.files.get(path) {
            Some((content, _)) => Ok(Box::new(Cursor::new(content.as_slice()))),
            None => Err(ProofError::unreadable(
                path.as_str(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory source"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn paths(metas: &[ArtifactMeta]) -> Vec<&str> {
        metas.iter().map(|m| m.path.as_str()).collect()
    }

    #[test]
    fn fs_lists_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/model")).unwrap();
        fs::write(dir.path().join("b.key"), b"secret").unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::write(dir.path().join("src/model/fit.py"), b"def fit(): pass\n").unwrap();

        let source = FsSource::new(dir.path()).unwrap();
        let listed = source.list().unwrap();
        assert_eq!(paths(&listed), vec!["a.txt", "b.key", "src/model/fit.py"]);
        assert_eq!(listed[0].size, 5);

        let mut buf = String::new();
        source
            .open(&ArtifactPath::new("src/model/fit.py").unwrap())
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "def fit(): pass\n");
    }

    #[test]
    fn fs_excludes_prune_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), b"ref").unwrap();
        fs::write(dir.path().join(".git/objects/ab"), b"blob").unwrap();
        fs::write(dir.path().join("notes.md"), b"# notes").unwrap();
        fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();

        let source = FsSource::new(dir.path())
            .unwrap()
            .with_excludes(&[".git/**".into(), "**/.DS_Store".into()])
            .unwrap();
        assert_eq!(paths(&source.list().unwrap()), vec!["notes.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn fs_symlink_is_partial_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let source = FsSource::new(dir.path()).unwrap();
        match source.list() {
            Err(ProofError::PartialCatalog { path, .. }) => assert_eq!(path, "link.txt"),
            other => panic!("expected PartialCatalog, got {other:?}"),
        }
    }

    #[test]
    fn fs_open_missing_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::new(dir.path()).unwrap();
        let err = source
            .open(&ArtifactPath::new("gone.txt").unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, ProofError::ArtifactUnreadable { .. }));
    }

    #[test]
    fn fs_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(FsSource::new(&file), Err(ProofError::InvalidConfig(_))));
    }

    #[test]
    fn memory_source_replaces_and_removes() {
        let mut source =
            MemorySource::from_files([("a.txt", b"one".to_vec()), ("b.key", b"two".to_vec())])
                .unwrap();
        let a = ArtifactPath::new("a.txt").unwrap();
        source.insert(a.clone(), b"three".to_vec());
        assert_eq!(source.get(&a), Some(&b"three"[..]));
        assert_eq!(source.list().unwrap()[0].size, 5);

        source.remove(&a);
        assert_eq!(source.len(), 1);
        assert!(source.open(&a).is_err());
    }

    #[test]
    fn memory_source_rejects_bad_paths() {
        assert!(MemorySource::from_files([("../x", b"".to_vec())]).is_err());
    }
}
