//! Deterministic tar archive of sealed artifacts.
//!
//! Same inputs give the same bytes: GNU headers, entries in path order,
//! mode 0644, mtime 0, uid/gid 0.

use proofpack_types::{ArtifactPath, ProofError, Result};
use std::collections::BTreeMap;
use std::io::Read;
use tar::{Archive, Builder, EntryType, Header};
use zeroize::Zeroizing;

const BLOCK: usize = 512;

/// Plaintext contents keyed by path.
pub type SealedContents = BTreeMap<ArtifactPath, Zeroizing<Vec<u8>>>;

pub(crate) fn write_archive(files: &SealedContents) -> Result<Zeroizing<Vec<u8>>> {
    // Reserve everything up front so the plaintext is never reallocated
    // and left behind in freed memory.
    let capacity = files
        .iter()
        .map(|(path, content)| {
            let long_name = if path.as_str().len() >= 100 {
                BLOCK + padded(path.as_str().len() + 1)
            } else {
                0
            };
            BLOCK + padded(content.len()) + long_name
        })
        .sum::<usize>()
        + 2 * BLOCK;
    let mut buf = Zeroizing::new(Vec::with_capacity(capacity));

    {
        let mut builder = Builder::new(&mut *buf);
        for (path, content) in files {
            let mut header = Header::new_gnu();
            header.set_entry_type(EntryType::Regular);
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            builder
                .append_data(&mut header, path.as_str(), content.as_slice())
                .map_err(|e| ProofError::EncryptionFailure(format!("archiving {path}: {e}")))?;
        }
        builder
            .finish()
            .map_err(|e| ProofError::EncryptionFailure(format!("finishing archive: {e}")))?;
    }

    Ok(buf)
}

pub(crate) fn read_archive(bytes: &[u8]) -> Result<SealedContents> {
    let corrupt = |what: &str, e: &dyn std::fmt::Display| {
        ProofError::BundleCorrupt(format!("{what}: {e}"))
    };

    let mut out = SealedContents::new();
    let mut archive = Archive::new(bytes);
    let entries = archive.entries().map_err(|e| corrupt("archive", &e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| corrupt("archive entry", &e))?;
        if entry.header().entry_type() != EntryType::Regular {
            return Err(ProofError::BundleCorrupt(format!(
                "unexpected archive entry type {:?}",
                entry.header().entry_type()
            )));
        }

        let name = {
            let raw_path = entry.path().map_err(|e| corrupt("entry path", &e))?;
            raw_path
                .to_str()
                .ok_or_else(|| ProofError::BundleCorrupt("entry path is not UTF-8".into()))?
                .to_string()
        };
        let path = ArtifactPath::new(name).map_err(|e| corrupt("entry path", &e))?;

        let mut content = Zeroizing::new(Vec::with_capacity(entry.size() as usize));
        entry
            .read_to_end(&mut content)
            .map_err(|e| corrupt(path.as_str(), &e))?;
        if content.len() as u64 != entry.size() {
            return Err(ProofError::BundleCorrupt(format!("{path} is truncated")));
        }

        if out.insert(path.clone(), content).is_some() {
            return Err(ProofError::BundleCorrupt(format!(
                "archive lists {path} twice"
            )));
        }
    }

    Ok(out)
}

fn padded(len: usize) -> usize {
    len.div_ceil(BLOCK) * BLOCK
}
