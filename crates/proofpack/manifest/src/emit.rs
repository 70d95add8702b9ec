//! All-or-nothing package emission.
//!
//! Layout of an emitted package directory:
//!
//! ```text
//! manifest.json        full manifest, including modified times
//! proof.json           proof record
//! sealed.bundle        encrypted archive of restricted and private tiers
//! seal.json            public receipt for sealed.bundle
//! disclosed/<path>     verbatim public-signature artifacts
//! audit.jsonl          hash-chained record of the run
//! ```

use crate::audit::AuditStage;
use crate::pipeline::ProofPackage;
use proofpack_types::{ProofError, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const PROOF_FILE: &str = "proof.json";
pub const BUNDLE_FILE: &str = "sealed.bundle";
pub const RECEIPT_FILE: &str = "seal.json";
pub const DISCLOSED_DIR: &str = "disclosed";
pub const AUDIT_FILE: &str = "audit.jsonl";

/// Writes a [`ProofPackage`] to disk.
///
/// Files are staged in a temporary sibling of the target and renamed into
/// place only once everything has been written. An existing target is
/// never touched.
#[derive(Clone, Debug, Default)]
pub struct PackageWriter;

impl PackageWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn emit(&self, package: &ProofPackage, out_dir: &Path) -> Result<PathBuf> {
        if out_dir.exists() {
            return Err(ProofError::PackageExists(out_dir.to_path_buf()));
        }
        let parent = match out_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| ProofError::emit(&parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".proofpack-staging-")
            .tempdir_in(&parent)
            .map_err(|e| ProofError::emit(&parent, e))?;
        let root = staging.path();

        let mut written = vec![MANIFEST_FILE, PROOF_FILE];
        write_json(&root.join(MANIFEST_FILE), &package.manifest)?;
        write_json(&root.join(PROOF_FILE), &package.proof)?;
        if let Some(bundle) = &package.bundle {
            write_file(&root.join(BUNDLE_FILE), &bundle.bytes)?;
            write_json(&root.join(RECEIPT_FILE), &bundle.receipt)?;
            written.extend([BUNDLE_FILE, RECEIPT_FILE]);
        }
        for (path, content) in &package.disclosed {
            let target = path
                .as_str()
                .split('/')
                .fold(root.join(DISCLOSED_DIR), |acc, part| acc.join(part));
            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir).map_err(|e| ProofError::emit(dir, e))?;
            }
            write_file(&target, content)?;
        }

        let mut audit = package.audit.clone();
        audit.record(
            AuditStage::Emitted,
            "package staged for publication",
            [
                ("files", serde_json::to_value(&written)?),
                ("disclosed_entries", Value::from(package.disclosed.len())),
            ],
        )?;
        write_file(&root.join(AUDIT_FILE), &audit.to_jsonl()?)?;

        if out_dir.exists() {
            return Err(ProofError::PackageExists(out_dir.to_path_buf()));
        }
        fs::rename(root, out_dir).map_err(|e| ProofError::emit(out_dir, e))?;

        tracing::info!(
            out = %out_dir.display(),
            combined = %package.proof.combined_digest.short(),
            "proof package emitted"
        );
        Ok(out_dir.to_path_buf())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_file(path, &bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| ProofError::emit(path, e))
}
