//! `proofpack build`

use super::PassphraseArgs;
use crate::error::{CliError, CliResult};
use crate::output::{print_field, print_success};
use anyhow::{bail, Context};
use chrono::{DateTime, TimeZone, Utc};
use clap::Args;
use proofpack_catalog::FsSource;
use proofpack_manifest::{PackageWriter, ProofPipeline};
use proofpack_types::{ProofConfig, RunMetadata};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory tree to catalog
    #[arg(long)]
    pub root: PathBuf,

    /// Package directory to create; must not exist
    #[arg(long)]
    pub out: PathBuf,

    /// Anchor identifier for this run
    #[arg(long)]
    pub anchor: Option<String>,

    /// Mark the run as subject to a patent filing
    #[arg(long)]
    pub patent: bool,

    /// Primary results file, relative to the root
    #[arg(long)]
    pub results: Option<String>,

    /// Source revision; read from git when absent
    #[arg(long)]
    pub revision: Option<String>,

    /// Run timestamp (RFC 3339); SOURCE_DATE_EPOCH or now when absent
    #[arg(long, value_parser = parse_timestamp)]
    pub timestamp: Option<DateTime<Utc>>,

    #[command(flatten)]
    pub passphrase: PassphraseArgs,
}

pub fn execute(args: BuildArgs, mut config: ProofConfig) -> CliResult<ExitCode> {
    if let Some(anchor) = args.anchor {
        config.run.anchor_id = Some(anchor);
    }
    if args.patent {
        config.run.patent_flag = true;
    }
    if let Some(results) = args.results {
        config.run.results_path = Some(results);
    }

    let anchor = config.run.anchor_id.clone().ok_or_else(|| {
        CliError::InvalidInput("an anchor id is required (--anchor or run.anchor_id)".into())
    })?;
    let timestamp = match args.timestamp {
        Some(ts) => ts,
        None => default_timestamp()?,
    };
    let revision = args
        .revision
        .or_else(|| config.run.revision_id.clone())
        .or_else(|| match git_revision(&args.root) {
            Ok(rev) => Some(rev),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "no source revision recorded");
                None
            }
        });

    let mut metadata = RunMetadata::new(timestamp, anchor).with_patent_flag(config.run.patent_flag);
    if let Some(revision) = revision {
        metadata = metadata.with_revision(revision);
    }

    let source = FsSource::new(&args.root)?.with_excludes(&config.exclude)?;
    let passphrase = args.passphrase.resolve()?;
    let pipeline = ProofPipeline::new(config)?;
    let package = pipeline.assemble(&source, &metadata, passphrase.as_ref())?;
    let out = PackageWriter::new().emit(&package, &args.out)?;

    print_success(&format!("proof package written to {}", out.display()));
    print_field("anchor", &package.proof.anchor_id);
    print_field("entries", package.proof.entry_count);
    print_field(
        "sealed",
        package
            .bundle
            .as_ref()
            .map_or(0, |b| b.receipt.sealed_entries.len()),
    );
    print_field("combined digest", package.proof.combined_digest.to_hex());
    Ok(ExitCode::SUCCESS)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("not an RFC 3339 timestamp: {e}"))
}

/// `SOURCE_DATE_EPOCH` when set, otherwise now at whole-second precision.
fn default_timestamp() -> CliResult<DateTime<Utc>> {
    match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| {
                CliError::InvalidInput(format!("SOURCE_DATE_EPOCH {raw:?} is not a Unix timestamp"))
            }),
        Err(_) => {
            let now = Utc::now();
            Ok(Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now))
        }
    }
}

fn git_revision(root: &Path) -> anyhow::Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["rev-parse", "HEAD"])
        .output()
        .context("running git")?;
    if !output.status.success() {
        bail!("git rev-parse exited with {}", output.status);
    }
    let revision = String::from_utf8(output.stdout)
        .context("git output is not UTF-8")?
        .trim()
        .to_string();
    if revision.is_empty() {
        bail!("git printed an empty revision");
    }
    Ok(revision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_parse_as_utc() {
        let ts = parse_timestamp("2025-03-01T13:00:00+01:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn outside_a_repository_there_is_no_revision() {
        let dir = std::env::temp_dir().join("proofpack-no-git-here");
        assert!(git_revision(&dir).is_err());
    }
}
