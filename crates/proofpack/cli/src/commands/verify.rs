//! `proofpack verify`

use super::{read_optional, PassphraseArgs};
use crate::error::CliResult;
use crate::output::{print_json, print_report};
use clap::Args;
use proofpack_catalog::FsSource;
use proofpack_manifest::{BUNDLE_FILE, DISCLOSED_DIR, MANIFEST_FILE, PROOF_FILE, RECEIPT_FILE};
use proofpack_types::ProofConfig;
use proofpack_verify::{Finding, FindingKind, VerificationReport, Verifier};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Package directory produced by `build`
    #[arg(long)]
    pub package: PathBuf,

    /// Plaintext tree to check every artifact against
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Check sealed tiers against the package's sealed bundle
    #[arg(long)]
    pub bundle: bool,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub passphrase: PassphraseArgs,
}

/// Exit code follows the verdict: 0 verified, 1 mismatch, 2 inputs unavailable.
///
/// Absent or unreadable inputs are reported as findings, never as errors.
pub fn execute(args: VerifyArgs, config: ProofConfig) -> CliResult<ExitCode> {
    let mut unavailable = Vec::new();
    let manifest = read_input(&args.package.join(MANIFEST_FILE), MANIFEST_FILE, &mut unavailable);
    let proof = read_input(&args.package.join(PROOF_FILE), PROOF_FILE, &mut unavailable);
    let (Some(manifest), Some(proof)) = (manifest, proof) else {
        return emit(&VerificationReport::from_findings(unavailable), args.json);
    };

    let root = match &args.root {
        Some(dir) => match FsSource::new(dir) {
            Ok(source) => Some(source.with_excludes(&config.exclude)?),
            Err(e) => {
                unavailable.push(Finding::new(
                    FindingKind::RootUnavailable,
                    dir.display().to_string(),
                    e.to_string(),
                ));
                None
            }
        },
        None => None,
    };
    let disclosed_dir = args.package.join(DISCLOSED_DIR);
    let disclosed = if args.root.is_none() && disclosed_dir.is_dir() {
        Some(FsSource::new(disclosed_dir)?)
    } else {
        None
    };

    let (bundle, receipt, passphrase) = if args.bundle {
        let bundle = read_input(&args.package.join(BUNDLE_FILE), BUNDLE_FILE, &mut unavailable);
        let receipt = match read_optional(&args.package.join(RECEIPT_FILE)) {
            Ok(receipt) => receipt,
            Err(e) => {
                unavailable.push(Finding::new(
                    FindingKind::PackageFileUnavailable,
                    RECEIPT_FILE,
                    e.to_string(),
                ));
                None
            }
        };
        let passphrase = args.passphrase.resolve().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "passphrase could not be read");
            None
        });
        (bundle, receipt, passphrase)
    } else {
        (None, None, None)
    };

    let mut verifier = Verifier::new();
    if let Some(root) = &root {
        verifier = verifier.with_root(root);
    }
    if let Some(disclosed) = &disclosed {
        verifier = verifier.with_disclosed(disclosed);
    }
    if let Some(bundle) = &bundle {
        verifier = verifier.with_bundle(bundle, passphrase.as_ref());
    }
    if let Some(receipt) = &receipt {
        verifier = verifier.with_receipt(receipt);
    }

    let mut report = verifier.verify(&manifest, &proof);
    for finding in unavailable {
        report.push_finding(finding);
    }
    emit(&report, args.json)
}

/// `None`, with a finding, when the file is absent or unreadable.
fn read_input(path: &Path, subject: &str, findings: &mut Vec<Finding>) -> Option<Vec<u8>> {
    match read_optional(path) {
        Ok(Some(bytes)) => Some(bytes),
        Ok(None) => {
            findings.push(Finding::new(
                FindingKind::PackageFileUnavailable,
                subject,
                format!("{} does not exist", path.display()),
            ));
            None
        }
        Err(e) => {
            findings.push(Finding::new(FindingKind::PackageFileUnavailable, subject, e.to_string()));
            None
        }
    }
}

fn emit(report: &VerificationReport, json: bool) -> CliResult<ExitCode> {
    if json {
        print_json(report)?;
    } else {
        print_report(report);
    }
    Ok(ExitCode::from(report.verdict.exit_code() as u8))
}
