//! `proofpack inspect`

use super::{read_file, read_optional};
use crate::error::{CliError, CliResult};
use crate::output::{print_field, print_json, print_warning};
use clap::Args;
use proofpack_manifest::{AuditTrail, AUDIT_FILE, MANIFEST_FILE, PROOF_FILE, RECEIPT_FILE};
use proofpack_types::{DisclosureTier, Manifest, ProofRecord, SealReceipt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Package directory produced by `build`
    #[arg(long)]
    pub package: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    proof: ProofRecord,
    revision_id: Option<String>,
    tiers: BTreeMap<DisclosureTier, usize>,
    receipt: Option<SealReceipt>,
    audit: AuditStatus,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AuditStatus {
    Intact { events: usize, head_hash: Option<String> },
    Broken { reason: String },
    Absent,
}

impl AuditStatus {
    fn read(raw: Option<Vec<u8>>) -> Self {
        match raw.map(|bytes| AuditTrail::from_jsonl(&bytes)) {
            None => AuditStatus::Absent,
            Some(Ok(trail)) => AuditStatus::Intact {
                events: trail.events().len(),
                head_hash: trail.head_hash().map(str::to_string),
            },
            Some(Err(e)) => AuditStatus::Broken { reason: e.to_string() },
        }
    }
}

pub fn execute(args: InspectArgs) -> CliResult<ExitCode> {
    let proof: ProofRecord = serde_json::from_slice(&read_file(&args.package.join(PROOF_FILE))?)?;
    proof.validate()?;
    let manifest: Manifest =
        serde_json::from_slice(&read_file(&args.package.join(MANIFEST_FILE))?)?;
    let receipt = read_optional(&args.package.join(RECEIPT_FILE))?
        .map(|raw| serde_json::from_slice::<SealReceipt>(&raw))
        .transpose()
        .map_err(|e| CliError::InvalidInput(format!("{RECEIPT_FILE}: {e}")))?;

    let mut tiers: BTreeMap<DisclosureTier, usize> =
        DisclosureTier::ALL.into_iter().map(|t| (t, 0)).collect();
    for entry in &manifest.entries {
        *tiers.entry(entry.tier).or_default() += 1;
    }

    let audit = AuditStatus::read(read_optional(&args.package.join(AUDIT_FILE))?);

    let summary = Summary {
        revision_id: manifest.header.revision_id.clone(),
        proof,
        tiers,
        receipt,
        audit,
    };
    if args.json {
        print_json(&summary)?;
        return Ok(ExitCode::SUCCESS);
    }

    let proof = &summary.proof;
    println!("{}", args.package.display());
    print_field("anchor", &proof.anchor_id);
    print_field("timestamp", proof.timestamp.to_rfc3339());
    print_field("revision", summary.revision_id.as_deref().unwrap_or("-"));
    print_field("patent flag", proof.patent_flag);
    print_field("algorithm", proof.algorithm);
    print_field("entries", proof.entry_count);
    for (tier, count) in &summary.tiers {
        print_field(&format!("  {tier}"), format!("{count} ({})", tier.disposition()));
    }
    print_field("manifest digest", proof.manifest_digest.to_hex());
    if let Some(results) = &proof.results_digest {
        print_field("results digest", results.to_hex());
    }
    print_field("combined digest", proof.combined_digest.to_hex());
    print_field("auxiliary crc32", proof.auxiliary_checksum.to_hex());
    if let Some(receipt) = &summary.receipt {
        print_field("sealed bundle", format!("{} bytes, {}", receipt.ciphertext_len, receipt.algorithm));
    }
    print_field("verify with", &proof.verification.command);
    print_field("method", &proof.verification.method);
    match &summary.audit {
        AuditStatus::Intact { events, head_hash } => print_field(
            "audit trail",
            format!("{events} events, head {}", head_hash.as_deref().unwrap_or("-")),
        ),
        AuditStatus::Broken { reason } => print_warning(&format!("audit trail: {reason}")),
        AuditStatus::Absent => print_field("audit trail", "absent"),
    }
    Ok(ExitCode::SUCCESS)
}
