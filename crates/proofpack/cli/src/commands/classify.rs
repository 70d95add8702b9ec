//! `proofpack classify`

use crate::error::{CliError, CliResult};
use crate::output::print_json;
use clap::Args;
use colored::*;
use proofpack_classify::DisclosureClassifier;
use proofpack_types::{ArtifactPath, DisclosureTier, ProofConfig};
use serde::Serialize;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Relative artifact paths to classify
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Print assignments as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Assignment {
    path: ArtifactPath,
    tier: DisclosureTier,
    /// `None` when no rule matched and the path fell back to private.
    rule: Option<String>,
}

pub fn execute(args: ClassifyArgs, config: ProofConfig) -> CliResult<ExitCode> {
    let classifier = DisclosureClassifier::from_config(&config)?;
    let assignments = args
        .paths
        .iter()
        .map(|raw| {
            let path = ArtifactPath::new(raw.as_str())
                .map_err(|e| CliError::InvalidInput(e.to_string()))?;
            let (rule, tier) = match classifier.matching_rule(&path) {
                Some((pattern, tier)) => (Some(pattern.to_string()), tier),
                None => (None, classifier.classify(&path)),
            };
            Ok(Assignment { path, tier, rule })
        })
        .collect::<CliResult<Vec<_>>>()?;

    if args.json {
        print_json(&assignments)?;
    } else {
        for a in &assignments {
            let tier = match a.tier {
                DisclosureTier::Public => a.tier.as_str().green(),
                DisclosureTier::PublicSignature => a.tier.as_str().cyan(),
                DisclosureTier::Restricted => a.tier.as_str().yellow(),
                DisclosureTier::Private => a.tier.as_str().red(),
            };
            let rule = a.rule.as_deref().unwrap_or("(no rule, fallback)");
            println!("{:<18} {}  {}", tier, a.path, rule.dimmed());
        }
    }
    Ok(ExitCode::SUCCESS)
}
