//! Proofpack CLI - build and verify provenance proof packages
//!
//! - `build`: catalog a tree, seal restricted and private tiers, write a package
//! - `verify`: re-derive a package's proof from a plaintext tree or its bundle
//! - `classify`: show which disclosure tier a path lands in
//! - `inspect`: print a package's proof summary

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{build, classify, inspect, verify};
use error::CliResult;

/// Proofpack CLI application
#[derive(Parser)]
#[command(name = "proofpack")]
#[command(about = "Tamper-evident provenance proof packages with tiered disclosure", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "PROOFPACK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "PROOFPACK_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Build a proof package from a directory tree
    Build(build::BuildArgs),

    /// Verify a proof package
    Verify(verify::VerifyArgs),

    /// Show the disclosure tier of each path
    Classify(classify::ClassifyArgs),

    /// Print a package's proof summary
    Inspect(inspect::InspectArgs),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Keep usage errors off the verdict codes 0-2.
            return if e.use_stderr() {
                ExitCode::from(64)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Logs go to stderr; stdout carries reports.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());
    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Build(args) => build::execute(args, config::load(cli.config.as_deref())?),
        Commands::Verify(args) => verify::execute(args, config::load(cli.config.as_deref())?),
        Commands::Classify(args) => classify::execute(args, config::load(cli.config.as_deref())?),
        Commands::Inspect(args) => inspect::execute(args),
    }
}
