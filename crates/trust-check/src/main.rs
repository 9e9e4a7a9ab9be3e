use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trust_check::{Checker, Report};

/// Fail the build when application sources fabricate status or figures.
#[derive(Debug, Parser)]
#[command(name = "trust-check", version)]
struct Cli {
    /// Source tree to scan
    #[arg(default_value = ".")]
    root: PathBuf,
}

fn run(cli: &Cli) -> anyhow::Result<Report> {
    let checker = Checker::with_default_rules().context("compiling built-in rules")?;
    checker
        .scan_tree(&cli.root)
        .with_context(|| format!("scanning {}", cli.root.display()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) => {
            for violation in &report.violations {
                println!("{}", violation);
            }
            println!("{}", report.summary());
            ExitCode::from(report.exit_code())
        }
        Err(e) => {
            eprintln!("trust-check: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
