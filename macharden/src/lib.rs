//! macharden: bring a Mac in line with a home or public hardening profile.
//!
//! Binary entry point lives in main.rs; this crate exposes `run_cli` so the
//! orchestration can be exercised from tests with a scripted host.

mod cli;
pub mod commands;

use anyhow::Result;
use clap::Parser;

pub use cli::Cli;

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let host = commands::harden::Host::system();
    let mut prompt = commands::harden::StdinPrompt::new(host.runner.clone());
    let report = commands::harden::run(&cli, &host, &mut prompt)?;
    // failed or unsupported subsystems still exit 0
    tracing::info!(disposition = ?report.disposition, "Hardening run finished");
    Ok(())
}
