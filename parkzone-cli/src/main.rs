//! ## parkzone-cli
//! **Operator interface for the parking allocation engine**
//!
//! Runs seeded simulations, replays scenario files, prints the configured
//! facility and fuzzes the engine against its invariants.

use clap::Parser;

mod commands;
mod report;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    commands::run_command(Cli::parse())
}
