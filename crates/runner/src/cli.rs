//! Subcommand surface. `run` is the default invocation; the other three
//! are one-shot checks meant for CI/deploy gates, each mapping to a
//! specific exit code rather than a generic failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vox-runner", about = "Core runtime of a modular voice assistant")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP/WebSocket surface and the text/voice workflow engine (default).
    Run,
    /// Instantiate the provider registry and report which configured providers
    /// failed to come up.
    CheckDeps,
    /// Load and validate the configuration file without starting anything.
    ValidateConfig,
    /// Load every donation file under `intents.donations_root` and validate
    /// lemma-sync and cross-language parity.
    ValidateDonations,
}
