//! Command-line tooling for exercising the cartosync engine without a map.
//!
//! `cartosync replay <script.json>` drives a [`cartosync_core::MapController`]
//! over an in-memory recording surface and prints a JSON report of what each
//! step did. `cartosync diff <old.json> <new.json>` prints how one marker list
//! reconciles into another.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod diff;
mod error;
mod files;
mod replay;

pub use error::CliError;

use diff::{DiffArgs, run_diff};
use replay::{ReplayArgs, run_replay};

pub(crate) const ARG_REPLAY_SCRIPT: &str = "script";
pub(crate) const ARG_REPLAY_OUTPUT: &str = "output";
pub(crate) const ARG_REPLAY_VIEWPORT_WIDTH: &str = "viewport-width";
pub(crate) const ARG_REPLAY_VIEWPORT_HEIGHT: &str = "viewport-height";
pub(crate) const ARG_REPLAY_LOAD_ASSETS: &str = "load-assets";
pub(crate) const ARG_REPLAY_ASSET_TIMEOUT: &str = "asset-timeout-secs";
pub(crate) const ENV_REPLAY_SCRIPT: &str = "CARTOSYNC_CMDS_REPLAY_SCRIPT";
pub(crate) const ARG_DIFF_OLD: &str = "old";
pub(crate) const ARG_DIFF_NEW: &str = "new";
pub(crate) const ENV_DIFF_OLD: &str = "CARTOSYNC_CMDS_DIFF_OLD";
pub(crate) const ENV_DIFF_NEW: &str = "CARTOSYNC_CMDS_DIFF_NEW";

/// Run the cartosync CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when arguments, configuration, inputs or output
/// fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Replay(args) => run_replay(args, &mut stdout),
        Command::Diff(args) => run_diff(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "cartosync",
    about = "Replay overlay scripts and diff marker lists offline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drive the engine through a JSON scene script.
    Replay(ReplayArgs),
    /// Show how one marker list reconciles into another.
    Diff(DiffArgs),
}

#[cfg(test)]
mod tests;
