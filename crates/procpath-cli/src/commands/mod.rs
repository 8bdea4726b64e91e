//! CLI command definitions and dispatch.

pub mod check;
pub mod creds;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use procpath_common::config::ResolverConfig;
use procpath_common::constants::{APP_NAME, DEFAULT_PROC_ROOT, PROC_ROOT_ENV};
use procpath_core::PathAccess;

/// procpath — Check path access on behalf of another process.
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Mount point of the proc filesystem to read process records from.
    #[arg(long, global = true, env = PROC_ROOT_ENV, default_value = DEFAULT_PROC_ROOT)]
    pub proc_root: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl Cli {
    /// Builds the resolver configuration from global flags.
    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        ResolverConfig::with_proc_root(&self.proc_root)
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a process can access a path.
    Check(check::CheckArgs),
    /// Show the credentials a process's accesses are evaluated with.
    Creds(creds::CredsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    tracing::debug!(proc_root = %config.proc_root().display(), "reading process records");
    let access = PathAccess::new(config);
    match cli.command {
        Command::Check(args) => check::execute(&access, args),
        Command::Creds(args) => creds::execute(&access, args),
    }
}
