//! `procpath check` — Check whether a process can access a path.

use std::path::PathBuf;

use clap::Args;
use procpath_core::{AccessMode, PathAccess};

use crate::output::CheckReport;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Process whose credentials the check is evaluated with.
    pub pid: u32,

    /// Path to check; relative paths resolve against the process's cwd.
    pub path: PathBuf,

    /// Requested access: any of `r`, `w`, `x`, or an octal digit.
    #[arg(short, long, default_value = "r")]
    pub mode: AccessMode,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `check` command.
///
/// # Errors
///
/// Returns an error if access is not granted, so the exit status reflects
/// the decision.
pub fn execute(access: &PathAccess, args: CheckArgs) -> anyhow::Result<()> {
    let result = access.check(args.pid, &args.path, args.mode);
    let report = CheckReport::new(args.pid, &args.path, args.mode, result.as_ref().err());
    tracing::info!(
        pid = args.pid,
        path = %args.path.display(),
        mode = %args.mode,
        granted = report.granted,
        denied = report.denied,
        "check complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }

    result.map_err(|e| anyhow::anyhow!("access to {} not granted: {e}", args.path.display()))
}
