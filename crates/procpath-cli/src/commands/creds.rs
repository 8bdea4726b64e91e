//! `procpath creds` — Show a process's resolved credentials.

use clap::Args;
use procpath_core::PathAccess;

use crate::output;

/// Arguments for the `creds` command.
#[derive(Args, Debug)]
pub struct CredsArgs {
    /// Process to inspect.
    pub pid: u32,

    /// Print the credentials as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `creds` command.
///
/// # Errors
///
/// Returns an error if the process status cannot be read or parsed.
pub fn execute(access: &PathAccess, args: CredsArgs) -> anyhow::Result<()> {
    let principal = access.principal(args.pid)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&principal)?);
    } else {
        print!("{}", output::format_principal(&principal));
    }
    Ok(())
}
