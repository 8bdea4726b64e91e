//! Formatted output helpers for CLI commands.

use std::path::Path;

use procpath_core::credential::Principal;
use procpath_core::{AccessMode, PathAccessError};
use serde::Serialize;

/// Outcome of a `check` command, as printed to the user.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Process the check was evaluated for.
    pub pid: u32,
    /// Path as given on the command line.
    pub path: String,
    /// Requested mode in `rwx` form.
    pub mode: String,
    /// Whether the access would be allowed.
    pub granted: bool,
    /// Whether a refusal is an access decision rather than a failure to
    /// evaluate the check (unreadable credentials, I/O errors).
    pub denied: bool,
    /// Error message when not granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Kernel errno name when not granted (e.g. `EACCES`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<String>,
}

impl CheckReport {
    /// Builds a report from a check result.
    #[must_use]
    pub fn new(pid: u32, path: &Path, mode: AccessMode, error: Option<&PathAccessError>) -> Self {
        Self {
            pid,
            path: path.display().to_string(),
            mode: mode.to_string(),
            granted: error.is_none(),
            denied: error.is_some_and(PathAccessError::is_denial),
            error: error.map(ToString::to_string),
            errno: error.map(|e| format!("{:?}", e.errno())),
        }
    }

    /// One-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match (&self.errno, &self.error) {
            (Some(errno), Some(error)) => format!(
                "{:<7} pid={} mode={} path={} ({errno}: {error})",
                if self.denied { "denied" } else { "failed" },
                self.pid,
                self.mode,
                self.path
            ),
            _ => format!(
                "granted pid={} mode={} path={}",
                self.pid, self.mode, self.path
            ),
        }
    }
}

/// Renders a principal as aligned `key: value` lines.
#[must_use]
pub fn format_principal(principal: &Principal) -> String {
    let groups = principal
        .groups
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let caps = principal
        .caps
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(",");

    [
        ("uid:", principal.uid.to_string()),
        ("gid:", principal.gid.to_string()),
        ("groups:", groups),
        ("caps:", format!("{} {caps}", principal.caps)),
        ("root:", principal.root.display().to_string()),
        ("cwd:", principal.cwd.display().to_string()),
    ]
    .into_iter()
    .map(|(key, value)| format!("{key:<8} {value}\n"))
    .collect()
}
