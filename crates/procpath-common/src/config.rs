//! Configuration model for credential resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings shared by the credential resolver and the path access entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Mount point of the proc filesystem holding `<pid>/status`,
    /// `<pid>/root` and `<pid>/cwd`.
    pub proc_root: PathBuf,
}

impl ResolverConfig {
    /// Creates a configuration reading process records under `proc_root`.
    #[must_use]
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Returns the `/proc/<pid>` directory for the given process.
    #[must_use]
    pub fn process_dir(&self, pid: u32) -> PathBuf {
        self.proc_root.join(pid.to_string())
    }

    /// Returns the proc filesystem mount point.
    #[must_use]
    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(crate::constants::DEFAULT_PROC_ROOT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reads_from_proc() {
        let config = ResolverConfig::default();
        assert_eq!(config.proc_root(), Path::new("/proc"));
        assert_eq!(config.process_dir(42), PathBuf::from("/proc/42"));
    }

    #[test]
    fn config_deserializes_from_json() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"proc_root":"/host/proc"}"#).expect("parse");
        assert_eq!(config, ResolverConfig::with_proc_root("/host/proc"));
    }
}
