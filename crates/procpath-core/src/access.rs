//! Entry point: can process `pid` access `path` with a given mode?

use std::path::Path;

use procpath_common::config::ResolverConfig;
use procpath_common::error::{PathAccessError, Result};
use procpath_common::types::AccessMode;

use crate::credential::{CredentialResolver, Principal};
use crate::walker;

/// Checks path accesses on behalf of other processes.
///
/// Holds no state between calls: every check resolves the process
/// credentials afresh, so one instance can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct PathAccess {
    config: ResolverConfig,
    resolver: CredentialResolver,
}

impl PathAccess {
    /// Creates a checker reading process records as configured.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            resolver: CredentialResolver::new(config.clone()),
            config,
        }
    }

    /// Resolves the credentials of `pid` without walking any path.
    ///
    /// # Errors
    ///
    /// See [`CredentialResolver::resolve`].
    pub fn principal(&self, pid: u32) -> Result<Principal> {
        self.resolver.resolve(pid)
    }

    /// Checks whether process `pid` can access `path` with `mode`.
    ///
    /// Absolute paths resolve against the process's root directory,
    /// relative ones against its working directory.
    ///
    /// # Errors
    ///
    /// Returns the credential resolution error unchanged, or the walk error
    /// described in [`walker::walk`]. A lookup failure caused by the process
    /// exiting mid-check is reported as [`PathAccessError::ProcessNotFound`].
    pub fn check(&self, pid: u32, path: impl AsRef<Path>, mode: AccessMode) -> Result<()> {
        let principal = self.resolver.resolve(pid)?;
        walker::walk(&principal, path, mode).map_err(|e| self.classify(pid, e))
    }

    /// Anchors vanish together with the process; report that instead of a
    /// missing path component.
    fn classify(&self, pid: u32, err: PathAccessError) -> PathAccessError {
        let lookup_failed = matches!(
            err,
            PathAccessError::NotFound { .. } | PathAccessError::Io { .. }
        );
        if lookup_failed && !self.config.process_dir(pid).exists() {
            tracing::debug!(pid, error = %err, "process exited during walk");
            return PathAccessError::ProcessNotFound { pid };
        }
        err
    }
}

/// Checks whether process `pid` can access `path` with `mode`, reading
/// process records from `/proc`.
///
/// # Errors
///
/// See [`PathAccess::check`].
pub fn path_access(pid: u32, path: impl AsRef<Path>, mode: AccessMode) -> Result<()> {
    PathAccess::default().check(pid, path, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_failure_of_exited_process_becomes_process_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let access = PathAccess::new(ResolverConfig::with_proc_root(dir.path()));
        let err = access.classify(7, PathAccessError::NotFound { path: "/x".into() });
        assert!(matches!(err, PathAccessError::ProcessNotFound { pid: 7 }));
    }

    #[test]
    fn lookup_failure_of_live_process_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("7")).expect("pid dir");
        let access = PathAccess::new(ResolverConfig::with_proc_root(dir.path()));
        let err = access.classify(7, PathAccessError::NotFound { path: "/x".into() });
        assert!(matches!(err, PathAccessError::NotFound { .. }));
    }

    #[test]
    fn denials_are_never_reclassified() {
        let dir = tempfile::tempdir().expect("tempdir");
        let access = PathAccess::new(ResolverConfig::with_proc_root(dir.path()));
        let err = access.classify(7, PathAccessError::PermissionDenied { path: "/x".into() });
        assert!(matches!(err, PathAccessError::PermissionDenied { .. }));
    }
}
