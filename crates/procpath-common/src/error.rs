//! Unified error type for the procpath workspace.
//!
//! Every failure of a path access check is terminal and maps to exactly one
//! variant below. Callers must treat any error as "access not granted".

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Error returned by credential resolution and path walking.
#[derive(Debug, Error)]
pub enum PathAccessError {
    /// The status record of the target process could not be opened.
    #[error("process {pid} not found")]
    ProcessNotFound {
        /// Process that was queried.
        pid: u32,
    },

    /// The status record exists but a required field is missing or malformed.
    #[error("invalid credential format in field {field}: {value:?}")]
    InvalidCredentialFormat {
        /// Status field that failed to parse (`Uid`, `Gid`, `Groups`, `CapEff`).
        field: &'static str,
        /// Raw value of the field, empty when the field was absent.
        value: String,
    },

    /// A path component does not exist.
    #[error("no such file or directory: {path}")]
    NotFound {
        /// Path that was being resolved.
        path: PathBuf,
    },

    /// A non-final path component is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// Entry that should have been a directory.
        path: PathBuf,
    },

    /// The principal lacks search permission on an intermediate component
    /// or the requested mode on the final one.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// Entry on which the permission check failed.
        path: PathBuf,
    },

    /// Symlink resolution exceeded the hop limit.
    #[error("too many levels of symbolic links: {path}")]
    TooManyLinks {
        /// Symlink at which the limit was hit.
        path: PathBuf,
    },

    /// The input path is longer than the platform allows.
    #[error("path name too long ({len} bytes)")]
    NameTooLong {
        /// Length of the rejected path in bytes.
        len: usize,
    },

    /// Any other I/O failure while reading process or file metadata.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl PathAccessError {
    /// Returns the errno the kernel reports for the same condition.
    ///
    /// Unclassified I/O errors carry their own OS error code; when there is
    /// none, `EIO` is returned.
    #[must_use]
    pub fn errno(&self) -> Errno {
        match self {
            Self::ProcessNotFound { .. } => Errno::ESRCH,
            Self::InvalidCredentialFormat { .. } => Errno::EINVAL,
            Self::NotFound { .. } => Errno::ENOENT,
            Self::NotADirectory { .. } => Errno::ENOTDIR,
            Self::PermissionDenied { .. } => Errno::EACCES,
            Self::TooManyLinks { .. } => Errno::ELOOP,
            Self::NameTooLong { .. } => Errno::ENAMETOOLONG,
            Self::Io { source, .. } => source.raw_os_error().map_or(Errno::EIO, Errno::from_raw),
        }
    }

    /// Returns `true` if the error is an access decision about the path
    /// rather than a failure to obtain the process credentials or metadata.
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NotADirectory { .. }
                | Self::PermissionDenied { .. }
                | Self::TooManyLinks { .. }
                | Self::NameTooLong { .. }
        )
    }

    /// Classifies a failed metadata syscall on `path`.
    ///
    /// Errnos with a dedicated variant map onto it; everything else is
    /// reported as [`PathAccessError::Io`].
    #[must_use]
    pub fn from_errno(errno: Errno, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match errno {
            Errno::ENOENT => Self::NotFound { path },
            Errno::ENOTDIR => Self::NotADirectory { path },
            Errno::ELOOP => Self::TooManyLinks { path },
            Errno::ENAMETOOLONG => Self::NameTooLong {
                len: path.as_os_str().len(),
            },
            other => Self::Io {
                path,
                source: other.into(),
            },
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PathAccessError>;
