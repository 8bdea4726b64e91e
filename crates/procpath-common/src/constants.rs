//! System-wide constants and default paths.

/// Default mount point of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Maximum number of symlinks followed during a single path walk.
///
/// Same bound the kernel applies before failing with `ELOOP`.
pub const SYMLINK_MAX: u32 = 40;

/// Per-process status record, relative to `/proc/<pid>`.
pub const PROC_STATUS_FILE: &str = "status";

/// Per-process root directory magic link, relative to `/proc/<pid>`.
pub const PROC_ROOT_LINK: &str = "root";

/// Per-process working directory magic link, relative to `/proc/<pid>`.
pub const PROC_CWD_LINK: &str = "cwd";

/// Application name used in CLI output.
pub const APP_NAME: &str = "procpath";

/// Environment variable overriding the proc filesystem mount point.
pub const PROC_ROOT_ENV: &str = "PROCPATH_PROC_ROOT";
