//! Component-by-component path resolution following `path_resolution(7)`.
//!
//! The walk starts at the principal's root (absolute paths) or working
//! directory (relative paths) and visits every component in order:
//!
//! - empty components are skipped, `.` stays in place, `..` climbs to the
//!   parent but never above the root, or above the starting anchor when
//!   the walk never entered the root;
//! - symlinks are followed by splicing their target into the remaining
//!   components, with absolute targets restarting at the root; at most
//!   [`SYMLINK_MAX`] links are followed per walk;
//! - every intermediate component must be a directory the principal can
//!   search, and the final component must grant the requested mode.
//!
//! The anchors themselves are magic links into another namespace and are
//! never followed as symlinks.
//!
//! Results are a snapshot: the filesystem may change between the check and
//! any later use of the path.

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::sys::stat::{FileStat, SFlag, lstat, stat};
use procpath_common::constants::SYMLINK_MAX;
use procpath_common::error::{PathAccessError, Result};
use procpath_common::types::AccessMode;

use crate::credential::Principal;
use crate::permission::{self, EntryMeta};

#[allow(clippy::cast_sign_loss)]
const PATH_MAX: usize = libc::PATH_MAX as usize;

/// Checks that `principal` can reach `path` and access it with `mode`.
///
/// An empty `mode` only checks that the path resolves and every
/// intermediate directory is searchable. A trailing `/` requires the final
/// component to be a directory. A path made only of `/` designates the
/// anchor itself.
///
/// # Errors
///
/// - [`PathAccessError::NotFound`] if `path` is empty or a component does not exist.
/// - [`PathAccessError::NameTooLong`] if `path` does not fit in `PATH_MAX`.
/// - [`PathAccessError::NotADirectory`] if an intermediate component is not a directory.
/// - [`PathAccessError::TooManyLinks`] if more than [`SYMLINK_MAX`] symlinks are followed.
/// - [`PathAccessError::PermissionDenied`] if search or the requested mode is refused.
/// - [`PathAccessError::Io`] if reading metadata fails for any other reason.
pub fn walk(principal: &Principal, path: impl AsRef<Path>, mode: AccessMode) -> Result<()> {
    let path = path.as_ref();
    let bytes = path.as_os_str().as_bytes();

    if bytes.is_empty() {
        return Err(PathAccessError::NotFound {
            path: PathBuf::new(),
        });
    }
    if bytes.len() + 1 > PATH_MAX {
        return Err(PathAccessError::NameTooLong { len: bytes.len() });
    }

    let anchor = if bytes.starts_with(b"/") {
        principal.root.as_path()
    } else {
        principal.cwd.as_path()
    };

    tracing::debug!(
        path = %path.display(),
        %mode,
        anchor = %anchor.display(),
        "walking path"
    );

    let result = Walk::new(principal, anchor, mode, path.as_os_str()).run();
    match &result {
        Ok(()) => tracing::debug!(path = %path.display(), %mode, "access granted"),
        Err(e) => tracing::debug!(path = %path.display(), %mode, error = %e, "access refused"),
    }
    result
}

/// A single path component.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Current,
    Parent,
    Name(OsString),
}

impl Step {
    fn from_bytes(component: &[u8]) -> Self {
        match component {
            b"." => Self::Current,
            b".." => Self::Parent,
            name => Self::Name(OsStr::from_bytes(name).to_os_string()),
        }
    }
}

/// A component waiting to be visited.
#[derive(Debug)]
struct Pending {
    step: Step,
    /// Last component of the whole walk; checked against the requested mode.
    last: bool,
    /// The component was followed by a `/` and must be a directory.
    trailing_slash: bool,
}

/// Splits `path` on `/`, dropping empty components.
///
/// Returns the components and whether `path` ends with a slash. A path
/// without components yields a single [`Step::Current`] so that the
/// starting point itself gets visited.
fn split(path: &OsStr) -> (Vec<Step>, bool) {
    let bytes = path.as_bytes();
    let mut steps: Vec<Step> = bytes
        .split(|b| *b == b'/')
        .filter(|c| !c.is_empty())
        .map(Step::from_bytes)
        .collect();
    if steps.is_empty() {
        steps.push(Step::Current);
    }
    (steps, bytes.ends_with(b"/"))
}

/// State of one walk.
struct Walk<'a> {
    principal: &'a Principal,
    anchor: &'a Path,
    mode: AccessMode,
    cur: PathBuf,
    links: u32,
    pending: VecDeque<Pending>,
}

impl<'a> Walk<'a> {
    fn new(principal: &'a Principal, anchor: &'a Path, mode: AccessMode, path: &OsStr) -> Self {
        let mut walk = Self {
            principal,
            anchor,
            mode,
            cur: anchor.to_path_buf(),
            links: 0,
            pending: VecDeque::new(),
        };
        walk.splice(path, true, false);
        walk
    }

    fn run(mut self) -> Result<()> {
        while let Some(item) = self.pending.pop_front() {
            self.advance(item)?;
        }
        Ok(())
    }

    /// Queues the components of `path` ahead of the remaining ones.
    ///
    /// `last` and `trailing_slash` describe the component being replaced
    /// and carry over to the final component of `path`.
    fn splice(&mut self, path: &OsStr, last: bool, trailing_slash: bool) {
        let (steps, ends_with_slash) = split(path);
        let count = steps.len();
        for (i, step) in steps.into_iter().enumerate().rev() {
            let is_tail = i + 1 == count;
            self.pending.push_front(Pending {
                step,
                last: last && is_tail,
                trailing_slash: is_tail && (trailing_slash || ends_with_slash),
            });
        }
    }

    fn advance(&mut self, item: Pending) -> Result<()> {
        match &item.step {
            Step::Current => {}
            Step::Parent => self.climb(),
            Step::Name(name) => {
                let candidate = self.cur.join(name);
                let st = lstat(&candidate)
                    .map_err(|e| PathAccessError::from_errno(e, candidate.clone()))?;
                if is_symlink(&st) && !self.principal.is_anchor(&candidate) {
                    return self.follow(candidate, &item);
                }
                self.cur = candidate;
            }
        }

        tracing::trace!(
            component = ?item.step,
            cur = %self.cur.display(),
            last = item.last,
            "visiting"
        );
        self.check_current(&item)
    }

    /// Moves to the parent of the current path, clamped at the root.
    fn climb(&mut self) {
        let principal = self.principal;
        let floor = if self.cur.starts_with(&principal.root) {
            principal.root.as_path()
        } else {
            self.anchor
        };
        self.cur = match self.cur.parent() {
            Some(parent) if parent.starts_with(floor) => parent.to_path_buf(),
            _ => floor.to_path_buf(),
        };
    }

    /// Replaces the symlink at `link` with its target.
    fn follow(&mut self, link: PathBuf, item: &Pending) -> Result<()> {
        if self.links >= SYMLINK_MAX {
            return Err(PathAccessError::TooManyLinks { path: link });
        }
        self.links += 1;

        let target = nix::fcntl::readlink(&link)
            .map_err(|e| PathAccessError::from_errno(e, link.clone()))?;
        tracing::trace!(
            link = %link.display(),
            target = ?target,
            hops = self.links,
            "following symlink"
        );

        if target.as_bytes().starts_with(b"/") {
            self.cur.clone_from(&self.principal.root);
        }
        self.splice(&target, item.last, item.trailing_slash);
        Ok(())
    }

    /// Checks the entry the walk currently points at.
    fn check_current(&self, item: &Pending) -> Result<()> {
        // Follows the anchors' magic links; everything else is already resolved.
        let st = stat(&self.cur).map_err(|e| PathAccessError::from_errno(e, self.cur.clone()))?;
        let entry = EntryMeta::from_stat(&st);

        if (!item.last || item.trailing_slash) && !entry.is_dir {
            return Err(PathAccessError::NotADirectory {
                path: self.cur.clone(),
            });
        }

        let wanted = if item.last {
            self.mode
        } else {
            AccessMode::EXECUTE
        };
        if !permission::check(self.principal, &entry, wanted) {
            return Err(PathAccessError::PermissionDenied {
                path: self.cur.clone(),
            });
        }
        Ok(())
    }
}

fn is_symlink(st: &FileStat) -> bool {
    SFlag::from_bits_truncate(st.st_mode & SFlag::S_IFMT.bits()) == SFlag::S_IFLNK
}
