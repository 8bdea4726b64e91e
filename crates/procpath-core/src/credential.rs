//! Credential resolution from `/proc/<pid>/status`.
//!
//! Builds the [`Principal`] on whose behalf a path is checked: effective
//! uid/gid, supplementary groups, effective capabilities, and the two
//! anchors (`/proc/<pid>/root`, `/proc/<pid>/cwd`) used as walk bases.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use procpath_common::config::ResolverConfig;
use procpath_common::constants::{PROC_CWD_LINK, PROC_ROOT_LINK, PROC_STATUS_FILE};
use procpath_common::error::{PathAccessError, Result};
use serde::Serialize;

use crate::capability::{Capability, CapabilitySet};

const UID_FIELD: &str = "Uid";
const GID_FIELD: &str = "Gid";
const GROUPS_FIELD: &str = "Groups";
const CAP_EFF_FIELD: &str = "CapEff";

/// Identity of the process an access is evaluated for.
///
/// Built once per check and never modified during the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// Base for absolute paths (the process's root directory view).
    pub root: PathBuf,
    /// Base for relative paths (the process's working directory view).
    pub cwd: PathBuf,
    /// Effective user id.
    pub uid: u32,
    /// Effective group id.
    pub gid: u32,
    /// Supplementary group ids.
    pub groups: Vec<u32>,
    /// Effective capabilities.
    pub caps: CapabilitySet,
}

impl Principal {
    /// Creates a principal with no supplementary groups and no capabilities.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, cwd: impl Into<PathBuf>, uid: u32, gid: u32) -> Self {
        Self {
            root: root.into(),
            cwd: cwd.into(),
            uid,
            gid,
            groups: Vec::new(),
            caps: CapabilitySet::EMPTY,
        }
    }

    /// Replaces the supplementary groups.
    #[must_use]
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = u32>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }

    /// Replaces the effective capability set.
    #[must_use]
    pub const fn with_caps(mut self, caps: CapabilitySet) -> Self {
        self.caps = caps;
        self
    }

    /// Returns `true` if `gid` is the effective or a supplementary group.
    #[must_use]
    pub fn in_group(&self, gid: u32) -> bool {
        self.gid == gid || self.groups.contains(&gid)
    }

    /// Returns `true` if the effective set holds `cap`.
    #[must_use]
    pub const fn has_cap(&self, cap: Capability) -> bool {
        self.caps.contains(cap)
    }

    /// Returns `true` if `path` is one of the two anchors.
    #[must_use]
    pub fn is_anchor(&self, path: &Path) -> bool {
        path == self.root || path == self.cwd
    }
}

/// Reads process credentials from a proc filesystem.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    config: ResolverConfig,
}

impl CredentialResolver {
    /// Creates a resolver reading from the configured proc mount point.
    #[must_use]
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolves the principal of process `pid`.
    ///
    /// The anchors are derived from the pid and are not checked here; a
    /// vanished process surfaces later as a failed walk.
    ///
    /// # Errors
    ///
    /// Returns [`PathAccessError::ProcessNotFound`] if the status record
    /// cannot be opened because the process is gone,
    /// [`PathAccessError::InvalidCredentialFormat`] if a required field is
    /// missing or malformed, and [`PathAccessError::Io`] for other read
    /// failures.
    pub fn resolve(&self, pid: u32) -> Result<Principal> {
        let proc_dir = self.config.process_dir(pid);
        let status_path = proc_dir.join(PROC_STATUS_FILE);

        let file = File::open(&status_path).map_err(|e| read_error(pid, status_path.clone(), e))?;
        let status = StatusFields::parse(BufReader::new(file))
            .map_err(|e| read_error(pid, status_path, e))?;

        let principal = Principal {
            root: proc_dir.join(PROC_ROOT_LINK),
            cwd: proc_dir.join(PROC_CWD_LINK),
            uid: parse_effective_id(UID_FIELD, utf8(UID_FIELD, status.uid.as_deref())?)?,
            gid: parse_effective_id(GID_FIELD, utf8(GID_FIELD, status.gid.as_deref())?)?,
            groups: parse_groups(utf8(GROUPS_FIELD, status.groups.as_deref())?)?,
            caps: parse_caps(utf8(CAP_EFF_FIELD, status.cap_eff.as_deref())?)?,
        };

        tracing::debug!(
            pid,
            uid = principal.uid,
            gid = principal.gid,
            groups = ?principal.groups,
            caps = %principal.caps,
            "resolved principal"
        );
        Ok(principal)
    }
}

/// Raw values of the status rows the resolver cares about.
///
/// Rows are kept as bytes: the kernel copies `Name:` verbatim from the
/// process's `comm`, which the process may set to anything.
#[derive(Debug, Default)]
struct StatusFields {
    uid: Option<Vec<u8>>,
    gid: Option<Vec<u8>>,
    groups: Option<Vec<u8>>,
    cap_eff: Option<Vec<u8>>,
}

impl StatusFields {
    fn parse(reader: impl BufRead) -> std::io::Result<Self> {
        let mut fields = Self::default();
        for line in reader.split(b'\n') {
            let mut line = line?;
            let Some(colon) = line.iter().position(|b| *b == b':') else {
                continue;
            };
            let Ok(key) = std::str::from_utf8(&line[..colon]) else {
                continue;
            };
            let slot = match key {
                UID_FIELD => &mut fields.uid,
                GID_FIELD => &mut fields.gid,
                GROUPS_FIELD => &mut fields.groups,
                CAP_EFF_FIELD => &mut fields.cap_eff,
                _ => continue,
            };
            *slot = Some(line.split_off(colon + 1));
        }
        Ok(fields)
    }
}

/// Decodes a status row value, rejecting anything that is not UTF-8.
fn utf8<'a>(field: &'static str, raw: Option<&'a [u8]>) -> Result<Option<&'a str>> {
    raw.map(|bytes| {
        std::str::from_utf8(bytes).map_err(|_| PathAccessError::InvalidCredentialFormat {
            field,
            value: String::from_utf8_lossy(bytes).trim().to_string(),
        })
    })
    .transpose()
}

fn read_error(pid: u32, path: PathBuf, source: std::io::Error) -> PathAccessError {
    let gone = source.kind() == std::io::ErrorKind::NotFound
        || source.raw_os_error() == Some(Errno::ESRCH as i32);
    if gone {
        PathAccessError::ProcessNotFound { pid }
    } else {
        PathAccessError::Io { path, source }
    }
}

fn invalid(field: &'static str, value: Option<&str>) -> PathAccessError {
    PathAccessError::InvalidCredentialFormat {
        field,
        value: value.unwrap_or_default().trim().to_string(),
    }
}

/// Picks the effective id out of a `real effective saved fs` row.
fn parse_effective_id(field: &'static str, value: Option<&str>) -> Result<u32> {
    let ids = value
        .ok_or_else(|| invalid(field, value))?
        .split_whitespace()
        .map(str::parse::<u32>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| invalid(field, value))?;
    match ids.as_slice() {
        [_, effective, _, _] => Ok(*effective),
        _ => Err(invalid(field, value)),
    }
}

fn parse_groups(value: Option<&str>) -> Result<Vec<u32>> {
    value
        .unwrap_or_default()
        .split_whitespace()
        .map(|g| g.parse::<u32>().map_err(|_| invalid(GROUPS_FIELD, value)))
        .collect()
}

fn parse_caps(value: Option<&str>) -> Result<CapabilitySet> {
    value
        .and_then(CapabilitySet::from_hex)
        .ok_or_else(|| invalid(CAP_EFF_FIELD, value))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const STATUS: &str = "Name:\tbash
Umask:\t0022
State:\tS (sleeping)
Pid:\t4242
Uid:\t1000\t1001\t1002\t1003
Gid:\t100\t101\t102\t103
FDSize:\t256
Groups:\t4 24 27 \t
CapInh:\t0000000000000000
CapPrm:\t0000000000000000
CapEff:\t0000000000000006
CapBnd:\t000001ffffffffff
";

    fn fake_proc(status: &str) -> (tempfile::TempDir, CredentialResolver) {
        let dir = tempfile::tempdir().expect("tempdir");
        let pid_dir = dir.path().join("4242");
        std::fs::create_dir_all(&pid_dir).expect("mkdir");
        std::fs::write(pid_dir.join("status"), status).expect("write status");
        let resolver = CredentialResolver::new(ResolverConfig::with_proc_root(dir.path()));
        (dir, resolver)
    }

    #[test]
    fn status_parse_keeps_only_known_rows() {
        let fields = StatusFields::parse(Cursor::new(STATUS)).expect("parse");
        assert_eq!(fields.uid.as_deref(), Some(&b"\t1000\t1001\t1002\t1003"[..]));
        assert_eq!(fields.cap_eff.as_deref(), Some(&b"\t0000000000000006"[..]));
        assert!(fields.groups.is_some());
    }

    #[test]
    fn binary_process_name_does_not_break_parsing() {
        let mut status = b"Name:\tx\xff\n".to_vec();
        status.extend_from_slice(STATUS.replace("Name:\tbash\n", "").as_bytes());
        let fields = StatusFields::parse(Cursor::new(&status)).expect("parse");
        assert_eq!(fields.gid.as_deref(), Some(&b"\t100\t101\t102\t103"[..]));

        let (dir, resolver) = fake_proc(STATUS);
        std::fs::write(dir.path().join("4242/status"), &status).expect("write status");
        let principal = resolver.resolve(4242).expect("resolve");
        assert_eq!(principal.uid, 1001);
        assert_eq!(principal.groups, vec![4, 24, 27]);
    }

    #[test]
    fn non_utf8_credential_row_is_rejected() {
        let mut status = b"Uid:\t1000\t\xfe1001\t1002\t1003\n".to_vec();
        status.extend_from_slice(
            STATUS
                .replace("Uid:\t1000\t1001\t1002\t1003\n", "")
                .as_bytes(),
        );
        let (dir, resolver) = fake_proc(STATUS);
        std::fs::write(dir.path().join("4242/status"), &status).expect("write status");
        let err = resolver.resolve(4242).expect_err("should fail");
        assert!(matches!(
            err,
            PathAccessError::InvalidCredentialFormat { field: "Uid", .. }
        ));
    }

    #[test]
    fn resolve_reads_effective_credentials() {
        let (dir, resolver) = fake_proc(STATUS);
        let principal = resolver.resolve(4242).expect("resolve");
        assert_eq!(principal.uid, 1001);
        assert_eq!(principal.gid, 101);
        assert_eq!(principal.groups, vec![4, 24, 27]);
        assert!(principal.has_cap(Capability::DacOverride));
        assert!(principal.has_cap(Capability::DacReadSearch));
        assert!(!principal.has_cap(Capability::Chown));
        assert_eq!(principal.root, dir.path().join("4242/root"));
        assert_eq!(principal.cwd, dir.path().join("4242/cwd"));
    }

    #[test]
    fn resolve_missing_process_is_process_not_found() {
        let (_dir, resolver) = fake_proc(STATUS);
        let err = resolver.resolve(1).expect_err("should fail");
        assert!(matches!(err, PathAccessError::ProcessNotFound { pid: 1 }));
    }

    #[test]
    fn empty_groups_row_yields_no_groups() {
        let status = STATUS.replace("Groups:\t4 24 27 \t", "Groups:");
        let (_dir, resolver) = fake_proc(&status);
        assert!(resolver.resolve(4242).expect("resolve").groups.is_empty());
    }

    #[test]
    fn missing_groups_row_yields_no_groups() {
        let status = STATUS.replace("Groups:\t4 24 27 \t\n", "");
        let (_dir, resolver) = fake_proc(&status);
        assert!(resolver.resolve(4242).expect("resolve").groups.is_empty());
    }

    #[test]
    fn uid_row_with_three_values_is_rejected() {
        let status = STATUS.replace("Uid:\t1000\t1001\t1002\t1003", "Uid:\t1000\t1001\t1002");
        let (_dir, resolver) = fake_proc(&status);
        let err = resolver.resolve(4242).expect_err("should fail");
        assert!(matches!(
            err,
            PathAccessError::InvalidCredentialFormat { field: "Uid", .. }
        ));
    }

    #[test]
    fn missing_gid_row_is_rejected() {
        let status = STATUS.replace("Gid:\t100\t101\t102\t103\n", "");
        let (_dir, resolver) = fake_proc(&status);
        let err = resolver.resolve(4242).expect_err("should fail");
        assert!(matches!(
            err,
            PathAccessError::InvalidCredentialFormat { field: "Gid", .. }
        ));
    }

    #[test]
    fn non_numeric_group_is_rejected() {
        let status = STATUS.replace("Groups:\t4 24 27 \t", "Groups:\t4 wheel");
        let (_dir, resolver) = fake_proc(&status);
        let err = resolver.resolve(4242).expect_err("should fail");
        assert!(matches!(
            err,
            PathAccessError::InvalidCredentialFormat { field: "Groups", .. }
        ));
    }

    #[test]
    fn malformed_cap_eff_is_rejected() {
        let status = STATUS.replace("CapEff:\t0000000000000006", "CapEff:\tnot-hex");
        let (_dir, resolver) = fake_proc(&status);
        let err = resolver.resolve(4242).expect_err("should fail");
        assert!(matches!(
            err,
            PathAccessError::InvalidCredentialFormat { field: "CapEff", .. }
        ));
    }

    #[test]
    fn effective_id_requires_four_integers() {
        assert_eq!(parse_effective_id("Uid", Some(" 0 5 0 0")).expect("ok"), 5);
        assert!(parse_effective_id("Uid", Some("0 5 0 x")).is_err());
        assert!(parse_effective_id("Uid", Some("0 5 0 0 0")).is_err());
        assert!(parse_effective_id("Uid", None).is_err());
    }

    #[test]
    fn in_group_checks_primary_and_supplementary() {
        let principal = Principal::new("/r", "/c", 1, 10).with_groups([20, 30, 20]);
        assert!(principal.in_group(10));
        assert!(principal.in_group(30));
        assert!(!principal.in_group(40));
    }

    #[test]
    fn resolve_self_reads_live_status() {
        let resolver = CredentialResolver::default();
        let principal = resolver.resolve(std::process::id()).expect("resolve self");
        assert_eq!(principal.uid, nix::unistd::geteuid().as_raw());
        assert_eq!(principal.gid, nix::unistd::getegid().as_raw());
    }
}
