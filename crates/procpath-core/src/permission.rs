//! Discretionary access control checks on a single filesystem entry.
//!
//! Owner, group and other classes are tried in turn and each may grant on
//! its own: a uid match whose owner bits fall short does not stop the group
//! or other bits from granting. Capability overrides apply only after all
//! three classes refused.

use nix::sys::stat::{FileStat, SFlag};
use procpath_common::types::AccessMode;

use crate::capability::Capability;
use crate::credential::Principal;

const OWNER_SHIFT: u32 = 6;
const GROUP_SHIFT: u32 = 3;
const CLASS_MASK: u32 = 0o7;
const PERM_MASK: u32 = 0o777;
const ANY_EXECUTE: u32 = 0o111;

/// Ownership and mode of a filesystem entry that is not a symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Permission bits (`rwxrwxrwx`).
    pub mode: u32,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl EntryMeta {
    /// Extracts the metadata relevant to permission checks from a `stat` result.
    #[must_use]
    pub fn from_stat(st: &FileStat) -> Self {
        let file_type = SFlag::from_bits_truncate(st.st_mode & SFlag::S_IFMT.bits());
        Self {
            uid: st.st_uid,
            gid: st.st_gid,
            mode: st.st_mode & PERM_MASK,
            is_dir: file_type == SFlag::S_IFDIR,
        }
    }

    const fn class_bits(self, shift: u32) -> u32 {
        (self.mode >> shift) & CLASS_MASK
    }
}

/// Returns `true` if `principal` may access `entry` with every bit of `mode`.
#[must_use]
pub fn check(principal: &Principal, entry: &EntryMeta, mode: AccessMode) -> bool {
    let wanted = mode.bits();
    let covers = |bits: u32| wanted & bits == wanted;

    if entry.uid == principal.uid && covers(entry.class_bits(OWNER_SHIFT)) {
        tracing::trace!(class = "owner", %mode, "granted");
        return true;
    }

    if principal.in_group(entry.gid) && covers(entry.class_bits(GROUP_SHIFT)) {
        tracing::trace!(class = "group", %mode, "granted");
        return true;
    }

    if covers(entry.class_bits(0)) {
        tracing::trace!(class = "other", %mode, "granted");
        return true;
    }

    if principal.has_cap(Capability::DacOverride) {
        // Execute on a regular file still needs one execute bit somewhere.
        let granted = entry.is_dir
            || !mode.contains(AccessMode::EXECUTE)
            || entry.mode & ANY_EXECUTE != 0;
        if granted {
            tracing::trace!(cap = %Capability::DacOverride, %mode, "granted");
            return true;
        }
    }

    if principal.has_cap(Capability::DacReadSearch) {
        let granted = if entry.is_dir {
            !mode.contains(AccessMode::WRITE)
        } else {
            mode == AccessMode::READ
        };
        if granted {
            tracing::trace!(cap = %Capability::DacReadSearch, %mode, "granted");
            return true;
        }
    }

    tracing::trace!(
        uid = entry.uid,
        gid = entry.gid,
        perm = entry.mode,
        requested = %mode,
        "denied"
    );
    false
}
