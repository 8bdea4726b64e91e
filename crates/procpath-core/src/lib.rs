//! # procpath-core
//!
//! Decides whether a process may access a filesystem path, without
//! performing the access and without entering the process's namespaces.
//!
//! The crate re-implements the kernel's `path_resolution(7)` walk and its
//! discretionary permission model from user space:
//! - **Credentials**: effective ids, supplementary groups and effective
//!   capabilities read from `/proc/<pid>/status`.
//! - **Permission checks**: owner/group/other bits plus the
//!   `CAP_DAC_OVERRIDE` and `CAP_DAC_READ_SEARCH` overrides.
//! - **Path walking**: `.`, `..` and symlink handling relative to the
//!   process's root and working directory.
//!
//! ACLs are not consulted and nothing is cached. The caller needs enough
//! privilege to read the target's `/proc` entries and the walked paths.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod access;
pub mod capability;
pub mod credential;
pub mod permission;
pub mod walker;

pub use access::{PathAccess, path_access};
pub use procpath_common::error::{PathAccessError, Result};
pub use procpath_common::types::AccessMode;
