//! # idmapd-core
//!
//! The namespace id mapping engine of the idmapd daemon.
//!
//! This crate provides:
//! - **Id maps**: entries, coalesced ranges, and sets with overlap checks,
//!   range splitting, and per-id translation in both directions.
//! - **Grants**: readers for subordinate id files and live kernel id maps.
//! - **Validation**: checks that a mapping only uses host ids the current
//!   namespace can grant.
//! - **Filesystem**: recursive, symlink-safe re-owning of a root filesystem.
//! - **Namespace**: writing a mapping into a child's kernel id maps.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod filesystem;
pub mod grants;
pub mod idmap;
pub mod namespace;
pub mod validate;

pub use idmap::{IdRange, IdmapEntry, IdmapSet};
pub use validate::resolve_idmap;
