//! Linux user namespace plumbing.
//!
//! Writes a validated [`IdmapSet`](crate::idmap::IdmapSet) into a child
//! process's `uid_map`/`gid_map`.

pub mod user;
