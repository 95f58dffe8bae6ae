//! User namespace id maps.
//!
//! Writes an [`IdmapSet`] into `/proc/<pid>/uid_map` and `gid_map`, in the
//! kernel's `<ns> <host> <len>` format. Each file can only be written once
//! per namespace, so both maps are built in full before anything is written.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use idmapd_common::error::{IdmapError, Result};
use idmapd_common::types::Channels;
use nix::unistd::Pid;

use crate::idmap::IdmapSet;

/// Kernel map file contents for one channel of `set`.
#[must_use]
pub fn kernel_map_contents(set: &IdmapSet, channel: Channels) -> String {
    let mut contents = String::new();
    for entry in set.entries().iter().filter(|e| e.channels().covers(channel)) {
        let _ = writeln!(contents, "{} {} {}", entry.ns_id(), entry.host_id(), entry.range());
    }
    contents
}

/// `/proc/<pid>`, or `/proc/self` when `pid` is `None`.
#[must_use]
pub fn proc_dir(pid: Option<Pid>) -> PathBuf {
    pid.map_or_else(
        || PathBuf::from("/proc/self"),
        |pid| PathBuf::from(format!("/proc/{pid}")),
    )
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| IdmapError::io(path, e))
}

/// Writes `set` into the id map files under `proc_dir`.
///
/// With `deny_setgroups`, `setgroups` is set to `deny` first when present,
/// as unprivileged writers must.
///
/// # Errors
///
/// Returns an error if the set has no entry for a channel, or if writing
/// `setgroups`, `uid_map`, or `gid_map` fails.
pub fn write_id_maps_at(proc_dir: &Path, set: &IdmapSet, deny_setgroups: bool) -> Result<()> {
    let uid_map = kernel_map_contents(set, Channels::UID);
    let gid_map = kernel_map_contents(set, Channels::GID);
    if uid_map.is_empty() || gid_map.is_empty() {
        return Err(IdmapError::Config {
            message: "id map needs both uid and gid entries".into(),
        });
    }

    if deny_setgroups {
        let setgroups = proc_dir.join("setgroups");
        if setgroups.exists() {
            write_file(&setgroups, "deny")?;
        }
    }
    write_file(&proc_dir.join("uid_map"), &uid_map)?;
    write_file(&proc_dir.join("gid_map"), &gid_map)?;

    tracing::debug!(proc = %proc_dir.display(), entries = set.len(), "wrote uid/gid maps");
    Ok(())
}

/// Writes `set` into the id maps of process `pid` (or of this process).
///
/// # Errors
///
/// See [`write_id_maps_at`].
pub fn write_id_maps(pid: Option<Pid>, set: &IdmapSet, deny_setgroups: bool) -> Result<()> {
    write_id_maps_at(&proc_dir(pid), set, deny_setgroups)
}
