//! Discovery of the id ranges the kernel or an administrator has granted.
//!
//! Two sources are read, neither cached:
//! - subordinate id grant files (`/etc/subuid`, `/etc/subgid`), used to
//!   build a default allocation for new containers;
//! - the live id maps of this process (`/proc/self/uid_map`, `gid_map`),
//!   used to check what the current namespace can actually hand out.

use std::path::Path;

use idmapd_common::config::IdmapdConfig;
use idmapd_common::constants::{FALLBACK_HOST_ID, FALLBACK_RANGE, MIN_USEFUL_GRANT};
use idmapd_common::error::{IdmapError, Result};
use idmapd_common::types::Channels;

use crate::idmap::{IdmapEntry, IdmapSet};

/// One `name:start:count` line of a subordinate id grant file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubidGrant {
    /// First granted host id.
    pub start: i64,
    /// Number of granted ids.
    pub count: i64,
}

/// One `ns host count` line of a live id map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelMapLine {
    /// First id inside the namespace.
    pub ns_id: i64,
    /// First id in the parent namespace.
    pub host_id: i64,
    /// Number of mapped ids.
    pub count: i64,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| IdmapError::io(path, e))
}

/// Strips a `#` comment and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

fn parse_u32(field: &str) -> Option<i64> {
    field.trim().parse::<u32>().ok().map(i64::from)
}

/// Reads every grant for `user` from a subordinate id file.
///
/// Usernames compare case-insensitively. Lines whose numbers don't parse
/// are skipped.
///
/// # Errors
///
/// Returns an error if the file can't be read, a line has fewer than three
/// fields, or no line matches `user`.
pub fn read_subid_grants(path: &Path, user: &str) -> Result<Vec<SubidGrant>> {
    let content = read(path)?;
    let mut grants = Vec::new();

    for line in content.lines().map(strip_comment) {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < 3 {
            return Err(IdmapError::format(
                line,
                format!("unexpected values in {}", path.display()),
            ));
        }
        if !fields[0].eq_ignore_ascii_case(user) {
            continue;
        }
        let (Some(start), Some(count)) = (parse_u32(fields[1]), parse_u32(fields[2])) else {
            tracing::warn!(path = %path.display(), line, "skipping unparsable grant");
            continue;
        };
        tracing::debug!(path = %path.display(), user, start, count, "found grant");
        grants.push(SubidGrant { start, count });
    }

    if grants.is_empty() {
        return Err(IdmapError::NoSuchUser {
            user: user.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(grants)
}

/// Reads the lines of a live `uid_map`/`gid_map` file.
///
/// Lines whose numbers don't parse are skipped.
///
/// # Errors
///
/// Returns an error if the file can't be read, a line has fewer than three
/// fields, or no line parses at all.
pub fn read_kernel_map(path: &Path) -> Result<Vec<KernelMapLine>> {
    let content = read(path)?;
    let mut lines = Vec::new();

    for line in content.lines().map(strip_comment) {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(IdmapError::format(
                line,
                format!("unexpected values in {}", path.display()),
            ));
        }
        let (Some(ns_id), Some(host_id), Some(count)) = (
            parse_u32(fields[0]),
            parse_u32(fields[1]),
            parse_u32(fields[2]),
        ) else {
            tracing::warn!(path = %path.display(), line, "skipping unparsable map line");
            continue;
        };
        lines.push(KernelMapLine {
            ns_id,
            host_id,
            count,
        });
    }

    if lines.is_empty() {
        return Err(IdmapError::EmptyMapping {
            path: path.to_path_buf(),
        });
    }
    Ok(lines)
}

fn shadow_tools_available(config: &IdmapdConfig) -> bool {
    which::which(&config.newuidmap).is_ok()
        && which::which(&config.newgidmap).is_ok()
        && config.subuid_path.exists()
        && config.subgid_path.exists()
}

/// First grant large enough to back a whole container, as a single entry.
fn first_useful_grant(path: &Path, user: &str, channels: Channels) -> Result<Option<IdmapEntry>> {
    let grants = read_subid_grants(path, user)?;
    let Some(grant) = grants.iter().find(|g| g.count >= MIN_USEFUL_GRANT) else {
        tracing::warn!(path = %path.display(), user, "no grant of at least {MIN_USEFUL_GRANT} ids");
        return Ok(None);
    };
    IdmapEntry::new(channels, 0, grant.start, grant.count).map(Some)
}

/// Builds the default allocation for new containers.
///
/// When the `newuidmap`/`newgidmap` helpers and both grant files are
/// present, the first grant of at least 65536 ids for the configured owner
/// backs namespace ids from 0, separately for uids and gids. Otherwise a
/// single combined fallback entry is used.
///
/// # Errors
///
/// Returns an error if a grant file is unreadable, malformed, or has no
/// lines for the owner.
pub fn default_idmap_set(config: &IdmapdConfig) -> Result<IdmapSet> {
    let mut set = IdmapSet::new();

    if shadow_tools_available(config) {
        let uid = first_useful_grant(&config.subuid_path, &config.owner, Channels::UID)?;
        let gid = first_useful_grant(&config.subgid_path, &config.owner, Channels::GID)?;
        for entry in uid.into_iter().chain(gid) {
            set.push(entry);
        }
        tracing::info!(owner = %config.owner, entries = set.len(), "default idmap from subordinate grants");
    } else {
        set.push(IdmapEntry::new(
            Channels::BOTH,
            0,
            FALLBACK_HOST_ID,
            FALLBACK_RANGE,
        )?);
        tracing::info!("shadow uidmap tools not found, using fallback idmap");
    }

    Ok(set)
}

/// Describes what the current namespace has been granted.
///
/// A missing map file means no mapping at all and yields a zero-length
/// entry for that channel, which validates nothing.
///
/// # Errors
///
/// Returns an error if a present map file is unreadable, malformed, or
/// empty.
pub fn current_idmap_set(config: &IdmapdConfig) -> Result<IdmapSet> {
    let mut set = IdmapSet::new();

    for (path, channels) in [
        (&config.uid_map_path, Channels::UID),
        (&config.gid_map_path, Channels::GID),
    ] {
        if path.exists() {
            for line in read_kernel_map(path)? {
                set.push(IdmapEntry::from_kernel(
                    channels,
                    line.ns_id,
                    line.host_id,
                    line.count,
                ));
            }
        } else {
            tracing::debug!(path = %path.display(), "no id map, assuming unmapped");
            set.push(IdmapEntry::from_kernel(channels, 0, 0, 0));
        }
    }

    Ok(set)
}
