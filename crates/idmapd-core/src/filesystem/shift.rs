//! Recursive re-owning of a container root filesystem.
//!
//! Every path under the root, the root included, gets its `(uid, gid)`
//! translated through an [`IdmapSet`] and written back. The walk is
//! sequential and pre-order; symlinks are re-owned themselves and never
//! descended into. Any failure aborts the whole walk.
//!
//! Callers must hold exclusive access to the tree for the duration.

use std::path::{Path, PathBuf};

use idmapd_common::error::{IdmapError, Result};
use idmapd_common::types::ShiftDirection;
use walkdir::WalkDir;

use super::ownership::{HostOwnership, OwnershipOps};
use crate::idmap::IdmapSet;

/// Whether a walk changes ownership or only reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftMode {
    /// Apply the new owners.
    Apply,
    /// Compute and report the new owners without touching the tree.
    DryRun,
}

/// The owner a path receives (or would receive) from a shift.
///
/// `-1` marks an id no entry maps; that id is left unchanged on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRecord {
    /// Path that was visited.
    pub path: PathBuf,
    /// New owning uid.
    pub uid: i64,
    /// New owning gid.
    pub gid: i64,
}

/// Outcome of a completed walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftReport {
    /// Number of paths visited.
    pub visited: usize,
    /// Per-path owners, collected in dry-run mode only.
    pub records: Vec<ShiftRecord>,
}

/// Resolves symlinks in everything before the final path component.
///
/// A symlinked storage mount point still walks the backing directory,
/// while a symlink as the final component is re-owned, not followed.
fn resolve_root(dir: &Path) -> Result<PathBuf> {
    let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) else {
        return Ok(dir.to_path_buf());
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let parent = std::fs::canonicalize(parent).map_err(|e| IdmapError::io(parent, e))?;
    Ok(parent.join(name))
}

fn to_owner(id: i64) -> Option<u32> {
    u32::try_from(id).ok()
}

/// Walks `dir` and translates every owner in `direction`.
///
/// # Errors
///
/// Returns the first I/O error hit while resolving, walking, stat'ing, or
/// re-owning; paths visited before it keep their new owners.
pub fn uidshift(
    set: &IdmapSet,
    dir: &Path,
    direction: ShiftDirection,
    mode: ShiftMode,
    ops: &dyn OwnershipOps,
) -> Result<ShiftReport> {
    let root = resolve_root(dir)?;

    tracing::info!(root = %root.display(), %direction, ?mode, "shifting ownership");
    let mut report = ShiftReport::default();

    let walk = WalkDir::new(&root)
        .follow_links(false)
        .follow_root_links(false)
        .sort_by_file_name();
    for entry in walk {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
            IdmapError::io(path, e.into())
        })?;
        let path = entry.path();

        let (uid, gid) = ops.owner(path).map_err(|e| IdmapError::io(path, e))?;
        let (new_uid, new_gid) = set.shift(i64::from(uid), i64::from(gid), direction);

        match mode {
            ShiftMode::DryRun => {
                tracing::info!(path = %path.display(), uid = new_uid, gid = new_gid, "would shift");
                report.records.push(ShiftRecord {
                    path: path.to_path_buf(),
                    uid: new_uid,
                    gid: new_gid,
                });
            }
            ShiftMode::Apply => {
                ops.set_owner(path, to_owner(new_uid), to_owner(new_gid))
                    .map_err(|e| IdmapError::io(path, e))?;
                tracing::debug!(path = %path.display(), uid, gid, new_uid, new_gid, "shifted");
            }
        }
        report.visited += 1;
    }

    tracing::info!(root = %root.display(), visited = report.visited, "ownership shift complete");
    Ok(report)
}

impl IdmapSet {
    /// Shifts a tree from namespace ids to host ids, optionally as a dry run.
    ///
    /// # Errors
    ///
    /// See [`uidshift`].
    pub fn uidshift_into_container(&self, dir: &Path, mode: ShiftMode) -> Result<ShiftReport> {
        uidshift(self, dir, ShiftDirection::IntoContainer, mode, &HostOwnership)
    }

    /// Shifts a tree from host ids back to namespace ids, optionally as a
    /// dry run.
    ///
    /// # Errors
    ///
    /// See [`uidshift`].
    pub fn uidshift_from_container(&self, dir: &Path, mode: ShiftMode) -> Result<ShiftReport> {
        uidshift(self, dir, ShiftDirection::FromContainer, mode, &HostOwnership)
    }

    /// Re-owns a container root filesystem for use inside the namespace.
    ///
    /// # Errors
    ///
    /// See [`uidshift`].
    pub fn shift_rootfs(&self, path: &Path) -> Result<()> {
        self.uidshift_into_container(path, ShiftMode::Apply)
            .map(|_| ())
    }

    /// Returns a container root filesystem to host-native ownership.
    ///
    /// # Errors
    ///
    /// See [`uidshift`].
    pub fn unshift_rootfs(&self, path: &Path) -> Result<()> {
        self.uidshift_from_container(path, ShiftMode::Apply)
            .map(|_| ())
    }

    /// Re-owns a single file (or tree) pushed into a container.
    ///
    /// # Errors
    ///
    /// See [`uidshift`].
    pub fn shift_file(&self, path: &Path) -> Result<()> {
        self.shift_rootfs(path)
    }
}
