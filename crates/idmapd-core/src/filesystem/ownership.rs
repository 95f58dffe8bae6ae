//! Reading and writing the owner of a single path.
//!
//! Neither operation follows symlinks: a link is stat'ed and re-owned
//! itself, never its target.

use std::io;
use std::path::Path;

/// Stat and chown capability used by the re-owner.
pub trait OwnershipOps {
    /// Returns the `(uid, gid)` owning `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if `path` can't be stat'ed.
    fn owner(&self, path: &Path) -> io::Result<(u32, u32)>;

    /// Sets the owner of `path`. `None` leaves that id unchanged.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the change is refused.
    fn set_owner(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()>;
}

/// Ownership operations on the host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostOwnership;

#[cfg(target_os = "linux")]
impl OwnershipOps for HostOwnership {
    fn owner(&self, path: &Path) -> io::Result<(u32, u32)> {
        use std::os::unix::fs::MetadataExt;

        let meta = std::fs::symlink_metadata(path)?;
        Ok((meta.uid(), meta.gid()))
    }

    fn set_owner(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        std::os::unix::fs::lchown(path, uid, gid)
    }
}

/// Stub for non-Linux platforms: every operation fails as unsupported.
#[cfg(not(target_os = "linux"))]
impl OwnershipOps for HostOwnership {
    fn owner(&self, _path: &Path) -> io::Result<(u32, u32)> {
        Err(unsupported())
    }

    fn set_owner(&self, _path: &Path, _uid: Option<u32>, _gid: Option<u32>) -> io::Result<()> {
        Err(unsupported())
    }
}

#[cfg(not(target_os = "linux"))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "Linux required for ownership changes",
    )
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn host_owner_matches_current_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (uid, _) = HostOwnership.owner(dir.path()).expect("owner");
        assert_eq!(uid, nix::unistd::geteuid().as_raw());
    }

    #[test]
    fn host_owner_missing_path_fails() {
        let err = HostOwnership
            .owner(Path::new("/nonexistent/idmapd"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn host_set_owner_to_self_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").expect("write");
        let (uid, gid) = HostOwnership.owner(&file).expect("owner");

        HostOwnership
            .set_owner(&file, Some(uid), Some(gid))
            .expect("chown");
        HostOwnership.set_owner(&file, None, None).expect("noop chown");
    }
}
