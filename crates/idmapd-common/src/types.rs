//! Domain primitive types used across the idmapd workspace.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which identifier channels a mapping applies to.
///
/// A combined value (both flags set) behaves like two single-channel
/// entries sharing the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Channels {
    /// Applies to user ids.
    pub uid: bool,
    /// Applies to group ids.
    pub gid: bool,
}

impl Channels {
    /// User ids only.
    pub const UID: Self = Self {
        uid: true,
        gid: false,
    };
    /// Group ids only.
    pub const GID: Self = Self {
        uid: false,
        gid: true,
    };
    /// Both user and group ids.
    pub const BOTH: Self = Self {
        uid: true,
        gid: true,
    };

    /// Returns `true` if the two values share at least one channel.
    #[must_use]
    pub const fn shares(self, other: Self) -> bool {
        (self.uid && other.uid) || (self.gid && other.gid)
    }

    /// Returns `true` if every channel in `other` is also in `self`.
    #[must_use]
    pub const fn covers(self, other: Self) -> bool {
        (self.uid || !other.uid) && (self.gid || !other.gid)
    }

    /// Returns the channels in `self` that are not in `other`.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self {
            uid: self.uid && !other.uid,
            gid: self.gid && !other.gid,
        }
    }

    /// Returns `true` if no channel is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.uid && !self.gid
    }

    /// Splits into the single-channel values this one is made of.
    pub fn split(self) -> impl Iterator<Item = Self> {
        [(self.uid, Self::UID), (self.gid, Self::GID)]
            .into_iter()
            .filter_map(|(set, ch)| set.then_some(ch))
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.uid, self.gid) {
            (true, true) => write!(f, "b"),
            (true, false) => write!(f, "u"),
            (false, true) => write!(f, "g"),
            (false, false) => write!(f, "-"),
        }
    }
}

/// Which way an id crosses the namespace boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftDirection {
    /// Namespace id to host id, used when shifting a tree into a container.
    IntoContainer,
    /// Host id back to namespace id, used when unshifting a tree.
    FromContainer,
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntoContainer => write!(f, "in"),
            Self::FromContainer => write!(f, "out"),
        }
    }
}

/// Name of a container managed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerName(String);

impl ContainerName {
    /// Creates a container name, rejecting empty names and path separators.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, `.`/`..`, or contains `/`.
    pub fn new(name: impl Into<String>) -> crate::error::Result<Self> {
        let name = name.into();
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(crate::error::IdmapError::Config {
                message: format!("invalid container name: {name:?}"),
            });
        }
        Ok(Self(name))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the root filesystem directory of this container.
    #[must_use]
    pub fn rootfs_path(&self, containers_dir: &Path) -> PathBuf {
        containers_dir
            .join(&self.0)
            .join(crate::constants::ROOTFS_DIR_NAME)
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_shares_requires_common_channel() {
        assert!(Channels::UID.shares(Channels::BOTH));
        assert!(Channels::GID.shares(Channels::BOTH));
        assert!(!Channels::UID.shares(Channels::GID));
    }

    #[test]
    fn channels_without_removes_overlap() {
        assert_eq!(Channels::BOTH.without(Channels::UID), Channels::GID);
        assert!(Channels::UID.without(Channels::BOTH).is_empty());
    }

    #[test]
    fn channels_split_combined_yields_both() {
        let parts: Vec<_> = Channels::BOTH.split().collect();
        assert_eq!(parts, vec![Channels::UID, Channels::GID]);
    }

    #[test]
    fn container_name_rejects_traversal() {
        assert!(ContainerName::new("..").is_err());
        assert!(ContainerName::new("a/b").is_err());
        assert!(ContainerName::new("").is_err());
    }

    #[test]
    fn container_name_rootfs_path_appends_rootfs() {
        let name = ContainerName::new("web").unwrap();
        let path = name.rootfs_path(Path::new("/var/lib/idmapd/containers"));
        assert_eq!(path, PathBuf::from("/var/lib/idmapd/containers/web/rootfs"));
    }
}
