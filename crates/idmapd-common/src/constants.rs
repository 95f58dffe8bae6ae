//! System-wide constants and default paths.

/// Administrator uid grants (`name:start:count` per line).
pub const SUBUID_PATH: &str = "/etc/subuid";
/// Administrator gid grants (`name:start:count` per line).
pub const SUBGID_PATH: &str = "/etc/subgid";

/// The running process's live uid map.
pub const PROC_SELF_UID_MAP: &str = "/proc/self/uid_map";
/// The running process's live gid map.
pub const PROC_SELF_GID_MAP: &str = "/proc/self/gid_map";

/// Helper binary that must be installed for subordinate uid grants to be used.
pub const NEWUIDMAP_BIN: &str = "newuidmap";
/// Helper binary that must be installed for subordinate gid grants to be used.
pub const NEWGIDMAP_BIN: &str = "newgidmap";

/// User whose subordinate grants back the default allocation.
pub const DEFAULT_OWNER: &str = "root";

/// Grants smaller than this are not useful for a full container.
pub const MIN_USEFUL_GRANT: i64 = 65_536;

/// First host id of the fallback allocation.
pub const FALLBACK_HOST_ID: i64 = 1_000_000;
/// Length of the fallback allocation.
pub const FALLBACK_RANGE: i64 = 1_000_000_000;

/// Returned for a channel no mapping entry resolves.
pub const UNMAPPED_ID: i64 = -1;

/// One past the largest representable id (ids are 32-bit unsigned).
pub const MAX_ID_EXCLUSIVE: i64 = 1 << 32;

/// Configuration key the container runtime reads mapping directives from.
pub const LXC_IDMAP_KEY: &str = "lxc.id_map";

/// Default base directory holding per-container state.
pub const DEFAULT_CONTAINERS_DIR: &str = "/var/lib/idmapd/containers";

/// Name of the root filesystem directory inside a container directory.
pub const ROOTFS_DIR_NAME: &str = "rootfs";
