//! Global configuration model for the idmapd daemon.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{IdmapError, Result};

/// Root configuration for id mapping.
///
/// Every field has a default, so a configuration file only needs to name
/// what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdmapdConfig {
    /// Administrator uid grant file.
    pub subuid_path: PathBuf,
    /// Administrator gid grant file.
    pub subgid_path: PathBuf,
    /// Live uid map of the daemon's own namespace.
    pub uid_map_path: PathBuf,
    /// Live gid map of the daemon's own namespace.
    pub gid_map_path: PathBuf,
    /// User whose subordinate grants back the default allocation.
    pub owner: String,
    /// Name or path of the `newuidmap` helper.
    pub newuidmap: String,
    /// Name or path of the `newgidmap` helper.
    pub newgidmap: String,
    /// Base directory holding per-container directories.
    pub containers_dir: PathBuf,
    /// Explicit `c:ns:host:len` entries replacing the default allocation.
    pub raw_idmap: Option<Vec<String>>,
}

impl Default for IdmapdConfig {
    fn default() -> Self {
        Self {
            subuid_path: PathBuf::from(constants::SUBUID_PATH),
            subgid_path: PathBuf::from(constants::SUBGID_PATH),
            uid_map_path: PathBuf::from(constants::PROC_SELF_UID_MAP),
            gid_map_path: PathBuf::from(constants::PROC_SELF_GID_MAP),
            owner: constants::DEFAULT_OWNER.to_string(),
            newuidmap: constants::NEWUIDMAP_BIN.to_string(),
            newgidmap: constants::NEWGIDMAP_BIN.to_string(),
            containers_dir: PathBuf::from(constants::DEFAULT_CONTAINERS_DIR),
            raw_idmap: None,
        }
    }
}

impl IdmapdConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// names an empty owner.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| IdmapError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        if config.owner.trim().is_empty() {
            return Err(IdmapError::Config {
                message: format!("{}: owner must not be empty", path.display()),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("idmapd.json");
        std::fs::write(&path, r#"{ "owner": "lxd", "raw_idmap": ["b:0:100000:65536"] }"#)
            .expect("write");

        let config = IdmapdConfig::load(&path).expect("load");
        assert_eq!(config.owner, "lxd");
        assert_eq!(config.subuid_path, PathBuf::from("/etc/subuid"));
        assert_eq!(
            config.raw_idmap.as_deref(),
            Some(&["b:0:100000:65536".to_string()][..])
        );
    }

    #[test]
    fn load_empty_owner_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("idmapd.json");
        std::fs::write(&path, r#"{ "owner": "  " }"#).expect("write");

        let err = IdmapdConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("owner"), "got: {err}");
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = IdmapdConfig::load(Path::new("/nonexistent/idmapd.json")).unwrap_err();
        assert!(matches!(err, IdmapError::Io { .. }));
    }
}
