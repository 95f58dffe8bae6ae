//! Checks that a mapping only hands out host ids the kernel will honor.
//!
//! Host ids of a candidate entry must fall inside the ids the current
//! namespace itself has mapped (the coalesced namespace-side ranges of the
//! live id maps). The live maps are read once per call and never cached.

use idmapd_common::config::IdmapdConfig;
use idmapd_common::error::{IdmapError, Result};

use crate::grants;
use crate::idmap::{IdRange, IdmapEntry, IdmapSet};

impl IdmapEntry {
    /// Checks this entry against pre-computed grant ranges.
    ///
    /// Every channel of the entry needs one grant range on that channel
    /// containing all of `[host_id, host_id + range - 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`IdmapError::UnauthorizedMapping`] naming this entry.
    pub fn validate_against(&self, grants: &[IdRange]) -> Result<()> {
        let first = self.host_id();
        let last = self.host_end() - 1;

        let covered = self.channels().split().all(|channel| {
            grants
                .iter()
                .filter(|g| g.channels.covers(channel))
                .any(|g| g.contains_span(first, last))
        });

        if !covered {
            return Err(IdmapError::UnauthorizedMapping {
                entry: self.to_string(),
            });
        }
        Ok(())
    }

    /// Checks this entry against the live id maps of the current namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the live maps can't be read, or
    /// [`IdmapError::UnauthorizedMapping`] if the entry isn't covered.
    pub fn usable(&self, config: &IdmapdConfig) -> Result<()> {
        let kernel = grants::current_idmap_set(config)?;
        self.validate_against(&kernel.valid_ranges())
    }
}

impl IdmapSet {
    /// Checks every entry against the ranges `kernel` covers.
    ///
    /// # Errors
    ///
    /// Returns [`IdmapError::UnauthorizedMapping`] for the first entry, in
    /// insertion order, that isn't covered.
    pub fn validate_against(&self, kernel: &Self) -> Result<()> {
        let ranges = kernel.valid_ranges();
        for entry in self.entries() {
            entry.validate_against(&ranges)?;
        }
        Ok(())
    }

    /// Checks every entry against the live id maps of the current namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the live maps can't be read, or
    /// [`IdmapError::UnauthorizedMapping`] naming the first uncovered entry.
    pub fn usable(&self, config: &IdmapdConfig) -> Result<()> {
        let kernel = grants::current_idmap_set(config)?;
        self.validate_against(&kernel)?;
        tracing::debug!(entries = self.len(), "idmap usable in current namespace");
        Ok(())
    }
}

/// Resolves the mapping to use for new containers and validates it.
///
/// Uses `raw_idmap` from the configuration when set, otherwise the default
/// allocation from subordinate grants.
///
/// # Errors
///
/// Returns a parse, conflict, or grant-reading error, or
/// [`IdmapError::UnauthorizedMapping`] if the mapping can't be granted.
pub fn resolve_idmap(config: &IdmapdConfig) -> Result<IdmapSet> {
    let set = match &config.raw_idmap {
        Some(raw) => IdmapSet::from_raw_entries(raw)?,
        None => grants::default_idmap_set(config)?,
    };
    set.usable(config)?;
    tracing::info!(entries = set.len(), "resolved idmap");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use idmapd_common::types::Channels;

    use super::*;

    fn config_with_maps(dir: &Path, uid_map: Option<&str>, gid_map: Option<&str>) -> IdmapdConfig {
        let config = IdmapdConfig {
            uid_map_path: dir.join("uid_map"),
            gid_map_path: dir.join("gid_map"),
            newuidmap: "idmapd-test-missing-newuidmap".into(),
            newgidmap: "idmapd-test-missing-newgidmap".into(),
            ..IdmapdConfig::default()
        };
        if let Some(content) = uid_map {
            std::fs::write(&config.uid_map_path, content).expect("write");
        }
        if let Some(content) = gid_map {
            std::fs::write(&config.gid_map_path, content).expect("write");
        }
        config
    }

    #[test]
    fn usable_zero_length_grant_rejects_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_with_maps(dir.path(), Some("0 0 0\n"), Some("0 0 0\n"));
        let entry = IdmapEntry::new(Channels::UID, 0, 100_000, 65_536).unwrap();

        let err = entry.usable(&config).unwrap_err();
        assert!(matches!(err, IdmapError::UnauthorizedMapping { .. }), "got: {err}");
    }

    #[test]
    fn usable_missing_maps_rejects_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_with_maps(dir.path(), None, None);
        let entry = IdmapEntry::new(Channels::GID, 0, 0, 1).unwrap();

        assert!(entry.usable(&config).is_err());
    }

    #[test]
    fn usable_initial_namespace_accepts_subordinate_range() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_with_maps(
            dir.path(),
            Some("0 0 4294967295\n"),
            Some("0 0 4294967295\n"),
        );
        let set = IdmapSet::from_raw_entries(["b:0:100000:65536"]).unwrap();

        set.usable(&config).unwrap();
    }

    #[test]
    fn usable_combined_entry_needs_both_channels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_with_maps(dir.path(), Some("0 0 4294967295\n"), Some("0 0 1000\n"));
        let set = IdmapSet::from_raw_entries(["b:0:100000:65536"]).unwrap();

        let err = set.usable(&config).unwrap_err();
        assert!(
            err.to_string().contains("u 0 100000 65536, g 0 100000 65536"),
            "got: {err}"
        );
    }

    #[test]
    fn validate_against_uses_coalesced_grants() {
        let kernel = IdmapSet::from_raw_entries(["u:0:500000:1000", "u:1000:700000:1000"]).unwrap();
        let spanning = IdmapSet::from_raw_entries(["u:0:900:200"]).unwrap();
        spanning.validate_against(&kernel).unwrap();

        let outside = IdmapSet::from_raw_entries(["u:0:1900:200"]).unwrap();
        let err = outside.validate_against(&kernel).unwrap_err();
        assert!(err.to_string().contains("u 0 1900 200"), "got: {err}");
    }

    #[test]
    fn resolve_idmap_prefers_raw_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = IdmapdConfig {
            raw_idmap: Some(vec!["u:0:100000:10".into(), "g:0:100000:10".into()]),
            ..config_with_maps(
                dir.path(),
                Some("0 0 4294967295\n"),
                Some("0 0 4294967295\n"),
            )
        };

        let set = resolve_idmap(&config).unwrap();
        assert_eq!(set.to_lxc_lines(), vec!["u 0 100000 10", "g 0 100000 10"]);
    }

    #[test]
    fn resolve_idmap_fallback_fails_in_small_namespace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_with_maps(dir.path(), Some("0 100000 65536\n"), Some("0 100000 65536\n"));

        let err = resolve_idmap(&config).unwrap_err();
        assert!(matches!(err, IdmapError::UnauthorizedMapping { .. }), "got: {err}");
    }
}
