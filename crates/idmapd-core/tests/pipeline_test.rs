//! End-to-end tests for the id mapping pipeline.
//!
//! These tests drive the public API the way the daemon does:
//! 1. Discover grants (subordinate id files, live id maps)
//! 2. Build a mapping (default allocation or raw entries)
//! 3. Validate it against the current namespace
//! 4. Hand it to the runtime as directive lines
//! 5. Re-own a root filesystem (dry run)

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::os::unix::fs::MetadataExt;
use std::path::Path;

use idmapd_common::config::IdmapdConfig;
use idmapd_common::error::IdmapError;
use idmapd_common::types::{Channels, ContainerName};
use idmapd_core::filesystem::ShiftMode;
use idmapd_core::{IdmapEntry, IdmapSet, grants, resolve_idmap};

fn config_in(dir: &Path) -> IdmapdConfig {
    IdmapdConfig {
        subuid_path: dir.join("subuid"),
        subgid_path: dir.join("subgid"),
        uid_map_path: dir.join("uid_map"),
        gid_map_path: dir.join("gid_map"),
        newuidmap: "idmapd-test-missing-newuidmap".into(),
        newgidmap: "idmapd-test-missing-newgidmap".into(),
        containers_dir: dir.join("containers"),
        ..IdmapdConfig::default()
    }
}

// ── Grants ───────────────────────────────────────────────────────────

#[test]
fn pipeline_default_without_tools_ignores_grant_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    std::fs::write(&config.subuid_path, "root:100000:65536\n").expect("write");
    std::fs::write(&config.subgid_path, "root:100000:65536\n").expect("write");

    let set = grants::default_idmap_set(&config).expect("default set");
    assert_eq!(set.len(), 1);
    let entry = set.entries()[0];
    assert_eq!(entry.channels(), Channels::BOTH);
    assert_eq!(
        (entry.ns_id(), entry.host_id(), entry.range()),
        (0, 1_000_000, 1_000_000_000)
    );
    assert_eq!(
        set.to_lxc_lines(),
        vec!["u 0 1000000 1000000000", "g 0 1000000 1000000000"]
    );
}

#[test]
fn pipeline_zero_length_live_map_rejects_candidate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    std::fs::write(&config.uid_map_path, "0 0 0\n").expect("write");
    std::fs::write(&config.gid_map_path, "0 0 0\n").expect("write");

    let candidate = IdmapEntry::new(Channels::UID, 0, 100_000, 65_536).expect("entry");
    let err = candidate.usable(&config).unwrap_err();
    assert!(matches!(err, IdmapError::UnauthorizedMapping { .. }), "got: {err}");
}

// ── Resolution ───────────────────────────────────────────────────────

#[test]
fn pipeline_resolve_raw_idmap_in_initial_namespace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = IdmapdConfig {
        raw_idmap: Some(vec!["b:0:100000:65536".into()]),
        ..config_in(dir.path())
    };
    std::fs::write(&config.uid_map_path, "         0          0 4294967295\n").expect("write");
    std::fs::write(&config.gid_map_path, "         0          0 4294967295\n").expect("write");

    let set = resolve_idmap(&config).expect("resolve");
    let items: Vec<_> = set.lxc_config_items().collect();
    assert_eq!(
        items,
        vec![
            ("lxc.id_map", String::new()),
            ("lxc.id_map", "u 0 100000 65536".to_string()),
            ("lxc.id_map", "g 0 100000 65536".to_string()),
        ]
    );
}

#[test]
fn pipeline_add_safe_then_validate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    std::fs::write(&config.uid_map_path, "0 100000 65536\n").expect("write");
    std::fs::write(&config.gid_map_path, "0 100000 65536\n").expect("write");

    // Ids as seen by this namespace: 0..65535.
    let mut set = IdmapSet::from_raw_entries(["u:0:1000:1000", "g:0:1000:1000"]).expect("set");
    set.add_safe(IdmapEntry::new(Channels::UID, 100, 5000, 1).expect("entry"))
        .expect("add_safe");
    set.usable(&config).expect("usable");

    set.add_safe(IdmapEntry::new(Channels::UID, 200, 70_000, 1).expect("entry"))
        .expect("add_safe");
    let err = set.usable(&config).unwrap_err();
    assert!(err.to_string().contains("u 200 70000 1"), "got: {err}");
}

// ── Filesystem ───────────────────────────────────────────────────────

#[test]
fn pipeline_dry_run_shift_of_named_container() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let name = ContainerName::new("web").expect("name");
    let rootfs = name.rootfs_path(&config.containers_dir);
    std::fs::create_dir_all(rootfs.join("bin")).expect("mkdir");
    std::fs::write(rootfs.join("bin/sh"), b"\x7fELF").expect("write");

    let owner = |p: &Path| {
        let meta = std::fs::symlink_metadata(p).expect("stat");
        (meta.uid(), meta.gid())
    };
    let before = owner(&rootfs.join("bin/sh"));

    let set = grants::default_idmap_set(&config).expect("default set");
    let report = set
        .uidshift_into_container(&rootfs, ShiftMode::DryRun)
        .expect("dry run");

    assert_eq!(report.visited, 3);
    let sh = report
        .records
        .iter()
        .find(|r| r.path.ends_with("bin/sh"))
        .expect("record for bin/sh");
    assert_eq!(sh.uid, set.shift_into_ns(i64::from(before.0), 0).0);
    assert_eq!(owner(&rootfs.join("bin/sh")), before);
}
