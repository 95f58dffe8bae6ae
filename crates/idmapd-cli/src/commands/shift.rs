//! `idmapd shift`: Re-own a container root filesystem.

use std::path::PathBuf;

use clap::Args;
use idmapd_common::config::IdmapdConfig;
use idmapd_common::types::{ContainerName, ShiftDirection};
use idmapd_core::filesystem::{HostOwnership, ShiftMode, uidshift};

use super::MapArgs;
use crate::output::format_id;

/// Arguments for the `shift` command.
#[derive(Args, Debug)]
pub struct ShiftArgs {
    /// Directory (or file) to re-own.
    #[arg(required_unless_present = "container", conflicts_with = "container")]
    pub path: Option<PathBuf>,

    /// Re-own the root filesystem of this container instead of a path.
    #[arg(long)]
    pub container: Option<String>,

    /// Return the tree to host-native ownership.
    #[arg(long)]
    pub unshift: bool,

    /// Report the new owners without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub map: MapArgs,
}

/// Executes the `shift` command.
///
/// # Errors
///
/// Returns an error if the mapping can't be built or any path can't be
/// re-owned. The walk stops at the first failure.
pub fn execute(args: &ShiftArgs, config: &IdmapdConfig) -> anyhow::Result<()> {
    let path = match (&args.path, &args.container) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => ContainerName::new(name.as_str())?.rootfs_path(&config.containers_dir),
        (None, None) => anyhow::bail!("either a path or --container is required"),
    };
    let set = args.map.load(config)?;

    let direction = if args.unshift {
        ShiftDirection::FromContainer
    } else {
        ShiftDirection::IntoContainer
    };
    let mode = if args.dry_run {
        ShiftMode::DryRun
    } else {
        ShiftMode::Apply
    };

    let report = uidshift(&set, &path, direction, mode, &HostOwnership)?;
    for record in &report.records {
        println!(
            "I would shift {:?} to {} {}",
            record.path,
            format_id(record.uid),
            format_id(record.gid)
        );
    }
    tracing::info!(path = %path.display(), visited = report.visited, "done");
    Ok(())
}
