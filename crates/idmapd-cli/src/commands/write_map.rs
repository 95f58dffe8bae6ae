//! `idmapd write-map`: Write a mapping into a process's kernel id maps.

use clap::Args;
use idmapd_common::config::IdmapdConfig;
use nix::unistd::Pid;

use super::MapArgs;

/// Arguments for the `write-map` command.
#[derive(Args, Debug)]
pub struct WriteMapArgs {
    /// Target process; defaults to this process.
    pub pid: Option<i32>,

    /// Deny `setgroups` before writing, as unprivileged writers must.
    #[arg(long)]
    pub deny_setgroups: bool,

    #[command(flatten)]
    pub map: MapArgs,
}

/// Executes the `write-map` command.
///
/// # Errors
///
/// Returns an error if the mapping can't be built or the kernel refuses it.
pub fn execute(args: &WriteMapArgs, config: &IdmapdConfig) -> anyhow::Result<()> {
    let set = args.map.load(config)?;
    let pid = args.pid.map(Pid::from_raw);
    idmapd_core::namespace::user::write_id_maps(pid, &set, args.deny_setgroups)?;
    tracing::info!(pid = ?args.pid, entries = set.len(), "id maps written");
    Ok(())
}
