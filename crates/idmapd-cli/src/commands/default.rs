//! `idmapd default`: Print the default allocation for new containers.

use clap::Args;
use idmapd_common::config::IdmapdConfig;

/// Arguments for the `default` command.
#[derive(Args, Debug)]
pub struct DefaultArgs {
    /// Print as `lxc.id_map = ...` configuration items.
    #[arg(long)]
    pub config_items: bool,
}

/// Executes the `default` command.
///
/// # Errors
///
/// Returns an error if the subordinate id grants can't be read.
pub fn execute(args: &DefaultArgs, config: &IdmapdConfig) -> anyhow::Result<()> {
    let set = idmapd_core::grants::default_idmap_set(config)?;
    if args.config_items {
        for (key, value) in set.lxc_config_items() {
            println!("{key} = {value}");
        }
    } else {
        crate::output::print_set(&set);
    }
    Ok(())
}
