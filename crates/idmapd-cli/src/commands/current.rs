//! `idmapd current`: Print what the current namespace has been granted.

use clap::Args;
use idmapd_common::config::IdmapdConfig;

/// Arguments for the `current` command.
#[derive(Args, Debug)]
pub struct CurrentArgs {
    /// Also print the coalesced ranges used for validation.
    #[arg(short, long)]
    pub ranges: bool,
}

/// Executes the `current` command.
///
/// # Errors
///
/// Returns an error if the live id maps can't be read.
pub fn execute(args: &CurrentArgs, config: &IdmapdConfig) -> anyhow::Result<()> {
    let set = idmapd_core::grants::current_idmap_set(config)?;
    crate::output::print_set(&set);

    if args.ranges {
        println!();
        println!("Granted ranges:");
        for range in set.valid_ranges() {
            println!("  {}", crate::output::format_range(&range));
        }
    }
    Ok(())
}
