//! `idmapd validate`: Check that a mapping can be granted.

use clap::Args;
use idmapd_common::config::IdmapdConfig;
use idmapd_core::IdmapSet;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Mapping entries (`u|g|b:ns:host:len`).
    #[arg(required = true, value_name = "ENTRY")]
    pub entries: Vec<String>,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if an entry is malformed or conflicting, or if the
/// mapping isn't covered by the current namespace's grants.
pub fn execute(args: &ValidateArgs, config: &IdmapdConfig) -> anyhow::Result<()> {
    let set = IdmapSet::from_raw_entries(&args.entries)?;
    set.usable(config)?;

    println!("valid:");
    crate::output::print_set(&set);
    Ok(())
}
