//! `idmapd add`: Insert an entry into a mapping, splitting overlaps.

use clap::Args;
use idmapd_core::{IdmapEntry, IdmapSet};

/// Arguments for the `add` command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Base mapping entries (`u|g|b:ns:host:len`).
    #[arg(required = true, value_name = "ENTRY")]
    pub entries: Vec<String>,

    /// Entry to insert.
    #[arg(long, value_name = "ENTRY")]
    pub insert: Vec<String>,
}

/// Executes the `add` command.
///
/// # Errors
///
/// Returns an error if an entry is malformed, or if an inserted entry
/// claims host ids the mapping already uses.
pub fn execute(args: &AddArgs) -> anyhow::Result<()> {
    let mut set = IdmapSet::from_raw_entries(&args.entries)?;
    for raw in &args.insert {
        let entry: IdmapEntry = raw.parse()?;
        set.add_safe(entry)?;
    }
    crate::output::print_set(&set);
    Ok(())
}
