//! `idmapd translate`: Translate a uid/gid pair across the namespace boundary.

use clap::Args;
use idmapd_common::config::IdmapdConfig;
use idmapd_common::types::ShiftDirection;

use super::MapArgs;
use crate::output::format_id;

/// Arguments for the `translate` command.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// User id to translate.
    pub uid: u32,

    /// Group id to translate.
    pub gid: u32,

    /// Translate host ids back to namespace ids.
    #[arg(long)]
    pub from_container: bool,

    #[command(flatten)]
    pub map: MapArgs,
}

/// Executes the `translate` command.
///
/// # Errors
///
/// Returns an error if the mapping can't be built.
pub fn execute(args: &TranslateArgs, config: &IdmapdConfig) -> anyhow::Result<()> {
    let set = args.map.parse(config)?;
    let direction = if args.from_container {
        ShiftDirection::FromContainer
    } else {
        ShiftDirection::IntoContainer
    };

    let (uid, gid) = set.shift(i64::from(args.uid), i64::from(args.gid), direction);
    println!("{} {}", format_id(uid), format_id(gid));
    Ok(())
}
