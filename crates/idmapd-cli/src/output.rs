//! Formatted output helpers for CLI commands.

use idmapd_common::constants::UNMAPPED_ID;
use idmapd_core::{IdRange, IdmapSet};

/// Formats an id, showing the unmapped sentinel as `unmapped`.
#[must_use]
pub fn format_id(id: i64) -> String {
    if id == UNMAPPED_ID {
        "unmapped".to_string()
    } else {
        id.to_string()
    }
}

/// Formats a coalesced range as `u 0-65535 (65536 ids)`.
#[must_use]
pub fn format_range(range: &IdRange) -> String {
    let count = (range.end_id - range.start_id + 1).max(0);
    if count == 0 {
        return format!("{} none", range.channels);
    }
    format!(
        "{} {}-{} ({count} ids)",
        range.channels, range.start_id, range.end_id
    )
}

/// Prints a mapping as runtime directive lines.
pub fn print_set(set: &IdmapSet) {
    for line in set.to_lxc_lines() {
        println!("{line}");
    }
}
