//! Coalesced, read-only view of the ids a mapping set covers.

use idmapd_common::types::Channels;

/// An inclusive block of ids `[start_id, end_id]` on one or both channels.
///
/// A range with `end_id < start_id` is empty and contains nothing; it comes
/// from the zero-length "unmapped" marker of a namespace without id maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdRange {
    /// Channels the range applies to.
    pub channels: Channels,
    /// First id in the range.
    pub start_id: i64,
    /// Last id in the range.
    pub end_id: i64,
}

impl IdRange {
    /// Returns `true` if `id` lies within the range.
    #[must_use]
    pub const fn contains(&self, id: i64) -> bool {
        id >= self.start_id && id <= self.end_id
    }

    /// Returns `true` if every id in `[first, last]` lies within the range.
    #[must_use]
    pub const fn contains_span(&self, first: i64, last: i64) -> bool {
        self.contains(first) && self.contains(last)
    }
}
