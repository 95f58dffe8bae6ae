//! Namespace id mapping: entries, coalesced ranges, and mapping sets.
//!
//! An [`IdmapEntry`] maps a contiguous block of namespace ids onto host ids
//! for the uid channel, the gid channel, or both. An [`IdmapSet`] is the
//! unit of validation and translation.

pub mod entry;
pub mod range;
pub mod set;

pub use entry::IdmapEntry;
pub use range::IdRange;
pub use set::IdmapSet;
