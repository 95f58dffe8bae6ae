//! Filesystem ownership management for container root filesystems.
//!
//! Provides the stat/chown capability and the recursive re-owner that
//! shifts a tree between host ids and namespace ids.

pub mod ownership;
pub mod shift;

pub use ownership::{HostOwnership, OwnershipOps};
pub use shift::{ShiftMode, ShiftRecord, ShiftReport, uidshift};
