//! A single contiguous id mapping block.

use std::fmt;
use std::str::FromStr;

use idmapd_common::constants::MAX_ID_EXCLUSIVE;
use idmapd_common::error::{IdmapError, Result};
use idmapd_common::types::{Channels, ShiftDirection};

/// Maps namespace ids `[ns_id, ns_id + range)` onto host ids
/// `[host_id, host_id + range)`, position for position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdmapEntry {
    channels: Channels,
    host_id: i64,
    ns_id: i64,
    range: i64,
}

impl IdmapEntry {
    /// Creates an entry, checking the range invariants.
    ///
    /// # Errors
    ///
    /// Returns [`IdmapError::Format`] if no channel is set, an id is
    /// negative, or the range is empty, and [`IdmapError::Wraparound`] if
    /// either side runs past the largest 32-bit id.
    pub fn new(channels: Channels, ns_id: i64, host_id: i64, range: i64) -> Result<Self> {
        let entry = Self {
            channels,
            host_id,
            ns_id,
            range,
        };
        let text = format!("{channels}:{ns_id}:{host_id}:{range}");
        if channels.is_empty() {
            return Err(IdmapError::format(text, "no uid or gid channel"));
        }
        if ns_id < 0 || host_id < 0 {
            return Err(IdmapError::format(text, "negative id"));
        }
        if range <= 0 {
            return Err(IdmapError::format(text, "empty range"));
        }
        if host_id + range > MAX_ID_EXCLUSIVE || ns_id + range > MAX_ID_EXCLUSIVE {
            return Err(IdmapError::Wraparound { input: text });
        }
        Ok(entry)
    }

    /// Creates an entry without checking invariants.
    ///
    /// Only used for kernel-reported maps, including the zero-length
    /// "identity, unmapped" marker.
    pub(crate) const fn from_kernel(channels: Channels, ns_id: i64, host_id: i64, range: i64) -> Self {
        Self {
            channels,
            host_id,
            ns_id,
            range,
        }
    }

    /// Channels this entry applies to.
    #[must_use]
    pub const fn channels(&self) -> Channels {
        self.channels
    }

    /// First host id.
    #[must_use]
    pub const fn host_id(&self) -> i64 {
        self.host_id
    }

    /// First namespace id.
    #[must_use]
    pub const fn ns_id(&self) -> i64 {
        self.ns_id
    }

    /// Number of ids mapped.
    #[must_use]
    pub const fn range(&self) -> i64 {
        self.range
    }

    /// One past the last host id.
    #[must_use]
    pub const fn host_end(&self) -> i64 {
        self.host_id + self.range
    }

    /// One past the last namespace id.
    #[must_use]
    pub const fn ns_end(&self) -> i64 {
        self.ns_id + self.range
    }

    /// Runtime directive lines, one per channel (`u <ns> <host> <len>`).
    ///
    /// Combined entries are always emitted as separate uid and gid lines.
    #[must_use]
    pub fn to_lxc_lines(&self) -> Vec<String> {
        self.channels
            .split()
            .map(|ch| format!("{ch} {} {} {}", self.ns_id, self.host_id, self.range))
            .collect()
    }

    /// Translates a namespace id to its host id.
    ///
    /// Returns `None` when `id` falls outside this entry's namespace range.
    #[must_use]
    pub const fn shift_into_ns(&self, id: i64) -> Option<i64> {
        if id < self.ns_id || id >= self.ns_end() {
            return None;
        }
        Some(id - self.ns_id + self.host_id)
    }

    /// Translates a host id back to its namespace id.
    ///
    /// Returns `None` when `id` falls outside this entry's host range.
    #[must_use]
    pub const fn shift_from_ns(&self, id: i64) -> Option<i64> {
        if id < self.host_id || id >= self.host_end() {
            return None;
        }
        Some(id - self.host_id + self.ns_id)
    }

    /// Translates one id in the given direction.
    #[must_use]
    pub const fn shift(&self, id: i64, direction: ShiftDirection) -> Option<i64> {
        match direction {
            ShiftDirection::IntoContainer => self.shift_into_ns(id),
            ShiftDirection::FromContainer => self.shift_from_ns(id),
        }
    }

    /// Returns `true` if both entries share a channel and claim a common
    /// host id.
    #[must_use]
    pub const fn hostids_intersect(&self, other: &Self) -> bool {
        self.channels.shares(other.channels)
            && overlaps(self.host_id, self.host_end(), other.host_id, other.host_end())
    }

    /// Returns `true` if both entries share a channel and overlap in either
    /// host id space or namespace id space.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.channels.shares(other.channels)
            && (overlaps(self.host_id, self.host_end(), other.host_id, other.host_end())
                || overlaps(self.ns_id, self.ns_end(), other.ns_id, other.ns_end()))
    }

    /// Returns a copy restricted to `channels` covering namespace ids
    /// `[ns_start, ns_end)`, or `None` if that slice is empty.
    pub(crate) fn slice(&self, channels: Channels, ns_start: i64, ns_end: i64) -> Option<Self> {
        let start = ns_start.max(self.ns_id);
        let end = ns_end.min(self.ns_end());
        if channels.is_empty() || end <= start {
            return None;
        }
        Some(Self {
            channels,
            host_id: self.host_id + (start - self.ns_id),
            ns_id: start,
            range: end - start,
        })
    }
}

/// Half-open interval overlap.
const fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

fn parse_id(input: &str, field: &str) -> Result<i64> {
    field
        .parse::<u32>()
        .map(i64::from)
        .map_err(|e| IdmapError::format(input, format!("bad number {field:?}: {e}")))
}

impl FromStr for IdmapEntry {
    type Err = IdmapError;

    /// Parses `<u|g|b>:<ns_id>:<host_id>:<range>`.
    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(':').collect();
        let [kind, ns, host, range] = fields.as_slice() else {
            return Err(IdmapError::format(s, "expected 4 ':'-separated fields"));
        };

        let channels = match *kind {
            "u" => Channels::UID,
            "g" => Channels::GID,
            "b" => Channels::BOTH,
            other => return Err(IdmapError::format(s, format!("bad idmap type {other:?}"))),
        };
        let ns_id = parse_id(s, ns)?;
        let host_id = parse_id(s, host)?;
        let range = parse_id(s, range)?;

        Self::new(channels, ns_id, host_id, range).map_err(|e| match e {
            IdmapError::Wraparound { .. } => IdmapError::Wraparound { input: s.to_string() },
            IdmapError::Format { reason, .. } => IdmapError::format(s, reason),
            other => other,
        })
    }
}

impl fmt::Display for IdmapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_lxc_lines().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(ns: i64, host: i64, range: i64) -> IdmapEntry {
        IdmapEntry::new(Channels::UID, ns, host, range).unwrap()
    }

    #[test]
    fn parse_combined_entry() {
        let e: IdmapEntry = "b:0:100000:65536".parse().unwrap();
        assert_eq!(e.channels(), Channels::BOTH);
        assert_eq!((e.ns_id(), e.host_id(), e.range()), (0, 100_000, 65_536));
    }

    #[test]
    fn parse_unknown_channel_fails() {
        let err = "x:0:100000:65536".parse::<IdmapEntry>().unwrap_err();
        assert!(matches!(err, IdmapError::Format { .. }), "got: {err}");
    }

    #[test]
    fn parse_wrong_field_count_fails() {
        assert!("u:0:100000".parse::<IdmapEntry>().is_err());
        assert!("u:0:1:2:3".parse::<IdmapEntry>().is_err());
    }

    #[test]
    fn parse_negative_or_oversized_number_fails() {
        assert!("u:-1:100000:10".parse::<IdmapEntry>().is_err());
        assert!("u:0:4294967296:10".parse::<IdmapEntry>().is_err());
        assert!("u:0:abc:10".parse::<IdmapEntry>().is_err());
    }

    #[test]
    fn parse_wraparound_fails() {
        let err = "u:0:4294967295:2".parse::<IdmapEntry>().unwrap_err();
        assert!(matches!(err, IdmapError::Wraparound { .. }), "got: {err}");
        let err = "g:4294967000:0:1000".parse::<IdmapEntry>().unwrap_err();
        assert!(matches!(err, IdmapError::Wraparound { .. }), "got: {err}");
    }

    #[test]
    fn parse_last_id_fits_exactly() {
        let e: IdmapEntry = "u:0:4294967295:1".parse().unwrap();
        assert_eq!(e.host_end(), MAX_ID_EXCLUSIVE);
    }

    #[test]
    fn parse_zero_range_fails() {
        assert!("u:0:100000:0".parse::<IdmapEntry>().is_err());
    }

    #[test]
    fn lxc_lines_split_combined_entry() {
        let e: IdmapEntry = "b:0:100000:65536".parse().unwrap();
        assert_eq!(
            e.to_lxc_lines(),
            vec!["u 0 100000 65536".to_string(), "g 0 100000 65536".to_string()]
        );
    }

    #[test]
    fn lxc_lines_roundtrip_single_channel() {
        let e: IdmapEntry = "g:10:200000:30".parse().unwrap();
        let lines = e.to_lxc_lines();
        assert_eq!(lines, vec!["g 10 200000 30".to_string()]);
        let reparsed: IdmapEntry = lines[0].replace(' ', ":").parse().unwrap();
        assert_eq!(reparsed, e);
    }

    #[test]
    fn shift_into_ns_maps_position_for_position() {
        let e = uid(0, 100_000, 65_536);
        assert_eq!(e.shift_into_ns(0), Some(100_000));
        assert_eq!(e.shift_into_ns(1000), Some(101_000));
        assert_eq!(e.shift_into_ns(65_535), Some(165_535));
        assert_eq!(e.shift_into_ns(65_536), None);
    }

    #[test]
    fn shift_from_ns_inverts_shift_into_ns() {
        let e = uid(500, 100_000, 1000);
        for id in [500, 501, 999, 1499] {
            let host = e.shift_into_ns(id).unwrap();
            assert_eq!(e.shift_from_ns(host), Some(id));
        }
        assert_eq!(e.shift_from_ns(99_999), None);
        assert_eq!(e.shift_from_ns(101_000), None);
    }

    #[test]
    fn hostids_intersect_requires_shared_channel() {
        let u = uid(0, 100_000, 1000);
        let g = IdmapEntry::new(Channels::GID, 0, 100_000, 1000).unwrap();
        assert!(!u.hostids_intersect(&g));
        let b = IdmapEntry::new(Channels::BOTH, 0, 100_500, 10).unwrap();
        assert!(u.hostids_intersect(&b));
    }

    #[test]
    fn hostids_intersect_adjacent_ranges_do_not_overlap() {
        let a = uid(0, 100_000, 1000);
        let b = uid(1000, 101_000, 1000);
        assert!(!a.hostids_intersect(&b));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn intersects_detects_namespace_overlap_only() {
        let a = uid(0, 100_000, 1000);
        let b = uid(500, 300_000, 10);
        assert!(!a.hostids_intersect(&b));
        assert!(a.intersects(&b));
    }

    #[test]
    fn intersects_is_symmetric() {
        let entries = [
            uid(0, 100_000, 1000),
            uid(200, 300_000, 100),
            uid(999, 100_999, 1),
            IdmapEntry::new(Channels::GID, 0, 100_000, 1000).unwrap(),
            IdmapEntry::new(Channels::BOTH, 5000, 5000, 5).unwrap(),
        ];
        for a in &entries {
            for b in &entries {
                assert_eq!(a.intersects(b), b.intersects(a), "{a} vs {b}");
                assert_eq!(a.hostids_intersect(b), b.hostids_intersect(a), "{a} vs {b}");
            }
        }
    }
}
