//! Ordered collections of mapping entries and their set algebra.

use std::fmt;

use idmapd_common::constants::{LXC_IDMAP_KEY, UNMAPPED_ID};
use idmapd_common::error::{IdmapError, Result};
use idmapd_common::types::ShiftDirection;

use super::entry::IdmapEntry;
use super::range::IdRange;

/// An ordered set of [`IdmapEntry`] values.
///
/// Insertion order is kept: it decides the emission order of runtime
/// directives and the first-match-wins tie break of id translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdmapSet {
    entries: Vec<IdmapEntry>,
}

impl IdmapSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn from_entries(entries: Vec<IdmapEntry>) -> Self {
        Self { entries }
    }

    pub(crate) fn push(&mut self, entry: IdmapEntry) {
        self.entries.push(entry);
    }

    /// Builds a set by appending each `c:ns:host:len` string in turn.
    ///
    /// # Errors
    ///
    /// Returns the first parse or conflict error; no partial set is returned.
    pub fn from_raw_entries<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for line in raw {
            set.append(line.as_ref())?;
        }
        Ok(set)
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[IdmapEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Working copy ordered uid entries first, then gid, each by namespace id.
    fn sorted(&self) -> Vec<IdmapEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|e| (!e.channels().uid, !e.channels().gid, e.ns_id()));
        sorted
    }

    /// Returns `true` if `candidate` intersects any member.
    #[must_use]
    pub fn intersects(&self, candidate: &IdmapEntry) -> bool {
        self.entries.iter().any(|e| candidate.intersects(e))
    }

    /// Returns `true` if `candidate` claims a host id some member already owns.
    #[must_use]
    pub fn hostids_intersect(&self, candidate: &IdmapEntry) -> bool {
        self.entries.iter().any(|e| candidate.hostids_intersect(e))
    }

    /// Coalesces the namespace ids covered into minimal disjoint ranges.
    ///
    /// Entries whose namespace ranges touch end to end on the same channels
    /// merge into one [`IdRange`].
    #[must_use]
    pub fn valid_ranges(&self) -> Vec<IdRange> {
        let mut ranges: Vec<IdRange> = Vec::new();

        for entry in self.sorted() {
            let adjacent = ranges
                .iter_mut()
                .find(|r| r.channels == entry.channels() && r.end_id + 1 == entry.ns_id());
            match adjacent {
                Some(range) => range.end_id += entry.range(),
                None => ranges.push(IdRange {
                    channels: entry.channels(),
                    start_id: entry.ns_id(),
                    end_id: entry.ns_end() - 1,
                }),
            }
        }

        ranges
    }

    /// Inserts `entry`, splitting any member it overlaps in namespace space.
    ///
    /// A member overlapping the candidate keeps its ids below and above the
    /// candidate's namespace range; ids inside it move to the candidate.
    /// On a combined member only the channels the candidate replaces are
    /// cut out.
    ///
    /// # Errors
    ///
    /// Returns [`IdmapError::ConflictingHostId`] if an overlapping member
    /// already owns one of the candidate's host ids. The set is unchanged.
    pub fn add_safe(&mut self, entry: IdmapEntry) -> Result<()> {
        let mut result = Vec::with_capacity(self.entries.len() + 3);
        let mut added = false;

        for existing in &self.entries {
            if !existing.intersects(&entry) {
                result.push(*existing);
                continue;
            }
            if existing.hostids_intersect(&entry) {
                return Err(IdmapError::ConflictingHostId {
                    entry: entry.to_string(),
                });
            }

            let channels = existing.channels();
            result.extend(existing.slice(channels, existing.ns_id(), entry.ns_id()));
            if !added {
                result.push(entry);
                added = true;
            }
            result.extend(existing.slice(
                channels.without(entry.channels()),
                entry.ns_id(),
                entry.ns_end(),
            ));
            result.extend(existing.slice(channels, entry.ns_end(), existing.ns_end()));
        }

        if !added {
            result.push(entry);
        }

        tracing::debug!(entry = %entry, entries = result.len(), "added idmap entry");
        self.entries = result;
        Ok(())
    }

    /// Parses one `c:ns:host:len` entry and appends it without splitting.
    ///
    /// # Errors
    ///
    /// Returns a parse error, or [`IdmapError::Conflict`] if the entry
    /// intersects any member.
    pub fn append(&mut self, raw: &str) -> Result<()> {
        let entry: IdmapEntry = raw.parse()?;
        if self.intersects(&entry) {
            return Err(IdmapError::Conflict {
                entry: raw.to_string(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Runtime directive lines, de-duplicated in first-seen order.
    #[must_use]
    pub fn to_lxc_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for line in self.entries.iter().flat_map(IdmapEntry::to_lxc_lines) {
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
        lines
    }

    /// `(key, value)` configuration items for the container runtime.
    ///
    /// The first item has an empty value and clears whatever mapping the
    /// runtime already holds; one item per directive line follows.
    pub fn lxc_config_items(&self) -> impl Iterator<Item = (&'static str, String)> {
        std::iter::once((LXC_IDMAP_KEY, String::new())).chain(
            self.to_lxc_lines()
                .into_iter()
                .map(|line| (LXC_IDMAP_KEY, line)),
        )
    }

    /// Translates a `(uid, gid)` pair in the given direction.
    ///
    /// Each channel takes the first entry, in insertion order, that
    /// resolves it. Unresolved channels come back as [`UNMAPPED_ID`].
    #[must_use]
    pub fn shift(&self, uid: i64, gid: i64, direction: ShiftDirection) -> (i64, i64) {
        let mut new_uid = None;
        let mut new_gid = None;

        for entry in &self.entries {
            if entry.channels().uid && new_uid.is_none() {
                new_uid = entry.shift(uid, direction);
            }
            if entry.channels().gid && new_gid.is_none() {
                new_gid = entry.shift(gid, direction);
            }
        }

        (
            new_uid.unwrap_or(UNMAPPED_ID),
            new_gid.unwrap_or(UNMAPPED_ID),
        )
    }

    /// Namespace ids to host ids.
    #[must_use]
    pub fn shift_into_ns(&self, uid: i64, gid: i64) -> (i64, i64) {
        self.shift(uid, gid, ShiftDirection::IntoContainer)
    }

    /// Host ids back to namespace ids.
    #[must_use]
    pub fn shift_from_ns(&self, uid: i64, gid: i64) -> (i64, i64) {
        self.shift(uid, gid, ShiftDirection::FromContainer)
    }
}

impl fmt::Display for IdmapSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lxc_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
