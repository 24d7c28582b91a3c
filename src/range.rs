//! Byte intervals claimed by template nodes, and the coalescing pass that normalises them.
//!
//! A template builder walks the binary file field by field, so a node tends to collect many
//! small, unordered, often touching intervals. [`merge_ranges`] folds them into the minimal
//! sorted set of disjoint, non-adjacent intervals the hex view needs for highlighting.

use crate::error::TreeError;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Half-open byte interval `[location, location + length)` within the underlying blob.
///
/// Values built through [`ByteRange::new`] are never empty and never overflow; the fields are
/// private so that guarantee cannot be bypassed.
pub struct ByteRange {
    location: u64,
    length: u64,
}

impl ByteRange {
    /// Validate and build an interval.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyRange`] when `length` is zero and [`TreeError::RangeOverflow`]
    /// when the end offset does not fit in a `u64`.
    pub fn new(location: u64, length: u64) -> Result<Self, TreeError> {
        if length == 0 {
            return Err(TreeError::EmptyRange(location));
        }
        if location.checked_add(length).is_none() {
            return Err(TreeError::RangeOverflow { location, length });
        }
        Ok(Self { location, length })
    }

    #[must_use]
    /// First byte covered.
    pub fn location(&self) -> u64 {
        self.location
    }

    #[must_use]
    /// Number of bytes covered, always positive.
    pub fn length(&self) -> u64 {
        self.length
    }

    #[must_use]
    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.location + self.length
    }

    #[must_use]
    /// Whether `offset` falls inside the interval.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.location && offset < self.end()
    }

    #[must_use]
    /// Whether the two intervals share at least one byte.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.location < other.end() && other.location < self.end()
    }

    #[must_use]
    /// Whether the two intervals overlap or sit exactly end to start.
    pub fn touches(&self, other: &Self) -> bool {
        self.location <= other.end() && other.location <= self.end()
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}..{:#x})", self.location, self.end())
    }
}

/// Coalesce overlapping and touching intervals in place.
///
/// After the call the list is sorted by location, pairwise disjoint and non-adjacent, and covers
/// exactly the bytes it covered before. Running it again changes nothing.
pub fn merge_ranges(ranges: &mut Vec<ByteRange>) {
    if ranges.len() < 2 {
        return;
    }
    ranges.sort_unstable_by_key(|r| (r.location, r.length));

    let mut merged: Vec<ByteRange> = Vec::with_capacity(ranges.len());
    for range in ranges.drain(..) {
        match merged.last_mut() {
            Some(current) if range.location <= current.end() => {
                let end = current.end().max(range.end());
                current.length = end - current.location;
            }
            _ => merged.push(range),
        }
    }
    *ranges = merged;
}

#[must_use]
/// Total number of bytes claimed, counting overlaps once per interval.
///
/// On a merged list this is the exact number of distinct bytes covered.
pub fn covered_len(ranges: &[ByteRange]) -> u64 {
    ranges
        .iter()
        .fold(0u64, |total, r| total.saturating_add(r.length))
}

#[cfg(test)]
#[path = "tests/range.rs"]
mod tests;
