//! Placeholder identifiers for rows without a usable Anubandh ID

use std::collections::BTreeSet;

/// First synthetic identifier handed out
pub const SYNTHETIC_ID_START: i64 = 99999;

/// Decrementing allocator threaded through an import batch by value
///
/// Each [`take`](SyntheticIds::take) consumes the allocator and hands back
/// the successor, so the next free value is always explicit at the call site.
/// Reserved identifiers (explicit ids in the batch, ids already stored) are
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticIds {
    next: i64,
    reserved: BTreeSet<i64>,
}

impl SyntheticIds {
    pub fn starting_at(next: i64) -> Self {
        Self {
            next,
            reserved: BTreeSet::new(),
        }
    }

    /// Never hand out any of `ids`
    pub fn reserving<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let next = self.next;
        self.reserved.extend(ids.into_iter().filter(|id| *id <= next));
        self.skip_reserved()
    }

    fn skip_reserved(mut self) -> Self {
        while self.reserved.contains(&self.next) {
            self.next = self.next.saturating_sub(1);
        }
        self
    }

    /// Allocate one identifier
    pub fn take(self) -> (i64, Self) {
        let id = self.next;
        let rest = Self {
            next: id.saturating_sub(1),
            reserved: self.reserved,
        }
        .skip_reserved();
        (id, rest)
    }

    /// Identifier the next `take` would return
    pub fn peek(&self) -> i64 {
        self.next
    }
}

impl Default for SyntheticIds {
    fn default() -> Self {
        Self::starting_at(SYNTHETIC_ID_START)
    }
}

/// Parse an identifier cell; empty, non-numeric and non-positive values yield `None`
pub fn parse_anubandh_id(cell: &str) -> Option<i64> {
    cell.trim().parse::<i64>().ok().filter(|id| *id > 0)
}
