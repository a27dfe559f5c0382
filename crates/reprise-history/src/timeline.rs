//! Cursor-based history buffer.
//!
//! The log is one ordered sequence, oldest first. Everything up to the cursor
//! is the undo side; everything after it is the redo branch.
//!
//! ```text
//! push(D) after undo() x2 on [A, B, C]
//!
//!   [A, B, C]        [A, B, C]        [A, D]
//!          ^          ^                   ^
//!        cursor     cursor             cursor   (B, C pruned)
//! ```
//!
//! # Invariants
//!
//! 1. The log is never empty, so `cursor < len()` always holds.
//! 2. `len() <= capacity` after every operation.
//! 3. Pushing prunes the redo branch, then evicts from the front.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use reprise_core::{Error, Result};
use web_time::Instant;

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry<T> {
    pub snapshot: T,
    pub timestamp: Instant,
}

/// Maximum number of entries a log retains, the current one included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Capacity {
    #[default]
    Unbounded,
    Limited(NonZeroUsize),
}

impl Capacity {
    /// Fails on zero: a log always holds at least the current entry.
    pub fn new(entries: usize) -> Result<Self> {
        NonZeroUsize::new(entries)
            .map(Capacity::Limited)
            .ok_or_else(|| Error::invalid_argument("capacity", "must be at least 1"))
    }

    pub fn limit(self) -> Option<usize> {
        match self {
            Capacity::Unbounded => None,
            Capacity::Limited(n) => Some(n.get()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HistoryLog<T> {
    entries: VecDeque<HistoryEntry<T>>,
    cursor: usize,
    capacity: Capacity,
}

impl<T> HistoryLog<T> {
    pub fn new(initial: HistoryEntry<T>, capacity: Capacity) -> Self {
        Self {
            entries: VecDeque::from([initial]),
            cursor: 0,
            capacity,
        }
    }

    /// Appends after the cursor, pruning the redo branch.
    /// Returns how many old entries were evicted to stay within capacity.
    pub fn push(&mut self, entry: HistoryEntry<T>) -> usize {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(entry);

        let mut evicted = 0;
        if let Some(limit) = self.capacity.limit() {
            while self.entries.len() > limit {
                self.entries.pop_front();
                evicted += 1;
            }
        }
        self.cursor = self.entries.len() - 1;
        evicted
    }

    pub fn undo(&mut self) -> Option<&HistoryEntry<T>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&HistoryEntry<T>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Entry `undo` would move to.
    pub fn peek_undo(&self) -> Option<&HistoryEntry<T>> {
        self.cursor.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Entry `redo` would move to.
    pub fn peek_redo(&self) -> Option<&HistoryEntry<T>> {
        self.entries.get(self.cursor + 1)
    }

    pub fn current(&self) -> &HistoryEntry<T> {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry<T>> {
        self.entries.iter()
    }

    /// Entries before the cursor, most recent first.
    pub fn undo_stack(&self) -> impl Iterator<Item = &HistoryEntry<T>> {
        self.entries.range(..self.cursor).rev()
    }

    /// Entries after the cursor, next redo first.
    pub fn redo_stack(&self) -> impl Iterator<Item = &HistoryEntry<T>> {
        self.entries.range(self.cursor + 1..)
    }

    /// Drops everything and starts over from `entry`.
    pub fn reset(&mut self, entry: HistoryEntry<T>) {
        self.entries.clear();
        self.entries.push_back(entry);
        self.cursor = 0;
    }
}
