use reprise_core::Source;
use reprise_filters::{DebounceOptions, Delay, FilterPolicy, ThrottleOptions};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Capacity, CloneFn};

/// When a change to the tracked cell becomes a commit.
#[derive(Clone, Debug, Default)]
pub enum CommitPolicy {
    /// Every change commits right away.
    #[default]
    Sync,
    Debounce(DebounceOptions),
    Throttle(ThrottleOptions),
}

impl CommitPolicy {
    pub fn debounce(delay: impl Into<Source<Delay>>) -> Self {
        CommitPolicy::Debounce(DebounceOptions::new(delay))
    }

    pub fn throttle(delay: impl Into<Source<Delay>>) -> Self {
        CommitPolicy::Throttle(ThrottleOptions::new(delay))
    }

    pub(crate) fn into_filter_policy(self) -> FilterPolicy {
        match self {
            CommitPolicy::Sync => FilterPolicy::PassThrough,
            CommitPolicy::Debounce(o) => FilterPolicy::Debounce(o),
            CommitPolicy::Throttle(o) => FilterPolicy::Throttle(o),
        }
    }
}

/// When change notifications are handed to the commit policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flush {
    /// Inside the write that caused them.
    #[default]
    Sync,
    /// Once per tick, coalescing every write made before it.
    Deferred,
}

#[derive(Clone, Debug)]
pub struct HistoryOptions<T> {
    pub capacity: Capacity,
    pub commit_policy: CommitPolicy,
    pub clone_fn: CloneFn<T>,
    /// Also commit on in-place mutations, not just replacements.
    pub deep: bool,
    pub flush: Flush,
}

impl<T: Serialize + DeserializeOwned + 'static> Default for HistoryOptions<T> {
    fn default() -> Self {
        Self::with_clone(CloneFn::json())
    }
}

impl<T: 'static> HistoryOptions<T> {
    /// Defaults for everything but the clone strategy, for values serde can't handle.
    pub fn with_clone(clone_fn: CloneFn<T>) -> Self {
        Self {
            capacity: Capacity::Unbounded,
            commit_policy: CommitPolicy::Sync,
            clone_fn,
            deep: false,
            flush: Flush::Sync,
        }
    }

    pub fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    pub fn clone_fn(mut self, clone_fn: CloneFn<T>) -> Self {
        self.clone_fn = clone_fn;
        self
    }

    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn flush(mut self, flush: Flush) -> Self {
        self.flush = flush;
        self
    }
}
