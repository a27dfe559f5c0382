use std::rc::Rc;

use reprise_core::{Result, Source, TimerHost};

use crate::{Debounce, DebounceOptions, Delay, Throttle, ThrottleOptions};

/// A deferred call handed to a filter. Dropping it without running it
/// cancels whatever completion is waiting on it.
pub type Invoke = Box<dyn FnOnce()>;

/// Decides when, or whether, a call actually runs.
///
/// Implementations keep at most one outstanding timer and at most one queued
/// call. Queued calls are always run with no internal borrow held, so the
/// call may re-enter the same filter.
pub trait EventFilter {
    fn apply(&self, invoke: Invoke);

    /// Drops the queued call, if any, and clears its timer. Idempotent.
    fn cancel(&self);

    fn is_pending(&self) -> bool;
}

/// Runs every call immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bypass;

impl EventFilter for Bypass {
    fn apply(&self, invoke: Invoke) {
        invoke()
    }

    fn cancel(&self) {}

    fn is_pending(&self) -> bool {
        false
    }
}

pub fn bypass_filter() -> Rc<dyn EventFilter> {
    Rc::new(Bypass)
}

pub fn debounce_filter(host: Rc<dyn TimerHost>, options: DebounceOptions) -> Rc<dyn EventFilter> {
    Rc::new(Debounce::new(host, options))
}

pub fn throttle_filter(host: Rc<dyn TimerHost>, options: ThrottleOptions) -> Rc<dyn EventFilter> {
    Rc::new(Throttle::new(host, options))
}

/// Timing policy for a wrapped function.
#[derive(Clone, Debug, Default)]
pub enum FilterPolicy {
    #[default]
    PassThrough,
    Debounce(DebounceOptions),
    Throttle(ThrottleOptions),
}

impl FilterPolicy {
    pub fn debounce(delay: impl Into<Source<Delay>>) -> Self {
        FilterPolicy::Debounce(DebounceOptions::new(delay))
    }

    pub fn throttle(delay: impl Into<Source<Delay>>) -> Self {
        FilterPolicy::Throttle(ThrottleOptions::new(delay))
    }

    /// Like [`FilterPolicy::debounce`], validating a raw millisecond count.
    pub fn debounce_ms(ms: f64) -> Result<Self> {
        Ok(Self::debounce(Delay::from_millis(ms)?))
    }

    /// Like [`FilterPolicy::throttle`], validating a raw millisecond count.
    pub fn throttle_ms(ms: f64) -> Result<Self> {
        Ok(Self::throttle(Delay::from_millis(ms)?))
    }

    pub fn into_filter(self, host: Rc<dyn TimerHost>) -> Rc<dyn EventFilter> {
        match self {
            FilterPolicy::PassThrough => bypass_filter(),
            FilterPolicy::Debounce(o) => debounce_filter(host, o),
            FilterPolicy::Throttle(o) => throttle_filter(host, o),
        }
    }
}
