//! # Call filters
//!
//! A filter sits between "something wants to call `f`" and `f` actually
//! running. Three policies cover most UI needs:
//!
//! - [`Bypass`] runs every call immediately.
//! - [`Debounce`] waits for a quiet period and runs only the last call.
//! - [`Throttle`] runs at most once per interval, optionally with a trailing call.
//!
//! [`Pausable`] can gate any of them. Filters are shared as
//! `Rc<dyn EventFilter>` and driven by the caller's [`TimerHost`].
//!
//! ```rust
//! use std::time::Duration;
//! use reprise_core::*;
//! use reprise_filters::*;
//!
//! let timers = VirtualTimers::new();
//! let saved = signal(String::new());
//! let save = use_debounce_fn(timers.host(), DebounceOptions::new(Delay::ms(300)), {
//!     let saved = saved.clone();
//!     move |text: String| saved.set(text)
//! });
//!
//! save.call("h".into());
//! save.call("hi".into());
//! timers.advance(Duration::from_millis(300));
//! assert_eq!(saved.get(), "hi");
//! ```
//!
//! [`TimerHost`]: reprise_core::TimerHost

mod completion;
mod debounce;
mod delay;
mod filter;
mod pausable;
mod throttle;
mod watch;
mod wrapper;

#[cfg(test)]
mod tests;

pub use completion::{Cancelled, Completion};
pub use debounce::{Debounce, DebounceOptions};
pub use delay::Delay;
pub use filter::{
    Bypass, EventFilter, FilterPolicy, Invoke, bypass_filter, debounce_filter, throttle_filter,
};
pub use pausable::{Pausable, pausable_filter};
pub use throttle::{Throttle, ThrottleOptions};
pub use watch::{
    FilteredRef, WatchHandle, ref_debounced, ref_throttled, watch_debounced, watch_throttled,
    watch_with_filter,
};
pub use wrapper::{FilterWrapper, create_filter_wrapper, use_debounce_fn, use_throttle_fn, wrap};
