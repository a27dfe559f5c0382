//! # Cells, Scopes, and Timers
//!
//! `reprise-core` holds the small runtime the rest of reprise is written
//! against. There are four pieces:
//!
//! - `Signal<T>` — observable, reactive value, and the `Observable<T>` trait
//!   that anything trackable implements.
//! - `Dispose` / `Scope` — cleanup guards and the owner that runs them.
//! - `TimerHost` — the injected timer capability (`TimerQueue`, `VirtualTimers`).
//! - `Source<T>` — "a value, a signal, or a getter", resolved in one place.
//!
//! ## Signals
//!
//! `Signal<T>` is a cloneable handle to a piece of state:
//!
//! ```rust
//! use reprise_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! Subscribers are told whether the value was replaced (`set`) or mutated in
//! place (`update`), which is what "deep" observation keys off:
//!
//! ```rust
//! use reprise_core::*;
//!
//! let items = signal(vec![1, 2]);
//! items.watch(|v, kind| log::debug!("{kind:?}: {v:?}"));
//! items.update(|v| v.push(3)); // ChangeKind::Mutated
//! items.set(vec![]);           // ChangeKind::Replaced
//! ```
//!
//! ## Timers
//!
//! Nothing here owns a global clock. Code that needs time takes an
//! `Rc<dyn TimerHost>`; tests hand in `VirtualTimers` and step it:
//!
//! ```rust
//! use std::time::Duration;
//! use reprise_core::*;
//!
//! let timers = VirtualTimers::new();
//! let fired = signal(false);
//! let f = fired.clone();
//! timers.schedule(Duration::from_millis(50), Box::new(move || f.set(true)));
//! timers.advance_ms(49);
//! assert!(!fired.get());
//! timers.advance_ms(1);
//! assert!(fired.get());
//! ```
//!
//! ## Scopes
//!
//! Composables started inside `Scope::run` hand their `Dispose` to that scope,
//! so disposing the scope (the owning component going away) stops them.

pub mod effects;
pub mod error;
pub mod prelude;
pub mod scope;
pub mod signal;
pub mod source;
pub mod timer;

#[cfg(test)]
mod tests;

pub use effects::*;
pub use error::{Error, Result};
pub use scope::{Scope, current_scope};
pub use signal::*;
pub use source::Source;
pub use timer::*;
