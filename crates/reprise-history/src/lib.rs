//! # Undo/redo history
//!
//! A history watches an observable cell and keeps snapshots of its value,
//! with a cursor marking which snapshot the cell currently reflects.
//!
//! - [`ManualHistory`] records only when [`commit`](ManualHistory::commit) is called.
//! - [`RefHistory`] records on every change, through a [`CommitPolicy`]
//!   (sync, debounced, or throttled).
//!
//! Undo and redo write the restored snapshot back into the cell. Those writes
//! are never recorded as new entries.
//!
//! ```rust
//! use reprise_core::*;
//! use reprise_history::*;
//!
//! let timers = VirtualTimers::new();
//! let count = signal(0);
//! let history = use_ref_history(timers.host(), count.clone(), HistoryOptions::default()).unwrap();
//!
//! count.set(1);
//! count.set(2);
//! assert_eq!(history.snapshots(), vec![0, 1, 2]);
//!
//! history.undo().unwrap();
//! assert_eq!(count.get(), 1);
//! assert!(history.can_redo());
//! ```
//!
//! Snapshots are copied with a [`CloneFn`]. The default goes through
//! `serde_json`, so a snapshot never aliases the live value.

mod clone;
mod manual;
mod options;
mod timeline;
mod tracked;


pub use clone::CloneFn;
pub use manual::{HistoryState, ManualHistory, use_manual_ref_history};
pub use options::{CommitPolicy, Flush, HistoryOptions};
pub use timeline::{Capacity, HistoryEntry, HistoryLog};
pub use tracked::{
    CommitState, RefHistory, use_debounced_ref_history, use_ref_history, use_throttled_ref_history,
};
