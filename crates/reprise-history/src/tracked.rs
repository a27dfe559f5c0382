use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use reprise_core::{
    ChangeKind, Dispose, Error, Observable, Result, Signal, Source, TimerHost, TimerId, own, signal,
};
use reprise_filters::{Delay, EventFilter};

use crate::manual::IgnoreGuard;
use crate::{CommitPolicy, Flush, HistoryEntry, HistoryOptions, HistoryState, ManualHistory};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitState {
    Idle,
    /// A debounced, throttled, or deferred commit is waiting on a timer.
    PendingCommit,
}

/// History that commits by itself whenever the tracked cell changes.
///
/// Changes pass through the configured commit policy (a debounce or throttle
/// filter) before they become entries. The history's own undo/redo writes are
/// never recorded.
///
/// Tracking stops on [`RefHistory::dispose`], when the current [`Scope`] it
/// was started in is disposed, or when the last handle is dropped.
///
/// [`Scope`]: reprise_core::Scope
pub struct RefHistory<T: 'static> {
    tracker: Rc<Tracker<T>>,
}

impl<T> Clone for RefHistory<T> {
    fn clone(&self) -> Self {
        Self {
            tracker: self.tracker.clone(),
        }
    }
}

struct Tracker<T: 'static> {
    history: ManualHistory<T>,
    filter: Rc<dyn EventFilter>,
    deep: bool,
    flush: Flush,
    tracking: Signal<bool>,
    subscription: RefCell<Option<Dispose>>,
    flush_timer: Cell<Option<TimerId>>,
    last_error: RefCell<Option<Error>>,
}

impl<T: Clone + 'static> Tracker<T> {
    fn on_change(self: &Rc<Self>, kind: ChangeKind) {
        let core = self.history.core();
        if core.ignoring.get() || core.is_disposed() || !self.tracking.get() {
            return;
        }
        if kind == ChangeKind::Mutated && !self.deep {
            return;
        }
        match self.flush {
            Flush::Sync => self.submit(),
            Flush::Deferred => self.defer(),
        }
    }

    fn defer(self: &Rc<Self>) {
        if self.flush_timer.get().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let id = self.history.core().host.schedule(
            Duration::ZERO,
            Box::new(move || {
                if let Some(t) = weak.upgrade() {
                    t.flush_timer.set(None);
                    t.submit();
                }
            }),
        );
        self.flush_timer.set(Some(id));
    }

    fn submit(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.filter.apply(Box::new(move || {
            if let Some(t) = weak.upgrade() {
                t.commit_from_change();
            }
        }));
    }

    fn commit_from_change(&self) {
        if let Err(e) = self.history.commit() {
            log::warn!("history: commit after change failed: {e}");
            *self.last_error.borrow_mut() = Some(e.clone());
            self.history.core().host.report_error(e);
        }
    }

    /// Drops any commit waiting on the filter or the flush tick.
    fn cancel_pending(&self) {
        self.filter.cancel();
        if let Some(id) = self.flush_timer.take() {
            self.history.core().host.cancel(id);
        }
    }

    fn is_pending(&self) -> bool {
        self.filter.is_pending() || self.flush_timer.get().is_some()
    }

    fn teardown(&self) {
        if let Some(sub) = self.subscription.borrow_mut().take() {
            sub.run();
        }
        self.cancel_pending();
        self.history.dispose();
    }
}

impl<T: 'static> Drop for Tracker<T> {
    fn drop(&mut self) {
        if let Some(sub) = self.subscription.get_mut().take() {
            sub.run();
        }
        self.filter.cancel();
        if let Some(id) = self.flush_timer.take() {
            self.history.core().host.cancel(id);
        }
    }
}

impl<T: Clone + 'static> RefHistory<T> {
    /// Starts tracking `cell`. The current value becomes the first entry.
    pub fn start(
        host: Rc<dyn TimerHost>,
        cell: impl Observable<T>,
        options: HistoryOptions<T>,
    ) -> Result<Self> {
        let HistoryOptions {
            capacity,
            commit_policy,
            clone_fn,
            deep,
            flush,
        } = options;
        let filter = commit_policy.into_filter_policy().into_filter(host.clone());
        let history = ManualHistory::new(
            host,
            cell,
            HistoryOptions::with_clone(clone_fn).capacity(capacity),
        )?;

        let tracker = Rc::new(Tracker {
            history,
            filter,
            deep,
            flush,
            tracking: signal(true),
            subscription: RefCell::new(None),
            flush_timer: Cell::new(None),
            last_error: RefCell::new(None),
        });

        let weak = Rc::downgrade(&tracker);
        let sub = tracker.history.core().cell.on_change(Box::new(
            move |_: &T, kind: ChangeKind| {
                if let Some(t) = weak.upgrade() {
                    t.on_change(kind);
                }
            },
        ));
        *tracker.subscription.borrow_mut() = Some(sub);

        let weak = Rc::downgrade(&tracker);
        own(Dispose::new(move || {
            if let Some(t) = weak.upgrade() {
                t.teardown();
            }
        }));

        log::debug!("history: tracking started ({flush:?} flush, deep = {deep})");
        Ok(Self { tracker })
    }

    fn manual(&self) -> &ManualHistory<T> {
        &self.tracker.history
    }

    /// Commits the cell's current value now, superseding any pending commit.
    pub fn commit(&self) -> Result<()> {
        self.tracker.cancel_pending();
        self.manual().commit()
    }

    pub fn undo(&self) -> Result<Option<T>> {
        self.tracker.cancel_pending();
        self.manual().undo()
    }

    pub fn redo(&self) -> Result<Option<T>> {
        self.tracker.cancel_pending();
        self.manual().redo()
    }

    pub fn clear(&self) -> Result<()> {
        self.tracker.cancel_pending();
        self.manual().clear()
    }

    /// Writes the current entry back into the cell, discarding uncommitted changes.
    pub fn reset(&self) -> Result<()> {
        self.tracker.cancel_pending();
        self.manual().reset()
    }

    /// Stops recording changes until [`RefHistory::resume`].
    pub fn pause(&self) {
        if self.tracker.tracking.get() {
            self.tracker.tracking.set(false);
        }
    }

    /// Resumes recording; with `commit_now`, the current value is committed straight away.
    pub fn resume(&self, commit_now: bool) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::DisposedUse("resume"));
        }
        if !self.tracker.tracking.get() {
            self.tracker.tracking.set(true);
        }
        if commit_now {
            self.commit()?;
        }
        Ok(())
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.tracking.get()
    }

    pub fn tracking_signal(&self) -> Signal<bool> {
        self.tracker.tracking.clone()
    }

    /// Runs `f` with recording suspended, then commits once.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        if self.is_disposed() {
            return Err(Error::DisposedUse("batch"));
        }
        let out = {
            let _guard = IgnoreGuard::new(&self.manual().core().ignoring);
            f()
        };
        self.commit()?;
        Ok(out)
    }

    /// Stops tracking for good. Later mutations of the cell are not recorded
    /// and history operations fail with [`Error::DisposedUse`].
    pub fn dispose(&self) {
        self.tracker.teardown();
    }

    pub fn is_disposed(&self) -> bool {
        self.manual().is_disposed()
    }

    pub fn state(&self) -> HistoryState {
        self.manual().state()
    }

    pub fn commit_state(&self) -> CommitState {
        if self.tracker.is_pending() {
            CommitState::PendingCommit
        } else {
            CommitState::Idle
        }
    }

    pub fn is_pending(&self) -> bool {
        self.tracker.is_pending()
    }

    /// Most recent failure of a commit triggered by a change rather than a call.
    pub fn last_error(&self) -> Option<Error> {
        self.tracker.last_error.borrow().clone()
    }

    pub fn take_last_error(&self) -> Option<Error> {
        self.tracker.last_error.borrow_mut().take()
    }

    pub fn can_undo(&self) -> bool {
        self.manual().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.manual().can_redo()
    }

    pub fn can_undo_signal(&self) -> Signal<bool> {
        self.manual().can_undo_signal()
    }

    pub fn can_redo_signal(&self) -> Signal<bool> {
        self.manual().can_redo_signal()
    }

    pub fn last(&self) -> HistoryEntry<T> {
        self.manual().last()
    }

    /// The current entry followed by the undo stack, newest first.
    pub fn history(&self) -> Vec<HistoryEntry<T>> {
        self.manual().history()
    }

    pub fn undo_stack(&self) -> Vec<HistoryEntry<T>> {
        self.manual().undo_stack()
    }

    pub fn redo_stack(&self) -> Vec<HistoryEntry<T>> {
        self.manual().redo_stack()
    }

    pub fn snapshots(&self) -> Vec<T> {
        self.manual().snapshots()
    }

    pub fn cursor(&self) -> usize {
        self.manual().cursor()
    }

    pub fn len(&self) -> usize {
        self.manual().len()
    }

    pub fn is_empty(&self) -> bool {
        self.manual().is_empty()
    }
}

pub fn use_ref_history<T: Clone + 'static>(
    host: Rc<dyn TimerHost>,
    cell: impl Observable<T>,
    options: HistoryOptions<T>,
) -> Result<RefHistory<T>> {
    RefHistory::start(host, cell, options)
}

/// [`use_ref_history`] with commits debounced by `delay`.
pub fn use_debounced_ref_history<T: Clone + 'static>(
    host: Rc<dyn TimerHost>,
    cell: impl Observable<T>,
    delay: impl Into<Source<Delay>>,
    options: HistoryOptions<T>,
) -> Result<RefHistory<T>> {
    RefHistory::start(
        host,
        cell,
        options.commit_policy(CommitPolicy::debounce(delay)),
    )
}

/// [`use_ref_history`] with commits throttled to one per `delay`.
pub fn use_throttled_ref_history<T: Clone + 'static>(
    host: Rc<dyn TimerHost>,
    cell: impl Observable<T>,
    delay: impl Into<Source<Delay>>,
    options: HistoryOptions<T>,
) -> Result<RefHistory<T>> {
    RefHistory::start(
        host,
        cell,
        options.commit_policy(CommitPolicy::throttle(delay)),
    )
}
