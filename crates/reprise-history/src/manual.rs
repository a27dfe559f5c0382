use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reprise_core::{Error, Observable, Result, Signal, TimerHost, signal};

use crate::{CloneFn, HistoryEntry, HistoryLog, HistoryOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryState {
    Tracking,
    Disposed,
}

/// History that only records when told to via [`ManualHistory::commit`].
///
/// Cloning the handle shares the same log.
pub struct ManualHistory<T: 'static> {
    core: Rc<Core<T>>,
}

impl<T> Clone for ManualHistory<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

pub(crate) struct Core<T: 'static> {
    pub(crate) cell: Rc<dyn Observable<T>>,
    pub(crate) host: Rc<dyn TimerHost>,
    clone_fn: CloneFn<T>,
    log: RefCell<HistoryLog<T>>,
    /// Set while the history writes into the cell itself.
    pub(crate) ignoring: Cell<bool>,
    state: Cell<HistoryState>,
    can_undo: Signal<bool>,
    can_redo: Signal<bool>,
}

/// Raises the ignore flag until dropped; restores the previous value so guards nest.
pub(crate) struct IgnoreGuard<'a> {
    flag: &'a Cell<bool>,
    prev: bool,
}

impl<'a> IgnoreGuard<'a> {
    pub(crate) fn new(flag: &'a Cell<bool>) -> Self {
        let prev = flag.replace(true);
        Self { flag, prev }
    }
}

impl Drop for IgnoreGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.prev);
    }
}

impl<T: Clone + 'static> Core<T> {
    fn ensure_live(&self, op: &'static str) -> Result<()> {
        match self.state.get() {
            HistoryState::Tracking => Ok(()),
            HistoryState::Disposed => Err(Error::DisposedUse(op)),
        }
    }

    fn snapshot(&self, value: &T) -> Result<HistoryEntry<T>> {
        Ok(HistoryEntry {
            snapshot: self.clone_fn.apply(value)?,
            timestamp: self.host.now(),
        })
    }

    pub(crate) fn commit(&self) -> Result<()> {
        self.ensure_live("commit")?;
        let entry = self.snapshot(&self.cell.get())?;
        let (evicted, len) = {
            let mut log = self.log.borrow_mut();
            (log.push(entry), log.len())
        };
        if evicted > 0 {
            log::debug!("history: evicted {evicted} oldest entries");
        }
        log::trace!("history: commit, {len} entries");
        self.sync_flags();
        Ok(())
    }

    pub(crate) fn undo(&self) -> Result<Option<T>> {
        self.ensure_live("undo")?;
        let restored = {
            let log = self.log.borrow();
            match log.peek_undo() {
                Some(e) => self.clone_fn.apply(&e.snapshot)?,
                None => return Ok(None),
            }
        };
        self.log.borrow_mut().undo();
        log::trace!("history: undo");
        self.write_back(restored.clone());
        self.sync_flags();
        Ok(Some(restored))
    }

    pub(crate) fn redo(&self) -> Result<Option<T>> {
        self.ensure_live("redo")?;
        let restored = {
            let log = self.log.borrow();
            match log.peek_redo() {
                Some(e) => self.clone_fn.apply(&e.snapshot)?,
                None => return Ok(None),
            }
        };
        self.log.borrow_mut().redo();
        log::trace!("history: redo");
        self.write_back(restored.clone());
        self.sync_flags();
        Ok(Some(restored))
    }

    pub(crate) fn clear(&self) -> Result<()> {
        self.ensure_live("clear")?;
        let entry = self.snapshot(&self.cell.get())?;
        self.log.borrow_mut().reset(entry);
        log::trace!("history: cleared");
        self.sync_flags();
        Ok(())
    }

    pub(crate) fn reset(&self) -> Result<()> {
        self.ensure_live("reset")?;
        let restored = self.clone_fn.apply(&self.log.borrow().current().snapshot)?;
        self.write_back(restored);
        Ok(())
    }

    pub(crate) fn dispose(&self) {
        if self.state.replace(HistoryState::Disposed) == HistoryState::Tracking {
            log::debug!("history: disposed");
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.state.get() == HistoryState::Disposed
    }

    // The guard is released only after `set` returns, so observers notified
    // synchronously by the write see the flag raised.
    fn write_back(&self, value: T) {
        let _guard = IgnoreGuard::new(&self.ignoring);
        self.cell.set(value);
    }

    fn sync_flags(&self) {
        let (undo, redo) = {
            let log = self.log.borrow();
            (log.can_undo(), log.can_redo())
        };
        if self.can_undo.get() != undo {
            self.can_undo.set(undo);
        }
        if self.can_redo.get() != redo {
            self.can_redo.set(redo);
        }
    }
}

impl<T: 'static> ManualHistory<T> {
    pub(crate) fn core(&self) -> &Rc<Core<T>> {
        &self.core
    }
}

impl<T: Clone + 'static> ManualHistory<T> {
    /// Starts a history whose first entry is the cell's current value.
    ///
    /// Only `capacity` and `clone_fn` of `options` apply here.
    pub fn new(
        host: Rc<dyn TimerHost>,
        cell: impl Observable<T>,
        options: HistoryOptions<T>,
    ) -> Result<Self> {
        let cell: Rc<dyn Observable<T>> = Rc::new(cell);
        let initial = HistoryEntry {
            snapshot: options.clone_fn.apply(&cell.get())?,
            timestamp: host.now(),
        };
        Ok(Self {
            core: Rc::new(Core {
                cell,
                host,
                clone_fn: options.clone_fn,
                log: RefCell::new(HistoryLog::new(initial, options.capacity)),
                ignoring: Cell::new(false),
                state: Cell::new(HistoryState::Tracking),
                can_undo: signal(false),
                can_redo: signal(false),
            }),
        })
    }

    /// Snapshots the cell's current value as the newest entry.
    pub fn commit(&self) -> Result<()> {
        self.core.commit()
    }

    /// Steps back one entry and writes it into the cell.
    /// Returns the restored value, or `None` at the oldest entry.
    pub fn undo(&self) -> Result<Option<T>> {
        self.core.undo()
    }

    pub fn redo(&self) -> Result<Option<T>> {
        self.core.redo()
    }

    /// Forgets all entries; the cell's current value becomes the only one.
    pub fn clear(&self) -> Result<()> {
        self.core.clear()
    }

    /// Writes the current entry back into the cell, discarding uncommitted changes.
    pub fn reset(&self) -> Result<()> {
        self.core.reset()
    }

    pub fn dispose(&self) {
        self.core.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    pub fn state(&self) -> HistoryState {
        self.core.state.get()
    }

    pub fn can_undo(&self) -> bool {
        self.core.log.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.core.log.borrow().can_redo()
    }

    pub fn can_undo_signal(&self) -> Signal<bool> {
        self.core.can_undo.clone()
    }

    pub fn can_redo_signal(&self) -> Signal<bool> {
        self.core.can_redo.clone()
    }

    /// The entry the cell currently reflects.
    pub fn last(&self) -> HistoryEntry<T> {
        self.core.log.borrow().current().clone()
    }

    /// The current entry followed by the undo stack, newest first.
    pub fn history(&self) -> Vec<HistoryEntry<T>> {
        let log = self.core.log.borrow();
        std::iter::once(log.current())
            .chain(log.undo_stack())
            .cloned()
            .collect()
    }

    pub fn undo_stack(&self) -> Vec<HistoryEntry<T>> {
        self.core.log.borrow().undo_stack().cloned().collect()
    }

    pub fn redo_stack(&self) -> Vec<HistoryEntry<T>> {
        self.core.log.borrow().redo_stack().cloned().collect()
    }

    /// Every snapshot, oldest first.
    pub fn snapshots(&self) -> Vec<T> {
        self.core
            .log
            .borrow()
            .entries()
            .map(|e| e.snapshot.clone())
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.core.log.borrow().cursor()
    }

    pub fn len(&self) -> usize {
        self.core.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.log.borrow().is_empty()
    }
}

pub fn use_manual_ref_history<T: Clone + 'static>(
    host: Rc<dyn TimerHost>,
    cell: impl Observable<T>,
    options: HistoryOptions<T>,
) -> Result<ManualHistory<T>> {
    ManualHistory::new(host, cell, options)
}
