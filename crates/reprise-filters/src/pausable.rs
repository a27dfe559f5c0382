use std::rc::Rc;

use reprise_core::{Signal, signal};

use crate::{EventFilter, Invoke};

/// Gate in front of another filter. While paused, calls are dropped.
pub struct Pausable {
    inner: Rc<dyn EventFilter>,
    active: Signal<bool>,
}

impl Pausable {
    pub fn new(inner: Rc<dyn EventFilter>) -> Self {
        Self {
            inner,
            active: signal(true),
        }
    }

    pub fn pause(&self) {
        if self.active.get() {
            self.active.set(false);
        }
    }

    pub fn resume(&self) {
        if !self.active.get() {
            self.active.set(true);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Reactive view of the active flag, for bindings.
    pub fn active(&self) -> Signal<bool> {
        self.active.clone()
    }
}

impl EventFilter for Pausable {
    fn apply(&self, invoke: Invoke) {
        if self.active.get() {
            self.inner.apply(invoke);
        } else {
            log::trace!("pausable: dropped call while paused");
        }
    }

    fn cancel(&self) {
        self.inner.cancel();
    }

    fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }
}

pub fn pausable_filter(inner: Rc<dyn EventFilter>) -> Rc<Pausable> {
    Rc::new(Pausable::new(inner))
}
