use std::cell::RefCell;
use std::rc::{Rc, Weak};

use reprise_core::{Source, TimerHost, TimerId, deadline_after};
use web_time::Instant;

use crate::{Delay, EventFilter, Invoke};

#[derive(Clone, Debug)]
pub struct DebounceOptions {
    pub delay: Source<Delay>,
    /// Longest a burst of calls may keep deferring the call.
    pub max_wait: Option<Source<Delay>>,
}

impl DebounceOptions {
    pub fn new(delay: impl Into<Source<Delay>>) -> Self {
        Self {
            delay: delay.into(),
            max_wait: None,
        }
    }

    pub fn max_wait(mut self, max_wait: impl Into<Source<Delay>>) -> Self {
        self.max_wait = Some(max_wait.into());
        self
    }
}

#[derive(Default)]
struct DebounceState {
    timer: Option<TimerId>,
    pending: Option<Invoke>,
    burst_start: Option<Instant>,
}

/// Runs only the last call of a burst, once `delay` passes with no new calls.
///
/// With `max_wait`, the single timer is pulled in so the call runs no later
/// than `max_wait` after the first call of the burst.
pub struct Debounce {
    host: Rc<dyn TimerHost>,
    options: DebounceOptions,
    state: Rc<RefCell<DebounceState>>,
}

impl Debounce {
    pub fn new(host: Rc<dyn TimerHost>, options: DebounceOptions) -> Self {
        Self {
            host,
            options,
            state: Rc::new(RefCell::new(DebounceState::default())),
        }
    }
}

impl EventFilter for Debounce {
    fn apply(&self, invoke: Invoke) {
        let delay = self.options.delay.get().as_duration();
        let max_wait = self.options.max_wait.as_ref().map(|m| m.get().as_duration());
        let now = self.host.now();

        let superseded = {
            let mut st = self.state.borrow_mut();
            if let Some(id) = st.timer.take() {
                self.host.cancel(id);
            }
            let superseded = st.pending.replace(invoke);
            let start = *st.burst_start.get_or_insert(now);

            let mut wait = delay;
            if let Some(max) = max_wait {
                wait = wait.min(deadline_after(start, max).saturating_duration_since(now));
            }

            let weak = Rc::downgrade(&self.state);
            st.timer = Some(self.host.schedule(wait, Box::new(move || fire(&weak))));
            superseded
        };
        if superseded.is_some() {
            log::trace!("debounce: superseded a queued call");
        }
    }

    fn cancel(&self) {
        let dropped = {
            let mut st = self.state.borrow_mut();
            if let Some(id) = st.timer.take() {
                self.host.cancel(id);
            }
            st.burst_start = None;
            st.pending.take()
        };
        drop(dropped);
    }

    fn is_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }
}

impl Drop for Debounce {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn fire(state: &Weak<RefCell<DebounceState>>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let invoke = {
        let mut st = state.borrow_mut();
        st.timer = None;
        st.burst_start = None;
        st.pending.take()
    };
    if let Some(invoke) = invoke {
        invoke();
    }
}
