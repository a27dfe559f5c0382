use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use reprise_core::{Source, TimerHost, TimerId};
use web_time::Instant;

use crate::{Delay, EventFilter, Invoke};

#[derive(Clone, Debug)]
pub struct ThrottleOptions {
    pub delay: Source<Delay>,
    /// Run the latest call made during the cooldown when it ends.
    pub trailing: bool,
    /// Run the first call of a window immediately.
    pub leading: bool,
}

impl ThrottleOptions {
    pub fn new(delay: impl Into<Source<Delay>>) -> Self {
        Self {
            delay: delay.into(),
            trailing: true,
            leading: true,
        }
    }

    pub fn trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }
}

#[derive(Default)]
struct ThrottleState {
    last_exec: Option<Instant>,
    timer: Option<TimerId>,
    pending: Option<Invoke>,
}

/// Runs at most one call per `delay`.
///
/// The first call of a window runs immediately (unless `leading` is off) and
/// opens a cooldown. Calls during the cooldown collapse into the single
/// trailing call, which runs with the latest arguments when the cooldown ends;
/// without `trailing` they are dropped.
pub struct Throttle {
    host: Rc<dyn TimerHost>,
    options: ThrottleOptions,
    state: Rc<RefCell<ThrottleState>>,
}

impl Throttle {
    pub fn new(host: Rc<dyn TimerHost>, options: ThrottleOptions) -> Self {
        Self {
            host,
            options,
            state: Rc::new(RefCell::new(ThrottleState::default())),
        }
    }

    fn schedule_trailing(&self, st: &mut ThrottleState, wait: Duration) {
        if st.timer.is_none() {
            let weak = Rc::downgrade(&self.state);
            let host = self.host.clone();
            st.timer = Some(
                self.host
                    .schedule(wait, Box::new(move || fire_trailing(&weak, host.as_ref()))),
            );
        }
    }
}

impl EventFilter for Throttle {
    fn apply(&self, invoke: Invoke) {
        let delay = self.options.delay.get().as_duration();
        let now = self.host.now();

        let (run_now, dropped) = {
            let mut st = self.state.borrow_mut();
            let elapsed = st.last_exec.map(|t| now.saturating_duration_since(t));
            let window_open = elapsed.is_none_or(|e| e >= delay);

            if delay.is_zero() {
                // Still goes through the timer so ordering is "next tick".
                let prev = st.pending.replace(invoke);
                self.schedule_trailing(&mut st, Duration::ZERO);
                (None, prev)
            } else if window_open && self.options.leading {
                // A trailing call the host has not fired yet is older than this one.
                if let Some(id) = st.timer.take() {
                    self.host.cancel(id);
                }
                st.last_exec = Some(now);
                (Some(invoke), st.pending.take())
            } else if self.options.trailing {
                let wait = match elapsed {
                    Some(e) if !window_open => delay - e,
                    _ => delay,
                };
                let prev = st.pending.replace(invoke);
                self.schedule_trailing(&mut st, wait);
                (None, prev)
            } else {
                (None, Some(invoke))
            }
        };

        drop(dropped);
        if let Some(invoke) = run_now {
            invoke();
        }
    }

    fn cancel(&self) {
        let dropped = {
            let mut st = self.state.borrow_mut();
            if let Some(id) = st.timer.take() {
                self.host.cancel(id);
            }
            st.pending.take()
        };
        drop(dropped);
    }

    fn is_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }
}

impl Drop for Throttle {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn fire_trailing(state: &Weak<RefCell<ThrottleState>>, host: &dyn TimerHost) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let invoke = {
        let mut st = state.borrow_mut();
        st.timer = None;
        let invoke = st.pending.take();
        if invoke.is_some() {
            st.last_exec = Some(host.now());
        }
        invoke
    };
    if let Some(invoke) = invoke {
        invoke();
    }
}
