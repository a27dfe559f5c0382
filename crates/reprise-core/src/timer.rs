//! Clocks and single-threaded timers.
//!
//! Everything time-driven in reprise (debounce, throttle, deferred history
//! flushes) goes through a [`TimerHost`] handed in by the caller rather than a
//! process-wide clock. Two hosts ship with the crate:
//!
//! - [`TimerQueue`] fires callbacks against any [`Clock`]. With
//!   [`SystemClock`] it is a tiny event loop: call [`TimerQueue::run_due`] from
//!   your frame/tick hook, or [`TimerQueue::run_until_idle`] to block.
//! - [`VirtualTimers`] pairs a queue with a [`ManualClock`] so tests can move
//!   time forward deterministically.
//!
//! Callbacks never run inside `schedule`, even with a zero delay; they run on
//! the next drive of the queue.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use slotmap::{SlotMap, new_key_type};
use web_time::Instant;

use crate::Error;

new_key_type! {
    /// Handle to a scheduled callback.
    pub struct TimerId;
}

/// Upper bound on callbacks fired by one drive of a queue.
const MAX_FIRES_PER_DRIVE: usize = 100_000;

/// Stand-in deadline distance for delays too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// `from + delay`, clamped to a deadline that never comes in practice when
/// the sum is not representable.
pub fn deadline_after(from: Instant, delay: Duration) -> Instant {
    from.checked_add(delay).unwrap_or_else(|| from + FAR_FUTURE.min(delay))
}

pub trait Clock: 'static {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock you can drive deterministically. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock(Rc<Cell<Instant>>);

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(t: Instant) -> Self {
        Self(Rc::new(Cell::new(t)))
    }

    pub fn advance(&self, d: Duration) {
        self.0.set(deadline_after(self.0.get(), d));
    }

    /// Moves the clock to `t`; never moves backwards.
    pub fn set(&self, t: Instant) {
        if t > self.0.get() {
            self.0.set(t);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

/// The timer capability supplied by the host environment.
pub trait TimerHost {
    fn now(&self) -> Instant;

    /// Run `f` once `delay` has elapsed. A zero delay still defers to the next tick.
    fn schedule(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a scheduled callback. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);

    /// Unhandled-error channel for failures inside timer callbacks,
    /// which have no caller to return to.
    fn report_error(&self, error: Error) {
        log::error!("unhandled error in timer callback: {error}");
    }
}

struct Scheduled {
    deadline: Instant,
    seq: u64,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct QueueState {
    timers: SlotMap<TimerId, Scheduled>,
    order: BTreeMap<(Instant, u64), TimerId>,
    next_seq: u64,
}

impl QueueState {
    fn pop_due(&mut self, now: Instant) -> Option<Box<dyn FnOnce()>> {
        let (&key, &id) = self.order.iter().next()?;
        if key.0 > now {
            return None;
        }
        self.order.remove(&key);
        self.timers.remove(id).map(|s| s.task)
    }
}

/// Timers fired in deadline order (ties in scheduling order) against a [`Clock`].
#[derive(Clone)]
pub struct TimerQueue {
    clock: Rc<dyn Clock>,
    state: Rc<RefCell<QueueState>>,
}

impl TimerQueue {
    pub fn new(clock: impl Clock) -> Self {
        Self {
            clock: Rc::new(clock),
            state: Rc::new(RefCell::new(QueueState::default())),
        }
    }

    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.borrow().order.keys().next().map(|k| k.0)
    }

    /// Fires every timer that is due now, including ones scheduled by
    /// callbacks during this call. Returns how many fired.
    pub fn run_due(&self) -> usize {
        let mut fired = 0;
        while fired < MAX_FIRES_PER_DRIVE {
            let now = self.clock.now();
            let task = self.state.borrow_mut().pop_due(now);
            match task {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => return fired,
            }
        }
        log::warn!("timer queue: stopped after {fired} callbacks; a timer keeps rescheduling itself");
        fired
    }

    /// Blocks the thread, sleeping until each deadline, until no timers remain.
    ///
    /// Only meaningful for clocks that advance on their own.
    pub fn run_until_idle(&self) {
        loop {
            self.run_due();
            let Some(deadline) = self.next_deadline() else {
                return;
            };
            let now = self.clock.now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }
    }

    fn fire_next_before(&self, limit: Instant, clock: &ManualClock) -> bool {
        let next = {
            let mut st = self.state.borrow_mut();
            match st.order.keys().next().copied() {
                Some(key) if key.0 <= limit => {
                    clock.set(key.0);
                    st.pop_due(key.0)
                }
                _ => None,
            }
        };
        match next {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }
}

impl TimerHost for TimerQueue {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn schedule(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerId {
        let deadline = deadline_after(self.clock.now(), delay);
        let mut st = self.state.borrow_mut();
        let seq = st.next_seq;
        st.next_seq += 1;
        let id = st.timers.insert(Scheduled {
            deadline,
            seq,
            task: f,
        });
        st.order.insert((deadline, seq), id);
        id
    }

    fn cancel(&self, id: TimerId) {
        let mut st = self.state.borrow_mut();
        if let Some(s) = st.timers.remove(id) {
            st.order.remove(&(s.deadline, s.seq));
        }
    }
}

/// A [`TimerQueue`] over a [`ManualClock`], for deterministic tests and replays.
#[derive(Clone)]
pub struct VirtualTimers {
    clock: ManualClock,
    queue: TimerQueue,
    errors: Rc<RefCell<Vec<Error>>>,
}

impl Default for VirtualTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTimers {
    pub fn new() -> Self {
        let clock = ManualClock::new();
        Self {
            queue: TimerQueue::new(clock.clone()),
            clock,
            errors: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Shared handle, ready to pass wherever a timer host is expected.
    pub fn host(&self) -> Rc<dyn TimerHost> {
        Rc::new(self.clone())
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Moves time forward by `d`, stopping at each deadline on the way to fire it.
    pub fn advance(&self, d: Duration) {
        let target = deadline_after(self.clock.now(), d);
        let mut fired = 0;
        while fired < MAX_FIRES_PER_DRIVE && self.queue.fire_next_before(target, &self.clock) {
            fired += 1;
        }
        self.clock.set(target);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Fires whatever is due without moving the clock (the "next tick").
    pub fn flush(&self) -> usize {
        self.queue.run_due()
    }

    /// Jumps to each remaining deadline until nothing is scheduled.
    pub fn run_until_idle(&self) {
        while let Some(deadline) = self.queue.next_deadline() {
            self.advance(deadline.saturating_duration_since(self.clock.now()));
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    pub fn errors(&self) -> Vec<Error> {
        self.errors.borrow().clone()
    }

    pub fn take_errors(&self) -> Vec<Error> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }
}

impl TimerHost for VirtualTimers {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn schedule(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerId {
        self.queue.schedule(delay, f)
    }

    fn cancel(&self, id: TimerId) {
        self.queue.cancel(id)
    }

    fn report_error(&self, error: Error) {
        log::error!("unhandled error in timer callback: {error}");
        self.errors.borrow_mut().push(error);
    }
}
