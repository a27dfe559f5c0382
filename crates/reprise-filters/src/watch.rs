use std::rc::Rc;

use reprise_core::{ChangeKind, Dispose, Observable, Signal, Source, TimerHost, own, signal};

use crate::{DebounceOptions, Delay, EventFilter, ThrottleOptions, debounce_filter, throttle_filter};

/// Live watcher. Stopping it unsubscribes and drops any queued callback.
#[derive(Clone)]
pub struct WatchHandle {
    dispose: Dispose,
    filter: Rc<dyn EventFilter>,
}

impl WatchHandle {
    pub fn stop(&self) {
        self.dispose.run();
    }

    pub fn is_stopped(&self) -> bool {
        self.dispose.is_disposed()
    }

    pub fn is_pending(&self) -> bool {
        self.filter.is_pending()
    }
}

/// Calls `cb` with the cell's value on change, timed by `filter`.
///
/// In-place mutations only count when `deep` is set. The watcher belongs to
/// the current scope, if there is one.
pub fn watch_with_filter<T, C>(
    cell: &C,
    filter: Rc<dyn EventFilter>,
    deep: bool,
    cb: impl Fn(&T) + 'static,
) -> WatchHandle
where
    T: Clone + 'static,
    C: Observable<T>,
{
    let cb = Rc::new(cb);
    let sub = cell.on_change(Box::new({
        let filter = filter.clone();
        move |value: &T, kind: ChangeKind| {
            if kind == ChangeKind::Mutated && !deep {
                return;
            }
            let cb = cb.clone();
            let value = value.clone();
            filter.apply(Box::new(move || cb(&value)));
        }
    }));
    let dispose = own(Dispose::new({
        let filter = filter.clone();
        move || {
            sub.run();
            filter.cancel();
        }
    }));
    WatchHandle { dispose, filter }
}

pub fn watch_debounced<T, C>(
    host: Rc<dyn TimerHost>,
    cell: &C,
    options: DebounceOptions,
    cb: impl Fn(&T) + 'static,
) -> WatchHandle
where
    T: Clone + 'static,
    C: Observable<T>,
{
    watch_with_filter(cell, debounce_filter(host, options), false, cb)
}

pub fn watch_throttled<T, C>(
    host: Rc<dyn TimerHost>,
    cell: &C,
    options: ThrottleOptions,
    cb: impl Fn(&T) + 'static,
) -> WatchHandle
where
    T: Clone + 'static,
    C: Observable<T>,
{
    watch_with_filter(cell, throttle_filter(host, options), false, cb)
}

/// A signal that follows another through a filter.
pub struct FilteredRef<T: 'static> {
    pub value: Signal<T>,
    pub handle: WatchHandle,
}

impl<T: Clone + 'static> FilteredRef<T> {
    pub fn get(&self) -> T {
        self.value.get()
    }
}

fn filtered_ref<T: Clone + 'static>(
    source: &Signal<T>,
    filter: Rc<dyn EventFilter>,
) -> FilteredRef<T> {
    let value = signal(source.get());
    let out = value.clone();
    let handle = watch_with_filter(source, filter, true, move |v: &T| out.set(v.clone()));
    FilteredRef { value, handle }
}

/// Follows `source`, updating only after it has been quiet for `delay`.
pub fn ref_debounced<T: Clone + 'static>(
    host: Rc<dyn TimerHost>,
    source: &Signal<T>,
    delay: impl Into<Source<Delay>>,
) -> FilteredRef<T> {
    filtered_ref(source, debounce_filter(host, DebounceOptions::new(delay)))
}

/// Follows `source`, updating at most once per `delay`.
pub fn ref_throttled<T: Clone + 'static>(
    host: Rc<dyn TimerHost>,
    source: &Signal<T>,
    delay: impl Into<Source<Delay>>,
) -> FilteredRef<T> {
    filtered_ref(source, throttle_filter(host, ThrottleOptions::new(delay)))
}
