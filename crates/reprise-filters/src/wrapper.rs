use std::rc::Rc;

use reprise_core::TimerHost;

use crate::completion::completion;
use crate::{
    Completion, DebounceOptions, EventFilter, FilterPolicy, ThrottleOptions, debounce_filter,
    throttle_filter,
};

/// A function whose calls go through an [`EventFilter`].
///
/// Calls return a [`Completion`] rather than the function's value, since the
/// filter may run the function later or not at all.
pub struct FilterWrapper<A, R> {
    filter: Rc<dyn EventFilter>,
    func: Rc<dyn Fn(A) -> R>,
}

impl<A, R> Clone for FilterWrapper<A, R> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            func: self.func.clone(),
        }
    }
}

impl<A: 'static, R: 'static> FilterWrapper<A, R> {
    pub fn call(&self, args: A) -> Completion<R> {
        let (resolver, done) = completion();
        let func = self.func.clone();
        self.filter
            .apply(Box::new(move || resolver.resolve(func(args))));
        done
    }

    /// Drops the queued call; its completion resolves as cancelled.
    pub fn cancel(&self) {
        self.filter.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.filter.is_pending()
    }

    pub fn filter(&self) -> &Rc<dyn EventFilter> {
        &self.filter
    }
}

pub fn create_filter_wrapper<A, R>(
    filter: Rc<dyn EventFilter>,
    func: impl Fn(A) -> R + 'static,
) -> FilterWrapper<A, R> {
    FilterWrapper {
        filter,
        func: Rc::new(func),
    }
}

/// Wraps `func` with the timing `policy`.
pub fn wrap<A, R>(
    host: Rc<dyn TimerHost>,
    policy: FilterPolicy,
    func: impl Fn(A) -> R + 'static,
) -> FilterWrapper<A, R> {
    create_filter_wrapper(policy.into_filter(host), func)
}

pub fn use_debounce_fn<A, R>(
    host: Rc<dyn TimerHost>,
    options: DebounceOptions,
    func: impl Fn(A) -> R + 'static,
) -> FilterWrapper<A, R> {
    create_filter_wrapper(debounce_filter(host, options), func)
}

pub fn use_throttle_fn<A, R>(
    host: Rc<dyn TimerHost>,
    options: ThrottleOptions,
    func: impl Fn(A) -> R + 'static,
) -> FilterWrapper<A, R> {
    create_filter_wrapper(throttle_filter(host, options), func)
}
