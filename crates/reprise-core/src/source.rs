use std::rc::Rc;

use crate::Signal;

/// A value that may be fixed, live in a signal, or be computed on demand.
///
/// Composables take `impl Into<Source<T>>` and call [`Source::get`] whenever
/// they need the current value; nothing downstream cares which form it was.
#[derive(Clone)]
pub enum Source<T: 'static> {
    Static(T),
    Signal(Signal<T>),
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + 'static> Source<T> {
    pub fn get(&self) -> T {
        match self {
            Source::Static(v) => v.clone(),
            Source::Signal(s) => s.get(),
            Source::Getter(f) => f(),
        }
    }

    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        Source::Getter(Rc::new(f))
    }
}

impl<T: 'static> From<T> for Source<T> {
    fn from(v: T) -> Self {
        Source::Static(v)
    }
}

impl<T: 'static> From<Signal<T>> for Source<T> {
    fn from(s: Signal<T>) -> Self {
        Source::Signal(s)
    }
}

impl<T: 'static> From<&Signal<T>> for Source<T> {
    fn from(s: &Signal<T>) -> Self {
        Source::Signal(s.clone())
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Source::Signal(s) => f.debug_tuple("Signal").field(s).finish(),
            Source::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}
