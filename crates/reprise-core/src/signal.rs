use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::Dispose;

pub type SubId = usize;

/// How a cell's value changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// The whole value was replaced via `set`.
    Replaced,
    /// The value was mutated in place via `update`.
    Mutated,
}

type Subscriber<T> = Rc<dyn Fn(&T, ChangeKind)>;

pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Inner<T> {
    value: T,
    next_sub: SubId,
    subs: SmallVec<[(SubId, Subscriber<T>); 2]>,
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            next_sub: 0,
            subs: SmallVec::new(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    /// Read the value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    pub fn set(&self, v: T)
    where
        T: Clone,
    {
        self.0.borrow_mut().value = v;
        self.notify(ChangeKind::Replaced);
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F)
    where
        T: Clone,
    {
        f(&mut self.0.borrow_mut().value);
        self.notify(ChangeKind::Mutated);
    }

    /// Subscribe to every change, replacement or in-place.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.watch(move |v, _| f(v))
    }

    /// Subscribe with the kind of change that happened.
    pub fn watch(&self, f: impl Fn(&T, ChangeKind) + 'static) -> SubId {
        let mut inner = self.0.borrow_mut();
        let id = inner.next_sub;
        inner.next_sub += 1;
        inner.subs.push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        let mut inner = self.0.borrow_mut();
        let before = inner.subs.len();
        inner.subs.retain(|(sid, _)| *sid != id);
        inner.subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subs.len()
    }

    // Subscribers run with no borrow held so they may read or write this cell.
    fn notify(&self, kind: ChangeKind)
    where
        T: Clone,
    {
        let (value, subs) = {
            let inner = self.0.borrow();
            if inner.subs.is_empty() {
                return;
            }
            let subs: SmallVec<[Subscriber<T>; 2]> =
                inner.subs.iter().map(|(_, s)| s.clone()).collect();
            (inner.value.clone(), subs)
        };
        for s in subs {
            s(&value, kind);
        }
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal").field(&self.0.borrow().value).finish()
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}

/// The reactive cell capability consumed by history tracking and watchers.
///
/// Anything that can hand out its value, accept a new one and notify
/// observers of writes can be tracked; `Signal<T>` is the stock implementation.
pub trait Observable<T>: 'static {
    fn get(&self) -> T;
    fn set(&self, value: T);
    /// Register `f` for every subsequent write. Running the returned guard unsubscribes.
    fn on_change(&self, f: Box<dyn Fn(&T, ChangeKind)>) -> Dispose;
}

impl<T: Clone + 'static> Observable<T> for Signal<T> {
    fn get(&self) -> T {
        Signal::get(self)
    }

    fn set(&self, value: T) {
        Signal::set(self, value)
    }

    fn on_change(&self, f: Box<dyn Fn(&T, ChangeKind)>) -> Dispose {
        let id = self.watch(move |v, kind| f(v, kind));
        let weak = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                Signal(inner).unsubscribe(id);
            }
        })
    }
}
