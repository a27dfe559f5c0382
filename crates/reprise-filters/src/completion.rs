use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use thiserror::Error;

/// The call was superseded, dropped, or cancelled before it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call was cancelled before it ran")]
pub struct Cancelled;

enum Outcome<R> {
    Waiting,
    Ready(R),
    Cancelled,
    Taken,
}

/// Result of a filtered call that may not have run yet.
///
/// Await it to get `Ok(value)` once the wrapped function runs, or
/// `Err(Cancelled)` if the filter discarded the call. Fire-and-forget callers
/// can simply drop it; dropping never cancels the call itself.
pub struct Completion<R> {
    rx: RefCell<oneshot::Receiver<R>>,
    outcome: RefCell<Outcome<R>>,
}

/// Write side of a [`Completion`]. Dropping it unresolved cancels the completion.
pub(crate) struct Resolver<R> {
    tx: oneshot::Sender<R>,
}

pub(crate) fn completion<R>() -> (Resolver<R>, Completion<R>) {
    let (tx, rx) = oneshot::channel();
    (
        Resolver { tx },
        Completion {
            rx: RefCell::new(rx),
            outcome: RefCell::new(Outcome::Waiting),
        },
    )
}

impl<R> Resolver<R> {
    pub(crate) fn resolve(self, value: R) {
        // Nobody is listening if the completion was dropped; the call still ran.
        let _ = self.tx.send(value);
    }
}

impl<R> Completion<R> {
    /// Moves a delivered value or a cancellation out of the channel.
    fn refresh(&self) {
        let mut outcome = self.outcome.borrow_mut();
        if !matches!(*outcome, Outcome::Waiting) {
            return;
        }
        match self.rx.borrow_mut().try_recv() {
            Ok(Some(v)) => *outcome = Outcome::Ready(v),
            Ok(None) => {}
            Err(oneshot::Canceled) => *outcome = Outcome::Cancelled,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.refresh();
        matches!(*self.outcome.borrow(), Outcome::Waiting)
    }

    pub fn is_cancelled(&self) -> bool {
        self.refresh();
        matches!(*self.outcome.borrow(), Outcome::Cancelled)
    }

    /// Takes the value if the call has run. Later calls return `None`.
    pub fn take(&self) -> Option<R> {
        self.refresh();
        let mut outcome = self.outcome.borrow_mut();
        match std::mem::replace(&mut *outcome, Outcome::Taken) {
            Outcome::Ready(v) => Some(v),
            other => {
                *outcome = other;
                None
            }
        }
    }
}

impl<R> Future for Completion<R> {
    type Output = Result<R, Cancelled>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &*self;
        let mut outcome = this.outcome.borrow_mut();
        match std::mem::replace(&mut *outcome, Outcome::Taken) {
            Outcome::Ready(v) => Poll::Ready(Ok(v)),
            Outcome::Waiting => match Pin::new(&mut *this.rx.borrow_mut()).poll(cx) {
                Poll::Ready(Ok(v)) => Poll::Ready(Ok(v)),
                Poll::Ready(Err(oneshot::Canceled)) => {
                    *outcome = Outcome::Cancelled;
                    Poll::Ready(Err(Cancelled))
                }
                Poll::Pending => {
                    *outcome = Outcome::Waiting;
                    Poll::Pending
                }
            },
            // A value already handed out through `take` reads as cancelled here.
            Outcome::Cancelled | Outcome::Taken => {
                *outcome = Outcome::Cancelled;
                Poll::Ready(Err(Cancelled))
            }
        }
    }
}

impl<R> std::fmt::Debug for Completion<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.refresh();
        let state = match *self.outcome.borrow() {
            Outcome::Waiting => "pending",
            Outcome::Ready(_) => "ready",
            Outcome::Cancelled => "cancelled",
            Outcome::Taken => "taken",
        };
        f.debug_tuple("Completion").field(&state).finish()
    }
}
