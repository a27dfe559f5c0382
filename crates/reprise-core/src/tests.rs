use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::scope::*;
use crate::signal::*;
use crate::timer::*;
use crate::{Dispose, Error, Source, effect};

#[test]
fn test_signal_basic() {
    let sig = signal(42);
    assert_eq!(sig.get(), 42);

    sig.set(100);
    assert_eq!(sig.get(), 100);

    sig.update(|v| *v += 1);
    assert_eq!(sig.get(), 101);
}

#[test]
fn test_signal_subscription() {
    let sig = signal(0);
    let called = Rc::new(RefCell::new(false));

    let called_clone = called.clone();
    sig.subscribe(move |_| {
        *called_clone.borrow_mut() = true;
    });

    sig.set(42);
    assert!(*called.borrow());
}

#[test]
fn test_signal_reports_change_kind() {
    let sig = signal(vec![1]);
    let kinds = Rc::new(RefCell::new(Vec::new()));
    let k = kinds.clone();
    sig.watch(move |_, kind| k.borrow_mut().push(kind));

    sig.update(|v| v.push(2));
    sig.set(vec![]);
    assert_eq!(
        *kinds.borrow(),
        vec![ChangeKind::Mutated, ChangeKind::Replaced]
    );
}

#[test]
fn test_signal_unsubscribe() {
    let sig = signal(0);
    let hits = Rc::new(RefCell::new(0));
    let h = hits.clone();
    let id = sig.subscribe(move |_| *h.borrow_mut() += 1);

    sig.set(1);
    assert!(sig.unsubscribe(id));
    assert!(!sig.unsubscribe(id));
    sig.set(2);
    assert_eq!(*hits.borrow(), 1);
    assert_eq!(sig.subscriber_count(), 0);
}

#[test]
fn test_signal_reentrant_write_from_subscriber() {
    let sig = signal(0);
    let s2 = sig.clone();
    sig.subscribe(move |v| {
        if *v < 3 {
            s2.set(v + 1);
        }
    });
    sig.set(0);
    assert_eq!(sig.get(), 3);
}

#[test]
fn test_observable_on_change_dispose() {
    let sig = signal(String::from("a"));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let d = Observable::on_change(
        &sig,
        Box::new(move |v: &String, _: ChangeKind| s.borrow_mut().push(v.clone())),
    );

    sig.set("b".into());
    d.run();
    d.run();
    sig.set("c".into());
    assert_eq!(*seen.borrow(), vec!["b".to_string()]);
    assert!(d.is_disposed());
}

#[test]
fn test_scope_drop_runs_disposers() {
    let cleaned_up = Rc::new(RefCell::new(false));

    {
        let scope = Scope::new();
        let cleaned_up_clone = cleaned_up.clone();
        scope.add_disposer(move || {
            *cleaned_up_clone.borrow_mut() = true;
        });

        assert!(!*cleaned_up.borrow());
    }

    assert!(*cleaned_up.borrow());
}

#[test]
fn test_scope_explicit_dispose() {
    let cleaned_up = Rc::new(RefCell::new(0));

    let scope = Scope::new();
    let cleaned_up_clone = cleaned_up.clone();
    scope.add_disposer(move || {
        *cleaned_up_clone.borrow_mut() += 1;
    });

    assert_eq!(*cleaned_up.borrow(), 0);
    scope.dispose();
    scope.dispose();
    assert_eq!(*cleaned_up.borrow(), 1);
    assert!(scope.is_disposed());
}

#[test]
fn test_scope_children_disposed_first() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let parent = Scope::new();
    let child = parent.child();

    let o = order.clone();
    parent.add_disposer(move || o.borrow_mut().push("parent"));
    let o = order.clone();
    child.add_disposer(move || o.borrow_mut().push("child"));

    parent.dispose();
    assert_eq!(*order.borrow(), vec!["child", "parent"]);
    assert!(child.is_disposed());
}

#[test]
fn test_effect_registers_on_current_scope() {
    let ran = Rc::new(RefCell::new(false));
    let scope = Scope::new();
    let r = ran.clone();
    let d = scope.run(|| {
        assert!(current_scope().is_some());
        effect(move || Dispose::new(move || *r.borrow_mut() = true))
    });
    assert!(current_scope().is_none());

    scope.dispose();
    assert!(*ran.borrow());
    assert!(d.is_disposed());
}

#[test]
fn test_source_resolution() {
    let s = signal(5);
    let from_value: Source<i32> = 1.into();
    let from_signal: Source<i32> = (&s).into();
    let from_getter = Source::getter({
        let s = s.clone();
        move || s.get() * 10
    });

    assert_eq!(from_value.get(), 1);
    assert_eq!(from_signal.get(), 5);
    assert_eq!(from_getter.get(), 50);

    s.set(7);
    assert_eq!(from_signal.get(), 7);
    assert_eq!(from_getter.get(), 70);
}

#[test]
fn test_virtual_timers_fire_in_deadline_order() {
    let timers = VirtualTimers::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    for (name, ms) in [("b", 20u64), ("a", 10), ("c", 20)] {
        let l = log.clone();
        timers.schedule(
            Duration::from_millis(ms),
            Box::new(move || l.borrow_mut().push(name)),
        );
    }

    timers.advance_ms(15);
    assert_eq!(*log.borrow(), vec!["a"]);
    timers.advance_ms(5);
    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    assert_eq!(timers.pending(), 0);
}

#[test]
fn test_zero_delay_is_deferred() {
    let timers = VirtualTimers::new();
    let fired = signal(false);
    let f = fired.clone();
    timers.schedule(Duration::ZERO, Box::new(move || f.set(true)));

    assert!(!fired.get());
    assert_eq!(timers.flush(), 1);
    assert!(fired.get());
}

#[test]
fn test_cancel_timer() {
    let timers = VirtualTimers::new();
    let fired = signal(false);
    let f = fired.clone();
    let id = timers.schedule(Duration::from_millis(5), Box::new(move || f.set(true)));

    timers.cancel(id);
    timers.cancel(id);
    timers.advance_ms(10);
    assert!(!fired.get());
}

#[test]
fn test_callback_sees_its_own_deadline() {
    let timers = VirtualTimers::new();
    let start = timers.now();
    let seen = Rc::new(RefCell::new(None));

    let s = seen.clone();
    let t = timers.clone();
    timers.schedule(
        Duration::from_millis(30),
        Box::new(move || *s.borrow_mut() = Some(t.now())),
    );
    timers.advance_ms(100);

    assert_eq!(*seen.borrow(), Some(start + Duration::from_millis(30)));
    assert_eq!(timers.now(), start + Duration::from_millis(100));
}

#[test]
fn test_timers_scheduled_by_callbacks_fire_within_advance() {
    let timers = VirtualTimers::new();
    let hits = Rc::new(RefCell::new(0));

    let h = hits.clone();
    let t = timers.clone();
    timers.schedule(
        Duration::from_millis(10),
        Box::new(move || {
            *h.borrow_mut() += 1;
            let h = h.clone();
            t.schedule(
                Duration::from_millis(10),
                Box::new(move || *h.borrow_mut() += 1),
            );
        }),
    );

    timers.advance_ms(20);
    assert_eq!(*hits.borrow(), 2);
}

#[test]
fn test_unrepresentable_deadline_is_clamped() {
    let timers = VirtualTimers::new();
    let fired = signal(false);
    let f = fired.clone();
    timers.schedule(Duration::MAX, Box::new(move || f.set(true)));

    timers.advance_ms(1_000);
    assert!(!fired.get());
    assert_eq!(timers.pending(), 1);
    let far = deadline_after(timers.now(), Duration::MAX);
    assert!(far > timers.now());
}

#[test]
fn test_report_error_is_collected() {
    let timers = VirtualTimers::new();
    timers.report_error(Error::CloneFailure("boom".into()));
    assert_eq!(timers.take_errors().len(), 1);
    assert!(timers.errors().is_empty());
}

#[test]
fn test_timer_queue_system_clock() {
    let queue = TimerQueue::system();
    let fired = signal(0);
    let f = fired.clone();
    queue.schedule(Duration::from_millis(1), Box::new(move || f.set(1)));
    assert_eq!(queue.pending(), 1);
    queue.run_until_idle();
    assert_eq!(fired.get(), 1);
    assert!(queue.next_deadline().is_none());
}
