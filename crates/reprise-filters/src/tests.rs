use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use reprise_core::*;

use crate::*;

/// Records `(elapsed ms, arg)` for each real invocation.
fn recorder(timers: &VirtualTimers) -> (Rc<RefCell<Vec<(u64, i32)>>>, impl Fn(i32) + 'static) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let start = timers.now();
    let t = timers.clone();
    let c = calls.clone();
    let f = move |n: i32| {
        let at = t.now().duration_since(start).as_millis() as u64;
        c.borrow_mut().push((at, n));
    };
    (calls, f)
}

#[test]
fn test_bypass_runs_synchronously() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = wrap(timers.host(), FilterPolicy::PassThrough, f);

    let done = w.call(1);
    w.call(2);
    assert_eq!(*calls.borrow(), vec![(0, 1), (0, 2)]);
    assert!(!done.is_pending());
    assert!(!w.is_pending());
}

#[test]
fn test_debounce_coalesces_burst() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_debounce_fn(timers.host(), DebounceOptions::new(Delay::ms(100)), f);

    for n in 0..5 {
        w.call(n);
        timers.advance_ms(20);
    }
    assert!(calls.borrow().is_empty());
    assert!(w.is_pending());

    timers.advance_ms(100);
    assert_eq!(*calls.borrow(), vec![(180, 4)]);
    assert!(!w.is_pending());
}

#[test]
fn test_debounce_superseded_completions_cancel() {
    let timers = VirtualTimers::new();
    let w = use_debounce_fn(timers.host(), DebounceOptions::new(Delay::ms(50)), |n: i32| n * 2);

    let first = w.call(1);
    let second = w.call(2);
    assert!(first.is_cancelled());
    assert!(second.is_pending());

    timers.advance_ms(50);
    assert_eq!(pollster::block_on(second), Ok(4));
    assert_eq!(pollster::block_on(first), Err(Cancelled));
}

#[test]
fn test_debounce_cancel_prevents_invocation() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_debounce_fn(timers.host(), DebounceOptions::new(Delay::ms(100)), f);

    let done = w.call(1);
    timers.advance_ms(50);
    w.cancel();
    w.cancel();
    timers.advance_ms(200);

    assert!(calls.borrow().is_empty());
    assert!(done.is_cancelled());
    assert_eq!(timers.pending(), 0);
}

#[test]
fn test_debounce_max_wait() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let opts = DebounceOptions::new(Delay::ms(100)).max_wait(Delay::ms(250));
    let w = use_debounce_fn(timers.host(), opts, f);

    for n in 0..10 {
        w.call(n);
        timers.advance_ms(50);
    }
    // Never quiet for 100ms, so only max_wait lets calls through.
    assert_eq!(*calls.borrow(), vec![(250, 4), (500, 9)]);
    assert_eq!(timers.pending(), 0);
}

#[test]
fn test_debounce_zero_delay_is_next_tick() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_debounce_fn(timers.host(), DebounceOptions::new(Delay::ZERO), f);

    w.call(1);
    w.call(2);
    assert!(calls.borrow().is_empty());
    timers.flush();
    assert_eq!(*calls.borrow(), vec![(0, 2)]);
}

#[test]
fn test_debounce_reactive_delay() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let delay = signal(Delay::ms(100));
    let w = use_debounce_fn(timers.host(), DebounceOptions::new(&delay), f);

    delay.set(Delay::ms(10));
    w.call(7);
    timers.advance_ms(10);
    assert_eq!(*calls.borrow(), vec![(10, 7)]);
}

#[test]
fn test_throttle_leading_and_trailing() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_throttle_fn(timers.host(), ThrottleOptions::new(Delay::ms(100)), f);

    for n in 0..30 {
        w.call(n);
        timers.advance_ms(10);
    }

    assert_eq!(
        *calls.borrow(),
        vec![(0, 0), (100, 9), (200, 19), (300, 29)]
    );
}

#[test]
fn test_throttle_without_trailing_drops() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_throttle_fn(
        timers.host(),
        ThrottleOptions::new(Delay::ms(100)).trailing(false),
        f,
    );

    w.call(1);
    let dropped = w.call(2);
    timers.advance_ms(100);
    w.call(3);

    assert!(dropped.is_cancelled());
    assert_eq!(*calls.borrow(), vec![(0, 1), (100, 3)]);
}

#[test]
fn test_throttle_without_leading_defers_first_call() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_throttle_fn(
        timers.host(),
        ThrottleOptions::new(Delay::ms(100)).leading(false),
        f,
    );

    w.call(1);
    timers.advance_ms(10);
    w.call(2);
    timers.advance_ms(10);
    w.call(3);
    assert!(calls.borrow().is_empty());

    timers.advance_ms(80);
    assert_eq!(*calls.borrow(), vec![(100, 3)]);
}

#[test]
fn test_throttle_late_tick_newest_call_wins() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_throttle_fn(timers.host(), ThrottleOptions::new(Delay::ms(100)), f);

    w.call(1);
    timers.advance_ms(10);
    let stale = w.call(2);

    // The cooldown ends but the host has not driven the queue yet.
    timers.clock().advance(Duration::from_millis(140));
    w.call(3);
    timers.flush();
    timers.advance_ms(300);

    assert!(stale.is_cancelled());
    assert_eq!(*calls.borrow(), vec![(0, 1), (150, 3)]);
    assert_eq!(timers.pending(), 0);
}

#[test]
fn test_throttle_cancel_drops_trailing() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_throttle_fn(timers.host(), ThrottleOptions::new(Delay::ms(100)), f);

    w.call(1);
    w.call(2);
    assert!(w.is_pending());
    w.cancel();
    timers.advance_ms(200);
    assert_eq!(*calls.borrow(), vec![(0, 1)]);
}

#[test]
fn test_reentrant_call_goes_through_filter() {
    let timers = VirtualTimers::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let slot: Rc<RefCell<Option<FilterWrapper<i32, ()>>>> = Rc::new(RefCell::new(None));

    let w = use_debounce_fn(timers.host(), DebounceOptions::new(Delay::ms(50)), {
        let calls = calls.clone();
        let slot = slot.clone();
        move |n: i32| {
            calls.borrow_mut().push(n);
            if n == 0
                && let Some(w) = slot.borrow().as_ref()
            {
                w.call(1);
            }
        }
    });
    *slot.borrow_mut() = Some(w.clone());

    w.call(0);
    timers.advance_ms(50);
    assert_eq!(*calls.borrow(), vec![0]);
    assert!(w.is_pending());
    timers.advance_ms(50);
    assert_eq!(*calls.borrow(), vec![0, 1]);

    slot.borrow_mut().take();
}

#[test]
fn test_pausable_drops_while_paused() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let gate = pausable_filter(bypass_filter());
    let w = create_filter_wrapper(gate.clone(), f);

    w.call(1);
    gate.pause();
    let dropped = w.call(2);
    assert!(!gate.is_active());
    gate.resume();
    w.call(3);

    assert!(dropped.is_cancelled());
    assert_eq!(*calls.borrow(), vec![(0, 1), (0, 3)]);
}

#[test]
fn test_invalid_delay_is_rejected() {
    assert!(matches!(
        FilterPolicy::debounce_ms(-1.0),
        Err(Error::InvalidArgument { name: "delay", .. })
    ));
    assert!(FilterPolicy::throttle_ms(f64::INFINITY).is_err());
    assert!(Delay::from_millis(f64::NAN).is_err());
    assert_eq!(Delay::from_millis(250.0).unwrap(), Delay::ms(250));
    assert!(matches!(
        Delay::from_millis(1e300),
        Err(Error::InvalidArgument { name: "delay", .. })
    ));
}

#[test]
fn test_huge_delay_never_fires() {
    let timers = VirtualTimers::new();
    let (calls, f) = recorder(&timers);
    let w = use_debounce_fn(
        timers.host(),
        DebounceOptions::new(Delay::ms(u64::MAX)).max_wait(Delay::ms(u64::MAX)),
        f,
    );

    w.call(1);
    timers.advance_ms(10_000);
    assert!(calls.borrow().is_empty());
    assert!(w.is_pending());
    assert_eq!(timers.pending(), 1);
}

#[test]
fn test_watch_debounced_and_stop() {
    let timers = VirtualTimers::new();
    let text = signal(String::new());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let handle = watch_debounced(
        timers.host(),
        &text,
        DebounceOptions::new(Delay::ms(100)),
        {
            let seen = seen.clone();
            move |v: &String| seen.borrow_mut().push(v.clone())
        },
    );

    text.set("a".into());
    text.set("ab".into());
    timers.advance_ms(100);
    text.set("abc".into());
    handle.stop();
    timers.advance_ms(100);

    assert_eq!(*seen.borrow(), vec!["ab".to_string()]);
    assert!(handle.is_stopped());
    assert_eq!(text.subscriber_count(), 0);
}

#[test]
fn test_watch_ignores_mutation_unless_deep() {
    let items = signal(vec![1]);
    let shallow = Rc::new(RefCell::new(0));
    let deep = Rc::new(RefCell::new(0));

    let s = shallow.clone();
    watch_with_filter(&items, bypass_filter(), false, move |_: &Vec<i32>| {
        *s.borrow_mut() += 1
    });
    let d = deep.clone();
    watch_with_filter(&items, bypass_filter(), true, move |_: &Vec<i32>| {
        *d.borrow_mut() += 1
    });

    items.update(|v| v.push(2));
    items.set(vec![]);
    assert_eq!(*shallow.borrow(), 1);
    assert_eq!(*deep.borrow(), 2);
}

#[test]
fn test_watch_stops_with_scope() {
    let timers = VirtualTimers::new();
    let n = signal(0);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let scope = Scope::new();

    let handle = scope.run(|| {
        let seen = seen.clone();
        watch_throttled(
            timers.host(),
            &n,
            ThrottleOptions::new(Delay::ms(100)),
            move |v: &i32| seen.borrow_mut().push(*v),
        )
    });

    n.set(1);
    n.set(2);
    scope.dispose();
    timers.advance_ms(100);

    assert_eq!(*seen.borrow(), vec![1]);
    assert!(handle.is_stopped());
}

#[test]
fn test_ref_debounced_and_throttled() {
    let timers = VirtualTimers::new();
    let source = signal(0);
    let debounced = ref_debounced(timers.host(), &source, Delay::ms(100));
    let throttled = ref_throttled(timers.host(), &source, Delay::ms(100));

    source.set(1);
    assert_eq!(throttled.get(), 1);
    assert_eq!(debounced.get(), 0);

    timers.advance_ms(50);
    source.set(2);
    assert_eq!(throttled.get(), 1);
    assert_eq!(debounced.get(), 0);

    timers.advance_ms(50);
    assert_eq!(throttled.get(), 2);
    assert_eq!(debounced.get(), 0);

    timers.advance_ms(50);
    assert_eq!(debounced.get(), 2);
}
