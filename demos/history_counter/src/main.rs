use std::rc::Rc;
use std::time::Duration;

use reprise_core::{Scope, TimerHost, TimerQueue, signal};
use reprise_filters::Delay;
use reprise_history::{HistoryOptions, use_debounced_ref_history};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let timers = TimerQueue::system();
    let host: Rc<dyn TimerHost> = Rc::new(timers.clone());
    let scope = Scope::new();

    let count = signal(0i32);
    let history = scope.run(|| {
        use_debounced_ref_history(
            host.clone(),
            count.clone(),
            Delay::ms(200),
            HistoryOptions::default(),
        )
    })?;

    // Three quick bursts of clicks; each burst settles into one entry.
    for burst in 1..=3 {
        for _ in 0..burst {
            count.set(count.get() + 1);
            std::thread::sleep(Duration::from_millis(20));
            timers.run_due();
        }
        timers.run_until_idle();
        log::info!("burst {burst} settled at {}", count.get());
    }
    println!("history: {:?}", history.snapshots());

    while history.can_undo() {
        history.undo()?;
        println!("undo  -> {}", count.get());
    }
    while history.can_redo() {
        history.redo()?;
        println!("redo  -> {}", count.get());
    }

    scope.dispose();
    count.set(100);
    println!("after dispose: {} entries", history.len());
    Ok(())
}
