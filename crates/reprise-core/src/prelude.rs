pub use crate::effects::{Dispose, effect, on_unmount, own};
pub use crate::error::{Error, Result};
pub use crate::scope::{Scope, current_scope};
pub use crate::signal::{ChangeKind, Observable, Signal, signal};
pub use crate::source::Source;
pub use crate::timer::{
    Clock, ManualClock, SystemClock, TimerHost, TimerId, TimerQueue, VirtualTimers,
};
