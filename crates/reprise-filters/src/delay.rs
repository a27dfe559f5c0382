use std::time::Duration;

use reprise_core::{Error, Result};

/// A non-negative, finite wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delay(Duration);

impl Delay {
    pub const ZERO: Delay = Delay(Duration::ZERO);

    pub const fn ms(ms: u64) -> Self {
        Delay(Duration::from_millis(ms))
    }

    /// Checked conversion from fractional milliseconds.
    pub fn from_millis(ms: f64) -> Result<Self> {
        if !ms.is_finite() {
            return Err(Error::invalid_argument("delay", format!("{ms} is not finite")));
        }
        if ms < 0.0 {
            return Err(Error::invalid_argument("delay", format!("{ms} is negative")));
        }
        Duration::try_from_secs_f64(ms / 1000.0)
            .map(Delay)
            .map_err(|_| Error::invalid_argument("delay", format!("{ms}ms is out of range")))
    }

    pub const fn as_duration(self) -> Duration {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for Delay {
    fn from(d: Duration) -> Self {
        Delay(d)
    }
}

impl From<Delay> for Duration {
    fn from(d: Delay) -> Self {
        d.0
    }
}
