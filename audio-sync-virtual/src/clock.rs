use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use audio_sync_core::traits::clock::Clock;

/// A clock that only moves when told to.
///
/// Clones share the same reading, so one handle can drive a simulation
/// while others sit inside a framer and a jitter buffer.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Jump to `at`. Ignored if it would move the clock backwards.
    pub fn set(&self, at: Duration) {
        let mut now = self.now.lock();
        if at > *now {
            *now = at;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
