use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self { Self { now: Arc::new(Mutex::new(start)) } }

    pub fn advance(&self, by: Duration) {
        let mut g = self.now.lock();
        *g += by;
    }

    pub fn set(&self, to: DateTime<Utc>) { *self.now.lock() = to; }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> { *self.now.lock() }
}
