use crate::domain::clock::clock::{SharedClock, SystemClock};

use std::sync::{Arc, RwLock};

/// Manually driven clock. Clones share the same time, so a test can keep one
/// handle and advance the clock seen by the controller.
#[derive(Debug, Clone)]
pub struct MockClock {
    time_ms: Arc<RwLock<i64>>,
}

impl MockClock {
    pub fn new(time_ms: i64) -> MockClock {
        MockClock { time_ms: Arc::new(RwLock::new(time_ms)) }
    }

    pub fn set_current_time_in_ms(&self, time_ms: i64) {
        *self.time_ms.write().expect("RwLock poisoned") = time_ms;
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        *self.time_ms.write().expect("RwLock poisoned") += delta_ms;
    }
}

impl SystemClock for MockClock {
    fn get_current_time_in_ms(&self) -> i64 {
        *self.time_ms.read().expect("RwLock poisoned")
    }

    fn clone_box(&self) -> SharedClock {
        SharedClock(Arc::new(self.clone()))
    }
}
