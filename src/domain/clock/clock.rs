use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of time for everything that stamps or schedules controller state.
pub trait SystemClock: std::fmt::Debug + Send + Sync {
    fn get_current_time_in_ms(&self) -> i64;
    fn clone_box(&self) -> SharedClock;
}

#[derive(Debug)]
pub struct SharedClock(pub Arc<dyn SystemClock>);

impl Clone for SharedClock {
    fn clone(&self) -> Self {
        self.0.clone_box()
    }
}

impl std::ops::Deref for SharedClock {
    type Target = dyn SystemClock;
    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl From<SharedClock> for Arc<dyn SystemClock> {
    fn from(wrapper: SharedClock) -> Self {
        wrapper.0
    }
}

/// Wall clock time since the Unix epoch.
#[derive(Debug, Clone, Default)]
pub struct WallClock;

impl WallClock {
    pub fn new() -> WallClock {
        WallClock
    }
}

impl SystemClock for WallClock {
    fn get_current_time_in_ms(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_millis() as i64
    }

    fn clone_box(&self) -> SharedClock {
        SharedClock(Arc::new(self.clone()))
    }
}
