use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

/// Source of "now" for everything that expires.
///
/// A fixed clock is shared between clones, so a test can hand one copy to the
/// server and keep another to move time forward.
#[derive(Debug, Clone)]
pub struct Clock {
    fixed_time: Option<Arc<Mutex<SystemTime>>>,
}

impl Clock {
    pub fn new() -> Self {
        Self { fixed_time: None }
    }

    pub fn new_with_fixed_time(fixed_time: SystemTime) -> Self {
        Self {
            fixed_time: Some(Arc::new(Mutex::new(fixed_time))),
        }
    }

    pub fn now(&self) -> SystemTime {
        match &self.fixed_time {
            Some(fixed_time) => *fixed_time.lock().unwrap_or_else(PoisonError::into_inner),
            None => SystemTime::now(),
        }
    }

    /// Moves a fixed clock forward. No-op on the system clock.
    pub fn advance(&self, duration: Duration) {
        if let Some(fixed_time) = &self.fixed_time {
            let mut fixed_time = fixed_time.lock().unwrap_or_else(PoisonError::into_inner);
            *fixed_time += duration;
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
