//! Wall-clock sources used by the clock registry.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime},
};

/// Source of the current wall-clock instant.
///
/// The registry samples `now` through this trait so tests can drive time explicitly.
pub trait TimeSource: Send + Sync + 'static {
    /// Current wall-clock instant.
    fn now(&self) -> SystemTime;
}

/// Reads the operating system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Time source that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    current: Arc<Mutex<SystemTime>>,
}

impl ManualTimeSource {
    /// Create a source frozen at `start`.
    pub fn new(start: SystemTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the frozen instant forward by `step`.
    pub fn advance(&self, step: Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current += step;
    }

    /// Pin the frozen instant to `instant`.
    pub fn set(&self, instant: SystemTime) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> SystemTime {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
