//! Process-wide registry of match clocks.
//!
//! The top-level map is only held long enough to find or insert a match's entry. Each entry
//! carries its own mutex, so transitions on one match are serialized while other matches
//! proceed untouched.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, SystemTime},
};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::{
    clock::{Clock, ClockSnapshot},
    time::{SystemTimeSource, TimeSource},
};

/// Identifier of a match, shared with the persisted match record.
pub type MatchId = Uuid;

type ClockEntry = Arc<Mutex<Clock>>;

/// Failure raised by clock operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    /// Resume was requested but the clock is not paused with time left.
    #[error("nothing to resume")]
    NothingToResume,
}

/// In-memory registry holding one [`Clock`] per match.
pub struct ClockRegistry {
    clocks: DashMap<MatchId, ClockEntry>,
    time: Arc<dyn TimeSource>,
    default_quarter: Duration,
}

impl ClockRegistry {
    /// Registry backed by the system wall clock.
    pub fn new(default_quarter: Duration) -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource), default_quarter)
    }

    /// Registry sampling `now` from the provided source.
    pub fn with_time_source(time: Arc<dyn TimeSource>, default_quarter: Duration) -> Self {
        Self {
            clocks: DashMap::new(),
            time,
            default_quarter,
        }
    }

    /// Current instant according to the registry's time source.
    pub fn now(&self) -> SystemTime {
        self.time.now()
    }

    /// Snapshot of the match clock, creating an idle one holding `quarter_duration` if needed.
    ///
    /// An existing clock is returned as is, its configured duration untouched.
    pub fn get_or_create(&self, match_id: MatchId, quarter_duration: Duration) -> ClockSnapshot {
        let entry = self.entry(match_id, || Clock::idle(quarter_duration));
        let clock = lock(&entry);
        clock.snapshot(self.time.now())
    }

    /// Start (or restart) the countdown from a full quarter.
    pub fn start(&self, match_id: MatchId, quarter_duration: Option<Duration>) -> ClockSnapshot {
        let default_quarter = self.default_quarter;
        let entry = self.entry(match_id, || Clock::idle(default_quarter));
        let mut clock = lock(&entry);
        let now = self.time.now();
        *clock = clock.start(now, quarter_duration);
        debug!(%match_id, quarter = ?clock.quarter_duration(), "clock started");
        clock.snapshot(now)
    }

    /// Freeze a running countdown and return the whole seconds left.
    ///
    /// Idle and paused clocks report their stored remaining time unchanged.
    pub fn pause(&self, match_id: MatchId) -> u64 {
        self.pause_snapshot(match_id).remaining_seconds
    }

    /// Same as [`ClockRegistry::pause`], returning the snapshot taken under the entry lock.
    pub fn pause_snapshot(&self, match_id: MatchId) -> ClockSnapshot {
        let default_quarter = self.default_quarter;
        let entry = self.entry(match_id, || Clock::empty(default_quarter));
        let mut clock = lock(&entry);
        let now = self.time.now();
        *clock = clock.pause(now);
        let snapshot = clock.snapshot(now);
        debug!(%match_id, remaining = snapshot.remaining_seconds, "clock paused");
        snapshot
    }

    /// Continue a paused countdown from where it stopped.
    pub fn resume(&self, match_id: MatchId) -> Result<ClockSnapshot, ClockError> {
        let entry = self.existing(match_id).ok_or(ClockError::NothingToResume)?;
        let mut clock = lock(&entry);
        let now = self.time.now();
        let resumed = clock.resume(now).ok_or(ClockError::NothingToResume)?;
        *clock = resumed;
        debug!(%match_id, "clock resumed");
        Ok(clock.snapshot(now))
    }

    /// Put the clock back to idle with nothing left on it.
    pub fn reset(&self, match_id: MatchId) -> ClockSnapshot {
        let default_quarter = self.default_quarter;
        let entry = self.entry(match_id, || Clock::empty(default_quarter));
        let mut clock = lock(&entry);
        *clock = clock.reset();
        debug!(%match_id, "clock reset");
        clock.snapshot(self.time.now())
    }

    /// Snapshot of the match clock without creating one.
    pub fn get(&self, match_id: MatchId) -> ClockSnapshot {
        match self.existing(match_id) {
            Some(entry) => lock(&entry).snapshot(self.time.now()),
            None => ClockSnapshot::absent(),
        }
    }

    /// Number of clocks currently tracked.
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// Whether no clock has been created yet.
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    fn existing(&self, match_id: MatchId) -> Option<ClockEntry> {
        self.clocks
            .get(&match_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn entry(&self, match_id: MatchId, init: impl FnOnce() -> Clock) -> ClockEntry {
        if let Some(entry) = self.existing(match_id) {
            return entry;
        }

        let entry = self
            .clocks
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(init())));
        Arc::clone(entry.value())
    }
}

fn lock(entry: &ClockEntry) -> MutexGuard<'_, Clock> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
