//! Countdown state for a single match and its point-in-time projection.
//!
//! A [`Clock`] never ticks. Running clocks store the absolute instant at which the countdown
//! hits zero, and every read derives the time left from that instant and the caller's `now`.
//! Transitions return a new value; the registry swaps it in under the entry lock.

use std::time::{Duration, SystemTime};

/// Longest countdown a clock accepts; longer quarters are cut down to it.
pub const MAX_QUARTER_DURATION: Duration = Duration::from_secs(2 * 60 * 60);

/// Phase of a match countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// Never started, or explicitly reset.
    Idle,
    /// Counting down towards `ends_at`.
    Running,
    /// Frozen with `remaining` left on the clock.
    Paused,
}

/// Countdown state of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    state: ClockState,
    remaining: Duration,
    ends_at: Option<SystemTime>,
    quarter_duration: Duration,
    version: u64,
}

/// Read-only view of a [`Clock`] at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    /// Phase the clock was in when the snapshot was taken.
    pub state: ClockState,
    /// Whether the countdown is currently running.
    pub is_running: bool,
    /// Whole seconds left, rounded up and never negative.
    pub remaining_seconds: u64,
    /// Instant at which a running countdown reaches zero.
    pub ends_at: Option<SystemTime>,
    /// Number of transitions applied to the clock so far.
    pub version: u64,
}

impl ClockSnapshot {
    /// Snapshot reported for a match the registry has never seen.
    pub fn absent() -> Self {
        Self {
            state: ClockState::Idle,
            is_running: false,
            remaining_seconds: 0,
            ends_at: None,
            version: 0,
        }
    }
}

impl Clock {
    /// Fresh idle clock holding a full quarter.
    pub fn idle(quarter_duration: Duration) -> Self {
        Self {
            state: ClockState::Idle,
            remaining: quarter_duration,
            ends_at: None,
            quarter_duration,
            version: 0,
        }
    }

    /// Idle clock with nothing left on it, used when a pause or reset is the first reference.
    pub fn empty(quarter_duration: Duration) -> Self {
        Self {
            remaining: Duration::ZERO,
            ..Self::idle(quarter_duration)
        }
    }

    /// Current phase.
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Configured length of one quarter.
    pub fn quarter_duration(&self) -> Duration {
        self.quarter_duration
    }

    /// Transition counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Time left at `now`, clamped to zero.
    pub fn remaining_at(&self, now: SystemTime) -> Duration {
        match (self.state, self.ends_at) {
            (ClockState::Running, Some(ends_at)) => {
                ends_at.duration_since(now).unwrap_or(Duration::ZERO)
            }
            _ => self.remaining,
        }
    }

    /// Restart the countdown from a full quarter.
    ///
    /// A positive `quarter_duration` replaces the configured one first. Allowed from every
    /// state, including `Running`. Durations above [`MAX_QUARTER_DURATION`] are capped.
    pub fn start(&self, now: SystemTime, quarter_duration: Option<Duration>) -> Self {
        let quarter_duration = quarter_duration
            .filter(|duration| !duration.is_zero())
            .unwrap_or(self.quarter_duration)
            .min(MAX_QUARTER_DURATION);

        Self {
            state: ClockState::Running,
            remaining: quarter_duration,
            ends_at: Some(now + quarter_duration),
            quarter_duration,
            version: self.version + 1,
        }
    }

    /// Freeze a running countdown. Idle and paused clocks are returned unchanged.
    pub fn pause(&self, now: SystemTime) -> Self {
        if self.state != ClockState::Running {
            return self.clone();
        }

        Self {
            state: ClockState::Paused,
            remaining: self.remaining_at(now),
            ends_at: None,
            quarter_duration: self.quarter_duration,
            version: self.version + 1,
        }
    }

    /// Continue a paused countdown, or `None` when there is nothing to resume.
    pub fn resume(&self, now: SystemTime) -> Option<Self> {
        if self.state != ClockState::Paused || self.remaining.is_zero() {
            return None;
        }

        Some(Self {
            state: ClockState::Running,
            remaining: self.remaining,
            ends_at: Some(now + self.remaining),
            quarter_duration: self.quarter_duration,
            version: self.version + 1,
        })
    }

    /// Return to idle with nothing left on the clock.
    pub fn reset(&self) -> Self {
        Self {
            state: ClockState::Idle,
            remaining: Duration::ZERO,
            ends_at: None,
            quarter_duration: self.quarter_duration,
            version: self.version + 1,
        }
    }

    /// Project the clock at `now`.
    pub fn snapshot(&self, now: SystemTime) -> ClockSnapshot {
        let is_running = self.state == ClockState::Running;
        ClockSnapshot {
            state: self.state,
            is_running,
            remaining_seconds: whole_seconds_ceil(self.remaining_at(now)),
            ends_at: if is_running { self.ends_at } else { None },
            version: self.version,
        }
    }
}

fn whole_seconds_ceil(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
