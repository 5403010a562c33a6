use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle status persisted on a match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum MatchStatus {
    /// Created but the clock was never started.
    Scheduled,
    /// Play is under way.
    Live,
    /// Final result recorded.
    Finished,
    /// Called off before completion.
    Canceled,
    /// Interrupted, may go live again.
    Suspended,
}

impl MatchStatus {
    /// Whether no further play can happen.
    pub fn is_closed(self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Canceled)
    }

    /// Compute the status reached by applying `event`.
    pub fn apply(self, event: MatchEvent) -> Result<MatchStatus, InvalidTransition> {
        use MatchStatus::*;

        let next = match (self, event) {
            (Scheduled | Live | Suspended, MatchEvent::StartClock) => Live,
            (Scheduled | Live | Suspended, MatchEvent::Finish) => Finished,
            (Scheduled | Live | Suspended, MatchEvent::Cancel) => Canceled,
            (Scheduled | Live, MatchEvent::Suspend) => Suspended,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

/// Events that move a match between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// The game clock starts a quarter.
    StartClock,
    /// The final quarter ended or the result was entered manually.
    Finish,
    /// The match is called off.
    Cancel,
    /// Play is interrupted.
    Suspend,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// Status the match was in when the event was received.
    pub from: MatchStatus,
    /// Event that cannot be applied from this status.
    pub event: MatchEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(status: MatchStatus, event: MatchEvent) -> MatchStatus {
        status.apply(event).unwrap()
    }

    #[test]
    fn full_happy_path_through_match() {
        let status = MatchStatus::Scheduled;
        let status = apply(status, MatchEvent::StartClock);
        assert_eq!(status, MatchStatus::Live);
        let status = apply(status, MatchEvent::StartClock);
        assert_eq!(status, MatchStatus::Live);
        let status = apply(status, MatchEvent::Suspend);
        assert_eq!(status, MatchStatus::Suspended);
        let status = apply(status, MatchEvent::StartClock);
        assert_eq!(status, MatchStatus::Live);
        assert_eq!(apply(status, MatchEvent::Finish), MatchStatus::Finished);
    }

    #[test]
    fn scheduled_match_can_be_canceled() {
        assert_eq!(
            apply(MatchStatus::Scheduled, MatchEvent::Cancel),
            MatchStatus::Canceled
        );
    }

    #[test]
    fn closed_matches_reject_every_event() {
        for from in [MatchStatus::Finished, MatchStatus::Canceled] {
            assert!(from.is_closed());
            for event in [
                MatchEvent::StartClock,
                MatchEvent::Finish,
                MatchEvent::Cancel,
                MatchEvent::Suspend,
            ] {
                let err = from.apply(event).unwrap_err();
                assert_eq!(err, InvalidTransition { from, event });
            }
        }
    }

    #[test]
    fn suspended_match_cannot_be_suspended_again() {
        let err = MatchStatus::Suspended
            .apply(MatchEvent::Suspend)
            .unwrap_err();
        assert_eq!(err.from, MatchStatus::Suspended);
        assert_eq!(err.event, MatchEvent::Suspend);
    }
}
