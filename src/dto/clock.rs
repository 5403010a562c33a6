use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::format_system_time, state::clock::ClockSnapshot};

/// Timer state exposed to REST and SSE clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClockSnapshotDto {
    pub is_running: bool,
    /// Whole seconds left, rounded up.
    pub remaining_seconds: u64,
    /// RFC 3339 instant at which a running quarter ends; `null` when not running.
    pub quarter_ends_at_utc: Option<String>,
}

impl From<ClockSnapshot> for ClockSnapshotDto {
    fn from(snapshot: ClockSnapshot) -> Self {
        Self {
            is_running: snapshot.is_running,
            remaining_seconds: snapshot.remaining_seconds,
            quarter_ends_at_utc: snapshot.ends_at.map(format_system_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use serde_json::json;

    use super::*;
    use crate::state::clock::Clock;

    #[test]
    fn running_clock_serializes_its_end_instant() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let snapshot = Clock::idle(Duration::from_secs(600))
            .start(now, None)
            .snapshot(now + Duration::from_secs(200));

        let value = serde_json::to_value(ClockSnapshotDto::from(snapshot)).unwrap();
        assert_eq!(
            value,
            json!({
                "isRunning": true,
                "remainingSeconds": 400,
                "quarterEndsAtUtc": "2023-11-14T22:23:20Z",
            })
        );
    }

    #[test]
    fn absent_clock_reports_null_end() {
        let value = serde_json::to_value(ClockSnapshotDto::from(ClockSnapshot::absent())).unwrap();
        assert_eq!(
            value,
            json!({ "isRunning": false, "remainingSeconds": 0, "quarterEndsAtUtc": null })
        );
    }
}
