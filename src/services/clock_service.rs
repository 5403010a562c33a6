//! Timer and quarter operations on a match.
//!
//! Every operation checks that the match exists, drives the clock registry and pushes the
//! resulting snapshot to the match SSE channel.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::{
    dto::{
        clock::ClockSnapshotDto,
        matches::{PauseResponse, QuarterResponse, StartTimerRequest},
        sse::BuzzerReason,
    },
    error::ServiceError,
    services::{
        match_service::{close_match, load_match},
        sse_events::{
            EVENT_TIMER_EXPIRED, EVENT_TIMER_PAUSED, EVENT_TIMER_RESET, EVENT_TIMER_RESUMED,
            EVENT_TIMER_STARTED, broadcast_buzzer, broadcast_match_ended,
            broadcast_quarter_changed, broadcast_timer,
        },
    },
    state::{
        MatchId, SharedState,
        clock::ClockSnapshot,
        state_machine::{MatchEvent, MatchStatus},
    },
};

/// Start the quarter countdown, putting the match live.
pub async fn start_timer(
    state: &SharedState,
    match_id: MatchId,
    request: StartTimerRequest,
) -> Result<ClockSnapshotDto, ServiceError> {
    let _gate = state.lock_match(match_id).await;

    let store = state.require_match_store().await?;
    let mut record = load_match(&store, match_id).await?;
    record.status = record.status.apply(MatchEvent::StartClock)?;
    if let Some(secs) = request.quarter_duration_seconds.filter(|secs| *secs > 0) {
        record.quarter_duration_secs = secs;
    }
    record.updated_at = state.clocks().now();
    store.save_match(record.clone()).await?;

    let quarter = Duration::from_secs(record.quarter_duration_secs.into());
    let snapshot = state.clocks().start(match_id, Some(quarter));
    info!(%match_id, quarter = record.period, secs = record.quarter_duration_secs, "quarter started");

    broadcast_timer(state, match_id, EVENT_TIMER_STARTED, snapshot);
    broadcast_quarter_changed(state, match_id, record.period);
    broadcast_buzzer(state, match_id, BuzzerReason::QuarterStart);
    schedule_expiry(state, match_id, snapshot);

    Ok(snapshot.into())
}

/// Freeze the countdown and report the seconds left.
pub async fn pause_timer(
    state: &SharedState,
    match_id: MatchId,
) -> Result<PauseResponse, ServiceError> {
    let _gate = state.lock_match(match_id).await;
    let store = state.require_match_store().await?;
    load_match(&store, match_id).await?;

    let snapshot = state.clocks().pause_snapshot(match_id);
    broadcast_timer(state, match_id, EVENT_TIMER_PAUSED, snapshot);

    Ok(PauseResponse {
        remaining_seconds: snapshot.remaining_seconds,
    })
}

/// Continue a paused countdown.
pub async fn resume_timer(
    state: &SharedState,
    match_id: MatchId,
) -> Result<ClockSnapshotDto, ServiceError> {
    let _gate = state.lock_match(match_id).await;
    let store = state.require_match_store().await?;
    load_match(&store, match_id).await?;

    let snapshot = state.clocks().resume(match_id)?;
    broadcast_timer(state, match_id, EVENT_TIMER_RESUMED, snapshot);
    schedule_expiry(state, match_id, snapshot);

    Ok(snapshot.into())
}

/// Zero the countdown.
pub async fn reset_timer(
    state: &SharedState,
    match_id: MatchId,
) -> Result<ClockSnapshotDto, ServiceError> {
    let _gate = state.lock_match(match_id).await;
    let store = state.require_match_store().await?;
    load_match(&store, match_id).await?;

    let snapshot = state.clocks().reset(match_id);
    broadcast_timer(state, match_id, EVENT_TIMER_RESET, snapshot);

    Ok(snapshot.into())
}

/// Move to the next quarter, finishing the match after the last one.
pub async fn advance_quarter(
    state: &SharedState,
    match_id: MatchId,
) -> Result<QuarterResponse, ServiceError> {
    advance(state, match_id, false).await
}

/// Variant of [`advance_quarter`] called by client timers reaching zero; a finished match is
/// left untouched.
pub async fn auto_advance_quarter(
    state: &SharedState,
    match_id: MatchId,
) -> Result<QuarterResponse, ServiceError> {
    advance(state, match_id, true).await
}

async fn advance(
    state: &SharedState,
    match_id: MatchId,
    tolerate_finished: bool,
) -> Result<QuarterResponse, ServiceError> {
    let _gate = state.lock_match(match_id).await;

    let store = state.require_match_store().await?;
    let mut record = load_match(&store, match_id).await?;

    if tolerate_finished && record.status == MatchStatus::Finished {
        return Ok(QuarterResponse {
            quarter: record.period,
        });
    }
    if record.status.is_closed() {
        return Err(ServiceError::InvalidState(format!(
            "match is already {:?}",
            record.status
        )));
    }

    let finished = record.period >= state.config().quarters_per_match;
    if finished {
        close_match(state, &store, &mut record).await?;
    } else {
        record.period += 1;
        record.updated_at = state.clocks().now();
        store.save_match(record.clone()).await?;
        info!(%match_id, quarter = record.period, "quarter advanced");
    }

    let snapshot = state.clocks().reset(match_id);
    broadcast_timer(state, match_id, EVENT_TIMER_RESET, snapshot);
    broadcast_quarter_changed(state, match_id, record.period);
    broadcast_buzzer(state, match_id, BuzzerReason::QuarterEnd);
    if finished {
        broadcast_match_ended(state, &record);
    }

    Ok(QuarterResponse {
        quarter: record.period,
    })
}

/// Whether a pending expiry for `ends_at` still matches the clock.
fn expiry_still_current(current: &ClockSnapshot, ends_at: std::time::SystemTime) -> bool {
    current.is_running && current.ends_at == Some(ends_at)
}

/// Arm a one-shot notification for the moment a running countdown reaches zero.
fn schedule_expiry(state: &SharedState, match_id: MatchId, snapshot: ClockSnapshot) {
    if !state.config().notify_expiry {
        return;
    }
    let Some(ends_at) = snapshot.ends_at else {
        return;
    };

    let delay = ends_at
        .duration_since(state.clocks().now())
        .unwrap_or_default();
    let state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let current = state.clocks().get(match_id);
        if !expiry_still_current(&current, ends_at) {
            debug!(%match_id, "countdown changed before expiry; skipping notification");
            return;
        }

        info!(%match_id, "quarter time expired");
        broadcast_timer(&state, match_id, EVENT_TIMER_EXPIRED, current);
        broadcast_buzzer(&state, match_id, BuzzerReason::QuarterEnd);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::MatchStore,
        services::match_service::tests::{fixture, fixture_with},
    };

    #[tokio::test]
    async fn start_pause_resume_drive_the_clock() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;

        let started = start_timer(&fx.state, match_id, StartTimerRequest::default())
            .await
            .unwrap();
        assert!(started.is_running);
        assert_eq!(started.remaining_seconds, 600);

        let record = fx.store.find_match(match_id).await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Live);

        fx.time.advance(Duration::from_secs(200));
        let paused = pause_timer(&fx.state, match_id).await.unwrap();
        assert_eq!(paused.remaining_seconds, 400);

        fx.time.advance(Duration::from_secs(50));
        let resumed = resume_timer(&fx.state, match_id).await.unwrap();
        assert!(resumed.is_running);
        assert_eq!(resumed.remaining_seconds, 400);
    }

    #[tokio::test]
    async fn start_overrides_the_quarter_length() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;

        let started = start_timer(
            &fx.state,
            match_id,
            StartTimerRequest {
                quarter_duration_seconds: Some(300),
            },
        )
        .await
        .unwrap();
        assert_eq!(started.remaining_seconds, 300);

        let record = fx.store.find_match(match_id).await.unwrap().unwrap();
        assert_eq!(record.quarter_duration_secs, 300);
    }

    #[tokio::test]
    async fn resume_without_time_left_is_rejected() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;

        let err = resume_timer(&fx.state, match_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref message) if message == "nothing to resume"));

        start_timer(&fx.state, match_id, StartTimerRequest::default())
            .await
            .unwrap();
        fx.time.advance(Duration::from_secs(700));
        assert_eq!(pause_timer(&fx.state, match_id).await.unwrap().remaining_seconds, 0);
        assert!(resume_timer(&fx.state, match_id).await.is_err());
    }

    #[tokio::test]
    async fn timer_operations_on_unknown_match_are_not_found() {
        let fx = fixture().await;
        let unknown = MatchId::new_v4();
        assert!(matches!(
            pause_timer(&fx.state, unknown).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(fx.state.clocks().get(unknown).version == 0);
    }

    #[tokio::test]
    async fn closed_match_cannot_start() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;
        crate::services::match_service::cancel_match(&fx.state, match_id)
            .await
            .unwrap();

        let err = start_timer(&fx.state, match_id, StartTimerRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert!(!fx.state.clocks().get(match_id).is_running);
    }

    #[tokio::test]
    async fn start_publishes_timer_quarter_and_buzzer() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;
        let mut events = fx.state.hubs().subscribe(match_id);

        start_timer(&fx.state, match_id, StartTimerRequest::default())
            .await
            .unwrap();

        let names: Vec<_> = [
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
        ]
        .into_iter()
        .map(|event| (event.event.unwrap_or_default(), event.data))
        .collect();

        assert_eq!(names[0].0, "timer.started");
        assert!(names[0].1.contains(r#""remainingSeconds":600"#));
        assert_eq!(names[1], ("quarter.changed".to_string(), r#"{"quarter":1}"#.to_string()));
        assert_eq!(names[2], ("buzzer".to_string(), r#"{"reason":"quarter-start"}"#.to_string()));
    }

    #[tokio::test]
    async fn advancing_past_the_last_quarter_finishes_the_match() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;
        crate::services::match_service::adjust_score(
            &fx.state,
            match_id,
            crate::dto::matches::AdjustScoreRequest {
                team_id: fx.created.home_team_id,
                delta: 10,
            },
        )
        .await
        .unwrap();

        for expected in 2..=4 {
            start_timer(&fx.state, match_id, StartTimerRequest::default())
                .await
                .unwrap();
            let quarter = advance_quarter(&fx.state, match_id).await.unwrap();
            assert_eq!(quarter.quarter, expected);
            assert!(!fx.state.clocks().get(match_id).is_running);
        }

        let mut events = fx.state.hubs().subscribe(match_id);
        let last = advance_quarter(&fx.state, match_id).await.unwrap();
        assert_eq!(last.quarter, 4);

        let record = fx.store.find_match(match_id).await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Finished);
        assert_eq!(fx.store.wins(match_id).await[0].team_id, fx.created.home_team_id);

        let mut names = Vec::new();
        while let Ok(event) = events.try_recv() {
            names.push(event.event.unwrap_or_default());
        }
        assert_eq!(
            names,
            ["timer.reset", "quarter.changed", "buzzer", "match.ended"]
        );

        let err = advance_quarter(&fx.state, match_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let again = auto_advance_quarter(&fx.state, match_id).await.unwrap();
        assert_eq!(again.quarter, 4);
        assert_eq!(fx.store.wins(match_id).await.len(), 1);
    }

    #[test]
    fn expiry_only_fires_for_the_countdown_it_was_armed_for() {
        let ends_at = std::time::SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let running = ClockSnapshot {
            is_running: true,
            ends_at: Some(ends_at),
            ..ClockSnapshot::absent()
        };
        assert!(expiry_still_current(&running, ends_at));

        let restarted = ClockSnapshot {
            ends_at: Some(ends_at + Duration::from_secs(5)),
            ..running
        };
        assert!(!expiry_still_current(&restarted, ends_at));
        assert!(!expiry_still_current(&ClockSnapshot::absent(), ends_at));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_notification_is_published_when_enabled() {
        let fx = fixture_with(AppConfig {
            notify_expiry: true,
            ..AppConfig::default()
        })
        .await;
        let match_id = fx.created.match_id;

        start_timer(
            &fx.state,
            match_id,
            StartTimerRequest {
                quarter_duration_seconds: Some(5),
            },
        )
        .await
        .unwrap();
        let mut events = fx.state.hubs().subscribe(match_id);

        let expired = events.recv().await.unwrap();
        assert_eq!(expired.event.as_deref(), Some("timer.expired"));
        let buzzer = events.recv().await.unwrap();
        assert_eq!(buzzer.data, r#"{"reason":"quarter-end"}"#);
        assert!(fx.state.clocks().get(match_id).is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_countdown_suppresses_the_expiry_notification() {
        let fx = fixture_with(AppConfig {
            notify_expiry: true,
            ..AppConfig::default()
        })
        .await;
        let match_id = fx.created.match_id;

        start_timer(
            &fx.state,
            match_id,
            StartTimerRequest {
                quarter_duration_seconds: Some(5),
            },
        )
        .await
        .unwrap();
        pause_timer(&fx.state, match_id).await.unwrap();
        let mut events = fx.state.hubs().subscribe(match_id);

        let outcome = tokio::time::timeout(Duration::from_secs(30), events.recv()).await;
        assert!(outcome.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_start_and_pause_publish_consistent_snapshots() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;
        let mut events = fx.state.hubs().subscribe(match_id);

        for _ in 0..300 {
            start_timer(&fx.state, match_id, StartTimerRequest::default())
                .await
                .unwrap();

            let pausing = {
                let state = fx.state.clone();
                tokio::spawn(async move { pause_timer(&state, match_id).await })
            };
            let starting = {
                let state = fx.state.clone();
                tokio::spawn(async move {
                    start_timer(&state, match_id, StartTimerRequest::default()).await
                })
            };
            pausing.await.unwrap().unwrap();
            starting.await.unwrap().unwrap();

            let mut last_timer = None;
            while let Ok(event) = events.try_recv() {
                let name = event.event.unwrap_or_default();
                if !name.starts_with("timer.") {
                    continue;
                }
                let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
                if name == "timer.paused" {
                    assert_eq!(payload["isRunning"], false);
                }
                last_timer = Some(payload);
            }

            let current = fx.state.clocks().get(match_id);
            let last_timer = last_timer.expect("timer events published");
            assert_eq!(last_timer["isRunning"], current.is_running);
        }
    }
}
