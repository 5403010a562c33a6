use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::MatchEntity,
    dto::{
        clock::ClockSnapshotDto,
        matches::{FoulsResponse, ScoreResponse, StatusResponse},
        sse::{BuzzerEvent, BuzzerReason, MatchEndedEvent, QuarterChangedEvent, ServerEvent, Winner},
    },
    state::{MatchId, SharedState, clock::ClockSnapshot},
};

pub const EVENT_TIMER_SYNC: &str = "timer.sync";
pub const EVENT_TIMER_STARTED: &str = "timer.started";
pub const EVENT_TIMER_PAUSED: &str = "timer.paused";
pub const EVENT_TIMER_RESUMED: &str = "timer.resumed";
pub const EVENT_TIMER_RESET: &str = "timer.reset";
pub const EVENT_TIMER_EXPIRED: &str = "timer.expired";
pub const EVENT_QUARTER_CHANGED: &str = "quarter.changed";
pub const EVENT_BUZZER: &str = "buzzer";
pub const EVENT_SCORE_UPDATED: &str = "score.updated";
pub const EVENT_FOULS_UPDATED: &str = "fouls.updated";
pub const EVENT_MATCH_ENDED: &str = "match.ended";
pub const EVENT_MATCH_CANCELED: &str = "match.canceled";
pub const EVENT_MATCH_SUSPENDED: &str = "match.suspended";

/// Broadcast a timer snapshot under one of the `timer.*` event names.
pub fn broadcast_timer(
    state: &SharedState,
    match_id: MatchId,
    event: &'static str,
    snapshot: ClockSnapshot,
) {
    send_match_event(state, match_id, event, &ClockSnapshotDto::from(snapshot));
}

/// Broadcast the current quarter of the match.
pub fn broadcast_quarter_changed(state: &SharedState, match_id: MatchId, quarter: u8) {
    let payload = QuarterChangedEvent { quarter };
    send_match_event(state, match_id, EVENT_QUARTER_CHANGED, &payload);
}

/// Ask scoreboards to sound the buzzer.
pub fn broadcast_buzzer(state: &SharedState, match_id: MatchId, reason: BuzzerReason) {
    let payload = BuzzerEvent { reason };
    send_match_event(state, match_id, EVENT_BUZZER, &payload);
}

/// Broadcast both scores of the match.
pub fn broadcast_score(state: &SharedState, record: &MatchEntity) {
    let payload = ScoreResponse {
        home_score: record.home_score,
        away_score: record.away_score,
    };
    send_match_event(state, record.id, EVENT_SCORE_UPDATED, &payload);
}

/// Broadcast both foul totals of the match.
pub fn broadcast_fouls(state: &SharedState, match_id: MatchId, fouls: FoulsResponse) {
    send_match_event(state, match_id, EVENT_FOULS_UPDATED, &fouls);
}

/// Broadcast the final result of a finished match.
pub fn broadcast_match_ended(state: &SharedState, record: &MatchEntity) {
    let payload = MatchEndedEvent {
        home: record.home_score,
        away: record.away_score,
        winner: Winner::from_scores(record.home_score, record.away_score),
    };
    send_match_event(state, record.id, EVENT_MATCH_ENDED, &payload);
}

/// Broadcast a status reached through cancel or suspend.
pub fn broadcast_status(state: &SharedState, record: &MatchEntity, event: &'static str) {
    let payload = StatusResponse {
        status: record.status,
    };
    send_match_event(state, record.id, event, &payload);
}

fn send_match_event(
    state: &SharedState,
    match_id: MatchId,
    event: &'static str,
    payload: &impl Serialize,
) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.hubs().broadcast(match_id, event),
        Err(err) => warn!(event, %match_id, error = %err, "failed to serialize match SSE payload"),
    }
}
