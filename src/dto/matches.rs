use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MatchEntity, TeamEntity},
    dto::{
        clock::ClockSnapshotDto,
        format_system_time,
        validation::{validate_distinct_teams, validate_team_name},
    },
    state::{clock::MAX_QUARTER_DURATION, state_machine::MatchStatus},
};

/// Longest quarter accepted from clients, in seconds.
pub const MAX_QUARTER_SECONDS: u32 = MAX_QUARTER_DURATION.as_secs() as u32;

/// Payload used to schedule a match between two registered teams.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_distinct_teams"))]
pub struct CreateMatchRequest {
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    /// Quarter length; zero or absent uses the server default.
    #[serde(default)]
    #[validate(range(max = MAX_QUARTER_SECONDS))]
    pub quarter_duration_seconds: Option<u32>,
}

/// Payload creating both teams by name and a match between them.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuickMatchRequest {
    #[validate(custom(function = "validate_team_name"))]
    pub home_name: String,
    #[validate(custom(function = "validate_team_name"))]
    pub away_name: String,
    #[serde(default)]
    #[validate(range(max = MAX_QUARTER_SECONDS))]
    pub quarter_duration_seconds: Option<u32>,
}

/// Optional body of the start-timer routes.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartTimerRequest {
    /// Replaces the stored quarter length when positive.
    #[serde(default)]
    #[validate(range(max = MAX_QUARTER_SECONDS))]
    pub quarter_duration_seconds: Option<u32>,
}

/// Points scored by a team during live play.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddScoreRequest {
    pub team_id: Uuid,
    #[serde(default)]
    pub player_id: Option<Uuid>,
    #[validate(range(min = 1, max = 3))]
    pub points: u8,
}

/// Manual correction of a team score.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustScoreRequest {
    pub team_id: Uuid,
    #[validate(range(min = -200, max = 200))]
    pub delta: i32,
}

/// Foul charged to a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddFoulRequest {
    pub team_id: Uuid,
    #[serde(default)]
    pub player_id: Option<Uuid>,
    #[serde(default, rename = "type")]
    #[validate(length(max = 40))]
    pub kind: Option<String>,
}

/// Manual correction of a team foul count.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustFoulsRequest {
    pub team_id: Uuid,
    /// Positive adds fouls, negative removes the most recent ones.
    #[validate(range(min = -50, max = 50))]
    pub delta: i32,
}

/// Score event supplied when closing a match.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEventInput {
    pub team_id: Uuid,
    #[serde(default)]
    pub player_id: Option<Uuid>,
    #[validate(range(min = -200, max = 200))]
    pub points: i32,
}

/// Foul supplied when closing a match.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoulInput {
    pub team_id: Uuid,
    #[serde(default)]
    pub player_id: Option<Uuid>,
}

/// Final result entered from the control desk.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinishMatchRequest {
    pub home_score: u32,
    pub away_score: u32,
    #[validate(range(max = 100))]
    pub home_fouls: u32,
    #[validate(range(max = 100))]
    pub away_fouls: u32,
    #[serde(default)]
    #[validate(nested)]
    pub score_events: Vec<ScoreEventInput>,
    #[serde(default)]
    pub fouls: Vec<FoulInput>,
}

/// Query string accepted by the match listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListMatchesQuery {
    /// 1-based page; invalid values fall back to 1.
    pub page: Option<i64>,
    /// Page size between 1 and 200; invalid values fall back to 20.
    pub page_size: Option<i64>,
    pub status: Option<MatchStatus>,
    pub team_id: Option<Uuid>,
}

/// Identifiers returned once a match has been created.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchCreatedResponse {
    pub match_id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub quarter_duration_seconds: u32,
}

/// Full view of a match, including its live timer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetail {
    pub id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: MatchStatus,
    pub quarter_duration_seconds: u32,
    pub quarter: u8,
    pub timer: ClockSnapshotDto,
    pub home_fouls: u32,
    pub away_fouls: u32,
}

/// Row of the match listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchListItem {
    pub id: Uuid,
    pub created_at_utc: String,
    pub status: MatchStatus,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub quarter: u8,
    pub quarter_duration_seconds: u32,
    pub home_fouls: u32,
    pub away_fouls: u32,
}

/// Team names and foul counts joined onto a match record.
pub struct MatchSides<'a> {
    pub home: Option<&'a TeamEntity>,
    pub away: Option<&'a TeamEntity>,
    pub fouls: FoulsResponse,
}

impl MatchListItem {
    /// Build a listing row from a match record and its joined data.
    pub fn new(record: &MatchEntity, sides: MatchSides<'_>) -> Self {
        Self {
            id: record.id,
            created_at_utc: format_system_time(record.created_at),
            status: record.status,
            home_team_id: record.home_team_id,
            away_team_id: record.away_team_id,
            home_team: team_name(sides.home),
            away_team: team_name(sides.away),
            home_score: record.home_score,
            away_score: record.away_score,
            quarter: record.period,
            quarter_duration_seconds: record.quarter_duration_secs,
            home_fouls: sides.fouls.home_fouls,
            away_fouls: sides.fouls.away_fouls,
        }
    }
}

impl MatchDetail {
    /// Build the detail view from a match record, its joined data and the timer.
    pub fn new(record: &MatchEntity, sides: MatchSides<'_>, timer: ClockSnapshotDto) -> Self {
        Self {
            id: record.id,
            home_team_id: record.home_team_id,
            away_team_id: record.away_team_id,
            home_team: team_name(sides.home),
            away_team: team_name(sides.away),
            home_score: record.home_score,
            away_score: record.away_score,
            status: record.status,
            quarter_duration_seconds: record.quarter_duration_secs,
            quarter: record.period,
            timer,
            home_fouls: sides.fouls.home_fouls,
            away_fouls: sides.fouls.away_fouls,
        }
    }
}

fn team_name(team: Option<&TeamEntity>) -> String {
    team.map(|team| team.name.clone()).unwrap_or_default()
}

/// One page of the match listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchListResponse {
    pub items: Vec<MatchListItem>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Remaining time frozen by a pause.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PauseResponse {
    pub remaining_seconds: u64,
}

/// Current quarter of a match.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct QuarterResponse {
    pub quarter: u8,
}

/// Foul totals of both teams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoulsResponse {
    pub home_fouls: u32,
    pub away_fouls: u32,
}

/// Scores of both teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub home_score: u32,
    pub away_score: u32,
}

/// Status reached by a lifecycle operation.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: MatchStatus,
}

/// Result of closing a match.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    pub id: Uuid,
    pub status: MatchStatus,
    pub home_score: u32,
    pub away_score: u32,
}
