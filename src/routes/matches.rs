use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use validator::Validate;

use crate::{
    dto::{
        clock::ClockSnapshotDto,
        matches::{
            AddFoulRequest, AddScoreRequest, AdjustFoulsRequest, AdjustScoreRequest,
            CreateMatchRequest, FinishMatchRequest, FinishResponse, FoulsResponse,
            ListMatchesQuery, MatchCreatedResponse, MatchDetail, MatchListResponse,
            PauseResponse, QuarterResponse, QuickMatchRequest, ScoreResponse, StartTimerRequest,
            StatusResponse,
        },
    },
    error::AppError,
    services::{clock_service, match_service},
    state::{MatchId, SharedState},
};

/// Match management, timer and scoring endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/quick", post(quick_match))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/start", post(start_timer))
        .route("/matches/{id}/timer/start", post(start_timer))
        .route("/matches/{id}/timer/pause", post(pause_timer))
        .route("/matches/{id}/timer/resume", post(resume_timer))
        .route("/matches/{id}/timer/reset", post(reset_timer))
        .route("/matches/{id}/quarters/advance", post(advance_quarter))
        .route("/matches/{id}/quarters/auto-advance", post(auto_advance_quarter))
        .route("/matches/{id}/score", post(add_score))
        .route("/matches/{id}/score/adjust", post(adjust_score))
        .route("/matches/{id}/fouls", post(add_foul))
        .route("/matches/{id}/fouls/adjust", post(adjust_fouls))
        .route("/matches/{id}/finish", post(finish_match))
        .route("/matches/{id}/cancel", post(cancel_match))
        .route("/matches/{id}/suspend", post(suspend_match))
}

/// List matches, newest first.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(ListMatchesQuery),
    responses((status = 200, description = "One page of matches", body = MatchListResponse))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
    Query(query): Query<ListMatchesQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    Ok(Json(match_service::list_matches(&state, query).await?))
}

/// Schedule a match between two registered teams.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 200, description = "Match created", body = MatchCreatedResponse),
        (status = 400, description = "Unknown or identical teams")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<Json<MatchCreatedResponse>, AppError> {
    Ok(Json(match_service::create_match(&state, payload).await?))
}

/// Register two teams by name and schedule a match between them.
#[utoipa::path(
    post,
    path = "/matches/quick",
    tag = "matches",
    request_body = QuickMatchRequest,
    responses((status = 200, description = "Teams and match created", body = MatchCreatedResponse))
)]
pub async fn quick_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuickMatchRequest>>,
) -> Result<Json<MatchCreatedResponse>, AppError> {
    Ok(Json(match_service::quick_match(&state, payload).await?))
}

/// Retrieve a match with its live timer.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Match detail", body = MatchDetail),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<MatchDetail>, AppError> {
    Ok(Json(match_service::match_detail(&state, id).await?))
}

/// Start the quarter countdown. The body is optional.
#[utoipa::path(
    post,
    path = "/matches/{id}/timer/start",
    tag = "timer",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body(content = StartTimerRequest, description = "Optional quarter length override"),
    responses(
        (status = 200, description = "Countdown running", body = ClockSnapshotDto),
        (status = 409, description = "Match is finished or canceled")
    )
)]
pub async fn start_timer(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    body: Option<Json<StartTimerRequest>>,
) -> Result<Json<ClockSnapshotDto>, AppError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    request.validate()?;
    Ok(Json(clock_service::start_timer(&state, id, request).await?))
}

/// Freeze the countdown.
#[utoipa::path(
    post,
    path = "/matches/{id}/timer/pause",
    tag = "timer",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses((status = 200, description = "Seconds left", body = PauseResponse))
)]
pub async fn pause_timer(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<PauseResponse>, AppError> {
    Ok(Json(clock_service::pause_timer(&state, id).await?))
}

/// Continue a paused countdown.
#[utoipa::path(
    post,
    path = "/matches/{id}/timer/resume",
    tag = "timer",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Countdown running", body = ClockSnapshotDto),
        (status = 400, description = "Nothing to resume")
    )
)]
pub async fn resume_timer(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<ClockSnapshotDto>, AppError> {
    Ok(Json(clock_service::resume_timer(&state, id).await?))
}

/// Zero the countdown.
#[utoipa::path(
    post,
    path = "/matches/{id}/timer/reset",
    tag = "timer",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses((status = 200, description = "Countdown reset", body = ClockSnapshotDto))
)]
pub async fn reset_timer(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<ClockSnapshotDto>, AppError> {
    Ok(Json(clock_service::reset_timer(&state, id).await?))
}

/// Move to the next quarter.
#[utoipa::path(
    post,
    path = "/matches/{id}/quarters/advance",
    tag = "timer",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Current quarter", body = QuarterResponse),
        (status = 409, description = "Match is finished or canceled")
    )
)]
pub async fn advance_quarter(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<QuarterResponse>, AppError> {
    Ok(Json(clock_service::advance_quarter(&state, id).await?))
}

/// Move to the next quarter once the client timer reaches zero.
#[utoipa::path(
    post,
    path = "/matches/{id}/quarters/auto-advance",
    tag = "timer",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses((status = 200, description = "Current quarter", body = QuarterResponse))
)]
pub async fn auto_advance_quarter(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<QuarterResponse>, AppError> {
    Ok(Json(clock_service::auto_advance_quarter(&state, id).await?))
}

/// Credit points scored during live play.
#[utoipa::path(
    post,
    path = "/matches/{id}/score",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body = AddScoreRequest,
    responses(
        (status = 200, description = "Updated scores", body = ScoreResponse),
        (status = 409, description = "Match is not live")
    )
)]
pub async fn add_score(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<AddScoreRequest>>,
) -> Result<Json<ScoreResponse>, AppError> {
    Ok(Json(match_service::add_score(&state, id, payload).await?))
}

/// Correct a team score.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/adjust",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body = AdjustScoreRequest,
    responses((status = 200, description = "Updated scores", body = ScoreResponse))
)]
pub async fn adjust_score(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<AdjustScoreRequest>>,
) -> Result<Json<ScoreResponse>, AppError> {
    Ok(Json(match_service::adjust_score(&state, id, payload).await?))
}

/// Charge a foul to a team.
#[utoipa::path(
    post,
    path = "/matches/{id}/fouls",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body = AddFoulRequest,
    responses((status = 200, description = "Updated foul totals", body = FoulsResponse))
)]
pub async fn add_foul(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<AddFoulRequest>>,
) -> Result<Json<FoulsResponse>, AppError> {
    Ok(Json(match_service::add_foul(&state, id, payload).await?))
}

/// Add fouls or remove the most recent ones.
#[utoipa::path(
    post,
    path = "/matches/{id}/fouls/adjust",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body = AdjustFoulsRequest,
    responses(
        (status = 200, description = "Updated foul totals", body = FoulsResponse),
        (status = 400, description = "No fouls to remove")
    )
)]
pub async fn adjust_fouls(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<AdjustFoulsRequest>>,
) -> Result<Json<FoulsResponse>, AppError> {
    Ok(Json(match_service::adjust_fouls(&state, id, payload).await?))
}

/// Record the final result and close the match.
#[utoipa::path(
    post,
    path = "/matches/{id}/finish",
    tag = "matches",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body = FinishMatchRequest,
    responses((status = 200, description = "Match finished", body = FinishResponse))
)]
pub async fn finish_match(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
    Valid(Json(payload)): Valid<Json<FinishMatchRequest>>,
) -> Result<Json<FinishResponse>, AppError> {
    Ok(Json(match_service::finish_match(&state, id, payload).await?))
}

/// Call the match off.
#[utoipa::path(
    post,
    path = "/matches/{id}/cancel",
    tag = "matches",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses((status = 200, description = "Match canceled", body = StatusResponse))
)]
pub async fn cancel_match(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(match_service::cancel_match(&state, id).await?))
}

/// Interrupt play.
#[utoipa::path(
    post,
    path = "/matches/{id}/suspend",
    tag = "matches",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses((status = 200, description = "Match suspended", body = StatusResponse))
)]
pub async fn suspend_match(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(match_service::suspend_match(&state, id).await?))
}
