use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::teams::{CreateTeamRequest, TeamSummary, TeamsResponse, UpdateTeamRequest},
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Team registration endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}", get(get_team).put(rename_team))
}

/// List registered teams.
#[utoipa::path(
    get,
    path = "/teams",
    tag = "teams",
    responses((status = 200, description = "Registered teams", body = TeamsResponse))
)]
pub async fn list_teams(State(state): State<SharedState>) -> Result<Json<TeamsResponse>, AppError> {
    Ok(Json(team_service::list_teams(&state).await?))
}

/// Register a team.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses((status = 200, description = "Team created", body = TeamSummary))
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(team_service::create_team(&state, payload).await?))
}

/// Fetch one team.
#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the team")),
    responses(
        (status = 200, description = "Team", body = TeamSummary),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(team_service::get_team(&state, id).await?))
}

/// Rename a team.
#[utoipa::path(
    put,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the team")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team renamed", body = TeamSummary),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn rename_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateTeamRequest>>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(team_service::rename_team(&state, id, payload).await?))
}
