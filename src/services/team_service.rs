use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{match_store::MatchStore, models::TeamEntity},
    dto::teams::{CreateTeamRequest, TeamSummary, TeamsResponse, UpdateTeamRequest},
    error::ServiceError,
    state::SharedState,
};

/// Persist a team under its trimmed name.
pub(crate) async fn insert_team(
    state: &SharedState,
    store: &Arc<dyn MatchStore>,
    name: &str,
) -> Result<TeamEntity, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("team name is required".into()));
    }

    let team = TeamEntity {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        created_at: state.clocks().now(),
    };
    store.save_team(team.clone()).await?;
    info!(team_id = %team.id, name = %team.name, "team created");
    Ok(team)
}

/// Register a new team.
pub async fn create_team(
    state: &SharedState,
    request: CreateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_match_store().await?;
    insert_team(state, &store, &request.name)
        .await
        .map(Into::into)
}

/// List registered teams.
pub async fn list_teams(state: &SharedState) -> Result<TeamsResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let teams = store.list_teams().await?;
    Ok(TeamsResponse {
        teams: teams.into_iter().map(Into::into).collect(),
    })
}

async fn load_team(store: &Arc<dyn MatchStore>, team_id: Uuid) -> Result<TeamEntity, ServiceError> {
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team {team_id} not found")))
}

/// Fetch one team.
pub async fn get_team(state: &SharedState, team_id: Uuid) -> Result<TeamSummary, ServiceError> {
    let store = state.require_match_store().await?;
    load_team(&store, team_id).await.map(Into::into)
}

/// Rename a team, keeping its identifier and creation date.
pub async fn rename_team(
    state: &SharedState,
    team_id: Uuid,
    request: UpdateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("team name is required".into()));
    }

    let store = state.require_match_store().await?;
    let mut team = load_team(&store, team_id).await?;
    team.name = name.to_owned();
    store.save_team(team.clone()).await?;
    info!(%team_id, name = %team.name, "team renamed");
    Ok(team.into())
}
