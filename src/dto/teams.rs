use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::TeamEntity,
    dto::{format_system_time, validation::validate_team_name},
};

/// Payload used to register a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(custom(function = "validate_team_name"))]
    pub name: String,
}

/// Payload used to rename a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[validate(custom(function = "validate_team_name"))]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Public projection of a team.
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at_utc: String,
}

impl From<TeamEntity> for TeamSummary {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            created_at_utc: format_system_time(team.created_at),
        }
    }
}

/// Response payload listing registered teams.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsResponse {
    pub teams: Vec<TeamSummary>,
}
