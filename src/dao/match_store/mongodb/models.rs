use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{FoulEntity, MatchEntity, ScoreEventEntity, TeamEntity},
    state::state_machine::MatchStatus,
};

// Identifiers are stored as their hyphenated string form.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    created_at: DateTime,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(&value.id, &value.id)?,
            name: value.name,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    home_team_id: String,
    away_team_id: String,
    status: MatchStatus,
    quarter_duration_secs: i64,
    home_score: i64,
    away_score: i64,
    period: i32,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            home_team_id: value.home_team_id.to_string(),
            away_team_id: value.away_team_id.to_string(),
            status: value.status,
            quarter_duration_secs: value.quarter_duration_secs.into(),
            home_score: value.home_score.into(),
            away_score: value.away_score.into(),
            period: value.period.into(),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        let owner = value.id.as_str();
        Ok(Self {
            id: parse_id(owner, &value.id)?,
            home_team_id: parse_id(owner, &value.home_team_id)?,
            away_team_id: parse_id(owner, &value.away_team_id)?,
            status: value.status,
            quarter_duration_secs: narrow(owner, "quarter_duration_secs", value.quarter_duration_secs)?,
            home_score: narrow(owner, "home_score", value.home_score)?,
            away_score: narrow(owner, "away_score", value.away_score)?,
            period: narrow(owner, "period", value.period)?,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreEventDocument {
    #[serde(rename = "_id")]
    id: String,
    match_id: String,
    team_id: String,
    player_id: Option<String>,
    points: i32,
    registered_at: DateTime,
}

impl From<ScoreEventEntity> for MongoScoreEventDocument {
    fn from(value: ScoreEventEntity) -> Self {
        Self {
            id: value.id.to_string(),
            match_id: value.match_id.to_string(),
            team_id: value.team_id.to_string(),
            player_id: value.player_id.map(|id| id.to_string()),
            points: value.points,
            registered_at: DateTime::from_system_time(value.registered_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFoulDocument {
    #[serde(rename = "_id")]
    pub id: String,
    match_id: String,
    team_id: String,
    player_id: Option<String>,
    kind: Option<String>,
    registered_at: DateTime,
}

impl From<FoulEntity> for MongoFoulDocument {
    fn from(value: FoulEntity) -> Self {
        Self {
            id: value.id.to_string(),
            match_id: value.match_id.to_string(),
            team_id: value.team_id.to_string(),
            player_id: value.player_id.map(|id| id.to_string()),
            kind: value.kind,
            registered_at: DateTime::from_system_time(value.registered_at),
        }
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! { "_id": id.to_string() }
}

/// Filter selecting the records of one team within one match.
pub fn match_team_filter(match_id: Uuid, team_id: Uuid) -> Document {
    doc! { "match_id": match_id.to_string(), "team_id": team_id.to_string() }
}

/// Stored representation of a status, matching its serde form.
pub fn status_key(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Scheduled => "Scheduled",
        MatchStatus::Live => "Live",
        MatchStatus::Finished => "Finished",
        MatchStatus::Canceled => "Canceled",
        MatchStatus::Suspended => "Suspended",
    }
}

fn parse_id(owner: &str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::Decode {
        id: owner.to_owned(),
        reason: format!("invalid identifier `{raw}`: {err}"),
    })
}

fn narrow<S, T>(owner: &str, field: &str, value: S) -> MongoResult<T>
where
    S: Copy + std::fmt::Display,
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| MongoDaoError::Decode {
        id: owner.to_owned(),
        reason: format!("`{field}` out of range: {value}"),
    })
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    #[test]
    fn match_document_keeps_every_field() {
        let created_at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let entity = MatchEntity {
            id: Uuid::new_v4(),
            home_team_id: Uuid::new_v4(),
            away_team_id: Uuid::new_v4(),
            status: MatchStatus::Suspended,
            quarter_duration_secs: 600,
            home_score: 81,
            away_score: 77,
            period: 3,
            created_at,
            updated_at: created_at,
        };

        let document = MongoMatchDocument::from(entity.clone());
        let restored = MatchEntity::try_from(document).unwrap();
        assert_eq!(restored, entity);
    }

    #[test]
    fn malformed_identifier_is_reported_as_decode_error() {
        let document = MongoTeamDocument {
            id: "not-a-uuid".into(),
            name: "Bulls".into(),
            created_at: DateTime::now(),
        };

        let err = TeamEntity::try_from(document).unwrap_err();
        assert!(matches!(err, MongoDaoError::Decode { ref id, .. } if id == "not-a-uuid"));
    }

    #[test]
    fn negative_score_is_rejected() {
        let err = narrow::<i64, u32>("m1", "home_score", -3).unwrap_err();
        assert!(err.to_string().contains("home_score"));
    }
}
