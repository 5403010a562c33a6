use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::state_machine::MatchStatus;

/// Team that can take part in matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name of the team.
    pub name: String,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Persisted match record. The live clock is kept in memory, only its quarter length is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match, also the clock registry key.
    pub id: Uuid,
    /// Team playing at home.
    pub home_team_id: Uuid,
    /// Visiting team.
    pub away_team_id: Uuid,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Configured length of one quarter, in seconds.
    pub quarter_duration_secs: u32,
    /// Points scored by the home team.
    pub home_score: u32,
    /// Points scored by the visiting team.
    pub away_score: u32,
    /// Current quarter, starting at 1.
    pub period: u8,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the record was updated.
    pub updated_at: SystemTime,
}

impl MatchEntity {
    /// Whether `team_id` plays in this match.
    pub fn involves(&self, team_id: Uuid) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

/// Points granted (or taken back) for a team during a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEventEntity {
    pub id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    /// Signed amount; manual adjustments may be negative.
    pub points: i32,
    pub registered_at: SystemTime,
}

/// Foul charged to a team during a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoulEntity {
    pub id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub player_id: Option<Uuid>,
    /// Free-form foul category (e.g. "personal", "technical").
    pub kind: Option<String>,
    pub registered_at: SystemTime,
}

impl FoulEntity {
    /// Build a foul registered now.
    pub fn new(match_id: Uuid, team_id: Uuid, player_id: Option<Uuid>, kind: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            team_id,
            player_id,
            kind,
            registered_at: SystemTime::now(),
        }
    }
}

/// Win credited to a team once a match is finished without a draw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamWinEntity {
    pub team_id: Uuid,
    pub match_id: Uuid,
    pub registered_at: SystemTime,
}

/// Filters and paging applied when listing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    /// Only matches in this status.
    pub status: Option<MatchStatus>,
    /// Only matches where this team plays.
    pub team_id: Option<Uuid>,
    /// Number of matching records to skip.
    pub skip: usize,
    /// Maximum number of records to return.
    pub limit: usize,
}

impl MatchQuery {
    /// Whether `record` passes the filters.
    pub fn matches(&self, record: &MatchEntity) -> bool {
        self.status.is_none_or(|status| record.status == status)
            && self.team_id.is_none_or(|team_id| record.involves(team_id))
    }
}

/// One page of matches plus the total number of matching records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPage {
    pub items: Vec<MatchEntity>,
    pub total: u64,
}
