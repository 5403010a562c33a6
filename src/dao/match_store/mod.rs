pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    FoulEntity, MatchEntity, MatchPage, MatchQuery, ScoreEventEntity, TeamEntity, TeamWinEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use memory::InMemoryMatchStore;

/// Abstraction over the persistence layer for teams, matches, scores and fouls.
pub trait MatchStore: Send + Sync {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    fn save_match(&self, record: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Matching records, newest first.
    fn list_matches(&self, query: MatchQuery) -> BoxFuture<'static, StorageResult<MatchPage>>;
    fn record_score_events(
        &self,
        events: Vec<ScoreEventEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn add_fouls(&self, fouls: Vec<FoulEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete up to `count` of the most recent fouls of a team, returning how many went away.
    fn remove_latest_fouls(
        &self,
        match_id: Uuid,
        team_id: Uuid,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<usize>>;
    fn count_fouls(&self, match_id: Uuid, team_id: Uuid) -> BoxFuture<'static, StorageResult<u32>>;
    /// Store a win unless the team already has one for the match. Returns whether it was new.
    fn record_win(&self, win: TeamWinEntity) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
