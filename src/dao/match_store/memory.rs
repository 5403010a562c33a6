//! Process-local store used when no database is configured, and by tests.

use std::{cmp::Reverse, sync::Arc};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MatchStore;
use crate::dao::{
    models::{
        FoulEntity, MatchEntity, MatchPage, MatchQuery, ScoreEventEntity, TeamEntity,
        TeamWinEntity,
    },
    storage::StorageResult,
};

/// [`MatchStore`] keeping every record in memory. Data is lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryMatchStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    teams: IndexMap<Uuid, TeamEntity>,
    matches: IndexMap<Uuid, MatchEntity>,
    score_events: Vec<ScoreEventEntity>,
    fouls: Vec<FoulEntity>,
    wins: Vec<TeamWinEntity>,
}

impl InMemoryMatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Score events recorded for a match, oldest first.
    pub async fn score_events(&self, match_id: Uuid) -> Vec<ScoreEventEntity> {
        let guard = self.inner.read().await;
        guard
            .score_events
            .iter()
            .filter(|event| event.match_id == match_id)
            .cloned()
            .collect()
    }

    /// Wins recorded for a match.
    pub async fn wins(&self, match_id: Uuid) -> Vec<TeamWinEntity> {
        let guard = self.inner.read().await;
        guard
            .wins
            .iter()
            .filter(|win| win.match_id == match_id)
            .cloned()
            .collect()
    }
}

impl MatchStore for InMemoryMatchStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.write().await.teams.insert(team.id, team);
            Ok(())
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { Ok(inner.read().await.teams.get(&id).cloned()) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { Ok(inner.read().await.teams.values().cloned().collect()) })
    }

    fn save_match(&self, record: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.write().await.matches.insert(record.id, record);
            Ok(())
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { Ok(inner.read().await.matches.get(&id).cloned()) })
    }

    fn list_matches(&self, query: MatchQuery) -> BoxFuture<'static, StorageResult<MatchPage>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let guard = inner.read().await;
            let mut selected: Vec<&MatchEntity> = guard
                .matches
                .values()
                .filter(|record| query.matches(record))
                .collect();
            selected.sort_by_key(|record| Reverse(record.created_at));

            let total = selected.len() as u64;
            let items = selected
                .into_iter()
                .skip(query.skip)
                .take(query.limit)
                .cloned()
                .collect();
            Ok(MatchPage { items, total })
        })
    }

    fn record_score_events(
        &self,
        events: Vec<ScoreEventEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.write().await.score_events.extend(events);
            Ok(())
        })
    }

    fn add_fouls(&self, fouls: Vec<FoulEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.write().await.fouls.extend(fouls);
            Ok(())
        })
    }

    fn remove_latest_fouls(
        &self,
        match_id: Uuid,
        team_id: Uuid,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.write().await;
            let doomed: Vec<usize> = guard
                .fouls
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, foul)| foul.match_id == match_id && foul.team_id == team_id)
                .map(|(index, _)| index)
                .take(count)
                .collect();

            // Indices are descending, so earlier removals never shift later ones.
            for index in &doomed {
                guard.fouls.remove(*index);
            }
            Ok(doomed.len())
        })
    }

    fn count_fouls(&self, match_id: Uuid, team_id: Uuid) -> BoxFuture<'static, StorageResult<u32>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let guard = inner.read().await;
            let count = guard
                .fouls
                .iter()
                .filter(|foul| foul.match_id == match_id && foul.team_id == team_id)
                .count();
            Ok(count as u32)
        })
    }

    fn record_win(&self, win: TeamWinEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut guard = inner.write().await;
            let exists = guard
                .wins
                .iter()
                .any(|existing| existing.team_id == win.team_id && existing.match_id == win.match_id);
            if exists {
                return Ok(false);
            }
            guard.wins.push(win);
            Ok(true)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
