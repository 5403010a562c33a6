use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoFoulDocument, MongoMatchDocument, MongoScoreEventDocument, MongoTeamDocument,
        doc_id, match_team_filter, status_key,
    },
};
use crate::dao::{
    match_store::MatchStore,
    models::{
        FoulEntity, MatchEntity, MatchPage, MatchQuery, ScoreEventEntity, TeamEntity,
        TeamWinEntity,
    },
    storage::StorageResult,
};

const TEAM_COLLECTION_NAME: &str = "teams";
const MATCH_COLLECTION_NAME: &str = "matches";
const SCORE_EVENT_COLLECTION_NAME: &str = "score_events";
const FOUL_COLLECTION_NAME: &str = "fouls";
const WIN_COLLECTION_NAME: &str = "team_wins";

/// [`MatchStore`] persisting teams, matches, scores, fouls and wins in MongoDB.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.open().await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.open().await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let indexes: [(&'static str, &'static str, Document, bool); 4] = [
            (
                MATCH_COLLECTION_NAME,
                "match_created_at_idx",
                doc! { "created_at": -1 },
                false,
            ),
            (
                FOUL_COLLECTION_NAME,
                "foul_match_team_idx",
                doc! { "match_id": 1, "team_id": 1, "registered_at": -1 },
                false,
            ),
            (
                SCORE_EVENT_COLLECTION_NAME,
                "score_event_match_idx",
                doc! { "match_id": 1 },
                false,
            ),
            (
                WIN_COLLECTION_NAME,
                "team_win_match_idx",
                doc! { "team_id": 1, "match_id": 1 },
                true,
            ),
        ];

        let database = self.database().await;
        for (collection, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(index.to_owned()))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.database().await.collection::<T>(name)
    }

    async fn save_team(&self, team: TeamEntity) -> MongoResult<()> {
        let id = team.id;
        let document = MongoTeamDocument::from(team);
        self.collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| write_error(TEAM_COLLECTION_NAME, source))?;
        Ok(())
    }

    async fn find_team(&self, id: Uuid) -> MongoResult<Option<TeamEntity>> {
        self.collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| read_error(TEAM_COLLECTION_NAME, source))?
            .map(TeamEntity::try_from)
            .transpose()
    }

    async fn list_teams(&self) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
            .await
            .find(doc! {})
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(|source| read_error(TEAM_COLLECTION_NAME, source))?
            .try_collect()
            .await
            .map_err(|source| read_error(TEAM_COLLECTION_NAME, source))?;

        documents.into_iter().map(TeamEntity::try_from).collect()
    }

    async fn save_match(&self, record: MatchEntity) -> MongoResult<()> {
        let id = record.id;
        let document = MongoMatchDocument::from(record);
        self.collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| write_error(MATCH_COLLECTION_NAME, source))?;
        Ok(())
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        self.collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| read_error(MATCH_COLLECTION_NAME, source))?
            .map(MatchEntity::try_from)
            .transpose()
    }

    async fn list_matches(&self, query: MatchQuery) -> MongoResult<MatchPage> {
        let mut filter = Document::new();
        if let Some(status) = query.status {
            filter.insert("status", status_key(status));
        }
        if let Some(team_id) = query.team_id {
            let team_id = team_id.to_string();
            filter.insert(
                "$or",
                vec![
                    doc! { "home_team_id": team_id.as_str() },
                    doc! { "away_team_id": team_id.as_str() },
                ],
            );
        }

        let collection = self
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
            .await;
        let total = collection
            .count_documents(filter.clone())
            .await
            .map_err(|source| read_error(MATCH_COLLECTION_NAME, source))?;

        let documents: Vec<MongoMatchDocument> = collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(query.skip as u64)
            .limit(query.limit as i64)
            .await
            .map_err(|source| read_error(MATCH_COLLECTION_NAME, source))?
            .try_collect()
            .await
            .map_err(|source| read_error(MATCH_COLLECTION_NAME, source))?;

        let items = documents
            .into_iter()
            .map(MatchEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;
        Ok(MatchPage { items, total })
    }

    async fn record_score_events(&self, events: Vec<ScoreEventEntity>) -> MongoResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let documents: Vec<MongoScoreEventDocument> =
            events.into_iter().map(Into::into).collect();
        self.collection::<MongoScoreEventDocument>(SCORE_EVENT_COLLECTION_NAME)
            .await
            .insert_many(documents)
            .await
            .map_err(|source| write_error(SCORE_EVENT_COLLECTION_NAME, source))?;
        Ok(())
    }

    async fn add_fouls(&self, fouls: Vec<FoulEntity>) -> MongoResult<()> {
        if fouls.is_empty() {
            return Ok(());
        }

        let documents: Vec<MongoFoulDocument> = fouls.into_iter().map(Into::into).collect();
        self.collection::<MongoFoulDocument>(FOUL_COLLECTION_NAME)
            .await
            .insert_many(documents)
            .await
            .map_err(|source| write_error(FOUL_COLLECTION_NAME, source))?;
        Ok(())
    }

    async fn remove_latest_fouls(
        &self,
        match_id: Uuid,
        team_id: Uuid,
        count: usize,
    ) -> MongoResult<usize> {
        if count == 0 {
            return Ok(0);
        }

        let collection = self
            .collection::<MongoFoulDocument>(FOUL_COLLECTION_NAME)
            .await;
        let latest: Vec<MongoFoulDocument> = collection
            .find(match_team_filter(match_id, team_id))
            .sort(doc! { "registered_at": -1 })
            .limit(count as i64)
            .await
            .map_err(|source| read_error(FOUL_COLLECTION_NAME, source))?
            .try_collect()
            .await
            .map_err(|source| read_error(FOUL_COLLECTION_NAME, source))?;

        if latest.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = latest.into_iter().map(|foul| foul.id).collect();
        let result = collection
            .delete_many(doc! { "_id": { "$in": ids } })
            .await
            .map_err(|source| write_error(FOUL_COLLECTION_NAME, source))?;
        Ok(result.deleted_count as usize)
    }

    async fn count_fouls(&self, match_id: Uuid, team_id: Uuid) -> MongoResult<u32> {
        let count = self
            .collection::<MongoFoulDocument>(FOUL_COLLECTION_NAME)
            .await
            .count_documents(match_team_filter(match_id, team_id))
            .await
            .map_err(|source| read_error(FOUL_COLLECTION_NAME, source))?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn record_win(&self, win: TeamWinEntity) -> MongoResult<bool> {
        let filter = match_team_filter(win.match_id, win.team_id);
        let result = self
            .collection::<Document>(WIN_COLLECTION_NAME)
            .await
            .update_one(
                filter,
                doc! {
                    "$setOnInsert": {
                        "registered_at": DateTime::from_system_time(win.registered_at),
                    }
                },
            )
            .upsert(true)
            .await
            .map_err(|source| write_error(WIN_COLLECTION_NAME, source))?;
        Ok(result.upserted_id.is_some())
    }
}

fn write_error(collection: &'static str, source: mongodb::error::Error) -> MongoDaoError {
    MongoDaoError::Write { collection, source }
}

fn read_error(collection: &'static str, source: mongodb::error::Error) -> MongoDaoError {
    MongoDaoError::Read { collection, source }
}

impl MatchStore for MongoMatchStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_team(team).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams().await.map_err(Into::into) })
    }

    fn save_match(&self, record: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_match(record).await.map_err(Into::into) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn list_matches(&self, query: MatchQuery) -> BoxFuture<'static, StorageResult<MatchPage>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches(query).await.map_err(Into::into) })
    }

    fn record_score_events(
        &self,
        events: Vec<ScoreEventEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.record_score_events(events).await.map_err(Into::into) })
    }

    fn add_fouls(&self, fouls: Vec<FoulEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.add_fouls(fouls).await.map_err(Into::into) })
    }

    fn remove_latest_fouls(
        &self,
        match_id: Uuid,
        team_id: Uuid,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .remove_latest_fouls(match_id, team_id, count)
                .await
                .map_err(Into::into)
        })
    }

    fn count_fouls(&self, match_id: Uuid, team_id: Uuid) -> BoxFuture<'static, StorageResult<u32>> {
        let store = self.clone();
        Box::pin(async move { store.count_fouls(match_id, team_id).await.map_err(Into::into) })
    }

    fn record_win(&self, win: TeamWinEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.record_win(win).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
