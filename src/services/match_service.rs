use std::{collections::HashMap, sync::Arc, time::Duration};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{FoulEntity, MatchEntity, MatchQuery, ScoreEventEntity, TeamEntity, TeamWinEntity},
    },
    dto::{
        clock::ClockSnapshotDto,
        matches::{
            AddFoulRequest, AddScoreRequest, AdjustFoulsRequest, AdjustScoreRequest,
            CreateMatchRequest, FinishMatchRequest, FinishResponse, FoulsResponse,
            ListMatchesQuery, MatchCreatedResponse, MatchDetail, MatchListItem,
            MatchListResponse, MatchSides, QuickMatchRequest, ScoreResponse, StatusResponse,
        },
        sse::Winner,
    },
    error::ServiceError,
    services::{
        sse_events::{
            EVENT_MATCH_CANCELED, EVENT_MATCH_SUSPENDED, EVENT_TIMER_RESET, broadcast_fouls,
            broadcast_match_ended, broadcast_score, broadcast_status, broadcast_timer,
        },
        team_service,
    },
    state::{
        MatchId, SharedState,
        state_machine::{MatchEvent, MatchStatus},
    },
};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

/// Load a match record or fail with `NotFound`.
pub(crate) async fn load_match(
    store: &Arc<dyn MatchStore>,
    match_id: MatchId,
) -> Result<MatchEntity, ServiceError> {
    store
        .find_match(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match {match_id} not found")))
}

/// Count the fouls of both teams of a match.
pub(crate) async fn foul_counts(
    store: &Arc<dyn MatchStore>,
    record: &MatchEntity,
) -> Result<FoulsResponse, ServiceError> {
    Ok(FoulsResponse {
        home_fouls: store.count_fouls(record.id, record.home_team_id).await?,
        away_fouls: store.count_fouls(record.id, record.away_team_id).await?,
    })
}

/// Mark the record finished, persist it and credit the winner.
pub(crate) async fn close_match(
    state: &SharedState,
    store: &Arc<dyn MatchStore>,
    record: &mut MatchEntity,
) -> Result<Winner, ServiceError> {
    record.status = record.status.apply(MatchEvent::Finish)?;
    record.updated_at = state.clocks().now();
    store.save_match(record.clone()).await?;

    let winner = Winner::from_scores(record.home_score, record.away_score);
    let team_id = match winner {
        Winner::Home => Some(record.home_team_id),
        Winner::Away => Some(record.away_team_id),
        Winner::Draw => None,
    };
    if let Some(team_id) = team_id {
        let recorded = store
            .record_win(TeamWinEntity {
                team_id,
                match_id: record.id,
                registered_at: record.updated_at,
            })
            .await?;
        if !recorded {
            warn!(match_id = %record.id, %team_id, "win already recorded for match");
        }
    }

    info!(
        match_id = %record.id,
        home = record.home_score,
        away = record.away_score,
        ?winner,
        "match finished"
    );
    Ok(winner)
}

fn side_of(record: &MatchEntity, team_id: Uuid) -> Result<Side, ServiceError> {
    if team_id == record.home_team_id {
        Ok(Side::Home)
    } else if team_id == record.away_team_id {
        Ok(Side::Away)
    } else {
        Err(ServiceError::InvalidInput(
            "team does not play in this match".into(),
        ))
    }
}

fn default_quarter_secs(state: &SharedState) -> u32 {
    u32::try_from(state.config().quarter_duration.as_secs()).unwrap_or(u32::MAX)
}

fn quarter_or_default(state: &SharedState, requested: Option<u32>) -> u32 {
    requested
        .filter(|secs| *secs > 0)
        .unwrap_or_else(|| default_quarter_secs(state))
}

async fn insert_match(
    state: &SharedState,
    store: &Arc<dyn MatchStore>,
    home: &TeamEntity,
    away: &TeamEntity,
    quarter_duration_seconds: Option<u32>,
) -> Result<MatchCreatedResponse, ServiceError> {
    let now = state.clocks().now();
    let record = MatchEntity {
        id: Uuid::new_v4(),
        home_team_id: home.id,
        away_team_id: away.id,
        status: MatchStatus::Scheduled,
        quarter_duration_secs: quarter_or_default(state, quarter_duration_seconds),
        home_score: 0,
        away_score: 0,
        period: 1,
        created_at: now,
        updated_at: now,
    };
    store.save_match(record.clone()).await?;
    state.clocks().reset(record.id);

    info!(
        match_id = %record.id,
        home = %home.name,
        away = %away.name,
        quarter_secs = record.quarter_duration_secs,
        "match created"
    );

    Ok(MatchCreatedResponse {
        match_id: record.id,
        home_team_id: home.id,
        away_team_id: away.id,
        quarter_duration_seconds: record.quarter_duration_secs,
    })
}

/// Schedule a match between two registered teams.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<MatchCreatedResponse, ServiceError> {
    if request.home_team_id == request.away_team_id {
        return Err(ServiceError::InvalidInput(
            "select two different teams".into(),
        ));
    }

    let store = state.require_match_store().await?;
    let home = store.find_team(request.home_team_id).await?;
    let away = store.find_team(request.away_team_id).await?;
    let (Some(home), Some(away)) = (home, away) else {
        return Err(ServiceError::InvalidInput("invalid team ids".into()));
    };

    insert_match(state, &store, &home, &away, request.quarter_duration_seconds).await
}

/// Register both teams by name, then schedule a match between them.
pub async fn quick_match(
    state: &SharedState,
    request: QuickMatchRequest,
) -> Result<MatchCreatedResponse, ServiceError> {
    let store = state.require_match_store().await?;
    let home = team_service::insert_team(state, &store, &request.home_name).await?;
    let away = team_service::insert_team(state, &store, &request.away_name).await?;
    insert_match(state, &store, &home, &away, request.quarter_duration_seconds).await
}

/// Page through matches, newest first.
pub async fn list_matches(
    state: &SharedState,
    query: ListMatchesQuery,
) -> Result<MatchListResponse, ServiceError> {
    let page = query
        .page
        .filter(|page| *page >= 1)
        .and_then(|page| u32::try_from(page).ok())
        .unwrap_or(DEFAULT_PAGE);
    let page_size = query
        .page_size
        .filter(|size| (1..=i64::from(MAX_PAGE_SIZE)).contains(size))
        .and_then(|size| u32::try_from(size).ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let store = state.require_match_store().await?;
    let result = store
        .list_matches(MatchQuery {
            status: query.status,
            team_id: query.team_id,
            skip: (page as usize - 1) * page_size as usize,
            limit: page_size as usize,
        })
        .await?;

    let teams: HashMap<Uuid, TeamEntity> = store
        .list_teams()
        .await?
        .into_iter()
        .map(|team| (team.id, team))
        .collect();

    let mut items = Vec::with_capacity(result.items.len());
    for record in &result.items {
        let fouls = foul_counts(&store, record).await?;
        items.push(MatchListItem::new(
            record,
            MatchSides {
                home: teams.get(&record.home_team_id),
                away: teams.get(&record.away_team_id),
                fouls,
            },
        ));
    }

    Ok(MatchListResponse {
        items,
        total: result.total,
        page,
        page_size,
    })
}

/// Match record joined with team names, foul totals and the live timer.
pub async fn match_detail(
    state: &SharedState,
    match_id: MatchId,
) -> Result<MatchDetail, ServiceError> {
    let store = state.require_match_store().await?;
    let record = load_match(&store, match_id).await?;
    let home = store.find_team(record.home_team_id).await?;
    let away = store.find_team(record.away_team_id).await?;
    let fouls = foul_counts(&store, &record).await?;

    let quarter = Duration::from_secs(record.quarter_duration_secs.into());
    let snapshot = state.clocks().get_or_create(match_id, quarter);

    Ok(MatchDetail::new(
        &record,
        MatchSides {
            home: home.as_ref(),
            away: away.as_ref(),
            fouls,
        },
        ClockSnapshotDto::from(snapshot),
    ))
}

/// Credit points scored during live play.
pub async fn add_score(
    state: &SharedState,
    match_id: MatchId,
    request: AddScoreRequest,
) -> Result<ScoreResponse, ServiceError> {
    if !(1..=3).contains(&request.points) {
        return Err(ServiceError::InvalidInput("points must be 1, 2 or 3".into()));
    }

    let _gate = state.lock_match(match_id).await;

    let store = state.require_match_store().await?;
    let mut record = load_match(&store, match_id).await?;
    if record.status != MatchStatus::Live {
        return Err(ServiceError::InvalidState(format!(
            "match is {:?}, scoring requires a live match",
            record.status
        )));
    }

    let points = u32::from(request.points);
    match side_of(&record, request.team_id)? {
        Side::Home => record.home_score += points,
        Side::Away => record.away_score += points,
    }

    let now = state.clocks().now();
    record.updated_at = now;
    store
        .record_score_events(vec![ScoreEventEntity {
            id: Uuid::new_v4(),
            match_id,
            team_id: request.team_id,
            player_id: request.player_id,
            points: i32::from(request.points),
            registered_at: now,
        }])
        .await?;
    store.save_match(record.clone()).await?;

    broadcast_score(state, &record);
    Ok(ScoreResponse {
        home_score: record.home_score,
        away_score: record.away_score,
    })
}

/// Apply a manual correction to one team score.
pub async fn adjust_score(
    state: &SharedState,
    match_id: MatchId,
    request: AdjustScoreRequest,
) -> Result<ScoreResponse, ServiceError> {
    let _gate = state.lock_match(match_id).await;

    let store = state.require_match_store().await?;
    let mut record = load_match(&store, match_id).await?;
    let side = side_of(&record, request.team_id)?;
    let score = match side {
        Side::Home => &mut record.home_score,
        Side::Away => &mut record.away_score,
    };

    let adjusted = i64::from(*score) + i64::from(request.delta);
    if adjusted < 0 {
        return Err(ServiceError::InvalidInput("score cannot be negative".into()));
    }
    *score = u32::try_from(adjusted)
        .map_err(|_| ServiceError::InvalidInput("score out of range".into()))?;

    let now = state.clocks().now();
    record.updated_at = now;
    store
        .record_score_events(vec![ScoreEventEntity {
            id: Uuid::new_v4(),
            match_id,
            team_id: request.team_id,
            player_id: None,
            points: request.delta,
            registered_at: now,
        }])
        .await?;
    store.save_match(record.clone()).await?;

    broadcast_score(state, &record);
    Ok(ScoreResponse {
        home_score: record.home_score,
        away_score: record.away_score,
    })
}

/// Charge a foul to a team.
pub async fn add_foul(
    state: &SharedState,
    match_id: MatchId,
    request: AddFoulRequest,
) -> Result<FoulsResponse, ServiceError> {
    let _gate = state.lock_match(match_id).await;
    let store = state.require_match_store().await?;
    let record = load_match(&store, match_id).await?;
    side_of(&record, request.team_id)?;

    store
        .add_fouls(vec![FoulEntity::new(
            match_id,
            request.team_id,
            request.player_id,
            request.kind,
        )])
        .await?;

    let fouls = foul_counts(&store, &record).await?;
    broadcast_fouls(state, match_id, fouls);
    Ok(fouls)
}

/// Add fouls, or remove the most recent ones when `delta` is negative.
pub async fn adjust_fouls(
    state: &SharedState,
    match_id: MatchId,
    request: AdjustFoulsRequest,
) -> Result<FoulsResponse, ServiceError> {
    let _gate = state.lock_match(match_id).await;

    let store = state.require_match_store().await?;
    let record = load_match(&store, match_id).await?;
    side_of(&record, request.team_id)?;

    let amount = request.delta.unsigned_abs() as usize;
    if request.delta > 0 {
        let fouls = (0..amount)
            .map(|_| FoulEntity::new(match_id, request.team_id, None, None))
            .collect();
        store.add_fouls(fouls).await?;
    } else if request.delta < 0 {
        let removed = store
            .remove_latest_fouls(match_id, request.team_id, amount)
            .await?;
        if removed == 0 {
            return Err(ServiceError::InvalidInput("no fouls to remove".into()));
        }
    }

    let fouls = foul_counts(&store, &record).await?;
    broadcast_fouls(state, match_id, fouls);
    Ok(fouls)
}

async fn sync_fouls(
    store: &Arc<dyn MatchStore>,
    match_id: MatchId,
    team_id: Uuid,
    target: u32,
) -> Result<(), ServiceError> {
    let current = store.count_fouls(match_id, team_id).await?;
    if target > current {
        let fouls = (current..target)
            .map(|_| FoulEntity::new(match_id, team_id, None, None))
            .collect();
        store.add_fouls(fouls).await?;
    } else if target < current {
        store
            .remove_latest_fouls(match_id, team_id, (current - target) as usize)
            .await?;
    }
    Ok(())
}

/// Record the final result entered from the control desk and close the match.
pub async fn finish_match(
    state: &SharedState,
    match_id: MatchId,
    request: FinishMatchRequest,
) -> Result<FinishResponse, ServiceError> {
    let _gate = state.lock_match(match_id).await;

    let store = state.require_match_store().await?;
    let mut record = load_match(&store, match_id).await?;
    record.status.apply(MatchEvent::Finish)?;

    for team_id in request
        .score_events
        .iter()
        .map(|event| event.team_id)
        .chain(request.fouls.iter().map(|foul| foul.team_id))
    {
        side_of(&record, team_id)?;
    }

    record.home_score = request.home_score;
    record.away_score = request.away_score;

    sync_fouls(&store, match_id, record.home_team_id, request.home_fouls).await?;
    sync_fouls(&store, match_id, record.away_team_id, request.away_fouls).await?;

    let now = state.clocks().now();
    let events: Vec<ScoreEventEntity> = request
        .score_events
        .into_iter()
        .map(|event| ScoreEventEntity {
            id: Uuid::new_v4(),
            match_id,
            team_id: event.team_id,
            player_id: event.player_id,
            points: event.points,
            registered_at: now,
        })
        .collect();
    store.record_score_events(events).await?;

    let fouls: Vec<FoulEntity> = request
        .fouls
        .into_iter()
        .map(|foul| FoulEntity::new(match_id, foul.team_id, foul.player_id, None))
        .collect();
    store.add_fouls(fouls).await?;

    close_match(state, &store, &mut record).await?;

    let snapshot = state.clocks().reset(match_id);
    broadcast_timer(state, match_id, EVENT_TIMER_RESET, snapshot);
    broadcast_match_ended(state, &record);

    Ok(FinishResponse {
        id: record.id,
        status: record.status,
        home_score: record.home_score,
        away_score: record.away_score,
    })
}

async fn transition(
    state: &SharedState,
    match_id: MatchId,
    event: MatchEvent,
    sse_event: &'static str,
) -> Result<StatusResponse, ServiceError> {
    let _gate = state.lock_match(match_id).await;

    let store = state.require_match_store().await?;
    let mut record = load_match(&store, match_id).await?;
    record.status = record.status.apply(event)?;
    record.updated_at = state.clocks().now();
    store.save_match(record.clone()).await?;

    info!(%match_id, status = ?record.status, "match status changed");
    broadcast_status(state, &record, sse_event);
    Ok(StatusResponse {
        status: record.status,
    })
}

/// Call the match off.
pub async fn cancel_match(
    state: &SharedState,
    match_id: MatchId,
) -> Result<StatusResponse, ServiceError> {
    transition(state, match_id, MatchEvent::Cancel, EVENT_MATCH_CANCELED).await
}

/// Interrupt play; starting the clock again resumes the match.
pub async fn suspend_match(
    state: &SharedState,
    match_id: MatchId,
) -> Result<StatusResponse, ServiceError> {
    transition(state, match_id, MatchEvent::Suspend, EVENT_MATCH_SUSPENDED).await
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::InMemoryMatchStore,
        dto::matches::{FoulInput, ScoreEventInput},
        state::{AppState, time::ManualTimeSource},
    };

    pub(crate) struct Fixture {
        pub state: SharedState,
        pub store: InMemoryMatchStore,
        pub time: ManualTimeSource,
        pub created: MatchCreatedResponse,
    }

    pub(crate) async fn fixture_with(config: AppConfig) -> Fixture {
        let time = ManualTimeSource::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        let state = AppState::with_time_source(config, Arc::new(time.clone()));
        let store = InMemoryMatchStore::new();
        state.install_match_store(Arc::new(store.clone())).await;

        let created = quick_match(
            &state,
            QuickMatchRequest {
                home_name: " Bulls ".into(),
                away_name: "Celtics".into(),
                quarter_duration_seconds: Some(600),
            },
        )
        .await
        .unwrap();

        Fixture {
            state,
            store,
            time,
            created,
        }
    }

    pub(crate) async fn fixture() -> Fixture {
        fixture_with(AppConfig::default()).await
    }

    pub(crate) async fn go_live(fixture: &Fixture) {
        let mut record = fixture
            .store
            .find_match(fixture.created.match_id)
            .await
            .unwrap()
            .unwrap();
        record.status = MatchStatus::Live;
        fixture.store.save_match(record).await.unwrap();
    }

    #[tokio::test]
    async fn created_match_is_scheduled_with_a_reset_clock() {
        let fx = fixture().await;
        let detail = match_detail(&fx.state, fx.created.match_id).await.unwrap();

        assert_eq!(detail.status, MatchStatus::Scheduled);
        assert_eq!(detail.quarter, 1);
        assert_eq!(detail.home_team, "Bulls");
        assert_eq!(detail.quarter_duration_seconds, 600);
        assert!(!detail.timer.is_running);
        assert_eq!(detail.timer.remaining_seconds, 0);
        assert_eq!(detail.home_fouls, 0);
    }

    #[tokio::test]
    async fn quarter_duration_defaults_to_configuration() {
        let fx = fixture().await;
        let created = create_match(
            &fx.state,
            CreateMatchRequest {
                home_team_id: fx.created.away_team_id,
                away_team_id: fx.created.home_team_id,
                quarter_duration_seconds: Some(0),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.quarter_duration_seconds, 10);
    }

    #[tokio::test]
    async fn create_match_rejects_unknown_or_identical_teams() {
        let fx = fixture().await;
        let err = create_match(
            &fx.state,
            CreateMatchRequest {
                home_team_id: fx.created.home_team_id,
                away_team_id: Uuid::new_v4(),
                quarter_duration_seconds: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = create_match(
            &fx.state,
            CreateMatchRequest {
                home_team_id: fx.created.home_team_id,
                away_team_id: fx.created.home_team_id,
                quarter_duration_seconds: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let fx = fixture().await;
        let err = match_detail(&fx.state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn scoring_requires_a_live_match() {
        let fx = fixture().await;
        let request = || AddScoreRequest {
            team_id: fx.created.home_team_id,
            player_id: None,
            points: 3,
        };

        let err = add_score(&fx.state, fx.created.match_id, request())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        go_live(&fx).await;
        let score = add_score(&fx.state, fx.created.match_id, request())
            .await
            .unwrap();
        assert_eq!(score, ScoreResponse { home_score: 3, away_score: 0 });
        assert_eq!(fx.store.score_events(fx.created.match_id).await.len(), 1);
    }

    #[tokio::test]
    async fn scoring_rejects_foreign_teams_and_bad_points() {
        let fx = fixture().await;
        go_live(&fx).await;

        let err = add_score(
            &fx.state,
            fx.created.match_id,
            AddScoreRequest {
                team_id: Uuid::new_v4(),
                player_id: None,
                points: 2,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = add_score(
            &fx.state,
            fx.created.match_id,
            AddScoreRequest {
                team_id: fx.created.home_team_id,
                player_id: None,
                points: 4,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn adjusting_score_never_goes_negative() {
        let fx = fixture().await;
        let adjust = |delta| AdjustScoreRequest {
            team_id: fx.created.away_team_id,
            delta,
        };

        let score = adjust_score(&fx.state, fx.created.match_id, adjust(5))
            .await
            .unwrap();
        assert_eq!(score.away_score, 5);

        let err = adjust_score(&fx.state, fx.created.match_id, adjust(-6))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref message) if message == "score cannot be negative"));

        let score = adjust_score(&fx.state, fx.created.match_id, adjust(-5))
            .await
            .unwrap();
        assert_eq!(score.away_score, 0);
    }

    #[tokio::test]
    async fn foul_adjustments_add_and_remove() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;
        let home = fx.created.home_team_id;

        let fouls = add_foul(
            &fx.state,
            match_id,
            AddFoulRequest {
                team_id: home,
                player_id: None,
                kind: Some("personal".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(fouls, FoulsResponse { home_fouls: 1, away_fouls: 0 });

        let fouls = adjust_fouls(
            &fx.state,
            match_id,
            AdjustFoulsRequest { team_id: home, delta: 2 },
        )
        .await
        .unwrap();
        assert_eq!(fouls.home_fouls, 3);

        let fouls = adjust_fouls(
            &fx.state,
            match_id,
            AdjustFoulsRequest { team_id: home, delta: -5 },
        )
        .await
        .unwrap();
        assert_eq!(fouls.home_fouls, 0);

        let err = adjust_fouls(
            &fx.state,
            match_id,
            AdjustFoulsRequest { team_id: home, delta: -1 },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref message) if message == "no fouls to remove"));
    }

    #[tokio::test]
    async fn finish_sets_final_result_and_credits_the_winner() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;
        let home = fx.created.home_team_id;
        let away = fx.created.away_team_id;

        adjust_fouls(&fx.state, match_id, AdjustFoulsRequest { team_id: home, delta: 4 })
            .await
            .unwrap();
        fx.state.clocks().start(match_id, Some(Duration::from_secs(600)));
        let mut events = fx.state.hubs().subscribe(match_id);

        let result = finish_match(
            &fx.state,
            match_id,
            FinishMatchRequest {
                home_score: 88,
                away_score: 90,
                home_fouls: 2,
                away_fouls: 3,
                score_events: vec![ScoreEventInput {
                    team_id: away,
                    player_id: None,
                    points: 2,
                }],
                fouls: vec![FoulInput {
                    team_id: away,
                    player_id: None,
                }],
            },
        )
        .await
        .unwrap();

        assert_eq!(result.status, MatchStatus::Finished);
        assert_eq!((result.home_score, result.away_score), (88, 90));
        assert_eq!(fx.store.count_fouls(match_id, home).await.unwrap(), 2);
        assert_eq!(fx.store.count_fouls(match_id, away).await.unwrap(), 4);

        let wins = fx.store.wins(match_id).await;
        assert_eq!(wins.len(), 1);
        assert_eq!(wins[0].team_id, away);

        let snapshot = fx.state.clocks().get(match_id);
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.remaining_seconds, 0);

        let reset = events.recv().await.unwrap();
        assert_eq!(reset.event.as_deref(), Some("timer.reset"));
        let ended = events.recv().await.unwrap();
        assert_eq!(ended.event.as_deref(), Some("match.ended"));
        assert_eq!(ended.data, r#"{"home":88,"away":90,"winner":"away"}"#);

        let err = finish_match(
            &fx.state,
            match_id,
            FinishMatchRequest {
                home_score: 0,
                away_score: 0,
                home_fouls: 0,
                away_fouls: 0,
                score_events: Vec::new(),
                fouls: Vec::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn draw_records_no_win() {
        let fx = fixture().await;
        finish_match(
            &fx.state,
            fx.created.match_id,
            FinishMatchRequest {
                home_score: 70,
                away_score: 70,
                home_fouls: 0,
                away_fouls: 0,
                score_events: Vec::new(),
                fouls: Vec::new(),
            },
        )
        .await
        .unwrap();
        assert!(fx.store.wins(fx.created.match_id).await.is_empty());
    }

    #[tokio::test]
    async fn cancel_and_suspend_follow_the_status_machine() {
        let fx = fixture().await;
        let match_id = fx.created.match_id;

        let status = suspend_match(&fx.state, match_id).await.unwrap();
        assert_eq!(status.status, MatchStatus::Suspended);
        let err = suspend_match(&fx.state, match_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let status = cancel_match(&fx.state, match_id).await.unwrap();
        assert_eq!(status.status, MatchStatus::Canceled);
        let err = cancel_match(&fx.state, match_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn listing_pages_newest_first_with_foul_counts() {
        let fx = fixture().await;
        fx.time.advance(Duration::from_secs(60));
        let newer = create_match(
            &fx.state,
            CreateMatchRequest {
                home_team_id: fx.created.away_team_id,
                away_team_id: fx.created.home_team_id,
                quarter_duration_seconds: None,
            },
        )
        .await
        .unwrap();
        add_foul(
            &fx.state,
            newer.match_id,
            AddFoulRequest {
                team_id: newer.home_team_id,
                player_id: None,
                kind: None,
            },
        )
        .await
        .unwrap();

        let page = list_matches(
            &fx.state,
            ListMatchesQuery {
                page: Some(0),
                page_size: Some(500),
                ..ListMatchesQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!((page.page, page.page_size, page.total), (1, 20, 2));
        assert_eq!(page.items[0].id, newer.match_id);
        assert_eq!(page.items[0].home_team, "Celtics");
        assert_eq!(page.items[0].home_fouls, 1);

        let second = list_matches(
            &fx.state,
            ListMatchesQuery {
                page: Some(2),
                page_size: Some(1),
                ..ListMatchesQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, fx.created.match_id);
    }

    #[tokio::test]
    async fn degraded_mode_rejects_match_operations() {
        let fx = fixture().await;
        fx.state.clear_match_store().await;
        let err = match_detail(&fx.state, fx.created.match_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
