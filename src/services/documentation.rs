use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Scoreboard Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::teams::list_teams,
        crate::routes::teams::create_team,
        crate::routes::teams::get_team,
        crate::routes::teams::rename_team,
        crate::routes::matches::list_matches,
        crate::routes::matches::create_match,
        crate::routes::matches::quick_match,
        crate::routes::matches::get_match,
        crate::routes::matches::start_timer,
        crate::routes::matches::pause_timer,
        crate::routes::matches::resume_timer,
        crate::routes::matches::reset_timer,
        crate::routes::matches::advance_quarter,
        crate::routes::matches::auto_advance_quarter,
        crate::routes::matches::add_score,
        crate::routes::matches::adjust_score,
        crate::routes::matches::add_foul,
        crate::routes::matches::adjust_fouls,
        crate::routes::matches::finish_match,
        crate::routes::matches::cancel_match,
        crate::routes::matches::suspend_match,
        crate::routes::sse::match_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::teams::CreateTeamRequest,
            crate::dto::teams::UpdateTeamRequest,
            crate::dto::teams::TeamSummary,
            crate::dto::teams::TeamsResponse,
            crate::dto::clock::ClockSnapshotDto,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::QuickMatchRequest,
            crate::dto::matches::StartTimerRequest,
            crate::dto::matches::AddScoreRequest,
            crate::dto::matches::AdjustScoreRequest,
            crate::dto::matches::AddFoulRequest,
            crate::dto::matches::AdjustFoulsRequest,
            crate::dto::matches::ScoreEventInput,
            crate::dto::matches::FoulInput,
            crate::dto::matches::FinishMatchRequest,
            crate::dto::matches::MatchCreatedResponse,
            crate::dto::matches::MatchDetail,
            crate::dto::matches::MatchListItem,
            crate::dto::matches::MatchListResponse,
            crate::dto::matches::PauseResponse,
            crate::dto::matches::QuarterResponse,
            crate::dto::matches::FoulsResponse,
            crate::dto::matches::ScoreResponse,
            crate::dto::matches::StatusResponse,
            crate::dto::matches::FinishResponse,
            crate::dto::sse::QuarterChangedEvent,
            crate::dto::sse::BuzzerReason,
            crate::dto::sse::BuzzerEvent,
            crate::dto::sse::Winner,
            crate::dto::sse::MatchEndedEvent,
            crate::state::state_machine::MatchStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "teams", description = "Team registration"),
        (name = "matches", description = "Match scheduling and lifecycle"),
        (name = "timer", description = "Quarter clock control"),
        (name = "scoring", description = "Scores and fouls during play"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
