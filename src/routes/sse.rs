use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::sse_service,
    state::{MatchId, SharedState},
};

#[utoipa::path(
    get,
    path = "/sse/matches/{id}",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the match to follow")),
    responses(
        (status = 200, description = "Match SSE stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown match")
    )
)]
/// Stream timer, score and lifecycle events of one match.
pub async fn match_stream(
    State(state): State<SharedState>,
    Path(id): Path<MatchId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let receiver = sse_service::subscribe_match(&state, id).await?;
    info!(match_id = %id, "New match SSE connection");
    Ok(sse_service::to_sse_stream(receiver, state, id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/matches/{id}", get(match_stream))
}
