use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod matches;
pub mod sse;
pub mod teams;

/// Compose all route trees and wire in the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(teams::router())
        .merge(matches::router())
        .merge(sse::router())
        .merge(docs::router())
        .with_state(state)
}
