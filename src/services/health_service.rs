use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness and the number of tracked clocks, pinging the match store on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_match_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let active_clocks = state.clocks().len();
    if state.is_degraded() {
        HealthResponse::degraded(active_clocks)
    } else {
        HealthResponse::ok(active_clocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::match_service::tests::fixture, state::AppState};

    #[tokio::test]
    async fn reports_degraded_without_a_store() {
        let state = AppState::new(AppConfig::default());
        let status = health_status(&state).await;
        assert_eq!(status, HealthResponse::degraded(0));
    }

    #[tokio::test]
    async fn counts_tracked_clocks() {
        let fx = fixture().await;
        let status = health_status(&fx.state).await;
        assert_eq!(status, HealthResponse::ok(1));
    }
}
