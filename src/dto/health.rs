use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of match clocks currently held in memory.
    pub active_clocks: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(active_clocks: usize) -> Self {
        Self {
            status: "ok".to_string(),
            active_clocks,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(active_clocks: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            active_clocks,
        }
    }
}
