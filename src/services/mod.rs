/// Quarter clock and period operations.
pub mod clock_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match lifecycle, scoring and foul bookkeeping.
pub mod match_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events subscription service.
pub mod sse_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;
/// Team registration.
pub mod team_service;
