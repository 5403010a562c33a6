use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{
        match_service::load_match,
        sse_events::{EVENT_TIMER_SYNC, broadcast_timer},
    },
    state::{MatchId, SharedState},
};

/// Subscribe to the SSE channel of a match and push the current timer to every subscriber.
///
/// The clock is created idle with the match quarter length when the registry has never seen
/// the match, so late viewers always receive a well-formed `timer.sync`.
pub async fn subscribe_match(
    state: &SharedState,
    match_id: MatchId,
) -> Result<broadcast::Receiver<ServerEvent>, ServiceError> {
    let store = state.require_match_store().await?;
    let record = load_match(&store, match_id).await?;

    let receiver = state.hubs().subscribe(match_id);
    let quarter = Duration::from_secs(record.quarter_duration_secs.into());
    let snapshot = state.clocks().get_or_create(match_id, quarter);
    broadcast_timer(state, match_id, EVENT_TIMER_SYNC, snapshot);

    Ok(receiver)
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// releasing the match hub once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    state: SharedState,
    match_id: MatchId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(%match_id, skipped, "match SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        // the hub only goes away once this receiver is gone
        drop(receiver);
        state.hubs().release(match_id);
        info!(%match_id, "match SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::match_service::tests::fixture;

    #[tokio::test]
    async fn subscriber_receives_the_current_timer() {
        let fx = fixture().await;
        let id = fx.created.match_id;

        let mut receiver = subscribe_match(&fx.state, id).await.unwrap();
        let event = receiver.recv().await.unwrap();

        assert_eq!(event.event.as_deref(), Some(EVENT_TIMER_SYNC));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["isRunning"], false);
        assert_eq!(payload["remainingSeconds"], 0);
        assert_eq!(fx.state.hubs().subscriber_count(id), 1);
    }

    #[tokio::test]
    async fn unknown_match_cannot_be_followed() {
        let fx = fixture().await;
        let unknown = MatchId::new_v4();

        let result = subscribe_match(&fx.state, unknown).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(fx.state.hubs().subscriber_count(unknown), 0);
    }

    #[tokio::test]
    async fn subscribing_does_not_touch_a_running_clock() {
        let fx = fixture().await;
        let id = fx.created.match_id;
        fx.state
            .clocks()
            .start(id, Some(Duration::from_secs(600)));
        fx.time.advance(Duration::from_secs(30));

        let mut receiver = subscribe_match(&fx.state, id).await.unwrap();
        let event = receiver.recv().await.unwrap();
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();

        assert_eq!(payload["isRunning"], true);
        assert_eq!(payload["remainingSeconds"], 570);
    }
}
