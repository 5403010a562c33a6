use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::{dto::sse::ServerEvent, state::registry::MatchId};

/// Per-match SSE hubs carved out from [`AppState`](super::AppState).
pub struct MatchHubs {
    hubs: DashMap<MatchId, SseHub>,
    capacity: usize,
}

impl MatchHubs {
    /// Build an empty hub set whose channels buffer `capacity` events each.
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber on the match channel, creating the hub on first use.
    pub fn subscribe(&self, match_id: MatchId) -> broadcast::Receiver<ServerEvent> {
        self.hubs
            .entry(match_id)
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Send an event to the match subscribers. Matches nobody watches are skipped.
    pub fn broadcast(&self, match_id: MatchId, event: ServerEvent) {
        let Some(hub) = self.hubs.get(&match_id).map(|hub| hub.clone()) else {
            return;
        };
        hub.broadcast(event);
    }

    /// Drop the match hub once its last subscriber is gone.
    pub fn release(&self, match_id: MatchId) {
        self.hubs
            .remove_if(&match_id, |_, hub| hub.receiver_count() == 0);
    }

    /// Number of live subscribers on the match channel.
    pub fn subscriber_count(&self, match_id: MatchId) -> usize {
        self.hubs
            .get(&match_id)
            .map(|hub| hub.receiver_count())
            .unwrap_or(0)
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
#[derive(Clone)]
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn broadcast_reaches_only_the_target_match() {
        let hubs = MatchHubs::new(4);
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut receiver = hubs.subscribe(watched);
        let mut other_receiver = hubs.subscribe(other);

        hubs.broadcast(watched, ServerEvent::new(Some("ping".into()), "1".into()));

        let event = receiver.recv().await.expect("event delivered");
        assert_eq!(event.event.as_deref(), Some("ping"));
        assert_eq!(event.data, "1");
        assert!(other_receiver.try_recv().is_err());
    }

    #[test]
    fn release_keeps_hub_while_subscribers_remain() {
        let hubs = MatchHubs::new(4);
        let id = Uuid::new_v4();

        let first = hubs.subscribe(id);
        let second = hubs.subscribe(id);
        drop(first);
        hubs.release(id);
        assert_eq!(hubs.subscriber_count(id), 1);

        drop(second);
        hubs.release(id);
        assert_eq!(hubs.subscriber_count(id), 0);
        assert!(hubs.hubs.get(&id).is_none());
    }

    #[test]
    fn broadcast_without_subscribers_is_a_no_op() {
        let hubs = MatchHubs::new(4);
        let id = Uuid::new_v4();
        hubs.broadcast(id, ServerEvent::new(None, "ignored".into()));
        assert!(hubs.hubs.get(&id).is_none());
    }
}
