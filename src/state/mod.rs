pub mod clock;
pub mod registry;
mod sse;
pub mod state_machine;
pub mod time;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, watch};

use crate::{config::AppConfig, dao::match_store::MatchStore, error::ServiceError};

pub use self::registry::{ClockRegistry, MatchId};
pub use self::sse::{MatchHubs, SseHub};
use self::time::{SystemTimeSource, TimeSource};

pub type SharedState = Arc<AppState>;

/// Central application state storing the clock registry, SSE hubs and the storage handle.
pub struct AppState {
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    clocks: ClockRegistry,
    hubs: MatchHubs,
    match_gates: DashMap<MatchId, Arc<Mutex<()>>>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Same as [`AppState::new`] but with clocks reading `time`.
    pub fn with_time_source(config: AppConfig, time: Arc<dyn TimeSource>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            match_store: RwLock::new(None),
            clocks: ClockRegistry::with_time_source(time, config.quarter_duration),
            hubs: MatchHubs::new(config.match_stream_capacity),
            match_gates: DashMap::new(),
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn install_match_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.match_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        {
            let mut guard = self.match_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Store handle for operations that need persistence.
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.match_store().await.ok_or(ServiceError::Degraded)
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Process-wide registry of match clocks.
    pub fn clocks(&self) -> &ClockRegistry {
        &self.clocks
    }

    /// Per-match SSE hubs.
    pub fn hubs(&self) -> &MatchHubs {
        &self.hubs
    }

    /// Runtime configuration loaded at start.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Wait for exclusive access to one match.
    ///
    /// Holding the guard serializes record updates, clock mutations and the matching
    /// broadcasts. The gate entry is dropped once nobody holds or waits on it.
    pub async fn lock_match(&self, match_id: MatchId) -> MatchGuard<'_> {
        let gate = self
            .match_gates
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        MatchGuard {
            state: self,
            match_id,
            guard: Some(gate.lock_owned().await),
        }
    }
}

/// Exclusive access to one match, released on drop.
pub struct MatchGuard<'a> {
    state: &'a AppState,
    match_id: MatchId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MatchGuard<'_> {
    fn drop(&mut self) {
        // release the lock first so our own handle no longer counts
        drop(self.guard.take());
        self.state
            .match_gates
            .remove_if(&self.match_id, |_, gate| Arc::strong_count(gate) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::match_store::InMemoryMatchStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_match_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state
            .install_match_store(Arc::new(InMemoryMatchStore::new()))
            .await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_match_store().await.is_ok());

        state.clear_match_store().await;
        assert!(state.is_degraded());
        assert!(state.match_store().await.is_none());
    }

    #[tokio::test]
    async fn degraded_flag_blocks_an_installed_store() {
        let state = AppState::new(AppConfig::default());
        state
            .install_match_store(Arc::new(InMemoryMatchStore::new()))
            .await;
        state.update_degraded(true);
        assert!(matches!(
            state.require_match_store().await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn match_lock_is_exclusive_per_match() {
        let state = AppState::new(AppConfig::default());
        let id = MatchId::new_v4();

        let held = state.lock_match(id).await;
        let other = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            state.lock_match(MatchId::new_v4()),
        )
        .await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            state.lock_match(id),
        )
        .await;
        assert!(same.is_err());

        drop(held);
        let _again = state.lock_match(id).await;
    }

    #[tokio::test]
    async fn released_gates_do_not_accumulate() {
        let state = AppState::new(AppConfig::default());
        for _ in 0..10 {
            let _gate = state.lock_match(MatchId::new_v4()).await;
        }
        assert!(state.match_gates.is_empty());

        let id = MatchId::new_v4();
        let held = state.lock_match(id).await;
        let waiter = {
            let state = state.clone();
            tokio::spawn(async move {
                let _gate = state.lock_match(id).await;
            })
        };
        // map, held guard and the waiting task
        while state
            .match_gates
            .get(&id)
            .map(|gate| Arc::strong_count(gate.value()))
            != Some(3)
        {
            tokio::task::yield_now().await;
        }
        drop(held);
        assert_eq!(state.match_gates.len(), 1);

        waiter.await.unwrap();
        assert!(state.match_gates.is_empty());
    }
}
