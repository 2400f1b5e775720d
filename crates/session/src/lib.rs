#![deny(warnings)]

//! Session controller: the single source of truth handed to the presentation
//! layer.
//!
//! A [`Session`] loads the saved game once at startup, then applies click,
//! upgrade and avatar actions to its in-memory [`GameState`] synchronously.
//! Every applied action queues one snapshot with the background
//! [`SaveWriter`]; persistence is best-effort and never blocks play.

use game_econ::InsufficientFunds;
use persistence::{KeyValueStore, SaveWriter, SnapshotStore, DEFAULT_STORAGE_KEY};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

pub use game_core::{GameEvent, GameState, StatsSummary, UpgradeTier};
pub use game_econ::{compute_pricing, Pricing, UpgradeOffer};

/// Session configuration parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key the snapshot is stored under.
    pub storage_key: String,
    /// Buffered events per subscriber before slow listeners start lagging.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_capacity: 32,
        }
    }
}

/// Lifecycle of a session. `Ready` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Actions are accepted only once the saved game has been loaded.
    #[error("session is not ready (phase: {0:?})")]
    NotReady(SessionPhase),
}

/// Outcome of an upgrade dispatch. A decline is a normal result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased,
    InsufficientFunds { cost: u64, coins: u64 },
}

impl PurchaseOutcome {
    pub fn is_purchased(&self) -> bool {
        matches!(self, PurchaseOutcome::Purchased)
    }
}

impl From<InsufficientFunds> for PurchaseOutcome {
    fn from(declined: InsufficientFunds) -> Self {
        PurchaseOutcome::InsufficientFunds {
            cost: declined.cost,
            coins: declined.coins,
        }
    }
}

/// One player's running game.
pub struct Session<S> {
    phase: SessionPhase,
    state: GameState,
    snapshots: Option<SnapshotStore<S>>,
    writer: Option<SaveWriter>,
    state_tx: watch::Sender<GameState>,
    events: broadcast::Sender<GameEvent>,
}

impl<S: KeyValueStore> Session<S> {
    /// Create an uninitialized session over `store`. Call [`Session::start`] next.
    pub fn new(store: S, config: &SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(GameState::default());
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            phase: SessionPhase::Uninitialized,
            state: GameState::default(),
            snapshots: Some(SnapshotStore::new(store, config.storage_key.clone())),
            writer: None,
            state_tx,
            events,
        }
    }

    /// Load the saved game (or defaults) and start the background writer.
    ///
    /// Unreadable saves are logged and replaced by defaults. Calling this again
    /// once ready is a no-op.
    pub async fn start(&mut self) -> &GameState {
        if self.phase == SessionPhase::Ready {
            return &self.state;
        }
        let Some(snapshots) = self.snapshots.as_ref() else {
            return &self.state;
        };
        self.phase = SessionPhase::Loading;
        info!(key = snapshots.key(), "loading saved game");

        let state = match snapshots.load().await {
            Ok(Some(state)) => {
                info!(
                    coins = state.coins,
                    coins_per_click = state.coins_per_click,
                    "restored saved game"
                );
                state
            }
            Ok(None) => {
                info!("no saved game, starting fresh");
                GameState::default()
            }
            Err(e) => {
                warn!(error = %e, "saved game unreadable, starting fresh");
                GameState::default()
            }
        };

        if let Some(snapshots) = self.snapshots.take() {
            self.writer = Some(SaveWriter::spawn(snapshots));
        }
        self.state = state;
        self.state_tx.send_replace(self.state.clone());
        self.phase = SessionPhase::Ready;
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current state. Holds defaults until the session is ready.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Upgrade offers for the current income.
    pub fn pricing(&self) -> Pricing {
        compute_pricing(self.state.coins_per_click)
    }

    pub fn stats(&self) -> StatsSummary {
        self.state.stats()
    }

    /// Receiver that observes every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<GameState> {
        self.state_tx.subscribe()
    }

    /// Receiver for sound/feedback events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Tap the coin.
    pub fn dispatch_click(&mut self) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let transition = game_econ::click(&self.state);
        self.commit(transition.state);
        self.emit(transition.event);
        Ok(())
    }

    /// Buy an upgrade at the given price. Declines leave state untouched and
    /// schedule no save.
    pub fn dispatch_upgrade(&mut self, cost: u64, bonus: u64) -> Result<PurchaseOutcome, SessionError> {
        self.ensure_ready()?;
        match game_econ::purchase_upgrade(&self.state, cost, bonus) {
            Ok(transition) => {
                self.commit(transition.state);
                self.emit(transition.event);
                Ok(PurchaseOutcome::Purchased)
            }
            Err(declined) => {
                debug!(%declined, "upgrade not affordable");
                Ok(declined.into())
            }
        }
    }

    /// Buy `tier` at its currently listed price.
    pub fn dispatch_tier(&mut self, tier: UpgradeTier) -> Result<PurchaseOutcome, SessionError> {
        let offer = self.pricing().offer(tier);
        self.dispatch_upgrade(offer.cost, offer.bonus)
    }

    /// Replace (or clear, with `None`) the avatar reference. The value is stored as given.
    pub fn set_avatar_reference(&mut self, reference: Option<String>) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let next = GameState {
            avatar_reference: reference,
            ..self.state.clone()
        };
        self.commit(next);
        Ok(())
    }

    /// Wait for queued saves to be attempted.
    pub async fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush().await;
        }
    }

    /// Write pending saves and stop the writer.
    pub async fn shutdown(mut self) {
        if let Some(writer) = self.writer.take() {
            writer.close().await;
        }
        info!(total_clicks = self.state.total_clicks, "session closed");
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Ready {
            return Err(SessionError::NotReady(self.phase));
        }
        Ok(())
    }

    fn commit(&mut self, state: GameState) {
        self.state = state;
        self.state_tx.send_replace(self.state.clone());
        if let Some(writer) = &self.writer {
            writer.save(self.state.clone());
        }
    }

    fn emit(&self, event: GameEvent) {
        // No listeners is fine.
        let _ = self.events.send(event);
    }
}
