//! Background snapshot writer.
//!
//! A single task owns the [`SnapshotStore`] and applies saves in the order they
//! were queued. When saves pile up behind a slow write only the newest one is
//! written, since each snapshot supersedes the previous. Failed writes are
//! logged and dropped; there is no retry.

use game_core::GameState;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{KeyValueStore, SnapshotStore};

enum Command {
    Save(GameState),
    Flush(oneshot::Sender<()>),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Save(state) => f.debug_tuple("Save").field(state).finish(),
            Command::Flush(_) => f.write_str("Flush"),
        }
    }
}

/// Handle to the background writer task.
#[derive(Debug)]
pub struct SaveWriter {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SaveWriter {
    /// Start the writer task on the current tokio runtime.
    pub fn spawn<S: KeyValueStore>(snapshots: SnapshotStore<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(snapshots, rx));
        Self { tx, task }
    }

    /// Queue `state` for writing. Never blocks.
    ///
    /// Returns `false` when the writer has stopped and the snapshot was dropped.
    pub fn save(&self, state: GameState) -> bool {
        if self.tx.send(Command::Save(state)).is_err() {
            warn!("save writer stopped; snapshot dropped");
            return false;
        }
        true
    }

    /// Wait until every save queued before this call has been attempted.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Write whatever is still queued, then stop the task.
    pub async fn close(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            warn!(error = %e, "save writer task ended abnormally");
        }
    }
}

async fn run<S: KeyValueStore>(
    snapshots: SnapshotStore<S>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    while let Some(command) = rx.recv().await {
        let mut latest = match command {
            Command::Save(state) => state,
            Command::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        let mut coalesced = 0usize;
        let mut flush_ack = None;
        while let Ok(next) = rx.try_recv() {
            match next {
                Command::Save(state) => {
                    latest = state;
                    coalesced += 1;
                }
                Command::Flush(ack) => {
                    flush_ack = Some(ack);
                    break;
                }
            }
        }
        if coalesced > 0 {
            debug!(coalesced, "coalesced queued saves");
        }

        match snapshots.save(&latest).await {
            Ok(()) => debug!(key = snapshots.key(), coins = latest.coins, "game state saved"),
            Err(e) => warn!(error = %e, "failed to save game state"),
        }

        if let Some(ack) = flush_ack {
            let _ = ack.send(());
        }
    }
    debug!(key = snapshots.key(), "save writer stopped");
}
