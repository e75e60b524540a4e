//! Ordered, fire-and-forget snapshot writes.
//!
//! Each room gets its own writer task fed by an unbounded queue, so saves
//! land in the order transitions happened and a delete always follows the
//! last save. Store failures are logged and dropped.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::domain::GameState;
use crate::repos::game_states::GameStateStore;

enum SnapshotCommand {
    Save(Box<GameState>),
    Delete,
}

pub struct SnapshotWriter {
    store: Arc<dyn GameStateStore>,
    queues: DashMap<String, UnboundedSender<SnapshotCommand>>,
}

impl SnapshotWriter {
    pub fn new(store: Arc<dyn GameStateStore>) -> Self {
        Self {
            store,
            queues: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn GameStateStore> {
        &self.store
    }

    pub fn save(&self, room_id: &str, state: GameState) {
        self.enqueue(room_id, SnapshotCommand::Save(Box::new(state)));
    }

    /// Delete the room's row after any queued saves, then retire its writer.
    pub fn delete(&self, room_id: &str) {
        self.enqueue(room_id, SnapshotCommand::Delete);
        self.queues.remove(room_id);
    }

    fn enqueue(&self, room_id: &str, command: SnapshotCommand) {
        let tx = self
            .queues
            .entry(room_id.to_string())
            .or_insert_with(|| {
                let (tx, rx) = unbounded_channel();
                tokio::spawn(drain(room_id.to_string(), Arc::clone(&self.store), rx));
                tx
            })
            .clone();
        if tx.send(command).is_err() {
            warn!(room_id, "Snapshot writer gone; write dropped");
        }
    }
}

async fn drain(
    room_id: String,
    store: Arc<dyn GameStateStore>,
    mut rx: UnboundedReceiver<SnapshotCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            SnapshotCommand::Save(state) => {
                if let Err(e) = store.save(&room_id, &state).await {
                    warn!(room_id = %room_id, error = %e, "Snapshot save failed");
                }
            }
            SnapshotCommand::Delete => {
                if let Err(e) = store.delete(&room_id).await {
                    warn!(room_id = %room_id, error = %e, "Snapshot delete failed");
                }
                break;
            }
        }
    }
    debug!(room_id = %room_id, "Snapshot writer stopped");
}
