//! Cancellable deferred work keyed by room.
//!
//! Each room owns a root `CancellationToken`; every scheduled task runs under
//! a child of it, so tearing a room down cancels everything it scheduled.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Grace period before a disconnected player's seat is given up.
    DisconnectGrace(String),
    /// One step of a delayed broadcast sequence.
    Sequence(u64),
}

#[derive(Default)]
pub struct Scheduler {
    rooms: DashMap<String, CancellationToken>,
    tasks: Arc<DashMap<(String, TimerKey), (u64, CancellationToken)>>,
    next_seq: AtomicU64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_sequence(&self) -> TimerKey {
        TimerKey::Sequence(self.next_seq.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `task` after `delay` unless cancelled first. Scheduling an existing
    /// key replaces the earlier task.
    pub fn schedule<F>(&self, room_id: &str, key: TimerKey, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let root = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(CancellationToken::new)
            .clone();
        let token = root.child_token();
        let generation = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let slot = (room_id.to_string(), key);
        if let Some((_, previous)) = self.tasks.insert(slot.clone(), (generation, token.clone())) {
            previous.cancel();
        }

        let tasks = Arc::clone(&self.tasks);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(room_id = %slot.0, key = ?slot.1, "Scheduled task cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    tasks.remove_if(&slot, |_, (current, _)| *current == generation);
                    task.await;
                }
            }
        });
    }

    pub fn cancel(&self, room_id: &str, key: &TimerKey) -> bool {
        match self.tasks.remove(&(room_id.to_string(), key.clone())) {
            Some((_, (_, token))) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending task of the room.
    pub fn cancel_room(&self, room_id: &str) {
        if let Some((_, root)) = self.rooms.remove(room_id) {
            root.cancel();
        }
        self.tasks.retain(|(room, _), _| room != room_id);
        debug!(room_id, "Room timers cancelled");
    }

    pub fn pending(&self, room_id: &str) -> usize {
        self.tasks.iter().filter(|e| e.key().0 == room_id).count()
    }

    pub fn is_pending(&self, room_id: &str, key: &TimerKey) -> bool {
        self.tasks.contains_key(&(room_id.to_string(), key.clone()))
    }
}
