//! Room runtime.
//!
//! Serializes intents per room behind the room lock, delivers the resulting
//! events, persists snapshots and runs deferred follow-ups on the scheduler.
//! Follow-ups re-enter through the same path as player intents.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::game_flow::{Audience, FollowUp, GameEvent, GameFlowService, UseCaseOutcome};
use super::persistence::SnapshotWriter;
use super::rooms::{Room, RoomEntry, RoomManager, RoomSettings, RoomStatus, TeamAssignmentMethod};
use super::scheduler::{Scheduler, TimerKey};
use crate::config::GameConfig;
use crate::domain::chombo::ViolationType;
use crate::domain::{Card, DeckSource, GameState, Suit, TrumpType};
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::errors::ErrorCode;
use crate::protocol::events::{Joined, RoomSummary};
use crate::protocol::OutboundEvent;
use crate::repos::game_states::GameStateStore;
use crate::ws::hub::EventSink;

pub struct GameRuntime {
    config: GameConfig,
    rooms: RoomManager,
    flow: GameFlowService,
    scheduler: Scheduler,
    snapshots: SnapshotWriter,
    sink: Arc<dyn EventSink>,
}

impl GameRuntime {
    pub fn new(
        config: GameConfig,
        deck_source: Arc<dyn DeckSource>,
        store: Arc<dyn GameStateStore>,
        sink: Arc<dyn EventSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            rooms: RoomManager::new(deck_source),
            flow: GameFlowService::new(),
            scheduler: Scheduler::new(),
            snapshots: SnapshotWriter::new(store),
            sink,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    // Room lifecycle

    /// Open an empty room. The host still has to join it.
    pub fn create_room(
        &self,
        name: &str,
        host_id: &str,
        points_to_win: Option<u32>,
        team_method: TeamAssignmentMethod,
    ) -> Result<RoomSummary, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation(
                ErrorCode::ValidationError,
                "room name must not be empty",
            ));
        }
        let points_to_win = points_to_win.unwrap_or(self.config.default_points_to_win);
        if points_to_win == 0 {
            return Err(AppError::validation(
                ErrorCode::ValidationError,
                "points to win must be positive",
            ));
        }
        if let Some(current) = self.rooms.room_of_player(host_id) {
            return Err(AppError::conflict(
                ErrorCode::AlreadyInRoom,
                format!("{host_id} is already seated in room {current}"),
            ));
        }

        let room = Room::new(
            name,
            host_id,
            RoomSettings {
                points_to_win,
                team_method,
            },
        );
        let shared = self.rooms.create(room);
        let summary = shared.lock().summary();
        Ok(summary)
    }

    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        self.rooms.list_rooms()
    }

    pub fn room_summary(&self, room_id: &str) -> Result<RoomSummary, AppError> {
        let shared = self.rooms.get(room_id)?;
        let summary = shared.lock().summary();
        Ok(summary)
    }

    /// Copy of the room's current game state.
    pub fn snapshot(&self, room_id: &str) -> Result<GameState, AppError> {
        let shared = self.rooms.get(room_id)?;
        let state = shared.lock().machine.snapshot();
        Ok(state)
    }

    /// Bring a room back from its persisted snapshot if it is not live.
    pub async fn resume_room(&self, room_id: &str) -> Result<RoomSummary, AppError> {
        if let Ok(shared) = self.rooms.get(room_id) {
            let summary = shared.lock().summary();
            return Ok(summary);
        }
        let state = self
            .snapshots
            .store()
            .load(room_id)
            .await
            .map_err(DomainError::from)?
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Room, room_id.to_string()))?;
        let shared = self.rooms.restore(room_id, room_id, state);
        let summary = shared.lock().summary();
        info!(room_id, players = summary.seats.len(), "Room resumed");
        Ok(summary)
    }

    /// Abandon every room idle past the TTL. Returns how many were dropped.
    pub fn sweep_idle(&self, now: OffsetDateTime) -> usize {
        let idle = self.rooms.idle_rooms(self.config.room_idle_ttl, now);
        for room_id in &idle {
            if let Ok(shared) = self.rooms.get(room_id) {
                let mut entry = shared.lock();
                entry.room.status = RoomStatus::Abandoned;
                self.deliver(
                    &entry,
                    &GameEvent::room(OutboundEvent::RoomDeleted(room_id.clone())),
                );
            }
            info!(room_id = %room_id, "Idle room abandoned");
            self.close_room(room_id);
        }
        idle.len()
    }

    /// Periodic idle sweep until `shutdown` fires.
    pub async fn run_sweeper(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let swept = self.sweep_idle(OffsetDateTime::now_utc());
                    if swept > 0 {
                        info!(swept, rooms = self.rooms.len(), "Idle sweep");
                    }
                }
            }
        }
        debug!("Sweeper stopped");
    }

    // Membership

    pub fn join_room(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
        name: &str,
        connection_id: &str,
    ) -> Result<Joined, AppError> {
        if let Some(current) = self.rooms.room_of_player(player_id) {
            if current != room_id {
                return Err(AppError::conflict(
                    ErrorCode::AlreadyInRoom,
                    format!("{player_id} is already seated in room {current}"),
                ));
            }
        }
        self.scheduler
            .cancel(room_id, &TimerKey::DisconnectGrace(player_id.to_string()));
        let token = self.execute(room_id, "join-room", |flow, entry| {
            flow.join_room(entry, player_id, name, connection_id)
        })?;
        Ok(Joined {
            room_id: room_id.to_string(),
            player_id: player_id.to_string(),
            reconnect_token: token,
        })
    }

    pub fn leave_room(self: &Arc<Self>, room_id: &str, player_id: &str) -> Result<(), AppError> {
        self.scheduler
            .cancel(room_id, &TimerKey::DisconnectGrace(player_id.to_string()));
        self.execute(room_id, "leave-room", |flow, entry| {
            flow.leave_room(entry, player_id)
        })
        .map(drop)
    }

    pub fn toggle_ready(self: &Arc<Self>, room_id: &str, player_id: &str) -> Result<(), AppError> {
        self.execute(room_id, "toggle-ready", |flow, entry| {
            flow.toggle_ready(entry, player_id)
        })
        .map(drop)
    }

    pub fn change_team(
        self: &Arc<Self>,
        room_id: &str,
        requester_id: &str,
        target_id: &str,
        team: u8,
    ) -> Result<(), AppError> {
        self.execute(room_id, "change-team", |flow, entry| {
            flow.change_team(entry, requester_id, target_id, team)
        })
        .map(drop)
    }

    pub fn start_game(self: &Arc<Self>, room_id: &str, requester_id: &str) -> Result<(), AppError> {
        self.execute(room_id, "start-game", |flow, entry| {
            flow.start_game(entry, requester_id)
        })
        .map(drop)
    }

    /// Rebind a connection by reconnect token, resuming the room from its
    /// snapshot first when it is not live.
    pub async fn reconnect(
        self: &Arc<Self>,
        room_id: &str,
        token: &str,
        connection_id: &str,
    ) -> Result<Joined, AppError> {
        if self.rooms.get(room_id).is_err() {
            self.resume_room(room_id).await?;
        }
        let mut player_id = None;
        self.execute(room_id, "reconnect", |flow, entry| {
            player_id = entry.machine.tokens().resolve(token).map(str::to_string);
            flow.reconnect(entry, token, connection_id)
        })?;
        let player_id = player_id.unwrap_or_default();
        self.scheduler
            .cancel(room_id, &TimerKey::DisconnectGrace(player_id.clone()));
        Ok(Joined {
            room_id: room_id.to_string(),
            player_id,
            reconnect_token: Some(token.to_string()),
        })
    }

    pub fn disconnect(self: &Arc<Self>, room_id: &str, connection_id: &str) -> Result<(), AppError> {
        self.execute(room_id, "disconnect", |flow, entry| {
            flow.disconnect(entry, connection_id)
        })
        .map(drop)
    }

    // Game intents

    pub fn declare_bid(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
        trump_type: TrumpType,
        number_of_pairs: u8,
    ) -> Result<(), AppError> {
        self.execute(room_id, "declare-bid", |flow, entry| {
            flow.declare_bid(entry, player_id, trump_type, number_of_pairs)
        })
        .map(drop)
    }

    pub fn pass_bid(self: &Arc<Self>, room_id: &str, player_id: &str) -> Result<(), AppError> {
        self.execute(room_id, "pass-bid", |flow, entry| {
            flow.pass_bid(entry, player_id)
        })
        .map(drop)
    }

    pub fn select_negri(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
        card: Card,
    ) -> Result<(), AppError> {
        self.execute(room_id, "select-negri", |flow, entry| {
            flow.select_negri(entry, player_id, card)
        })
        .map(drop)
    }

    pub fn play_card(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
        card: Card,
    ) -> Result<(), AppError> {
        self.execute(room_id, "play-card", |flow, entry| {
            flow.play_card(entry, player_id, card)
        })
        .map(drop)
    }

    pub fn select_base_suit(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
        suit: Suit,
    ) -> Result<(), AppError> {
        self.execute(room_id, "select-base-suit", |flow, entry| {
            flow.select_base_suit(entry, player_id, suit)
        })
        .map(drop)
    }

    pub fn declare_open(self: &Arc<Self>, room_id: &str, player_id: &str) -> Result<(), AppError> {
        self.execute(room_id, "declare-open", |flow, entry| {
            flow.declare_open(entry, player_id)
        })
        .map(drop)
    }

    pub fn reveal_broken(self: &Arc<Self>, room_id: &str, player_id: &str) -> Result<(), AppError> {
        self.execute(room_id, "reveal-broken", |flow, entry| {
            flow.reveal_broken(entry, player_id)
        })
        .map(drop)
    }

    pub fn report_violation(
        self: &Arc<Self>,
        room_id: &str,
        reporter_id: &str,
        violator_id: &str,
        violation_type: ViolationType,
    ) -> Result<(), AppError> {
        self.execute(room_id, "report-violation", |flow, entry| {
            flow.report_violation(entry, reporter_id, violator_id, violation_type)
        })
        .map(drop)
    }

    // Plumbing

    /// Run one use case under the room lock and dispatch its outcome.
    /// Returns the reconnect token the outcome carried, if any.
    fn execute<F>(
        self: &Arc<Self>,
        room_id: &str,
        intent: &'static str,
        op: F,
    ) -> Result<Option<String>, AppError>
    where
        F: FnOnce(&GameFlowService, &mut RoomEntry) -> Result<UseCaseOutcome, DomainError>,
    {
        let shared = match self.rooms.get(room_id) {
            Ok(shared) => shared,
            Err(e) => {
                let err = AppError::from(e);
                log_failure(room_id, intent, &err);
                return Err(err);
            }
        };

        let (token, closed) = {
            let mut entry = shared.lock();
            let outcome = match op(&self.flow, &mut entry) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let err = AppError::from(e);
                    log_failure(room_id, intent, &err);
                    return Err(err);
                }
            };
            entry.room.touch();
            let token = outcome.reconnect_token.clone();
            let closed = outcome.room_closed;
            self.dispatch(&entry, outcome);
            (token, closed)
        };

        if closed {
            self.close_room(room_id);
        }
        Ok(token)
    }

    fn dispatch(self: &Arc<Self>, entry: &RoomEntry, mut outcome: UseCaseOutcome) {
        let room_id = entry.room.id.as_str();
        if !outcome.events.is_empty() {
            debug!(room_id, events = ?outcome.event_names(), "Dispatching events");
        }
        for event in &outcome.events {
            self.deliver(entry, event);
        }
        if outcome.persist {
            self.snapshots.save(room_id, entry.machine.snapshot());
        }

        let mut sequenced = Vec::new();
        for follow_up in std::mem::take(&mut outcome.follow_ups) {
            match follow_up {
                FollowUp::ReapDisconnected { player_id } => {
                    let key = TimerKey::DisconnectGrace(player_id.clone());
                    let reap = FollowUp::ReapDisconnected { player_id };
                    self.schedule_follow_up(room_id, key, self.config.disconnect_grace, reap);
                }
                FollowUp::GameOverReset => {
                    let key = self.scheduler.next_sequence();
                    let reset = FollowUp::GameOverReset;
                    self.schedule_follow_up(room_id, key, self.config.game_over_reset, reset);
                }
                other => sequenced.push(other),
            }
        }

        if outcome.delayed.is_empty() && sequenced.is_empty() {
            return;
        }
        debug!(
            room_id,
            delayed = ?outcome.delayed_names(),
            follow_ups = sequenced.len(),
            "Sequencing delayed broadcast"
        );
        let runtime = Arc::clone(self);
        let room = room_id.to_string();
        let delayed = outcome.delayed;
        self.scheduler.schedule(
            room_id,
            self.scheduler.next_sequence(),
            self.config.broadcast_delay,
            async move {
                runtime.fire_sequence(&room, &delayed, sequenced);
            },
        );
    }

    fn schedule_follow_up(
        self: &Arc<Self>,
        room_id: &str,
        key: TimerKey,
        delay: Duration,
        follow_up: FollowUp,
    ) {
        let runtime = Arc::clone(self);
        let room = room_id.to_string();
        self.scheduler.schedule(room_id, key, delay, async move {
            runtime.fire_sequence(&room, &[], vec![follow_up]);
        });
    }

    /// Delayed broadcasts go out first, then each follow-up runs in order.
    fn fire_sequence(
        self: &Arc<Self>,
        room_id: &str,
        delayed: &[GameEvent],
        follow_ups: Vec<FollowUp>,
    ) {
        if !delayed.is_empty() {
            let Ok(shared) = self.rooms.get(room_id) else {
                debug!(room_id, "Room gone before delayed broadcast");
                return;
            };
            let entry = shared.lock();
            for event in delayed {
                self.deliver(&entry, event);
            }
        }
        for follow_up in follow_ups {
            let name = follow_up_name(&follow_up);
            debug!(room_id, follow_up = name, "Running follow-up");
            // Failures are logged by `execute`.
            let _ = self.execute(room_id, name, move |flow, entry| match follow_up {
                FollowUp::CompleteField => flow.complete_field(entry),
                FollowUp::FinalizeBroken { player_id } => flow.finalize_broken(entry, &player_id),
                FollowUp::NextRound => flow.start_next_round(entry),
                FollowUp::GameOverReset => Ok(flow.reset_after_game_over(entry)),
                FollowUp::RestartRound => flow.restart_round(entry),
                FollowUp::ReapDisconnected { player_id } => {
                    flow.reap_disconnected(entry, &player_id)
                }
            });
        }
    }

    fn deliver(&self, entry: &RoomEntry, event: &GameEvent) {
        match &event.audience {
            Audience::Room => {
                for player in &entry.machine.state().players {
                    if player.is_connected() {
                        self.sink.send_to(&player.connection_id, &event.event);
                    }
                }
            }
            Audience::Connection(connection_id) => self.sink.send_to(connection_id, &event.event),
        }
    }

    /// Tear down a room: timers, live entry and snapshot.
    fn close_room(&self, room_id: &str) {
        self.scheduler.cancel_room(room_id);
        self.rooms.remove(room_id);
        self.snapshots.delete(room_id);
        info!(room_id, rooms = self.rooms.len(), "Room closed");
    }
}

fn follow_up_name(follow_up: &FollowUp) -> &'static str {
    match follow_up {
        FollowUp::CompleteField => "complete-field",
        FollowUp::FinalizeBroken { .. } => "finalize-broken",
        FollowUp::NextRound => "next-round",
        FollowUp::GameOverReset => "game-over-reset",
        FollowUp::RestartRound => "restart-round",
        FollowUp::ReapDisconnected { .. } => "reap-disconnected",
    }
}

fn log_failure(room_id: &str, intent: &str, err: &AppError) {
    if err.is_rejection() {
        warn!(room_id, intent, code = %err.code(), detail = %err.detail(), "Intent rejected");
    } else {
        error!(room_id, intent, code = %err.code(), detail = %err.detail(), "Intent failed");
    }
}
