//! Rooms, seats and the cross-room index.
//!
//! `room.seats[i]` always describes `state.players[i]`: joins append to both,
//! leaves before play remove from both, and leaves during play turn the seat
//! vacant while the game player stays in place with its hand.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::domain::rules::{alternating_team, PLAYERS};
use crate::domain::{DeckSource, GameState, Player};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::protocol::events::{RoomSummary, SeatView};
use crate::services::game_machine::GameMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Ready,
    Playing,
    Finished,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeamAssignmentMethod {
    #[default]
    Random,
    HostChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    pub points_to_win: u32,
    pub team_method: TeamAssignmentMethod,
}

/// Room-level membership facts that the game state does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub player_id: String,
    pub is_ready: bool,
}

/// What a vacated seat remembers about its last occupant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacantSeat {
    pub member: Member,
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seat {
    Occupied(Member),
    Vacant(Box<VacantSeat>),
}

impl Seat {
    pub fn is_vacant(&self) -> bool {
        matches!(self, Seat::Vacant(_))
    }

    pub fn player_id(&self) -> &str {
        match self {
            Seat::Occupied(m) => &m.player_id,
            Seat::Vacant(v) => &v.member.player_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub host_id: String,
    pub status: RoomStatus,
    pub settings: RoomSettings,
    pub seats: Vec<Seat>,
    pub created_at: OffsetDateTime,
    pub last_activity: OffsetDateTime,
}

impl Room {
    pub fn new(name: impl Into<String>, host_id: impl Into<String>, settings: RoomSettings) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Ulid::new().to_string(),
            name: name.into(),
            host_id: host_id.into(),
            status: RoomStatus::Waiting,
            settings,
            seats: Vec::with_capacity(PLAYERS),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = OffsetDateTime::now_utc();
    }

    pub fn seat_index(&self, player_id: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.player_id() == player_id)
    }

    pub fn occupied_index(&self, player_id: &str) -> Option<usize> {
        self.seats
            .iter()
            .position(|s| matches!(s, Seat::Occupied(m) if m.player_id == player_id))
    }

    pub fn member_mut(&mut self, player_id: &str) -> Option<&mut Member> {
        self.seats.iter_mut().find_map(|s| match s {
            Seat::Occupied(m) if m.player_id == player_id => Some(m),
            _ => None,
        })
    }

    pub fn vacant_seats(&self) -> Vec<usize> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_vacant())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.is_vacant()).count()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= PLAYERS
    }

    pub fn is_in_game(&self) -> bool {
        self.status == RoomStatus::Playing
    }

    /// Waiting <-> Ready from the seat table. Playing and terminal statuses
    /// are left alone.
    pub fn refresh_status(&mut self) {
        if !matches!(self.status, RoomStatus::Waiting | RoomStatus::Ready) {
            return;
        }
        let all_ready = self.seats.len() == PLAYERS
            && self
                .seats
                .iter()
                .all(|s| matches!(s, Seat::Occupied(m) if m.is_ready));
        self.status = if all_ready {
            RoomStatus::Ready
        } else {
            RoomStatus::Waiting
        };
    }

    /// Host passes to the first non-vacant seat. Returns the new host.
    pub fn reassign_host(&mut self) -> Option<&str> {
        let next = self.seats.iter().find_map(|s| match s {
            Seat::Occupied(m) => Some(m.player_id.clone()),
            Seat::Vacant(_) => None,
        })?;
        self.host_id = next;
        Some(&self.host_id)
    }

    pub fn clear_ready(&mut self) {
        for seat in &mut self.seats {
            if let Seat::Occupied(m) = seat {
                m.is_ready = false;
            }
        }
    }
}

/// Team for a newcomer given the teams already taken.
pub fn assign_team(method: TeamAssignmentMethod, seat_index: usize, teams: &[u8]) -> u8 {
    let per_team = PLAYERS / 2;
    let zeros = teams.iter().filter(|t| **t == 0).count();
    let ones = teams.len() - zeros;
    match (zeros < per_team, ones < per_team) {
        (true, false) => 0,
        (false, true) => 1,
        _ => match method {
            TeamAssignmentMethod::HostChoice => alternating_team(seat_index),
            TeamAssignmentMethod::Random => u8::from(rand::rng().random_bool(0.5)),
        },
    }
}

/// A room and its game, guarded together by one lock.
pub struct RoomEntry {
    pub room: Room,
    pub machine: GameMachine,
}

impl RoomEntry {
    pub fn state(&self) -> &GameState {
        self.machine.state()
    }

    pub fn summary(&self) -> RoomSummary {
        let state = self.machine.state();
        let seats = self
            .room
            .seats
            .iter()
            .enumerate()
            .map(|(index, seat)| {
                let (member, is_vacant) = match seat {
                    Seat::Occupied(m) => (m, false),
                    Seat::Vacant(v) => (&v.member, true),
                };
                let player = state.player(&member.player_id);
                SeatView {
                    index,
                    player_id: Some(member.player_id.clone()),
                    name: player.map(|p| p.name.clone()),
                    team: player.map(|p| p.team),
                    is_ready: member.is_ready,
                    is_host: member.player_id == self.room.host_id,
                    is_vacant,
                    is_connected: !is_vacant && player.is_some_and(Player::is_connected),
                }
            })
            .collect();
        RoomSummary {
            id: self.room.id.clone(),
            name: self.room.name.clone(),
            host_id: self.room.host_id.clone(),
            status: self.room.status,
            points_to_win: self.room.settings.points_to_win,
            team_assignment_method: self.room.settings.team_method,
            seats,
        }
    }
}

pub type SharedRoom = Arc<Mutex<RoomEntry>>;

/// Cross-room index. Each room is behind its own mutex so rooms never block
/// each other.
pub struct RoomManager {
    rooms: DashMap<String, SharedRoom>,
    deck_source: Arc<dyn DeckSource>,
}

impl RoomManager {
    pub fn new(deck_source: Arc<dyn DeckSource>) -> Self {
        Self {
            rooms: DashMap::new(),
            deck_source,
        }
    }

    pub fn create(&self, room: Room) -> SharedRoom {
        let machine = GameMachine::new(room.settings.points_to_win, Arc::clone(&self.deck_source));
        let id = room.id.clone();
        let entry = Arc::new(Mutex::new(RoomEntry { room, machine }));
        self.rooms.insert(id.clone(), Arc::clone(&entry));
        info!(room_id = %id, "Room created");
        entry
    }

    /// Re-create a room around a persisted game state. Connections from the
    /// previous process are gone, so every player must reconnect by token.
    pub fn restore(&self, room_id: &str, name: &str, mut state: GameState) -> SharedRoom {
        let host_id = state
            .players
            .first()
            .map(|p| p.player_id.clone())
            .unwrap_or_default();
        let mut room = Room::new(
            name,
            host_id,
            RoomSettings {
                points_to_win: state.points_to_win,
                team_method: TeamAssignmentMethod::HostChoice,
            },
        );
        room.id = room_id.to_string();
        for player in &mut state.players {
            player.connection_id.clear();
            room.seats.push(Seat::Occupied(Member {
                player_id: player.player_id.clone(),
                is_ready: true,
            }));
        }
        room.status = if state.game_phase.is_some() {
            RoomStatus::Playing
        } else {
            RoomStatus::Waiting
        };
        room.refresh_status();

        let mut machine = GameMachine::from_snapshot(state, Arc::clone(&self.deck_source));
        if machine.needs_redeal() && room.status == RoomStatus::Playing {
            if let Err(e) = machine.start_round() {
                warn!(room_id, error = %e, "Deferred redeal failed on restore");
            }
        }
        let entry = Arc::new(Mutex::new(RoomEntry { room, machine }));
        self.rooms.insert(room_id.to_string(), Arc::clone(&entry));
        info!(room_id, "Room restored from snapshot");
        entry
    }

    pub fn get(&self, room_id: &str) -> Result<SharedRoom, DomainError> {
        self.rooms
            .get(room_id)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Room, room_id.to_string()))
    }

    pub fn remove(&self, room_id: &str) -> Option<SharedRoom> {
        let removed = self.rooms.remove(room_id).map(|(_, r)| r);
        if removed.is_some() {
            debug!(room_id, "Room removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Room the player currently has a seat in, vacant or not.
    pub fn room_of_player(&self, player_id: &str) -> Option<String> {
        self.rooms.iter().find_map(|r| {
            let entry = r.value().lock();
            entry
                .room
                .seat_index(player_id)
                .map(|_| entry.room.id.clone())
        })
    }

    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<(OffsetDateTime, RoomSummary)> = self
            .rooms
            .iter()
            .map(|r| {
                let entry = r.value().lock();
                (entry.room.created_at, entry.summary())
            })
            .collect();
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        rooms.into_iter().map(|(_, summary)| summary).collect()
    }

    /// Ids of rooms whose last activity is older than `ttl` at `now`.
    pub fn idle_rooms(&self, ttl: Duration, now: OffsetDateTime) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|r| {
                let entry = r.value().lock();
                let idle = now - entry.room.last_activity;
                idle.is_positive() && idle.unsigned_abs() > ttl
            })
            .map(|r| r.key().clone())
            .collect()
    }
}
