//! Room membership use cases: joining, leaving, readiness, teams, starting
//! the game and connection changes.

use tracing::{debug, info, warn};

use super::{emit_turn, phase_event, players_event, FollowUp, GameFlowService, UseCaseOutcome};
use crate::domain::rules::{PLAYERS, TEAMS};
use crate::domain::Player;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::protocol::events::{player_views, GamePaused, GameResumed, GameStarted, OutboundEvent};
use crate::services::rooms::{
    assign_team, Member, RoomEntry, RoomStatus, Seat, TeamAssignmentMethod, VacantSeat,
};
use crate::services::tokens::ReconnectRegistry;

impl GameFlowService {
    /// Seat a player. Returning players get their seat back; during a paused
    /// game a newcomer takes over the first vacant seat.
    pub fn join_room(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
        name: &str,
        connection_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, connection_id, "Join room");

        if let Some(index) = entry.room.seat_index(player_id) {
            return Ok(self.restore_seat(entry, index, connection_id));
        }

        match entry.room.status {
            RoomStatus::Playing => {
                let Some(index) = entry.room.vacant_seats().first().copied() else {
                    return Err(DomainError::conflict(
                        ConflictKind::GameInProgress,
                        "game in progress with no vacant seat",
                    ));
                };
                Ok(self.claim_vacant_seat(entry, index, player_id, name, connection_id))
            }
            RoomStatus::Finished | RoomStatus::Abandoned => Err(DomainError::conflict(
                ConflictKind::GameInProgress,
                format!("room is {:?}", entry.room.status).to_lowercase(),
            )),
            RoomStatus::Waiting | RoomStatus::Ready => {
                if entry.room.is_full() {
                    return Err(DomainError::conflict(
                        ConflictKind::RoomFull,
                        format!("room {} is full", entry.room.id),
                    ));
                }
                Ok(self.seat_newcomer(entry, player_id, name, connection_id))
            }
        }
    }

    fn seat_newcomer(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
        name: &str,
        connection_id: &str,
    ) -> UseCaseOutcome {
        let index = entry.room.seats.len();
        let state = entry.machine.state();
        let team = match state.team_assignments.get(player_id) {
            Some(team) if team_has_space(&state.players, *team, None) => *team,
            _ => {
                let teams: Vec<u8> = state.players.iter().map(|p| p.team).collect();
                assign_team(entry.room.settings.team_method, index, &teams)
            }
        };

        let token = ReconnectRegistry::issue();
        let player = Player::new(player_id, connection_id, name, team).with_token(token.as_str());
        entry.machine.tokens_mut().register(&token, player_id);
        let state = entry.machine.state_mut();
        state.players.push(player);
        state.team_assignments.insert(player_id.to_string(), team);

        entry.room.seats.push(Seat::Occupied(Member {
            player_id: player_id.to_string(),
            is_ready: false,
        }));
        if entry.room.occupied_index(&entry.room.host_id).is_none() {
            entry.room.host_id = player_id.to_string();
        }
        entry.room.refresh_status();
        entry.room.touch();
        info!(room_id = %entry.room.id, player_id, team, seat = index, "Player joined");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.reconnect_token = Some(token);
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome.emit(players_event(entry.machine.state()));
        outcome
    }

    /// Same player back in their seat: rebind the connection onto the live
    /// player, whose hand may have been redealt while the seat was empty.
    fn restore_seat(
        &self,
        entry: &mut RoomEntry,
        index: usize,
        connection_id: &str,
    ) -> UseCaseOutcome {
        let was_vacant = entry.room.seats[index].is_vacant();
        if let Seat::Vacant(vacant) = &entry.room.seats[index] {
            let member = vacant.member.clone();
            entry.room.seats[index] = Seat::Occupied(member);
        }
        let player_id = entry.room.seats[index].player_id().to_string();

        let state = entry.machine.state_mut();
        state.players[index].connection_id = connection_id.to_string();
        let token = state.players[index].reconnect_token.clone();
        if entry.room.occupied_index(&entry.room.host_id).is_none() {
            entry.room.host_id = player_id.clone();
        }
        entry.room.touch();
        info!(room_id = %entry.room.id, player_id = %player_id, seat = index, was_vacant, "Seat restored");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.reconnect_token = Some(token);
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome.emit(players_event(entry.machine.state()));
        if was_vacant {
            self.resume_if_seated(entry, &mut outcome);
        }
        outcome
    }

    /// Last vacancy filled: announce the resume and either redeal or hand
    /// the turn back.
    fn resume_if_seated(&self, entry: &RoomEntry, outcome: &mut UseCaseOutcome) {
        if !entry.room.vacant_seats().is_empty() || !entry.room.is_in_game() {
            return;
        }
        let state = entry.machine.state();
        outcome.emit(OutboundEvent::GameResumed(GameResumed {
            current_turn: state.current_turn().map(str::to_string),
        }));
        if entry.machine.needs_redeal() {
            debug!(room_id = %entry.room.id, "All seats filled; redeal queued");
            outcome.then(FollowUp::RestartRound);
        } else {
            emit_turn(outcome, state);
        }
    }

    /// A different player permanently takes a vacated seat. They inherit the
    /// team but not the hand; the previous occupant's token is revoked.
    fn claim_vacant_seat(
        &self,
        entry: &mut RoomEntry,
        index: usize,
        player_id: &str,
        name: &str,
        connection_id: &str,
    ) -> UseCaseOutcome {
        let Seat::Vacant(vacant) = &entry.room.seats[index] else {
            return UseCaseOutcome::new();
        };
        let previous_id = vacant.member.player_id.clone();
        let team = vacant.player.team;

        let revoked = entry.machine.tokens_mut().revoke_player(&previous_id);
        let token = ReconnectRegistry::issue();
        entry.machine.tokens_mut().register(&token, player_id);

        let state = entry.machine.state_mut();
        let released = std::mem::take(&mut state.players[index].hand);
        state.deck.extend(released);
        state.players[index] = Player::new(player_id, connection_id, name, team).with_token(token.as_str());
        state.team_assignments.remove(&previous_id);
        state.team_assignments.insert(player_id.to_string(), team);

        entry.room.seats[index] = Seat::Occupied(Member {
            player_id: player_id.to_string(),
            is_ready: true,
        });
        entry.machine.defer_redeal();
        if entry.room.occupied_index(&entry.room.host_id).is_none() {
            entry.room.host_id = player_id.to_string();
        }
        entry.room.touch();
        info!(
            room_id = %entry.room.id,
            player_id,
            previous_id = %previous_id,
            revoked,
            seat = index,
            "Vacant seat claimed"
        );

        let mut outcome = UseCaseOutcome::persisted();
        outcome.reconnect_token = Some(token);
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome.emit(players_event(entry.machine.state()));
        self.resume_if_seated(entry, &mut outcome);
        outcome
    }

    /// Leave the room. Mid-game the seat turns vacant and keeps the hand;
    /// otherwise the player is removed outright.
    pub fn leave_room(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, "Leave room");
        let Some(index) = entry.room.seat_index(player_id) else {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                format!("{player_id} is not in room {}", entry.room.id),
            ));
        };
        if entry.room.seats[index].is_vacant() {
            return Ok(UseCaseOutcome::new());
        }

        let mut outcome = UseCaseOutcome::persisted();
        if entry.room.is_in_game() {
            let state = entry.machine.state_mut();
            state.players[index].connection_id.clear();
            let player = state.players[index].clone();
            let member = match &entry.room.seats[index] {
                Seat::Occupied(m) => m.clone(),
                Seat::Vacant(v) => v.member.clone(),
            };
            entry.room.seats[index] = Seat::Vacant(Box::new(VacantSeat { member, player }));
            info!(room_id = %entry.room.id, player_id, seat = index, "Seat vacated mid-game");
            outcome.emit(OutboundEvent::GamePaused(GamePaused {
                vacant_seats: entry.room.vacant_seats(),
            }));
        } else {
            entry.room.seats.remove(index);
            entry.machine.state_mut().players.remove(index);
            entry.room.refresh_status();
            info!(room_id = %entry.room.id, player_id, "Player left");
        }

        if entry.room.host_id == player_id {
            if let Some(host) = entry.room.reassign_host().map(str::to_string) {
                debug!(room_id = %entry.room.id, host = %host, "Host reassigned");
            }
        }
        entry.room.touch();

        if entry.room.occupied_count() == 0 {
            info!(room_id = %entry.room.id, "Room empty; closing");
            outcome.room_closed = true;
            outcome.emit(OutboundEvent::RoomDeleted(entry.room.id.clone()));
            return Ok(outcome);
        }
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome.emit(players_event(entry.machine.state()));
        Ok(outcome)
    }

    pub fn toggle_ready(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        ensure_lobby(entry)?;
        let member = entry.room.member_mut(player_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Player, player_id.to_string())
        })?;
        member.is_ready = !member.is_ready;
        let is_ready = member.is_ready;
        entry.room.refresh_status();
        entry.room.touch();
        debug!(room_id = %entry.room.id, player_id, is_ready, status = ?entry.room.status, "Ready toggled");

        let mut outcome = UseCaseOutcome::new();
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        Ok(outcome)
    }

    /// Move `target_id` to `team`. Players may move themselves; under
    /// host-choice the host may move anyone.
    pub fn change_team(
        &self,
        entry: &mut RoomEntry,
        requester_id: &str,
        target_id: &str,
        team: u8,
    ) -> Result<UseCaseOutcome, DomainError> {
        ensure_lobby(entry)?;
        if usize::from(team) >= TEAMS {
            return Err(DomainError::validation(
                ValidationKind::InvalidTeam,
                format!("team {team} does not exist"),
            ));
        }
        let host_choice = entry.room.settings.team_method == TeamAssignmentMethod::HostChoice;
        if requester_id != target_id && !(host_choice && requester_id == entry.room.host_id) {
            return Err(DomainError::validation(
                ValidationKind::NotHost,
                "only the host may move other players",
            ));
        }
        let state = entry.machine.state();
        let index = state
            .player_index(target_id)
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Player, target_id.to_string()))?;
        if state.players[index].team == team {
            return Ok(UseCaseOutcome::new());
        }
        if !team_has_space(&state.players, team, Some(index)) {
            return Err(DomainError::validation(
                ValidationKind::InvalidTeam,
                format!("team {team} is full"),
            ));
        }

        let state = entry.machine.state_mut();
        state.players[index].team = team;
        state.team_assignments.insert(target_id.to_string(), team);
        entry.room.touch();
        info!(room_id = %entry.room.id, requester_id, target_id, team, "Team changed");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome.emit(players_event(entry.machine.state()));
        Ok(outcome)
    }

    /// Host starts a ready room: seats alternate by team, scores reset and
    /// the first round is dealt.
    pub fn start_game(
        &self,
        entry: &mut RoomEntry,
        requester_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, requester_id, "Start game");
        if entry.room.host_id != requester_id {
            return Err(DomainError::validation(
                ValidationKind::NotHost,
                "only the host can start the game",
            ));
        }
        if entry.room.status != RoomStatus::Ready {
            return Err(DomainError::validation(
                ValidationKind::RoomNotReady,
                format!("room is {:?}", entry.room.status).to_lowercase(),
            ));
        }
        let state = entry.machine.state();
        for team in 0..TEAMS as u8 {
            let members = state.players.iter().filter(|p| p.team == team).count();
            if members != PLAYERS / TEAMS {
                return Err(DomainError::validation(
                    ValidationKind::InvalidTeam,
                    format!("team {team} has {members} players"),
                ));
            }
        }

        alternate_seats_by_team(entry);
        entry.machine.reset_state();
        entry.machine.start_round()?;
        entry.room.status = RoomStatus::Playing;
        entry.room.touch();

        let state = entry.machine.state();
        info!(
            room_id = %entry.room.id,
            points_to_win = state.points_to_win,
            first_turn = state.current_turn().unwrap_or_default(),
            "Game started"
        );
        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::GameStarted(GameStarted {
            room_id: entry.room.id.clone(),
            players: player_views(&state.players),
            current_turn: state.current_turn().map(str::to_string),
            points_to_win: state.points_to_win,
        }));
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome.emit(phase_event(state, None));
        emit_turn(&mut outcome, state);
        Ok(outcome)
    }

    /// Rebind a connection from a reconnect token.
    pub fn reconnect(
        &self,
        entry: &mut RoomEntry,
        token: &str,
        connection_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        let Some(player_id) = entry.machine.tokens().resolve(token).map(str::to_string) else {
            warn!(room_id = %entry.room.id, "Unknown reconnect token");
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                "unknown reconnect token",
            ));
        };
        let index = entry.room.seat_index(&player_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Player, format!("{player_id} has no seat"))
        })?;
        info!(room_id = %entry.room.id, player_id = %player_id, "Reconnected by token");
        Ok(self.restore_seat(entry, index, connection_id))
    }

    /// A connection dropped. The seat is held until the grace period ends.
    pub fn disconnect(
        &self,
        entry: &mut RoomEntry,
        connection_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        let state = entry.machine.state_mut();
        let Some(player) = state
            .players
            .iter_mut()
            .find(|p| !connection_id.is_empty() && p.connection_id == connection_id)
        else {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                format!("no player on connection {connection_id}"),
            ));
        };
        player.connection_id.clear();
        let player_id = player.player_id.clone();
        info!(room_id = %entry.room.id, player_id = %player_id, "Player disconnected");

        let mut outcome = UseCaseOutcome::new();
        outcome.emit(players_event(state));
        outcome.then(FollowUp::ReapDisconnected { player_id });
        Ok(outcome)
    }

    /// Grace period over: a still-disconnected player leaves.
    pub fn reap_disconnected(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        let still_gone = entry
            .machine
            .state()
            .player(player_id)
            .is_some_and(|p| !p.is_connected());
        if !still_gone || entry.room.occupied_index(player_id).is_none() {
            return Ok(UseCaseOutcome::new());
        }
        info!(room_id = %entry.room.id, player_id, "Grace period expired");
        self.leave_room(entry, player_id)
    }
}

fn ensure_lobby(entry: &RoomEntry) -> Result<(), DomainError> {
    if matches!(entry.room.status, RoomStatus::Waiting | RoomStatus::Ready) {
        return Ok(());
    }
    Err(DomainError::conflict(
        ConflictKind::GameInProgress,
        "seating is locked while a game runs",
    ))
}

fn team_has_space(players: &[Player], team: u8, moving: Option<usize>) -> bool {
    let taken = players
        .iter()
        .enumerate()
        .filter(|(i, p)| p.team == team && Some(*i) != moving)
        .count();
    taken < PLAYERS / TEAMS
}

/// Reorder seats so partners sit opposite: team 0, team 1, team 0, team 1.
fn alternate_seats_by_team(entry: &mut RoomEntry) {
    let state = entry.machine.state_mut();
    let mut order: Vec<usize> = Vec::with_capacity(PLAYERS);
    let mut by_team: [Vec<usize>; TEAMS] = [Vec::new(), Vec::new()];
    for (i, p) in state.players.iter().enumerate() {
        by_team[usize::from(p.team.min(1))].push(i);
    }
    for pair in 0..PLAYERS / TEAMS {
        for team in &by_team {
            if let Some(i) = team.get(pair) {
                order.push(*i);
            }
        }
    }
    if order.len() != state.players.len() {
        return;
    }

    let mut players: Vec<Option<Player>> = std::mem::take(&mut state.players)
        .into_iter()
        .map(Some)
        .collect();
    let mut seats: Vec<Option<Seat>> = std::mem::take(&mut entry.room.seats)
        .into_iter()
        .map(Some)
        .collect();
    for i in order {
        if let (Some(player), Some(seat)) = (players[i].take(), seats[i].take()) {
            state.players.push(player);
            entry.room.seats.push(seat);
        }
    }
}
