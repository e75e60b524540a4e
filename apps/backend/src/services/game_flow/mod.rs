//! Use-case orchestrators.
//!
//! Every method runs with the room lock held, validates before it mutates,
//! and returns a `UseCaseOutcome` describing what to broadcast and what to
//! run later. Nothing here awaits or touches I/O.

mod outcome;
mod player_actions;
mod round_lifecycle;
pub mod seats;

pub use outcome::{Audience, FollowUp, GameEvent, UseCaseOutcome};

use crate::domain::state::Seat;
use crate::domain::{GamePhase, GameState};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::protocol::events::{player_views, OutboundEvent, PhaseUpdate};
use crate::services::rooms::{RoomEntry, RoomStatus};

#[derive(Default)]
pub struct GameFlowService;

impl GameFlowService {
    pub fn new() -> Self {
        Self
    }
}

/// The room is mid-game with every seat filled.
fn require_active(entry: &RoomEntry) -> Result<(), DomainError> {
    if entry.room.status != RoomStatus::Playing {
        return Err(DomainError::phase_mismatch("game is not in progress"));
    }
    let vacant = entry.room.vacant_seats();
    if !vacant.is_empty() {
        return Err(DomainError::phase_mismatch(format!(
            "game is paused; seats {vacant:?} are vacant"
        )));
    }
    Ok(())
}

fn require_phase(state: &GameState, phase: GamePhase) -> Result<(), DomainError> {
    if state.game_phase != Some(phase) {
        return Err(DomainError::phase_mismatch(format!(
            "expected {} phase, game is in {}",
            phase.as_str(),
            state.game_phase.map_or("no", GamePhase::as_str)
        )));
    }
    Ok(())
}

fn require_seat(state: &GameState, player_id: &str) -> Result<Seat, DomainError> {
    state
        .player_index(player_id)
        .ok_or_else(|| DomainError::not_found(NotFoundKind::Player, player_id.to_string()))
}

fn require_turn(state: &GameState, player_id: &str) -> Result<Seat, DomainError> {
    let seat = require_seat(state, player_id)?;
    if !state.is_player_turn(player_id) {
        return Err(DomainError::out_of_turn(format!(
            "it is {}'s turn",
            state.current_turn().unwrap_or("nobody")
        )));
    }
    Ok(seat)
}

fn require_declarer(state: &GameState, player_id: &str) -> Result<(), DomainError> {
    if state.declarer_id() != Some(player_id) {
        return Err(DomainError::validation(
            ValidationKind::NotDeclarer,
            format!("{player_id} did not win the blow"),
        ));
    }
    Ok(())
}

fn players_event(state: &GameState) -> OutboundEvent {
    OutboundEvent::UpdatePlayers(player_views(&state.players))
}

fn turn_event(state: &GameState) -> Option<OutboundEvent> {
    state
        .current_turn()
        .map(|id| OutboundEvent::UpdateTurn(id.to_string()))
}

fn phase_event(state: &GameState, winner: Option<u8>) -> OutboundEvent {
    OutboundEvent::UpdatePhase(PhaseUpdate {
        phase: state.game_phase,
        scores: state.team_scores,
        winner,
        current_highest_declaration: state.blow_state.current_highest_declaration.clone(),
        current_trump: state.trump(),
    })
}

/// Push the current turn, when there is one.
fn emit_turn(outcome: &mut UseCaseOutcome, state: &GameState) {
    if let Some(event) = turn_event(state) {
        outcome.emit(event);
    }
}

fn emit_turn_later(outcome: &mut UseCaseOutcome, state: &GameState) {
    if let Some(event) = turn_event(state) {
        outcome.emit_later(event);
    }
}
