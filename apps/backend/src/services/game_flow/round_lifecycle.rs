use tracing::{debug, error, info};

use super::{
    emit_turn, emit_turn_later, phase_event, players_event, FollowUp, GameFlowService,
    UseCaseOutcome,
};
use crate::domain::cards_logic::sort_hand;
use crate::domain::chombo::has_required_broken;
use crate::domain::rules::PLAYERS;
use crate::domain::scoring::{award_play_points, winning_team, PlayAward};
use crate::domain::state::next_seat;
use crate::domain::GamePhase;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::protocol::events::{
    player_views, BrokenReveal, FieldComplete, GameOver, NewRoundStarted, OutboundEvent,
    RevealAgari, RoundCancelled, RoundResults,
};
use crate::services::rooms::{RoomEntry, RoomStatus};

impl GameFlowService {
    /// Nobody declared: rotate the opening seat, redeal and bid again.
    pub(super) fn cancel_blow_round(
        &self,
        entry: &mut RoomEntry,
    ) -> Result<UseCaseOutcome, DomainError> {
        let state = entry.machine.state_mut();
        state.blow_state.is_round_cancelled = true;
        state.blow_state.current_blow_index = next_seat(state.blow_state.current_blow_index, PLAYERS);
        state.chombo_violations.expire_violations();
        entry.machine.start_round()?;

        let state = entry.machine.state();
        let next_dealer = state.current_turn().unwrap_or_default().to_string();
        info!(room_id = %entry.room.id, next_dealer = %next_dealer, "Blow round cancelled");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::RoundCancelled(RoundCancelled {
            next_dealer,
            players: player_views(&state.players),
        }));
        outcome.emit(phase_event(state, None));
        emit_turn(&mut outcome, state);
        Ok(outcome)
    }

    /// The highest declarer takes the Agari, trump is fixed and play begins
    /// once they set aside the Negri.
    pub(super) fn transition_to_play(
        &self,
        entry: &mut RoomEntry,
    ) -> Result<UseCaseOutcome, DomainError> {
        let room_id = entry.room.id.clone();
        let state = entry.machine.state_mut();
        let Some(declaration) = state.blow_state.current_highest_declaration.clone() else {
            return Err(DomainError::phase_mismatch("no winning declaration"));
        };
        let seat = state.player_index(&declaration.player_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Player, declaration.player_id.clone())
        })?;

        let trump = Some(declaration.trump_type);
        let agari = state.agari.take();
        let winner = &mut state.players[seat];
        if let Some(card) = agari {
            winner.hand.push(card);
        }
        sort_hand(&mut winner.hand, trump);
        winner.has_required_broken = has_required_broken(&winner.hand);
        let winner_id = winner.player_id.clone();
        let winner_team = winner.team;
        let winner_connection = winner.connection_id.clone();
        let required_broken = winner.has_required_broken;

        state.blow_state.current_trump = trump;
        state.game_phase = Some(GamePhase::Play);
        state.current_player_index = seat;

        info!(
            room_id = %room_id,
            declarer = %winner_id,
            trump = %declaration.trump_type,
            pairs = declaration.number_of_pairs,
            "Blow won; entering play"
        );

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(players_event(state));
        outcome.emit_later_to(
            &winner_connection,
            OutboundEvent::RevealAgari(RevealAgari {
                agari,
                message: "Select a card from your hand as Negri".to_string(),
                player_id: winner_id.clone(),
            }),
        );
        emit_turn_later(&mut outcome, state);
        outcome.emit_later(phase_event(state, Some(winner_team)));
        if required_broken {
            debug!(room_id = %room_id, player_id = %winner_id, "Agari completed four Jacks");
            outcome.then(FollowUp::FinalizeBroken {
                player_id: winner_id,
            });
        }
        Ok(outcome)
    }

    /// Seal the full field and either hand the lead on or close the round.
    pub fn complete_field(&self, entry: &mut RoomEntry) -> Result<UseCaseOutcome, DomainError> {
        let state = entry.machine.state();
        let full = state
            .play_state
            .current_field
            .as_ref()
            .is_some_and(|f| f.is_full());
        if state.game_phase != Some(GamePhase::Play) || !full {
            debug!(room_id = %entry.room.id, "No full field to complete");
            return Ok(UseCaseOutcome::new());
        }

        let completed = entry.machine.complete_field()?;
        let state = entry.machine.state();
        if !state.is_conserved() {
            error!(
                room_id = %entry.room.id,
                cards = state.card_count(),
                "Card conservation broken after field"
            );
        }

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::FieldComplete(FieldComplete {
            winner_id: completed.winner_id.clone(),
            field: completed.clone(),
            next_player_id: completed.winner_id.clone(),
        }));

        if state.all_hands_empty() {
            let Some(declaring_team) = state.declaring_team() else {
                return Err(DomainError::phase_mismatch("round has no declaring team"));
            };
            let pairs = state
                .winning_declaration()
                .map_or(0, |d| d.number_of_pairs);
            let won = state.won_fields(declaring_team);
            let state = entry.machine.state_mut();
            let award = award_play_points(
                &mut state.team_scores,
                &mut state.team_score_records,
                declaring_team,
                pairs,
                won,
            );
            info!(
                room_id = %entry.room.id,
                declaring_team,
                pairs,
                won,
                award_team = award.team,
                award_points = award.points,
                "Round scored"
            );
            outcome.merge(self.finish_round(entry, Some(award))?);
        } else {
            emit_turn(&mut outcome, state);
        }
        Ok(outcome)
    }

    /// Publish results, then either end the game or queue the next round.
    pub(super) fn finish_round(
        &self,
        entry: &mut RoomEntry,
        award: Option<PlayAward>,
    ) -> Result<UseCaseOutcome, DomainError> {
        let state = entry.machine.state_mut();
        state.game_phase = Some(GamePhase::Deal);
        state.chombo_violations.expire_violations();

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::RoundResults(RoundResults {
            scores: state.team_scores,
            award,
        }));

        let target = f64::from(state.points_to_win);
        match winning_team(&state.team_scores, target) {
            Some(winner) => outcome.merge(self.process_game_over(entry, winner)),
            None => {
                outcome.then(FollowUp::NextRound);
            }
        }
        Ok(outcome)
    }

    /// Rotate the opening seat and deal the next round.
    pub fn start_next_round(&self, entry: &mut RoomEntry) -> Result<UseCaseOutcome, DomainError> {
        if entry.room.status != RoomStatus::Playing {
            debug!(room_id = %entry.room.id, "Room no longer playing; next round skipped");
            return Ok(UseCaseOutcome::new());
        }
        let state = entry.machine.state_mut();
        state.round_number += 1;
        state.blow_state.current_blow_index = next_seat(state.blow_state.current_blow_index, PLAYERS);
        if defer_while_vacant(entry) {
            return Ok(UseCaseOutcome::persisted());
        }
        entry.machine.start_round()?;

        let state = entry.machine.state();
        info!(room_id = %entry.room.id, round = state.round_number, "Next round dealt");
        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::RoundReset);
        outcome.emit(new_round_event(entry));
        emit_turn(&mut outcome, state);
        outcome.emit(phase_event(state, None));
        Ok(outcome)
    }

    /// Redeal the current round without rotating the opening seat.
    pub fn restart_round(&self, entry: &mut RoomEntry) -> Result<UseCaseOutcome, DomainError> {
        if entry.room.status != RoomStatus::Playing || !entry.room.vacant_seats().is_empty() {
            return Ok(UseCaseOutcome::new());
        }
        entry.machine.state_mut().chombo_violations.expire_violations();
        entry.machine.start_round()?;
        info!(room_id = %entry.room.id, "Round restarted with new seat holder");

        let state = entry.machine.state();
        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::RoundReset);
        outcome.emit(new_round_event(entry));
        emit_turn(&mut outcome, state);
        outcome.emit(phase_event(state, None));
        Ok(outcome)
    }

    /// Second half of a broken-hand reveal: discard the deal and bid again
    /// from the same opening seat.
    pub fn finalize_broken(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        if entry.room.status != RoomStatus::Playing {
            return Ok(UseCaseOutcome::new());
        }
        if entry.machine.state().player(player_id).is_none() {
            return Err(DomainError::not_found(
                NotFoundKind::Player,
                player_id.to_string(),
            ));
        }
        if defer_while_vacant(entry) {
            let mut outcome = UseCaseOutcome::persisted();
            outcome.emit(OutboundEvent::Broken(BrokenReveal {
                player_id: player_id.to_string(),
                next_player_id: None,
                players: player_views(&entry.machine.state().players),
            }));
            return Ok(outcome);
        }
        entry.machine.state_mut().chombo_violations.expire_violations();
        entry.machine.start_round()?;
        let state = entry.machine.state();
        info!(room_id = %entry.room.id, player_id, "Redealt after broken hand");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::Broken(BrokenReveal {
            player_id: player_id.to_string(),
            next_player_id: state.current_turn().map(str::to_string),
            players: player_views(&state.players),
        }));
        outcome.emit(phase_event(state, None));
        emit_turn(&mut outcome, state);
        Ok(outcome)
    }

    /// Mark the room finished and announce the winner.
    pub(super) fn process_game_over(&self, entry: &mut RoomEntry, winner: u8) -> UseCaseOutcome {
        entry.room.status = RoomStatus::Finished;
        let state = entry.machine.state();
        info!(
            room_id = %entry.room.id,
            winner,
            team0 = state.team_scores[0].total,
            team1 = state.team_scores[1].total,
            "Game over"
        );

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::GameOver(GameOver {
            winner,
            final_scores: state.team_scores,
        }));
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome.then(FollowUp::GameOverReset);
        outcome
    }

    /// Return a finished room to waiting with a fresh game.
    pub fn reset_after_game_over(&self, entry: &mut RoomEntry) -> UseCaseOutcome {
        if entry.room.status != RoomStatus::Finished {
            return UseCaseOutcome::new();
        }
        entry.machine.reset_state();
        entry.room.status = RoomStatus::Waiting;
        entry.room.clear_ready();
        entry.room.refresh_status();
        entry.room.touch();
        info!(room_id = %entry.room.id, "Room reset after game over");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(players_event(entry.machine.state()));
        outcome.emit(OutboundEvent::RoomUpdated(entry.summary()));
        outcome
    }
}

/// Park a redeal until every seat is filled.
fn defer_while_vacant(entry: &mut RoomEntry) -> bool {
    let vacant = entry.room.vacant_seats();
    if vacant.is_empty() {
        return false;
    }
    entry.machine.defer_redeal();
    info!(room_id = %entry.room.id, vacant = ?vacant, "Redeal deferred until seats are filled");
    true
}

fn new_round_event(entry: &RoomEntry) -> OutboundEvent {
    let state = entry.machine.state();
    OutboundEvent::NewRoundStarted(NewRoundStarted {
        players: player_views(&state.players),
        current_turn: state.current_turn().map(str::to_string),
        game_phase: state.game_phase,
        round_number: state.round_number,
    })
}
