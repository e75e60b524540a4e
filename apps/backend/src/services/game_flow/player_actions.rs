use tracing::{debug, info, warn};

use super::{
    emit_turn, players_event, require_active, require_declarer, require_phase, require_seat,
    require_turn, FollowUp, GameFlowService, UseCaseOutcome,
};
use crate::domain::bidding::{find_highest_declaration, validate_declaration, BlowDeclaration};
use crate::domain::chombo::{ChomboCheck, ViolationType};
use crate::domain::rules::CHOMBO_PENALTY;
use crate::domain::scoring::add_points;
use crate::domain::tricks::is_valid_card_play;
use crate::domain::{Card, Field, GamePhase, GameState, Suit, TrumpType};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::protocol::events::{
    player_views, BlowUpdate, CardPlayed, ChomboReported, OpenDeclared, OutboundEvent, PlaySetup,
};
use crate::services::rooms::RoomEntry;

impl GameFlowService {
    /// Declare a trump and a number of pairs in the blow phase.
    pub fn declare_bid(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
        trump_type: TrumpType,
        number_of_pairs: u8,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, %trump_type, number_of_pairs, "Declare bid");
        require_active(entry)?;
        let state = entry.machine.state();
        require_phase(state, GamePhase::Blow)?;
        let seat = require_turn(state, player_id)?;
        ensure_not_acted(state, seat)?;
        validate_declaration(
            trump_type,
            number_of_pairs,
            state.blow_state.current_highest_declaration.as_ref(),
        )?;

        let state = entry.machine.state_mut();
        record_four_jack(state, seat);
        state
            .blow_state
            .declarations
            .push(BlowDeclaration::new(player_id, trump_type, number_of_pairs));
        state.blow_state.current_highest_declaration =
            find_highest_declaration(&state.blow_state.declarations).cloned();

        info!(
            room_id = %entry.room.id,
            player_id,
            %trump_type,
            number_of_pairs,
            "Declaration accepted"
        );
        self.after_blow_action(entry)
    }

    /// Pass in the blow phase.
    pub fn pass_bid(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, "Pass bid");
        require_active(entry)?;
        let state = entry.machine.state();
        require_phase(state, GamePhase::Blow)?;
        let seat = require_turn(state, player_id)?;
        ensure_not_acted(state, seat)?;

        record_four_jack(entry.machine.state_mut(), seat);

        let state = entry.machine.state_mut();
        state.players[seat].is_passer = true;
        state.blow_state.last_passer = Some(player_id.to_string());

        info!(room_id = %entry.room.id, player_id, "Player passed");
        self.after_blow_action(entry)
    }

    /// Broadcast the blow state, then move the turn on or close the blow.
    fn after_blow_action(&self, entry: &mut RoomEntry) -> Result<UseCaseOutcome, DomainError> {
        let mut outcome = UseCaseOutcome::persisted();
        let state = entry.machine.state();
        outcome.emit(OutboundEvent::BlowUpdated(BlowUpdate {
            declarations: state.blow_state.declarations.clone(),
            current_highest: state.blow_state.current_highest_declaration.clone(),
            last_passer: state.blow_state.last_passer.clone(),
        }));

        if entry.machine.next_blow_turn() {
            emit_turn(&mut outcome, entry.machine.state());
            return Ok(outcome);
        }

        let closing = if entry.machine.state().blow_state.declarations.is_empty() {
            self.cancel_blow_round(entry)?
        } else {
            self.transition_to_play(entry)?
        };
        outcome.merge(closing);
        Ok(outcome)
    }

    /// The declarer sets aside one card as the Negri; play opens with them.
    pub fn select_negri(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
        card: Card,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, %card, "Select negri");
        require_active(entry)?;
        let state = entry.machine.state();
        require_phase(state, GamePhase::Play)?;
        require_declarer(state, player_id)?;
        let seat = require_seat(state, player_id)?;
        if state.play_state.negri_card.is_some() {
            return Err(DomainError::validation(
                ValidationKind::NegriAlreadySelected,
                "the Negri is already set",
            ));
        }
        if !state.players[seat].holds(card) {
            return Err(DomainError::validation(
                ValidationKind::CardNotInHand,
                format!("{card} is not in hand"),
            ));
        }

        let state = entry.machine.state_mut();
        state.players[seat].hand.retain(|c| *c != card);
        state.play_state.negri_card = Some(card);
        state.play_state.neguri.insert(player_id.to_string(), card);
        state.play_state.current_field = Some(Field::led_by(player_id));
        state.set_current_turn(player_id);

        info!(room_id = %entry.room.id, player_id, %card, "Negri selected");
        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::PlaySetupComplete(PlaySetup {
            negri: card,
            starting_player: player_id.to_string(),
        }));
        outcome.emit(players_event(state));
        emit_turn(&mut outcome, state);
        Ok(outcome)
    }

    /// Play one card onto the current field.
    pub fn play_card(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
        card: Card,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, %card, "Play card");
        require_active(entry)?;
        let state = entry.machine.state();
        require_phase(state, GamePhase::Play)?;
        let seat = require_turn(state, player_id)?;

        if state.declarer_id() == Some(player_id) && state.play_state.negri_card.is_none() {
            let negri = state.play_state.negri_card;
            let recorded = entry
                .machine
                .state_mut()
                .chombo_violations
                .check_violations(player_id, ChomboCheck::NegriForget { negri });
            if recorded.is_some() {
                warn!(room_id = %entry.room.id, player_id, "negri-forget recorded");
            }
            return Err(DomainError::validation(
                ValidationKind::NegriNotSelected,
                "select the Negri before playing",
            ));
        }

        let field = state
            .play_state
            .current_field
            .as_ref()
            .ok_or_else(|| DomainError::phase_mismatch("no field in play"))?;
        if field.is_full() {
            return Err(DomainError::phase_mismatch("field is being completed"));
        }
        if field.awaits_base_suit() {
            return Err(DomainError::phase_mismatch(
                "waiting for the leader to choose a base suit",
            ));
        }
        let hand = &state.players[seat].hand;
        let tanzen = state.play_state.is_tanzen_round;
        is_valid_card_play(hand, card, field, state.trump(), tanzen)?;

        let hand = hand.clone();
        record_four_jack(entry.machine.state_mut(), seat);
        let state = entry.machine.state_mut();
        if state
            .chombo_violations
            .check_violations(player_id, ChomboCheck::LastTanzen { hand: &hand, card })
            .is_some()
        {
            warn!(room_id = %entry.room.id, player_id, "last-tanzen recorded");
        }

        state.players[seat].hand.retain(|c| *c != card);
        let Some(field) = state.play_state.current_field.as_mut() else {
            return Err(DomainError::phase_mismatch("no field in play"));
        };
        field.place(card);
        let field_snapshot = field.clone();
        let full = field.is_full();
        let awaits_base = field.awaits_base_suit();

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::CardPlayed(CardPlayed {
            player_id: player_id.to_string(),
            card,
            field: field_snapshot,
            players: player_views(&state.players),
        }));

        if full {
            debug!(room_id = %entry.room.id, "Field full; completion scheduled");
            outcome.then(FollowUp::CompleteField);
        } else if !awaits_base {
            entry.machine.next_turn();
            emit_turn(&mut outcome, entry.machine.state());
        }
        Ok(outcome)
    }

    /// The leader of a Joker-led field names the suit the others must follow.
    pub fn select_base_suit(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
        suit: Suit,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, suit = %suit.glyph(), "Select base suit");
        require_active(entry)?;
        let state = entry.machine.state();
        require_phase(state, GamePhase::Play)?;
        require_seat(state, player_id)?;
        let field = state
            .play_state
            .current_field
            .as_ref()
            .ok_or_else(|| DomainError::phase_mismatch("no field in play"))?;
        if !field.awaits_base_suit() {
            return Err(DomainError::validation(
                ValidationKind::BaseSuitNotRequired,
                "the field does not need a base suit",
            ));
        }
        if field.dealer_id != player_id {
            return Err(DomainError::out_of_turn("only the leader chooses the base suit"));
        }

        let Some(field) = entry.machine.state_mut().play_state.current_field.as_mut() else {
            return Err(DomainError::phase_mismatch("no field in play"));
        };
        field.base_suit = Some(suit);
        let field = field.clone();
        entry.machine.next_turn();

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::FieldUpdated(field));
        emit_turn(&mut outcome, entry.machine.state());
        Ok(outcome)
    }

    /// Declare an open hand. Only the declarer leading a fresh field may.
    pub fn declare_open(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, "Declare open");
        require_active(entry)?;
        let state = entry.machine.state();
        require_phase(state, GamePhase::Play)?;
        require_seat(state, player_id)?;

        let can_declare_open = state.declarer_id() == Some(player_id)
            && state.is_player_turn(player_id)
            && !state.play_state.open_declared
            && state
                .play_state
                .current_field
                .as_ref()
                .is_some_and(|f| f.cards.is_empty());

        let state = entry.machine.state_mut();
        if state
            .chombo_violations
            .check_violations(player_id, ChomboCheck::DeclareOpen { can_declare_open })
            .is_some()
        {
            warn!(room_id = %entry.room.id, player_id, "wrong-open recorded");
        }
        if !can_declare_open {
            return Err(DomainError::validation(
                ValidationKind::InvalidOpen,
                "open may only be declared by the declarer leading a new field",
            ));
        }

        state.play_state.open_declared = true;
        state.play_state.open_declarer_id = Some(player_id.to_string());
        info!(room_id = %entry.room.id, player_id, "Open declared");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::OpenDeclared(OpenDeclared {
            player_id: player_id.to_string(),
        }));
        Ok(outcome)
    }

    /// Reveal a broken hand. The redeal runs as a follow-up so clients see
    /// the hand first.
    pub fn reveal_broken(
        &self,
        entry: &mut RoomEntry,
        player_id: &str,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(room_id = %entry.room.id, player_id, "Reveal broken hand");
        require_active(entry)?;
        let state = entry.machine.state();
        let seat = require_seat(state, player_id)?;
        let allowed = match state.game_phase {
            Some(GamePhase::Blow) => true,
            Some(GamePhase::Play) => {
                state.declarer_id() == Some(player_id) && state.play_state.negri_card.is_none()
            }
            _ => false,
        };
        if !allowed {
            return Err(DomainError::phase_mismatch(
                "broken hands are revealed during the blow or before the Negri",
            ));
        }

        let hand = state.players[seat].hand.clone();
        let state = entry.machine.state_mut();
        if state
            .chombo_violations
            .check_violations(player_id, ChomboCheck::DeclareBroken { hand: &hand })
            .is_some()
        {
            warn!(room_id = %entry.room.id, player_id, "wrong-broken recorded");
            return Err(DomainError::validation(
                ValidationKind::NotBroken,
                "hand is not broken",
            ));
        }
        if !state.players[seat].has_broken && !state.players[seat].has_required_broken {
            return Err(DomainError::validation(
                ValidationKind::NotBroken,
                "hand is not broken",
            ));
        }

        state.players[seat].revealed_broken = true;
        info!(room_id = %entry.room.id, player_id, "Broken hand revealed");

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(players_event(state));
        outcome.then(FollowUp::FinalizeBroken {
            player_id: player_id.to_string(),
        });
        Ok(outcome)
    }

    /// Report an opponent's violation. A successful report scores the penalty
    /// for the reporter's team and ends the round.
    pub fn report_violation(
        &self,
        entry: &mut RoomEntry,
        reporter_id: &str,
        violator_id: &str,
        violation_type: ViolationType,
    ) -> Result<UseCaseOutcome, DomainError> {
        debug!(
            room_id = %entry.room.id,
            reporter_id,
            violator_id,
            violation = violation_type.as_str(),
            "Report violation"
        );
        require_active(entry)?;
        let state = entry.machine.state();
        if !matches!(state.game_phase, Some(GamePhase::Blow | GamePhase::Play)) {
            return Err(DomainError::phase_mismatch("no round in progress"));
        }
        let reporter_team = state
            .player(reporter_id)
            .map(|p| p.team)
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Player, reporter_id.to_string()))?;
        let violator_team = state
            .player(violator_id)
            .map(|p| p.team)
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Player, violator_id.to_string()))?;

        let state = entry.machine.state_mut();
        let violation = state.chombo_violations.report(
            reporter_id,
            reporter_team,
            violator_id,
            violator_team,
            violation_type,
        )?;
        add_points(
            &mut state.team_scores,
            &mut state.team_score_records,
            reporter_team,
            CHOMBO_PENALTY,
            false,
        );
        info!(
            room_id = %entry.room.id,
            reporter_id,
            violator_id,
            violation = violation_type.as_str(),
            reporter_team,
            "Chombo reported"
        );

        let mut outcome = UseCaseOutcome::persisted();
        outcome.emit(OutboundEvent::ChomboReported(ChomboReported {
            violation,
            reporter_team,
            scores: state.team_scores,
        }));
        outcome.merge(self.finish_round(entry, None)?);
        Ok(outcome)
    }
}

fn ensure_not_acted(state: &GameState, seat: usize) -> Result<(), DomainError> {
    if state.has_acted_in_blow(&state.players[seat]) {
        return Err(DomainError::validation(
            ValidationKind::AlreadyActed,
            "already declared or passed this blow",
        ));
    }
    Ok(())
}

/// Record four-jack when the player acts holding every Jack unrevealed.
fn record_four_jack(state: &mut GameState, seat: usize) {
    let player = &state.players[seat];
    let hand = player.hand.clone();
    let revealed_broken = player.revealed_broken;
    let player_id = player.player_id.clone();
    if state
        .chombo_violations
        .check_violations(
            &player_id,
            ChomboCheck::FourJack {
                hand: &hand,
                revealed_broken,
            },
        )
        .is_some()
    {
        warn!(player_id = %player_id, "four-jack recorded");
    }
}
