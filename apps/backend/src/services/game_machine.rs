//! One room's game state machine.
//!
//! `None -> Deal -> Blow -> Play -> (round end) -> Deal ...`. Every method
//! here is a single atomic transition on the owned `GameState`; callers hold
//! the room lock for the duration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::bidding::BlowState;
use crate::domain::cards_logic::sort_hand;
use crate::domain::chombo::{has_broken, has_required_broken};
use crate::domain::rules::PLAYERS;
use crate::domain::state::{next_seat, PlayState};
use crate::domain::tricks::{determine_field_winner, CompletedField, Field};
use crate::domain::{deal_hands, DeckSource, GamePhase, GameState};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::services::tokens::ReconnectRegistry;

pub struct GameMachine {
    state: GameState,
    tokens: ReconnectRegistry,
    deck_source: Arc<dyn DeckSource>,
}

impl GameMachine {
    pub fn new(points_to_win: u32, deck_source: Arc<dyn DeckSource>) -> Self {
        Self {
            state: GameState::new(points_to_win),
            tokens: ReconnectRegistry::default(),
            deck_source,
        }
    }

    /// Resume from a persisted snapshot; the token index is rebuilt from the
    /// players it carries.
    pub fn from_snapshot(state: GameState, deck_source: Arc<dyn DeckSource>) -> Self {
        let tokens = ReconnectRegistry::rebuild(&state.players);
        Self {
            state,
            tokens,
            deck_source,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn tokens(&self) -> &ReconnectRegistry {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut ReconnectRegistry {
        &mut self.tokens
    }

    pub fn needs_redeal(&self) -> bool {
        self.state.needs_redeal
    }

    pub fn defer_redeal(&mut self) {
        self.state.needs_redeal = true;
    }

    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// Shuffle a fresh deck and deal ten cards to every seat plus the Agari.
    pub fn deal_cards(&mut self) -> Result<(), DomainError> {
        if self.state.players.len() != PLAYERS {
            return Err(DomainError::validation(
                ValidationKind::RoomNotReady,
                format!("cannot deal to {} players", self.state.players.len()),
            ));
        }

        let deck = self.deck_source.next_deck();
        let deal = deal_hands(&deck)?;

        for (player, hand) in self.state.players.iter_mut().zip(deal.hands) {
            player.reset_for_deal();
            player.hand = hand;
            sort_hand(&mut player.hand, None);
            player.has_broken = has_broken(&player.hand);
            player.has_required_broken = has_required_broken(&player.hand);
        }
        self.state.agari = Some(deal.agari);
        self.state.deck = deal.rest;
        self.state.game_phase = Some(GamePhase::Deal);

        debug!(
            round = self.state.round_number,
            agari = %deal.agari,
            "Dealt cards"
        );
        Ok(())
    }

    /// Clear the round and deal, leaving the table in the blow phase with the
    /// turn on the current blow index.
    pub fn start_round(&mut self) -> Result<(), DomainError> {
        self.reset_round_state();
        self.deal_cards()?;
        self.state.needs_redeal = false;
        self.state.game_phase = Some(GamePhase::Blow);
        self.state.current_player_index = self.state.blow_state.current_blow_index % PLAYERS;
        info!(
            round = self.state.round_number,
            blow_index = self.state.blow_state.current_blow_index,
            "Round started"
        );
        Ok(())
    }

    /// Advance the turn one seat.
    pub fn next_turn(&mut self) {
        self.state.current_player_index =
            next_seat(self.state.current_player_index, self.state.players.len());
    }

    /// Advance to the next seat that has neither declared nor passed.
    /// Returns false when everyone has acted.
    pub fn next_blow_turn(&mut self) -> bool {
        let count = self.state.players.len();
        let mut idx = self.state.current_player_index;
        for _ in 0..count {
            idx = next_seat(idx, count);
            if !self.state.has_acted_in_blow(&self.state.players[idx]) {
                self.state.current_player_index = idx;
                return true;
            }
        }
        false
    }

    /// Seal the full current field, hand the lead to its winner and open the
    /// next field when cards remain.
    pub fn complete_field(&mut self) -> Result<CompletedField, DomainError> {
        let trump = self.state.trump();
        let field = self.state.play_state.current_field.take().ok_or_else(|| {
            DomainError::validation(ValidationKind::PhaseMismatch, "no field in play")
        })?;
        if !field.is_full() {
            let missing = PLAYERS - field.cards.len();
            self.state.play_state.current_field = Some(field);
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                format!("field still waiting for {missing} cards"),
            ));
        }

        let seat_order = self.state.seat_order();
        let winner_id = determine_field_winner(&field, &seat_order, trump)
            .map(str::to_string)
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Player,
                    format!("field dealer {} is not seated", field.dealer_id),
                )
            })?;
        let winner_team = self
            .state
            .player(&winner_id)
            .map(|p| p.team)
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Player, winner_id.clone()))?;

        let completed = CompletedField {
            cards: field.cards,
            winner_id: winner_id.clone(),
            winner_team,
            dealer_id: field.dealer_id,
        };
        self.state.play_state.fields.push(completed.clone());
        self.state.play_state.last_winner_id = Some(winner_id.clone());
        self.state.play_state.is_tanzen_round = self.state.play_state.is_tanzen_trick();
        self.state.set_current_turn(&winner_id);
        if !self.state.all_hands_empty() {
            self.state.play_state.current_field = Some(Field::led_by(winner_id.as_str()));
        }

        debug!(
            winner_id = %winner_id,
            winner_team,
            fields = self.state.play_state.fields.len(),
            "Field completed"
        );
        Ok(completed)
    }

    /// Clear per-round state. Ids, teams, connections, scores and the chombo
    /// ledger survive; the blow index is kept so the caller decides the
    /// rotation.
    pub fn reset_round_state(&mut self) {
        let blow_index = self.state.blow_state.current_blow_index;
        for player in &mut self.state.players {
            player.reset_for_deal();
        }
        self.state.deck.clear();
        self.state.agari = None;
        self.state.blow_state = BlowState::starting_at(blow_index);
        self.state.play_state = PlayState::default();
        self.state.game_phase = Some(GamePhase::Deal);
    }

    /// Back to a fresh game with the same seated players.
    pub fn reset_state(&mut self) {
        let players = std::mem::take(&mut self.state.players);
        let assignments = std::mem::take(&mut self.state.team_assignments);
        let mut fresh = GameState::new(self.state.points_to_win);
        fresh.players = players;
        fresh.team_assignments = assignments;
        for player in &mut fresh.players {
            player.reset_for_deal();
        }
        self.state = fresh;
        info!("Game state reset");
    }
}
