use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::bidding::{BlowDeclaration, BlowState};
use crate::domain::chombo::ChomboLedger;
use crate::domain::rules::{DECK_SIZE, PLAYERS, TANZEN_TRICK_INDEX};
use crate::domain::scoring::{TeamScoreRecords, TeamScores};
use crate::domain::tricks::{CompletedField, Field};
use crate::domain::{Card, TrumpType};

pub type Seat = usize; // 0..=3

/// A seated participant in one room's game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: String,
    /// Empty while disconnected.
    pub connection_id: String,
    pub name: String,
    pub team: u8,
    pub hand: Vec<Card>,
    pub is_passer: bool,
    pub has_broken: bool,
    pub has_required_broken: bool,
    /// Set once the player has revealed a broken hand this deal.
    #[serde(default)]
    pub revealed_broken: bool,
    /// Persisted so the token registry can be rebuilt on load.
    #[serde(default)]
    pub reconnect_token: String,
}

impl Player {
    pub fn new(
        player_id: impl Into<String>,
        connection_id: impl Into<String>,
        name: impl Into<String>,
        team: u8,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            connection_id: connection_id.into(),
            name: name.into(),
            team,
            hand: Vec::new(),
            is_passer: false,
            has_broken: false,
            has_required_broken: false,
            revealed_broken: false,
            reconnect_token: String::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.reconnect_token = token.into();
        self
    }

    pub fn is_connected(&self) -> bool {
        !self.connection_id.is_empty()
    }

    pub fn holds(&self, card: Card) -> bool {
        self.hand.contains(&card)
    }

    /// Clear per-deal flags and the hand.
    pub fn reset_for_deal(&mut self) {
        self.hand.clear();
        self.is_passer = false;
        self.has_broken = false;
        self.has_required_broken = false;
        self.revealed_broken = false;
    }
}

/// Overall game progression phases. `None` on `GameState` means not started.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Deal,
    Blow,
    Play,
}

impl GamePhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            GamePhase::Deal => "deal",
            GamePhase::Blow => "blow",
            GamePhase::Play => "play",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub current_field: Option<Field>,
    pub negri_card: Option<Card>,
    /// Negri per declarer, kept for the round summary.
    pub neguri: BTreeMap<String, Card>,
    pub fields: Vec<CompletedField>,
    pub last_winner_id: Option<String>,
    pub is_tanzen_round: bool,
    pub open_declared: bool,
    pub open_declarer_id: Option<String>,
}

impl PlayState {
    pub fn is_tanzen_trick(&self) -> bool {
        self.fields.len() == TANZEN_TRICK_INDEX
    }
}

/// One room's authoritative game state; the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub players: Vec<Player>,
    pub deck: Vec<Card>,
    pub current_player_index: usize,
    pub agari: Option<Card>,
    pub team_scores: TeamScores,
    pub game_phase: Option<GamePhase>,
    pub blow_state: BlowState,
    pub play_state: PlayState,
    pub team_score_records: TeamScoreRecords,
    pub chombo_violations: ChomboLedger,
    pub round_number: u32,
    pub points_to_win: u32,
    /// Remembered team per player id, re-applied on return.
    pub team_assignments: BTreeMap<String, u8>,
    /// A redeal is waiting for every seat to be filled.
    #[serde(default)]
    pub needs_redeal: bool,
}

impl GameState {
    pub fn new(points_to_win: u32) -> Self {
        Self {
            players: Vec::with_capacity(PLAYERS),
            deck: Vec::new(),
            current_player_index: 0,
            agari: None,
            team_scores: TeamScores::default(),
            game_phase: None,
            blow_state: BlowState::default(),
            play_state: PlayState::default(),
            team_score_records: TeamScoreRecords::default(),
            chombo_violations: ChomboLedger::default(),
            round_number: 1,
            points_to_win,
            team_assignments: BTreeMap::new(),
            needs_redeal: false,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn player_index(&self, player_id: &str) -> Option<Seat> {
        self.players.iter().position(|p| p.player_id == player_id)
    }

    pub fn player_by_connection(&self, connection_id: &str) -> Option<&Player> {
        if connection_id.is_empty() {
            return None;
        }
        self.players.iter().find(|p| p.connection_id == connection_id)
    }

    pub fn seat_order(&self) -> Vec<String> {
        self.players.iter().map(|p| p.player_id.clone()).collect()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn current_turn(&self) -> Option<&str> {
        self.current_player().map(|p| p.player_id.as_str())
    }

    pub fn is_player_turn(&self, player_id: &str) -> bool {
        self.current_turn() == Some(player_id)
    }

    /// Point the turn at `player_id`. Unknown ids leave the turn unchanged.
    pub fn set_current_turn(&mut self, player_id: &str) {
        if let Some(idx) = self.player_index(player_id) {
            self.current_player_index = idx;
        }
    }

    pub fn trump(&self) -> Option<TrumpType> {
        self.blow_state.current_trump
    }

    pub fn has_acted_in_blow(&self, player: &Player) -> bool {
        player.is_passer || self.blow_state.has_declared(&player.player_id)
    }

    pub fn all_acted_in_blow(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| self.has_acted_in_blow(p))
    }

    pub fn winning_declaration(&self) -> Option<&BlowDeclaration> {
        self.blow_state.current_highest_declaration.as_ref()
    }

    pub fn declarer_id(&self) -> Option<&str> {
        self.winning_declaration().map(|d| d.player_id.as_str())
    }

    /// Team of the winning declarer, falling back to remembered assignments.
    pub fn declaring_team(&self) -> Option<u8> {
        let declarer = self.declarer_id()?;
        self.player(declarer)
            .map(|p| p.team)
            .or_else(|| self.team_assignments.get(declarer).copied())
    }

    pub fn won_fields(&self, team: u8) -> u8 {
        self.play_state
            .fields
            .iter()
            .filter(|f| f.winner_team == team)
            .count() as u8
    }

    pub fn all_hands_empty(&self) -> bool {
        self.players.iter().all(|p| p.hand.is_empty())
    }

    /// Every card currently accounted for by this state.
    ///
    /// The Agari counts only until it is claimed in the blow-to-play
    /// transition; the Negri counts once it leaves the declarer's hand.
    pub fn accounted_cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .players
            .iter()
            .flat_map(|p| p.hand.iter().copied())
            .collect();
        cards.extend(self.deck.iter().copied());
        if let Some(field) = &self.play_state.current_field {
            cards.extend(field.cards.iter().copied());
        }
        for field in &self.play_state.fields {
            cards.extend(field.cards.iter().copied());
        }
        if self.game_phase != Some(GamePhase::Play) {
            cards.extend(self.agari);
        }
        cards.extend(self.play_state.negri_card);
        cards
    }

    pub fn card_count(&self) -> usize {
        self.accounted_cards().len()
    }

    /// All 41 cards present, none held twice.
    pub fn is_conserved(&self) -> bool {
        if self.game_phase.is_none() {
            return true;
        }
        let cards = self.accounted_cards();
        let unique: HashSet<Card> = cards.iter().copied().collect();
        cards.len() == DECK_SIZE && unique.len() == DECK_SIZE
    }
}

/// Seat after `seat` around a table of `players`.
pub fn next_seat(seat: Seat, players: usize) -> Seat {
    if players == 0 {
        return 0;
    }
    (seat + 1) % players
}
