use serde::Serialize;

use crate::domain::bidding::BlowDeclaration;
use crate::domain::chombo::ChomboViolation;
use crate::domain::scoring::{PlayAward, TeamScores};
use crate::domain::state::{GamePhase, Player};
use crate::domain::tricks::{CompletedField, Field};
use crate::domain::{Card, TrumpType};
use crate::error::ErrorPayload;
use crate::services::rooms::{RoomStatus, TeamAssignmentMethod};

/// A player as broadcast to the room: no reconnect token or connection id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub player_id: String,
    pub name: String,
    pub team: u8,
    pub hand: Vec<Card>,
    pub is_passer: bool,
    pub has_broken: bool,
    pub has_required_broken: bool,
    pub is_connected: bool,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            player_id: p.player_id.clone(),
            name: p.name.clone(),
            team: p.team,
            hand: p.hand.clone(),
            is_passer: p.is_passer,
            has_broken: p.has_broken,
            has_required_broken: p.has_required_broken,
            is_connected: p.is_connected(),
        }
    }
}

pub fn player_views(players: &[Player]) -> Vec<PlayerView> {
    players.iter().map(PlayerView::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseUpdate {
    pub phase: Option<GamePhase>,
    pub scores: TeamScores,
    pub winner: Option<u8>,
    pub current_highest_declaration: Option<BlowDeclaration>,
    pub current_trump: Option<TrumpType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowUpdate {
    pub declarations: Vec<BlowDeclaration>,
    pub current_highest: Option<BlowDeclaration>,
    pub last_passer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCancelled {
    pub next_dealer: String,
    pub players: Vec<PlayerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealAgari {
    pub agari: Option<Card>,
    pub message: String,
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySetup {
    pub negri: Card,
    pub starting_player: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlayed {
    pub player_id: String,
    pub card: Card,
    pub field: Field,
    pub players: Vec<PlayerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldComplete {
    pub winner_id: String,
    pub field: CompletedField,
    pub next_player_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResults {
    pub scores: TeamScores,
    pub award: Option<PlayAward>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoundStarted {
    pub players: Vec<PlayerView>,
    pub current_turn: Option<String>,
    pub game_phase: Option<GamePhase>,
    pub round_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    pub winner: u8,
    pub final_scores: TeamScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenReveal {
    pub player_id: String,
    pub next_player_id: Option<String>,
    pub players: Vec<PlayerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChomboReported {
    pub violation: ChomboViolation,
    pub reporter_team: u8,
    pub scores: TeamScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    pub room_id: String,
    pub players: Vec<PlayerView>,
    pub current_turn: Option<String>,
    pub points_to_win: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePaused {
    pub vacant_seats: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResumed {
    pub current_turn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDeclared {
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub index: usize,
    pub player_id: Option<String>,
    pub name: Option<String>,
    pub team: Option<u8>,
    pub is_ready: bool,
    pub is_host: bool,
    pub is_vacant: bool,
    pub is_connected: bool,
}

/// Public view of a room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub host_id: String,
    pub status: RoomStatus,
    pub points_to_win: u32,
    pub team_assignment_method: TeamAssignmentMethod,
    pub seats: Vec<SeatView>,
}

/// Private acknowledgement of a join or reconnect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    pub room_id: String,
    pub player_id: String,
    pub reconnect_token: Option<String>,
}

/// Every notification a room can emit.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum OutboundEvent {
    UpdatePlayers(Vec<PlayerView>),
    UpdateTurn(String),
    UpdatePhase(PhaseUpdate),
    BlowUpdated(BlowUpdate),
    RoundCancelled(RoundCancelled),
    RevealAgari(RevealAgari),
    PlaySetupComplete(PlaySetup),
    CardPlayed(CardPlayed),
    FieldUpdated(Field),
    FieldComplete(FieldComplete),
    RoundResults(RoundResults),
    RoundReset,
    NewRoundStarted(NewRoundStarted),
    GameOver(GameOver),
    Broken(BrokenReveal),
    ChomboReported(ChomboReported),
    OpenDeclared(OpenDeclared),
    GameStarted(GameStarted),
    GamePaused(GamePaused),
    GameResumed(GameResumed),
    RoomUpdated(RoomSummary),
    RoomDeleted(String),
    Joined(Joined),
    RoomList(Vec<RoomSummary>),
    Error(ErrorPayload),
}

impl OutboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::UpdatePlayers(_) => "update-players",
            OutboundEvent::UpdateTurn(_) => "update-turn",
            OutboundEvent::UpdatePhase(_) => "update-phase",
            OutboundEvent::BlowUpdated(_) => "blow-updated",
            OutboundEvent::RoundCancelled(_) => "round-cancelled",
            OutboundEvent::RevealAgari(_) => "reveal-agari",
            OutboundEvent::PlaySetupComplete(_) => "play-setup-complete",
            OutboundEvent::CardPlayed(_) => "card-played",
            OutboundEvent::FieldUpdated(_) => "field-updated",
            OutboundEvent::FieldComplete(_) => "field-complete",
            OutboundEvent::RoundResults(_) => "round-results",
            OutboundEvent::RoundReset => "round-reset",
            OutboundEvent::NewRoundStarted(_) => "new-round-started",
            OutboundEvent::GameOver(_) => "game-over",
            OutboundEvent::Broken(_) => "broken",
            OutboundEvent::ChomboReported(_) => "chombo-reported",
            OutboundEvent::OpenDeclared(_) => "open-declared",
            OutboundEvent::GameStarted(_) => "game-started",
            OutboundEvent::GamePaused(_) => "game-paused",
            OutboundEvent::GameResumed(_) => "game-resumed",
            OutboundEvent::RoomUpdated(_) => "room-updated",
            OutboundEvent::RoomDeleted(_) => "room-deleted",
            OutboundEvent::Joined(_) => "joined",
            OutboundEvent::RoomList(_) => "room-list",
            OutboundEvent::Error(_) => "error",
        }
    }
}
