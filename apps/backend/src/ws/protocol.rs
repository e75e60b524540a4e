//! Inbound client messages.

use serde::Deserialize;

use crate::domain::chombo::ViolationType;
use crate::domain::{Card, Suit, TrumpType};
use crate::services::rooms::TeamAssignmentMethod;

pub const PROTOCOL_VERSION: i32 = 1;

/// One player intent. The game intents act on the room the session joined.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMsg {
    Hello {
        protocol: i32,
    },
    ListRooms,
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        name: String,
        player_id: String,
        player_name: String,
        #[serde(default)]
        points_to_win: Option<u32>,
        #[serde(default)]
        team_method: TeamAssignmentMethod,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        player_id: String,
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    Reconnect { room_id: String, token: String },
    LeaveRoom,
    ToggleReady,
    #[serde(rename_all = "camelCase")]
    ChangeTeam { target_id: String, team: u8 },
    StartGame,
    #[serde(rename_all = "camelCase")]
    DeclareBid {
        trump_type: TrumpType,
        number_of_pairs: u8,
    },
    PassBid,
    SelectNegri {
        card: Card,
    },
    PlayCard {
        card: Card,
    },
    SelectBaseSuit {
        suit: Suit,
    },
    DeclareOpen,
    RevealBroken,
    #[serde(rename_all = "camelCase")]
    ReportViolation {
        violator_id: String,
        violation_type: ViolationType,
    },
}

impl ClientMsg {
    pub fn name(&self) -> &'static str {
        match self {
            ClientMsg::Hello { .. } => "hello",
            ClientMsg::ListRooms => "list-rooms",
            ClientMsg::CreateRoom { .. } => "create-room",
            ClientMsg::JoinRoom { .. } => "join-room",
            ClientMsg::Reconnect { .. } => "reconnect",
            ClientMsg::LeaveRoom => "leave-room",
            ClientMsg::ToggleReady => "toggle-ready",
            ClientMsg::ChangeTeam { .. } => "change-team",
            ClientMsg::StartGame => "start-game",
            ClientMsg::DeclareBid { .. } => "declare-bid",
            ClientMsg::PassBid => "pass-bid",
            ClientMsg::SelectNegri { .. } => "select-negri",
            ClientMsg::PlayCard { .. } => "play-card",
            ClientMsg::SelectBaseSuit { .. } => "select-base-suit",
            ClientMsg::DeclareOpen => "declare-open",
            ClientMsg::RevealBroken => "reveal-broken",
            ClientMsg::ReportViolation { .. } => "report-violation",
        }
    }
}
