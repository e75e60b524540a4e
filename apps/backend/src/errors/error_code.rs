//! Error codes for the Mei-Tra backend.
//!
//! Every rejection sent to a client carries one of these codes. Add new codes
//! here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that
//! appear in outbound `error` events.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Turn & phase
    /// Acting while it is another player's turn
    OutOfTurn,
    /// Intent not allowed in the current game phase
    PhaseMismatch,
    /// Player already declared or passed this blow round
    AlreadyActed,

    // Illegal moves
    /// Declaration does not beat the current highest declaration
    InvalidBid,
    /// Card not in hand
    CardNotInHand,
    /// Must follow the led suit
    MustFollowSuit,
    /// Joker must be played
    MustPlayJoker,
    /// Base suit selection is only for a Joker lead
    BaseSuitNotRequired,
    /// Negri must be chosen before playing
    NegriNotSelected,
    /// Negri was already chosen
    NegriAlreadySelected,
    /// Only the winning declarer may do this
    NotDeclarer,
    /// Only the host may do this
    NotHost,
    /// Hand is not a broken hand
    NotBroken,
    /// Open declaration outside the declarer's lead
    InvalidOpen,
    /// Team index outside 0..=1 or team is full
    InvalidTeam,
    /// Chombo report could not be matched
    InvalidReport,
    /// Room not ready to start
    RoomNotReady,
    /// Card token could not be parsed
    ParseCard,
    /// No-trump cannot be converted to a suit
    InvalidTrumpConversion,
    /// General validation error
    ValidationError,

    // Resource Not Found
    RoomNotFound,
    PlayerNotFound,
    ViolationNotFound,
    NotFound,

    // Conflicts
    SeatTaken,
    RoomFull,
    AlreadyInRoom,
    GameInProgress,
    AlreadyReported,
    Conflict,

    // System Errors
    StoreUnavailable,
    StoreTimeout,
    DataCorruption,
    Internal,
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::AlreadyActed => "ALREADY_ACTED",

            Self::InvalidBid => "INVALID_BID",
            Self::CardNotInHand => "CARD_NOT_IN_HAND",
            Self::MustFollowSuit => "MUST_FOLLOW_SUIT",
            Self::MustPlayJoker => "MUST_PLAY_JOKER",
            Self::BaseSuitNotRequired => "BASE_SUIT_NOT_REQUIRED",
            Self::NegriNotSelected => "NEGRI_NOT_SELECTED",
            Self::NegriAlreadySelected => "NEGRI_ALREADY_SELECTED",
            Self::NotDeclarer => "NOT_DECLARER",
            Self::NotHost => "NOT_HOST",
            Self::NotBroken => "NOT_BROKEN",
            Self::InvalidOpen => "INVALID_OPEN",
            Self::InvalidTeam => "INVALID_TEAM",
            Self::InvalidReport => "INVALID_REPORT",
            Self::RoomNotReady => "ROOM_NOT_READY",
            Self::ParseCard => "PARSE_CARD",
            Self::InvalidTrumpConversion => "INVALID_TRUMP_CONVERSION",
            Self::ValidationError => "VALIDATION_ERROR",

            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::ViolationNotFound => "VIOLATION_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::SeatTaken => "SEAT_TAKEN",
            Self::RoomFull => "ROOM_FULL",
            Self::AlreadyInRoom => "ALREADY_IN_ROOM",
            Self::GameInProgress => "GAME_IN_PROGRESS",
            Self::AlreadyReported => "ALREADY_REPORTED",
            Self::Conflict => "CONFLICT",

            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::StoreTimeout => "STORE_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
