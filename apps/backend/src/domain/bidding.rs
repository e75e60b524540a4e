//! Blow (bidding) engine: declaration ordering and blow-round bookkeeping.

use serde::{Deserialize, Serialize};

use crate::domain::cards_logic::trump_strength;
use crate::domain::rules::valid_pairs_range;
use crate::domain::TrumpType;
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowDeclaration {
    pub player_id: String,
    pub trump_type: TrumpType,
    pub number_of_pairs: u8,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl BlowDeclaration {
    pub fn new(player_id: impl Into<String>, trump_type: TrumpType, number_of_pairs: u8) -> Self {
        Self {
            player_id: player_id.into(),
            trump_type,
            number_of_pairs,
            timestamp: now_millis(),
        }
    }
}

pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Per-round blow bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowState {
    pub declarations: Vec<BlowDeclaration>,
    pub current_highest_declaration: Option<BlowDeclaration>,
    pub current_trump: Option<TrumpType>,
    pub last_passer: Option<String>,
    pub is_round_cancelled: bool,
    /// Seat that opens bidding this round.
    pub current_blow_index: usize,
}

impl BlowState {
    pub fn starting_at(current_blow_index: usize) -> Self {
        Self {
            current_blow_index,
            ..Self::default()
        }
    }

    pub fn has_declared(&self, player_id: &str) -> bool {
        self.declarations.iter().any(|d| d.player_id == player_id)
    }
}

/// `a` beats `b` when it has a strictly stronger trump at equal-or-more
/// pairs, or an equal-or-stronger trump with strictly more pairs.
pub fn beats(a_trump: TrumpType, a_pairs: u8, b: &BlowDeclaration) -> bool {
    let (ta, tb) = (trump_strength(a_trump), trump_strength(b.trump_type));
    let (pa, pb) = (a_pairs, b.number_of_pairs);
    (ta > tb && pa >= pb) || (ta >= tb && pa > pb)
}

pub fn is_valid_declaration(
    trump_type: TrumpType,
    number_of_pairs: u8,
    current_highest: Option<&BlowDeclaration>,
) -> bool {
    if !valid_pairs_range().contains(&number_of_pairs) {
        return false;
    }
    match current_highest {
        None => true,
        Some(highest) => beats(trump_type, number_of_pairs, highest),
    }
}

pub fn validate_declaration(
    trump_type: TrumpType,
    number_of_pairs: u8,
    current_highest: Option<&BlowDeclaration>,
) -> Result<(), DomainError> {
    if is_valid_declaration(trump_type, number_of_pairs, current_highest) {
        return Ok(());
    }
    let detail = match current_highest {
        _ if !valid_pairs_range().contains(&number_of_pairs) => {
            format!("{number_of_pairs} pairs is outside {:?}", valid_pairs_range())
        }
        Some(h) => format!(
            "{number_of_pairs} {trump_type} does not beat {} {}",
            h.number_of_pairs, h.trump_type
        ),
        None => format!("invalid declaration {number_of_pairs} {trump_type}"),
    };
    Err(DomainError::validation(ValidationKind::InvalidBid, detail))
}

/// The strongest declaration; among incomparable ones the earliest stands.
pub fn find_highest_declaration(declarations: &[BlowDeclaration]) -> Option<&BlowDeclaration> {
    declarations.iter().fold(None, |highest, current| match highest {
        None => Some(current),
        Some(h) if beats(current.trump_type, current.number_of_pairs, h) => Some(current),
        keep => keep,
    })
}
