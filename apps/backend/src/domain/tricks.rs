//! Trick (field) engine: play legality, trick winners and the round's
//! winning team.

use serde::{Deserialize, Serialize};

use crate::domain::cards_logic::{
    card_strength, card_suit, hand_has_suit, is_primary_jack, is_secondary_jack,
};
use crate::domain::rules::PLAYERS;
use crate::domain::{Card, Suit, TrumpType};
use crate::errors::domain::{DomainError, ValidationKind};

/// The trick currently being played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub cards: Vec<Card>,
    pub base_card: Option<Card>,
    /// Chosen by the leader when the Joker leads.
    pub base_suit: Option<Suit>,
    pub dealer_id: String,
    pub is_complete: bool,
}

impl Field {
    pub fn led_by(dealer_id: impl Into<String>) -> Self {
        Self {
            cards: Vec::with_capacity(PLAYERS),
            base_card: None,
            base_suit: None,
            dealer_id: dealer_id.into(),
            is_complete: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.cards.len() >= PLAYERS
    }

    /// A Joker lead with no base suit chosen yet blocks further play.
    pub fn awaits_base_suit(&self) -> bool {
        self.base_card == Some(Card::Joker) && self.base_suit.is_none()
    }

    pub fn lead_suit(&self, trump: Option<TrumpType>) -> Option<Suit> {
        match self.base_card {
            None => None,
            Some(Card::Joker) => self.base_suit,
            Some(card) => card_suit(card, trump, None),
        }
    }

    pub fn place(&mut self, card: Card) {
        if self.cards.is_empty() {
            self.base_card = Some(card);
        }
        self.cards.push(card);
    }
}

/// A sealed trick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedField {
    pub cards: Vec<Card>,
    pub winner_id: String,
    pub winner_team: u8,
    pub dealer_id: String,
}

/// Check that `card` may be played from `hand` onto `field`.
///
/// In the Tanzen trick a held Joker must be played.
pub fn is_valid_card_play(
    hand: &[Card],
    card: Card,
    field: &Field,
    trump: Option<TrumpType>,
    tanzen: bool,
) -> Result<(), DomainError> {
    if !hand.contains(&card) {
        return Err(DomainError::validation(
            ValidationKind::CardNotInHand,
            format!("{card} is not in hand"),
        ));
    }
    if tanzen && card != Card::Joker && hand.contains(&Card::Joker) {
        return Err(DomainError::validation(
            ValidationKind::MustPlayJoker,
            "the Joker must be played in the Tanzen trick",
        ));
    }
    if card.is_joker() || field.cards.is_empty() {
        return Ok(());
    }
    let Some(lead) = field.lead_suit(trump) else {
        return Ok(());
    };

    let suit_trump = trump.and_then(TrumpType::suit);
    if suit_trump.is_some() && (is_primary_jack(card, trump) || is_secondary_jack(card, trump)) {
        return Ok(());
    }

    if card_suit(card, trump, None) == Some(lead) || !hand_has_suit(hand, lead, trump) {
        return Ok(());
    }

    let only_joker_answers = Some(lead) == suit_trump
        && !hand
            .iter()
            .filter(|c| !c.is_joker())
            .any(|c| card_suit(*c, trump, None) == Some(lead));
    if only_joker_answers {
        return Err(DomainError::validation(
            ValidationKind::MustPlayJoker,
            "the Joker is the only trump in hand",
        ));
    }
    Err(DomainError::validation(
        ValidationKind::MustFollowSuit,
        format!("must follow {}", lead.glyph()),
    ))
}

/// Winner of a field given the table's seat order.
///
/// Play order is rebuilt from the field's dealer; the first maximum wins.
/// Returns None when the dealer is not seated.
pub fn determine_field_winner<'a>(
    field: &Field,
    seat_order: &'a [String],
    trump: Option<TrumpType>,
) -> Option<&'a str> {
    let dealer_index = seat_order.iter().position(|id| *id == field.dealer_id)?;
    let base_suit = field.lead_suit(trump);

    let mut best: Option<(u32, &'a str)> = None;
    for (i, card) in field.cards.iter().enumerate() {
        let player = seat_order[(dealer_index + i) % seat_order.len()].as_str();
        let strength = card_strength(*card, base_suit, trump);
        if best.map_or(true, |(top, _)| strength > top) {
            best = Some((strength, player));
        }
    }
    best.map(|(_, player)| player)
}

/// Team with the majority of completed fields. A tie goes to team 1.
pub fn determine_winning_team(fields: &[CompletedField]) -> u8 {
    let team0 = fields.iter().filter(|f| f.winner_team == 0).count();
    let team1 = fields.len() - team0;
    if team0 > team1 {
        0
    } else {
        1
    }
}
