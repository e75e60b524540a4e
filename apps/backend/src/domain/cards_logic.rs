//! Card game logic: trump ordering, Jack special-casing, effective suits and
//! per-card strength.

use std::cmp::Ordering;

use super::cards_types::{Card, Rank, Suit, TrumpType};

pub const JOKER_STRENGTH: u32 = 150;
pub const PRIMARY_JACK_STRENGTH: u32 = 19;
pub const SECONDARY_JACK_STRENGTH: u32 = 18;
pub const TRUMP_BONUS: u32 = 100;
pub const BASE_SUIT_BONUS: u32 = 50;

/// Bid ordering of trump types: tra 5, hel 4, daya 3, club 2, zuppe 1.
pub const fn trump_strength(trump: TrumpType) -> u8 {
    match trump {
        TrumpType::Tra => 5,
        TrumpType::Hel => 4,
        TrumpType::Daya => 3,
        TrumpType::Club => 2,
        TrumpType::Zuppe => 1,
    }
}

/// Jack of the trump suit. None under tra.
pub fn primary_jack(trump: TrumpType) -> Option<Card> {
    trump.suit().map(|suit| Card::new(Rank::Jack, suit))
}

/// Jack of the same-colour suit. None under tra.
pub fn secondary_jack(trump: TrumpType) -> Option<Card> {
    trump.suit().map(|suit| Card::new(Rank::Jack, suit.partner()))
}

pub fn is_primary_jack(card: Card, trump: Option<TrumpType>) -> bool {
    trump.and_then(primary_jack) == Some(card)
}

pub fn is_secondary_jack(card: Card, trump: Option<TrumpType>) -> bool {
    trump.and_then(secondary_jack) == Some(card)
}

fn trump_suit(trump: Option<TrumpType>) -> Option<Suit> {
    trump.and_then(TrumpType::suit)
}

/// Effective suit of a card in play.
///
/// The Joker takes the trump suit under a suit trump and the base suit
/// otherwise. The secondary Jack reports the primary Jack's suit.
pub fn card_suit(card: Card, trump: Option<TrumpType>, base_suit: Option<Suit>) -> Option<Suit> {
    match card {
        Card::Joker => trump_suit(trump).or(base_suit),
        Card::Standard { suit, .. } => {
            if is_secondary_jack(card, trump) {
                trump_suit(trump)
            } else {
                Some(suit)
            }
        }
    }
}

/// Strength of `card` within a trick led in `base_suit` under `trump`.
pub fn card_strength(card: Card, base_suit: Option<Suit>, trump: Option<TrumpType>) -> u32 {
    let rank = match card {
        Card::Joker => return JOKER_STRENGTH,
        Card::Standard { rank, .. } => rank,
    };

    let mut strength = if is_primary_jack(card, trump) {
        PRIMARY_JACK_STRENGTH
    } else if is_secondary_jack(card, trump) {
        SECONDARY_JACK_STRENGTH
    } else {
        rank.value()
    };

    let suit = card_suit(card, trump, base_suit);
    if suit.is_some() && suit == trump_suit(trump) {
        strength += TRUMP_BONUS;
    } else if suit.is_some() && suit == base_suit {
        strength += BASE_SUIT_BONUS;
    }
    strength
}

/// Whether any card in `hand` answers `suit` under `trump`.
///
/// Under tra the Joker has no suit of its own while held.
pub fn hand_has_suit(hand: &[Card], suit: Suit, trump: Option<TrumpType>) -> bool {
    hand.iter()
        .filter(|c| !c.is_joker() || trump_suit(trump).is_some())
        .any(|c| card_suit(*c, trump, None) == Some(suit))
}

/// Display order for a hand: Joker first, trump suit next, then the
/// remaining suits; strongest first within a suit.
pub fn compare_for_hand(a: &Card, b: &Card, trump: Option<TrumpType>) -> Ordering {
    let group = |c: &Card| -> u8 {
        match card_suit(*c, trump, None) {
            _ if c.is_joker() => 0,
            Some(s) if Some(s) == trump_suit(trump) => 1,
            Some(s) => 2 + s as u8,
            None => 6,
        }
    };
    group(a)
        .cmp(&group(b))
        .then_with(|| card_strength(*b, None, trump).cmp(&card_strength(*a, None, trump)))
}

pub fn sort_hand(hand: &mut [Card], trump: Option<TrumpType>) {
    hand.sort_by(|a, b| compare_for_hand(a, b, trump));
}
