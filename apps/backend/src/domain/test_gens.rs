// Proptest generators for domain types.
// Card sets are always drawn without replacement from the real deck.

use proptest::prelude::*;
use proptest::sample::subsequence;

use crate::domain::dealing::full_deck;
use crate::domain::{Card, Suit, TrumpType};

pub fn suit() -> impl Strategy<Value = Suit> {
    prop_oneof![
        Just(Suit::Hearts),
        Just(Suit::Diamonds),
        Just(Suit::Clubs),
        Just(Suit::Spades),
    ]
}

pub fn trump() -> impl Strategy<Value = TrumpType> {
    prop_oneof![
        Just(TrumpType::Tra),
        Just(TrumpType::Hel),
        Just(TrumpType::Daya),
        Just(TrumpType::Club),
        Just(TrumpType::Zuppe),
    ]
}

pub fn pairs() -> impl Strategy<Value = u8> {
    4u8..=11
}

/// Four distinct cards in play order.
pub fn four_distinct_cards() -> impl Strategy<Value = Vec<Card>> {
    subsequence(full_deck(), 4).prop_shuffle()
}

/// A shuffled full deck.
pub fn shuffled_deck() -> impl Strategy<Value = Vec<Card>> {
    Just(full_deck()).prop_shuffle()
}
