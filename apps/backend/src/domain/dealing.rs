//! Deck generation, shuffling and dealing.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::rules::{DECK_SIZE, HAND_SIZE, PLAYERS};
use crate::domain::{Card, Rank, Suit};
use crate::errors::domain::{DomainError, ValidationKind};

/// The 41-card Mei-Tra deck in canonical order: ranks 5..A of each suit, then
/// the Joker.
pub fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(rank, suit));
        }
    }
    deck.push(Card::Joker);
    deck
}

/// Fisher-Yates shuffle driven by any `Rng`.
pub fn shuffle_with<R: Rng + ?Sized>(deck: &mut [Card], rng: &mut R) {
    for i in (1..deck.len()).rev() {
        let j = rng.random_range(0..=i);
        deck.swap(i, j);
    }
}

/// Where fresh decks come from. Production uses OS randomness; tests inject
/// seeded or fixed decks.
pub trait DeckSource: Send + Sync {
    fn next_deck(&self) -> Vec<Card>;
}

#[derive(Debug, Default)]
pub struct ShuffledDeck;

impl DeckSource for ShuffledDeck {
    fn next_deck(&self) -> Vec<Card> {
        let mut deck = full_deck();
        shuffle_with(&mut deck, &mut rand::rng());
        deck
    }
}

/// Reproducible decks from a ChaCha8 stream.
pub struct SeededDeck {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededDeck {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl DeckSource for SeededDeck {
    fn next_deck(&self) -> Vec<Card> {
        let mut deck = full_deck();
        shuffle_with(&mut deck, &mut *self.rng.lock());
        deck
    }
}

/// Hands out queued decks in order, then the canonical unshuffled deck.
#[derive(Default)]
pub struct FixedDeck {
    queue: Mutex<VecDeque<Vec<Card>>>,
}

impl FixedDeck {
    pub fn new(decks: impl IntoIterator<Item = Vec<Card>>) -> Self {
        Self {
            queue: Mutex::new(decks.into_iter().collect()),
        }
    }

    pub fn push(&self, deck: Vec<Card>) {
        self.queue.lock().push_back(deck);
    }
}

impl DeckSource for FixedDeck {
    fn next_deck(&self) -> Vec<Card> {
        self.queue.lock().pop_front().unwrap_or_else(full_deck)
    }
}

/// Result of dealing one deck.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub hands: [Vec<Card>; PLAYERS],
    pub agari: Card,
    pub rest: Vec<Card>,
}

/// Deal ten cards to each seat round-robin; the card after the hands is the
/// Agari.
pub fn deal_hands(deck: &[Card]) -> Result<Deal, DomainError> {
    let dealt = HAND_SIZE * PLAYERS;
    if deck.len() <= dealt {
        return Err(DomainError::validation(
            ValidationKind::Other("INVALID_DECK".into()),
            format!("deck of {} cards cannot be dealt", deck.len()),
        ));
    }

    let mut hands: [Vec<Card>; PLAYERS] = std::array::from_fn(|_| Vec::with_capacity(HAND_SIZE + 1));
    for i in 0..HAND_SIZE {
        for (seat, hand) in hands.iter_mut().enumerate() {
            hand.push(deck[i * PLAYERS + seat]);
        }
    }

    Ok(Deal {
        hands,
        agari: deck[dealt],
        rest: deck[dealt + 1..].to_vec(),
    })
}
