//! Core card-related types: Card, Rank, Suit, TrumpType

use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    pub const fn glyph(self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
            Suit::Spades => '♠',
        }
    }

    pub fn from_glyph(ch: char) -> Option<Suit> {
        match ch {
            '♥' => Some(Suit::Hearts),
            '♦' => Some(Suit::Diamonds),
            '♣' => Some(Suit::Clubs),
            '♠' => Some(Suit::Spades),
            _ => None,
        }
    }

    /// The other suit of the same colour.
    pub const fn partner(self) -> Suit {
        match self {
            Suit::Hearts => Suit::Diamonds,
            Suit::Diamonds => Suit::Hearts,
            Suit::Clubs => Suit::Spades,
            Suit::Spades => Suit::Clubs,
        }
    }
}

/// Declared trump. `Tra` is no-trump and ranks above every suit trump.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TrumpType {
    Tra,
    Hel,
    Daya,
    Club,
    Zuppe,
}

impl TrumpType {
    pub const ALL: [TrumpType; 5] = [
        TrumpType::Tra,
        TrumpType::Hel,
        TrumpType::Daya,
        TrumpType::Club,
        TrumpType::Zuppe,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TrumpType::Tra => "tra",
            TrumpType::Hel => "hel",
            TrumpType::Daya => "daya",
            TrumpType::Club => "club",
            TrumpType::Zuppe => "zuppe",
        }
    }

    /// Trump suit, `None` for tra.
    pub const fn suit(self) -> Option<Suit> {
        match self {
            TrumpType::Tra => None,
            TrumpType::Hel => Some(Suit::Hearts),
            TrumpType::Daya => Some(Suit::Diamonds),
            TrumpType::Club => Some(Suit::Clubs),
            TrumpType::Zuppe => Some(Suit::Spades),
        }
    }
}

impl From<Suit> for TrumpType {
    fn from(suit: Suit) -> Self {
        match suit {
            Suit::Hearts => TrumpType::Hel,
            Suit::Diamonds => TrumpType::Daya,
            Suit::Clubs => TrumpType::Club,
            Suit::Spades => TrumpType::Zuppe,
        }
    }
}

impl TryFrom<TrumpType> for Suit {
    type Error = DomainError;

    fn try_from(trump: TrumpType) -> Result<Self, Self::Error> {
        trump.suit().ok_or_else(|| {
            DomainError::validation(
                ValidationKind::InvalidTrumpConversion,
                "Cannot convert tra to Suit",
            )
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rank {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 10] = [
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Face value: 5..10, J=11, Q=12, K=13, A=14.
    pub const fn value(self) -> u32 {
        match self {
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
            Rank::Ace => 14,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }

    pub const fn is_picture(self) -> bool {
        matches!(self, Rank::Jack | Rank::Queen | Rank::King | Rank::Ace)
    }
}

/// A playing card. The Joker carries no rank or suit of its own.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Card {
    Joker,
    Standard { rank: Rank, suit: Suit },
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Card::Standard { rank, suit }
    }

    pub const fn is_joker(&self) -> bool {
        matches!(self, Card::Joker)
    }

    pub const fn is_jack(&self) -> bool {
        matches!(
            self,
            Card::Standard {
                rank: Rank::Jack,
                ..
            }
        )
    }

    pub const fn rank(&self) -> Option<Rank> {
        match self {
            Card::Joker => None,
            Card::Standard { rank, .. } => Some(*rank),
        }
    }

    /// Printed suit, ignoring any trump or Joker substitution.
    pub const fn printed_suit(&self) -> Option<Suit> {
        match self {
            Card::Joker => None,
            Card::Standard { suit, .. } => Some(*suit),
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Card::Joker => write!(f, "JOKER"),
            Card::Standard { rank, suit } => write!(f, "{}{}", rank.symbol(), suit.glyph()),
        }
    }
}

impl std::fmt::Display for TrumpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
