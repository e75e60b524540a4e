//! Card parsing from token strings (e.g., "K♥", "10♦", "JOKER")

use std::str::FromStr;

use super::cards_types::{Card, Rank, Suit, TrumpType};
use crate::errors::domain::{DomainError, ValidationKind};

fn parse_error(s: &str) -> DomainError {
    DomainError::validation(ValidationKind::ParseCard, format!("Parse card: {s}"))
}

impl FromStr for Card {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "JOKER" {
            return Ok(Card::Joker);
        }
        let suit_ch = s.chars().last().ok_or_else(|| parse_error(s))?;
        let suit = Suit::from_glyph(suit_ch).ok_or_else(|| parse_error(s))?;
        let rank_str = &s[..s.len() - suit_ch.len_utf8()];
        let rank = match rank_str {
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            _ => return Err(parse_error(s)),
        };
        Ok(Card::new(rank, suit))
    }
}

impl FromStr for TrumpType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tra" => Ok(TrumpType::Tra),
            "hel" => Ok(TrumpType::Hel),
            "daya" => Ok(TrumpType::Daya),
            "club" => Ok(TrumpType::Club),
            "zuppe" => Ok(TrumpType::Zuppe),
            _ => Err(DomainError::validation(
                ValidationKind::InvalidBid,
                format!("Unknown trump type: {s}"),
            )),
        }
    }
}

impl FromStr for Suit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Suit::from_glyph(ch).ok_or_else(|| {
                DomainError::validation(ValidationKind::ParseCard, format!("Parse suit: {s}"))
            }),
            _ => Err(DomainError::validation(
                ValidationKind::ParseCard,
                format!("Parse suit: {s}"),
            )),
        }
    }
}
