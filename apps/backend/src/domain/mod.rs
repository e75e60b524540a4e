//! Domain layer: pure game logic types and helpers.

pub mod bidding;
pub mod cards_logic;
pub mod cards_parsing;
pub mod cards_serde;
pub mod cards_types;
pub mod chombo;
pub mod dealing;
pub mod rules;
pub mod scoring;
pub mod state;
pub mod tricks;

#[cfg(test)]
mod test_gens;
#[cfg(test)]
mod test_prelude;
#[cfg(test)]
mod tests_props_trick_winner;

// Re-exports for ergonomics
pub use bidding::{BlowDeclaration, BlowState};
pub use cards_logic::{card_strength, card_suit, trump_strength};
pub use cards_types::{Card, Rank, Suit, TrumpType};
pub use chombo::{ChomboCheck, ChomboLedger, ChomboViolation, ViolationType};
pub use dealing::{deal_hands, DeckSource, FixedDeck, SeededDeck, ShuffledDeck};
pub use scoring::{TeamScore, TeamScoreRecord};
pub use state::{GamePhase, GameState, PlayState, Player};
pub use tricks::{CompletedField, Field};
