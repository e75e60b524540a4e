use std::ops::RangeInclusive;

pub const PLAYERS: usize = 4;
pub const TEAMS: usize = 2;
pub const HAND_SIZE: usize = 10;
pub const DECK_SIZE: usize = HAND_SIZE * PLAYERS + 1;
pub const TRICKS_PER_ROUND: usize = HAND_SIZE;

pub const MIN_PAIRS: u8 = 6;
pub const MAX_PAIRS: u8 = TRICKS_PER_ROUND as u8;

/// Points awarded to the team that reports a chombo.
pub const CHOMBO_PENALTY: f64 = 5.0;

/// Zero-based trick index of the Tanzen trick (the ninth of ten).
pub const TANZEN_TRICK_INDEX: usize = TRICKS_PER_ROUND - 2;

pub fn valid_pairs_range() -> RangeInclusive<u8> {
    MIN_PAIRS..=MAX_PAIRS
}

/// Team of a seat when teams alternate around the table.
pub const fn alternating_team(seat: usize) -> u8 {
    (seat % TEAMS) as u8
}
