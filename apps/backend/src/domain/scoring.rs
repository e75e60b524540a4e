//! Score engine: play points and per-team score-card ledgers.

use serde::{Deserialize, Serialize};

use crate::domain::rules::TEAMS;
use crate::domain::Suit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub play: f64,
    pub total: f64,
}

pub type TeamScores = [TeamScore; TEAMS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    pub value: u8,
    pub suit: Suit,
    pub is_face_up: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamScoreRecord {
    pub cards: Vec<ScoreCard>,
    pub remembered_ten: u32,
}

pub type TeamScoreRecords = [TeamScoreRecord; TEAMS];

/// Points for `declared_pairs` (X) against `won_fields` (Y).
///
/// Y ≥ X scores `0.5(Y − X) + X − 5`; otherwise `Y − X`, which the caller
/// awards to the opposing team as a positive amount.
pub fn calculate_play_points(declared_pairs: u8, won_fields: u8) -> f64 {
    let x = f64::from(declared_pairs);
    let y = f64::from(won_fields);
    if y >= x {
        0.5 * (y - x) + x - 5.0
    } else {
        y - x
    }
}

pub const fn team_colour(team: u8) -> Suit {
    if team == 0 {
        Suit::Hearts
    } else {
        Suit::Spades
    }
}

/// Represent `points` on the team's score cards.
///
/// Remembered tens are consumed first; an exact face-up card ends the update;
/// otherwise tens are remembered and 2/3/4 cards are added face up.
pub fn update_team_score(team: u8, points: f64, record: &TeamScoreRecord) -> TeamScoreRecord {
    let mut updated = record.clone();
    let mut remaining = points;

    while remaining >= 10.0 && updated.remembered_ten > 0 {
        remaining -= 10.0;
        updated.remembered_ten -= 1;
    }

    while remaining > 0.0 {
        let exact = updated
            .cards
            .iter()
            .any(|c| c.is_face_up && f64::from(c.value) == remaining);
        if exact {
            break;
        }
        if remaining >= 10.0 {
            updated.remembered_ten += 1;
            remaining -= 10.0;
        } else {
            let value = remaining.ceil().clamp(2.0, 4.0) as u8;
            updated.cards.push(ScoreCard {
                value,
                suit: team_colour(team),
                is_face_up: true,
            });
            remaining -= f64::from(value);
        }
    }

    updated
}

/// Toggle a score card's face. Returns false for an unknown index.
pub fn flip_score_card(record: &mut TeamScoreRecord, card_index: usize) -> bool {
    match record.cards.get_mut(card_index) {
        Some(card) => {
            card.is_face_up = !card.is_face_up;
            true
        }
        None => false,
    }
}

/// Who received play points at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAward {
    pub team: u8,
    pub points: f64,
}

/// Apply the round's play points. A negative result goes to the other team as
/// its absolute value.
pub fn award_play_points(
    scores: &mut TeamScores,
    records: &mut TeamScoreRecords,
    declaring_team: u8,
    declared_pairs: u8,
    won_fields: u8,
) -> PlayAward {
    let points = calculate_play_points(declared_pairs, won_fields);
    let award = if points >= 0.0 {
        PlayAward {
            team: declaring_team,
            points,
        }
    } else {
        PlayAward {
            team: 1 - declaring_team,
            points: points.abs(),
        }
    };
    add_points(scores, records, award.team, award.points, true);
    award
}

/// Add a flat amount (e.g. a chombo penalty) to a team's totals.
pub fn add_points(
    scores: &mut TeamScores,
    records: &mut TeamScoreRecords,
    team: u8,
    points: f64,
    is_play: bool,
) {
    let idx = usize::from(team);
    if is_play {
        scores[idx].play += points;
    }
    scores[idx].total += points;
    records[idx] = update_team_score(team, points, &records[idx]);
}

/// First team at or above `points_to_win`.
pub fn winning_team(scores: &TeamScores, points_to_win: f64) -> Option<u8> {
    scores
        .iter()
        .position(|s| s.total >= points_to_win)
        .map(|idx| idx as u8)
}
