//! Chombo (rule violation) engine.
//!
//! Violations are recorded when the offending action happens and are never a
//! reason to reject the action on their own. Only the opposing team can report
//! one, once, before it expires at the round boundary.

use serde::{Deserialize, Serialize};

use crate::domain::bidding::now_millis;
use crate::domain::{Card, Rank};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationType {
    NegriForget,
    FourJack,
    LastTanzen,
    WrongBroken,
    WrongOpen,
}

impl ViolationType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ViolationType::NegriForget => "negri-forget",
            ViolationType::FourJack => "four-jack",
            ViolationType::LastTanzen => "last-tanzen",
            ViolationType::WrongBroken => "wrong-broken",
            ViolationType::WrongOpen => "wrong-open",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChomboViolation {
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub player_id: String,
    pub timestamp: i64,
    pub reported_by: Option<String>,
    pub is_expired: bool,
}

impl ChomboViolation {
    pub fn is_reportable(&self) -> bool {
        !self.is_expired && self.reported_by.is_none()
    }
}

/// Action-specific context for violation detection.
#[derive(Debug, Clone, Copy)]
pub enum ChomboCheck<'a> {
    /// Declarer plays while the Negri is still unset.
    NegriForget { negri: Option<Card> },
    /// Player acts while holding all four Jacks.
    FourJack {
        hand: &'a [Card],
        revealed_broken: bool,
    },
    /// Player plays `card` from `hand` (before removal).
    LastTanzen { hand: &'a [Card], card: Card },
    /// Player claims a broken hand.
    DeclareBroken { hand: &'a [Card] },
    /// Player declares an open hand.
    DeclareOpen { can_declare_open: bool },
}

pub fn detect(check: ChomboCheck<'_>) -> Option<ViolationType> {
    let violated = match check {
        ChomboCheck::NegriForget { negri } => negri.is_none(),
        ChomboCheck::FourJack {
            hand,
            revealed_broken,
        } => has_required_broken(hand) && !revealed_broken,
        ChomboCheck::LastTanzen { hand, card } => card.is_joker() && hand == [Card::Joker],
        ChomboCheck::DeclareBroken { hand } => !has_broken(hand) && !has_required_broken(hand),
        ChomboCheck::DeclareOpen { can_declare_open } => !can_declare_open,
    };
    if !violated {
        return None;
    }
    Some(match check {
        ChomboCheck::NegriForget { .. } => ViolationType::NegriForget,
        ChomboCheck::FourJack { .. } => ViolationType::FourJack,
        ChomboCheck::LastTanzen { .. } => ViolationType::LastTanzen,
        ChomboCheck::DeclareBroken { .. } => ViolationType::WrongBroken,
        ChomboCheck::DeclareOpen { .. } => ViolationType::WrongOpen,
    })
}

/// A hand with no A/K/Q/J, or whose only picture card is a single Queen.
pub fn has_broken(hand: &[Card]) -> bool {
    let count = |wanted: &[Rank]| {
        hand.iter()
            .filter(|c| c.rank().is_some_and(|r| wanted.contains(&r)))
            .count()
    };
    let pictures = count(&[Rank::Ace, Rank::King, Rank::Queen, Rank::Jack]);
    let non_queen_pictures = count(&[Rank::Ace, Rank::King, Rank::Jack]);
    let queens = count(&[Rank::Queen]);
    pictures == 0 || (non_queen_pictures == 0 && queens == 1)
}

/// A hand holding all four Jacks must be revealed.
pub fn has_required_broken(hand: &[Card]) -> bool {
    hand.iter().filter(|c| c.is_jack()).count() == 4
}

/// Per-room violation ledger, persisted with the game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChomboLedger {
    violations: Vec<ChomboViolation>,
}

impl ChomboLedger {
    /// Run `check` for `player_id`; a detected violation is recorded unless an
    /// identical reportable one is already on file.
    pub fn check_violations(
        &mut self,
        player_id: &str,
        check: ChomboCheck<'_>,
    ) -> Option<ChomboViolation> {
        let violation_type = detect(check)?;
        self.record(player_id, violation_type)
    }

    pub fn record(
        &mut self,
        player_id: &str,
        violation_type: ViolationType,
    ) -> Option<ChomboViolation> {
        let duplicate = self.violations.iter().any(|v| {
            v.player_id == player_id && v.violation_type == violation_type && v.is_reportable()
        });
        if duplicate {
            return None;
        }
        let violation = ChomboViolation {
            violation_type,
            player_id: player_id.to_string(),
            timestamp: now_millis(),
            reported_by: None,
            is_expired: false,
        };
        self.violations.push(violation.clone());
        Some(violation)
    }

    /// Mark the matching violation reported. Same-team reports are refused.
    pub fn report(
        &mut self,
        reporter_id: &str,
        reporter_team: u8,
        violator_id: &str,
        violator_team: u8,
        violation_type: ViolationType,
    ) -> Result<ChomboViolation, DomainError> {
        if reporter_team == violator_team {
            return Err(DomainError::validation(
                ValidationKind::InvalidReport,
                "cannot report a player on your own team",
            ));
        }
        let matches = |v: &ChomboViolation| {
            v.player_id == violator_id && v.violation_type == violation_type && !v.is_expired
        };
        if let Some(v) = self
            .violations
            .iter_mut()
            .find(|v| matches(v) && v.reported_by.is_none())
        {
            v.reported_by = Some(reporter_id.to_string());
            return Ok(v.clone());
        }
        if self.violations.iter().any(matches) {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyReported,
                format!("{} by {violator_id} was already reported", violation_type.as_str()),
            ));
        }
        Err(DomainError::not_found(
            NotFoundKind::Violation,
            format!("no {} by {violator_id}", violation_type.as_str()),
        ))
    }

    pub fn expire_violations(&mut self) {
        for v in &mut self.violations {
            v.is_expired = true;
        }
    }

    pub fn active_violations(&self) -> impl Iterator<Item = &ChomboViolation> {
        self.violations.iter().filter(|v| v.is_reportable())
    }

    pub fn all(&self) -> &[ChomboViolation] {
        &self.violations
    }
}
