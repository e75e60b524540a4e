//! Game state persistence seam.
//!
//! One row per room: the whole `GameState` as a JSON blob plus a handful of
//! denormalized columns for querying. The runtime writes after every
//! persisted transition and never lets a store failure reach a player.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::scoring::{TeamScoreRecords, TeamScores};
use crate::domain::{GamePhase, GameState};
use crate::errors::domain::{DomainError, InfraErrorKind};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("snapshot (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Serialization(err) => {
                DomainError::infra(InfraErrorKind::DataCorruption, err.to_string())
            }
            StoreError::Unavailable(detail) => {
                DomainError::infra(InfraErrorKind::StoreUnavailable, detail)
            }
        }
    }
}

/// Persisted row shape.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredGameState {
    pub room_id: String,
    pub state: serde_json::Value,
    pub current_player_index: usize,
    pub game_phase: Option<GamePhase>,
    pub round_number: u32,
    pub points_to_win: u32,
    pub team_scores: TeamScores,
    pub team_score_records: TeamScoreRecords,
    pub team_assignments: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl StoredGameState {
    pub fn from_state(room_id: &str, state: &GameState) -> Result<Self, StoreError> {
        Ok(Self {
            room_id: room_id.to_string(),
            state: serde_json::to_value(state)?,
            current_player_index: state.current_player_index,
            game_phase: state.game_phase,
            round_number: state.round_number,
            points_to_win: state.points_to_win,
            team_scores: state.team_scores,
            team_score_records: state.team_score_records.clone(),
            team_assignments: serde_json::to_value(&state.team_assignments)?,
            updated_at: OffsetDateTime::now_utc(),
        })
    }

    pub fn to_state(&self) -> Result<GameState, StoreError> {
        Ok(serde_json::from_value(self.state.clone())?)
    }
}

#[async_trait]
pub trait GameStateStore: Send + Sync {
    async fn load(&self, room_id: &str) -> Result<Option<GameState>, StoreError>;
    async fn save(&self, room_id: &str, state: &GameState) -> Result<(), StoreError>;
    async fn delete(&self, room_id: &str) -> Result<(), StoreError>;
}

/// Process-local store backed by a `DashMap` of serialized rows.
#[derive(Debug, Default)]
pub struct InMemoryGameStateStore {
    rows: DashMap<String, StoredGameState>,
}

impl InMemoryGameStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, room_id: &str) -> Option<StoredGameState> {
        self.rows.get(room_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl GameStateStore for InMemoryGameStateStore {
    async fn load(&self, room_id: &str) -> Result<Option<GameState>, StoreError> {
        self.rows
            .get(room_id)
            .map(|row| row.to_state())
            .transpose()
    }

    async fn save(&self, room_id: &str, state: &GameState) -> Result<(), StoreError> {
        let row = StoredGameState::from_state(room_id, state)?;
        self.rows.insert(room_id.to_string(), row);
        Ok(())
    }

    async fn delete(&self, room_id: &str) -> Result<(), StoreError> {
        self.rows.remove(room_id);
        Ok(())
    }
}

/// Store that refuses every call; exercises the swallow-and-log path.
#[derive(Debug, Default)]
pub struct UnavailableGameStateStore;

#[async_trait]
impl GameStateStore for UnavailableGameStateStore {
    async fn load(&self, _room_id: &str) -> Result<Option<GameState>, StoreError> {
        Err(StoreError::Unavailable("store offline".into()))
    }

    async fn save(&self, _room_id: &str, _state: &GameState) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".into()))
    }

    async fn delete(&self, _room_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".into()))
    }
}
