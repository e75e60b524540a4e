//! Reconnect-token index for one room.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::Player;

/// `token -> player_id`. Rebuilt from the persisted players on load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconnectRegistry {
    tokens: HashMap<String, String>,
}

impl ReconnectRegistry {
    pub fn issue() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn rebuild(players: &[Player]) -> Self {
        let mut registry = Self::default();
        for p in players.iter().filter(|p| !p.reconnect_token.is_empty()) {
            registry.register(&p.reconnect_token, &p.player_id);
        }
        registry
    }

    pub fn register(&mut self, token: &str, player_id: &str) {
        self.tokens.insert(token.to_string(), player_id.to_string());
    }

    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    /// Drop every token that points at `player_id`.
    pub fn revoke_player(&mut self, player_id: &str) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, id| id != player_id);
        before - self.tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
