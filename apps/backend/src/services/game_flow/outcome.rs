use crate::protocol::events::OutboundEvent;

/// Who receives an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Audience {
    /// Every connected player in the room.
    Room,
    /// A single connection.
    Connection(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    pub audience: Audience,
    pub event: OutboundEvent,
}

impl GameEvent {
    pub fn room(event: OutboundEvent) -> Self {
        Self {
            audience: Audience::Room,
            event,
        }
    }

    pub fn to_connection(connection_id: impl Into<String>, event: OutboundEvent) -> Self {
        Self {
            audience: Audience::Connection(connection_id.into()),
            event,
        }
    }
}

/// Deferred transitions the runtime runs on a timer, each under the room lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Seal the full field after the broadcast delay.
    CompleteField,
    /// Redeal after a broken hand was revealed.
    FinalizeBroken { player_id: String },
    /// Start the next round after results were shown.
    NextRound,
    /// Return a finished room to waiting.
    GameOverReset,
    /// Restart the round after a newcomer took over a vacated seat.
    RestartRound,
    /// Give up a disconnected player's seat once the grace period ends.
    ReapDisconnected { player_id: String },
}

/// Result of one use case: what to send now, what to send after the
/// broadcast delay, and what to run later.
#[derive(Debug, Default)]
pub struct UseCaseOutcome {
    pub events: Vec<GameEvent>,
    pub delayed: Vec<GameEvent>,
    pub follow_ups: Vec<FollowUp>,
    /// Snapshot the room's game state after dispatch.
    pub persist: bool,
    /// The room emptied out and should be torn down.
    pub room_closed: bool,
    /// Issued to a joining player for later reconnects.
    pub reconnect_token: Option<String>,
}

impl UseCaseOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persisted() -> Self {
        Self {
            persist: true,
            ..Self::default()
        }
    }

    pub fn emit(&mut self, event: OutboundEvent) -> &mut Self {
        self.events.push(GameEvent::room(event));
        self
    }

    pub fn emit_to(&mut self, connection_id: &str, event: OutboundEvent) -> &mut Self {
        if !connection_id.is_empty() {
            self.events
                .push(GameEvent::to_connection(connection_id, event));
        }
        self
    }

    pub fn emit_later(&mut self, event: OutboundEvent) -> &mut Self {
        self.delayed.push(GameEvent::room(event));
        self
    }

    pub fn emit_later_to(&mut self, connection_id: &str, event: OutboundEvent) -> &mut Self {
        if !connection_id.is_empty() {
            self.delayed
                .push(GameEvent::to_connection(connection_id, event));
        }
        self
    }

    pub fn then(&mut self, follow_up: FollowUp) -> &mut Self {
        self.follow_ups.push(follow_up);
        self
    }

    pub fn merge(&mut self, other: UseCaseOutcome) {
        self.events.extend(other.events);
        self.delayed.extend(other.delayed);
        self.follow_ups.extend(other.follow_ups);
        self.persist |= other.persist;
        self.room_closed |= other.room_closed;
        if other.reconnect_token.is_some() {
            self.reconnect_token = other.reconnect_token;
        }
    }

    /// Names of the immediate events, in order.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.event.name()).collect()
    }

    pub fn delayed_names(&self) -> Vec<&'static str> {
        self.delayed.iter().map(|e| e.event.name()).collect()
    }
}
