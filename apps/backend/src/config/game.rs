use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Runtime timing and defaults for rooms.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// How long a disconnected player keeps their seat before it is vacated.
    pub disconnect_grace: Duration,
    /// Delay before sequenced broadcasts (trick completion, phase changes).
    pub broadcast_delay: Duration,
    /// Delay between game-over and the room's full reset.
    pub game_over_reset: Duration,
    pub default_points_to_win: u32,
    /// Rooms idle longer than this are abandoned by the sweep.
    pub room_idle_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            disconnect_grace: Duration::from_millis(15_000),
            broadcast_delay: Duration::from_millis(3_000),
            game_over_reset: Duration::from_millis(5_000),
            default_points_to_win: 17,
            room_idle_ttl: Duration::from_secs(3_600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl GameConfig {
    /// Build from `MEITRA_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            disconnect_grace: millis_var("MEITRA_DISCONNECT_GRACE_MS", defaults.disconnect_grace)?,
            broadcast_delay: millis_var("MEITRA_BROADCAST_DELAY_MS", defaults.broadcast_delay)?,
            game_over_reset: millis_var("MEITRA_GAME_OVER_RESET_MS", defaults.game_over_reset)?,
            default_points_to_win: parsed_var(
                "MEITRA_DEFAULT_POINTS_TO_WIN",
                defaults.default_points_to_win,
            )?,
            room_idle_ttl: secs_var("MEITRA_ROOM_IDLE_TTL_SECS", defaults.room_idle_ttl)?,
            sweep_interval: secs_var("MEITRA_SWEEP_INTERVAL_SECS", defaults.sweep_interval)?,
        })
    }

    /// No delays; timers fire on the next scheduler tick.
    pub fn for_tests() -> Self {
        Self {
            disconnect_grace: Duration::ZERO,
            broadcast_delay: Duration::ZERO,
            game_over_reset: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{name} is not a valid number: '{raw}'"))),
        Err(_) => Ok(default),
    }
}

fn millis_var(name: &str, default: Duration) -> Result<Duration, AppError> {
    parsed_var(name, default.as_millis() as u64).map(Duration::from_millis)
}

fn secs_var(name: &str, default: Duration) -> Result<Duration, AppError> {
    parsed_var(name, default.as_secs()).map(Duration::from_secs)
}
