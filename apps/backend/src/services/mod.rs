//! Room runtime services.

pub mod game_flow;
pub mod game_machine;
pub mod persistence;
pub mod rooms;
pub mod runtime;
pub mod scheduler;
pub mod tokens;
