#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

//! Mei-Tra game server core: rule engines, per-room state machines, room
//! and seat management, and the runtime that drives them.

pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod protocol;
pub mod repos;
pub mod services;
pub mod ws;

pub use config::GameConfig;
pub use error::AppError;
pub use errors::ErrorCode;
pub use services::runtime::GameRuntime;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    meitra_test_support::logging::init();
}
