//! Shared helpers for the backend's unit and integration tests.

pub mod ids;
pub mod logging;
