//! Persistence seams for the game runtime.

pub mod game_states;
