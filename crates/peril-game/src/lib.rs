//! Game rules and per-player state for Peril.
//!
//! This crate is broker-agnostic: it knows nothing about queues or codecs.
//! It exposes [`GameState`] plus the decision types the messaging layer maps
//! onto acknowledgments, keeping the rules testable without any transport.

mod error;
mod state;

pub use error::GameError;
pub use state::{GameState, LOCATIONS, MoveOutcome, WarOutcome, rank_power};
