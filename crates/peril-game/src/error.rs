//! Error types for local game commands.

use peril_protocol::UnitId;

/// Errors returned by local player commands.
///
/// Inbound event handling never returns these — event outcomes are
/// expressed through [`MoveOutcome`](crate::MoveOutcome) and
/// [`WarOutcome`](crate::WarOutcome) instead.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The named territory is not on the map.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// The referenced unit does not belong to this player.
    #[error("unknown unit: {0}")]
    UnknownUnit(UnitId),

    /// A move was requested with no units selected.
    #[error("no units selected")]
    NoUnitsSelected,

    /// The game is paused; movement is suspended until resume.
    #[error("game is paused")]
    Paused,
}
