//! Unified error type for the Peril meta-crate.

use peril_broker::BrokerError;
use peril_game::GameError;
use peril_protocol::ProtocolError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `peril` meta-crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant auto-generates `From` impls, so the `?` operator converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PerilError {
    /// A codec-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A broker-level error (connect, declare, publish, consume, settle).
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// A game-rule error (unknown location/unit, empty selection, paused).
    #[error(transparent)]
    Game(#[from] GameError),

    /// The log journal could not be opened or written.
    #[error("log journal: {0}")]
    Journal(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_game_error() {
        let err = GameError::Paused;
        let peril_err: PerilError = err.into();
        assert!(matches!(peril_err, PerilError::Game(_)));
        assert!(peril_err.to_string().contains("paused"));
    }

    #[test]
    fn test_from_broker_error() {
        let err = BrokerError::UnknownExchange("peril_topic".into());
        let peril_err: PerilError = err.into();
        assert!(matches!(peril_err, PerilError::Broker(_)));
        assert!(peril_err.to_string().contains("peril_topic"));
    }
}
