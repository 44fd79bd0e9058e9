//! Error types for the broker layer.
//!
//! The taxonomy mirrors how failures are handled: connection and channel
//! errors are fatal at startup, provisioning errors are fatal to one
//! subscription and surfaced to the caller without retry, and per-message
//! problems are expressed through [`AckDecision`](crate::AckDecision)
//! rather than errors.

use peril_protocol::ProtocolError;

/// Errors that can occur in the broker layer.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Opening the broker connection failed. Fatal at startup.
    #[cfg(feature = "amqp")]
    #[error("broker connection failed: {0}")]
    Connect(#[source] lapin::Error),

    /// Opening a channel on an established connection failed.
    #[cfg(feature = "amqp")]
    #[error("channel open failed: {0}")]
    ChannelOpen(#[source] lapin::Error),

    /// The broker rejected a queue declare or bind.
    #[cfg(feature = "amqp")]
    #[error("queue declare failed: {0}")]
    Declare(#[source] lapin::Error),

    /// Handing a message to the broker failed.
    #[cfg(feature = "amqp")]
    #[error("publish failed: {0}")]
    Publish(#[source] lapin::Error),

    /// Starting a consumer or applying flow control failed.
    #[cfg(feature = "amqp")]
    #[error("consume failed: {0}")]
    Consume(#[source] lapin::Error),

    /// Acknowledging or rejecting a delivery failed.
    #[cfg(feature = "amqp")]
    #[error("settle failed: {0}")]
    Settle(#[source] lapin::Error),

    /// A queue was re-declared with parameters that don't match the
    /// existing queue.
    #[error("queue declare rejected: {0}")]
    DeclareRejected(String),

    /// A publish or bind referenced an exchange that doesn't exist.
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    /// A consume referenced a queue that was never declared.
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    /// Encoding a value for publish failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
