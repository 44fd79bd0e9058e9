//! Broker abstraction layer for Peril.
//!
//! Provides the [`Broker`], [`Channel`], and [`Delivery`] traits that
//! abstract over the message broker, plus the ack-driven publish/subscribe
//! operations built on top of them ([`declare_and_bind`], [`publish`],
//! [`subscribe`]).
//!
//! The broker itself — connection management, exchange topology, dead-letter
//! routing — is an external collaborator reached through this narrow
//! interface. Two backends are provided:
//!
//! # Feature flags
//!
//! - `amqp` (default) — AMQP 0.9.1 backend via `lapin`
//! - `memory` (default) — in-process backend for tests and local runs
//!
//! # Concurrency
//!
//! A channel is owned by exactly one worker; concurrent publishers each open
//! their own channel instead of sharing one handle. Within a subscription,
//! deliveries are handled strictly one at a time.

#[cfg(feature = "amqp")]
mod amqp;
mod error;
#[cfg(feature = "memory")]
mod memory;
mod pubsub;
mod queue;

#[cfg(feature = "amqp")]
pub use amqp::{AmqpBroker, AmqpChannel, AmqpDelivery};
pub use error::BrokerError;
#[cfg(feature = "memory")]
pub use memory::{MemoryBroker, MemoryChannel, MemoryDelivery};
pub use pubsub::{declare_and_bind, publish, subscribe};
pub use queue::{AckDecision, ExchangeKind, QueueInfo, QueueKind, QueueSpec};

use std::future::Future;

use futures_util::Stream;
use peril_protocol::Envelope;

// The trait methods return explicit `impl Future + Send` rather than plain
// `async fn`: worker futures built over a generic `B: Broker` are handed to
// `tokio::spawn`, which needs them to be `Send`.

/// A connection to the broker, from which channels are opened.
pub trait Broker: Send + Sync + 'static {
    /// The channel type produced by this broker.
    type Channel: Channel;

    /// Opens a fresh channel.
    ///
    /// Each concurrent worker must own its own channel; channels are never
    /// shared across tasks.
    fn open_channel(
        &self,
    ) -> impl Future<Output = Result<Self::Channel, BrokerError>> + Send;
}

/// One broker channel: the handle used to provision, publish, and consume.
pub trait Channel: Send + Sync + 'static {
    /// One in-flight delivery handed to a consumer.
    type Delivery: Delivery;
    /// The ordered stream of deliveries produced by [`consume`](Self::consume).
    type Deliveries: Stream<Item = Self::Delivery> + Send + Unpin;

    /// Idempotently declares the queue described by `spec`, binds it to the
    /// exchange under the routing key, and attaches the well-known
    /// dead-letter exchange.
    ///
    /// Re-declaring an existing queue with identical parameters is a no-op;
    /// a parameter mismatch is surfaced to the caller, not retried.
    fn declare_queue(
        &self,
        spec: &QueueSpec,
    ) -> impl Future<Output = Result<QueueInfo, BrokerError>> + Send;

    /// Hands one encoded message to the broker for best-effort delivery.
    ///
    /// Fire-and-forget: the call succeeding means the broker accepted the
    /// message, not that any consumer saw it.
    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        envelope: Envelope,
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;

    /// Caps the number of unacknowledged deliveries this channel may hold.
    fn set_prefetch(
        &self,
        count: u16,
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;

    /// Starts consuming from `queue`, yielding deliveries in queue order.
    ///
    /// The stream ends when the channel or connection is torn down.
    fn consume(
        &self,
        queue: &str,
    ) -> impl Future<Output = Result<Self::Deliveries, BrokerError>> + Send;
}

/// One message instance requiring an explicit settle decision.
///
/// A delivery is settled exactly once: either [`ack`](Self::ack) or
/// [`nack`](Self::nack), both of which consume it.
pub trait Delivery: Send + 'static {
    /// The raw message body.
    fn body(&self) -> &[u8];

    /// Whether the broker has delivered this message before.
    fn redelivered(&self) -> bool;

    /// Permanently removes the message from the queue (terminal success).
    fn ack(self) -> impl Future<Output = Result<(), BrokerError>> + Send;

    /// Rejects the message: `requeue = true` returns it to the front of the
    /// queue for redelivery, `requeue = false` routes it to the dead-letter
    /// exchange.
    fn nack(self, requeue: bool) -> impl Future<Output = Result<(), BrokerError>> + Send;
}
