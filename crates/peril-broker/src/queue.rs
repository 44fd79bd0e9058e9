//! Queue descriptors, durability policy, and acknowledgment decisions.

use std::fmt;

// ---------------------------------------------------------------------------
// Durability policy
// ---------------------------------------------------------------------------

/// The two-valued durability policy for a queue.
///
/// The policy drives all three declare flags at once:
///
/// - `Durable` ⇒ durable, not auto-deleted, not exclusive — the queue
///   survives a broker restart and outlives its consumer.
/// - `Transient` ⇒ the opposite on all three — the queue disappears with
///   its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Durable,
    Transient,
}

impl QueueKind {
    /// Whether the queue survives a broker restart.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable)
    }

    /// Whether the broker deletes the queue when its last consumer goes away.
    pub fn auto_delete(&self) -> bool {
        !self.is_durable()
    }

    /// Whether the queue is restricted to the declaring connection.
    pub fn exclusive(&self) -> bool {
        !self.is_durable()
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable => f.write_str("durable"),
            Self::Transient => f.write_str("transient"),
        }
    }
}

// ---------------------------------------------------------------------------
// Queue descriptor
// ---------------------------------------------------------------------------

/// Everything needed to provision one queue: its name, the exchange and
/// routing key it binds to, and the durability policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
    pub kind: QueueKind,
}

impl QueueSpec {
    pub fn new(
        exchange: impl Into<String>,
        queue: impl Into<String>,
        routing_key: impl Into<String>,
        kind: QueueKind,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            queue: queue.into(),
            routing_key: routing_key.into(),
            kind,
        }
    }
}

/// Metadata returned by a successful queue declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueInfo {
    /// The resolved queue name.
    pub name: String,
    /// Messages currently sitting in the queue.
    pub messages: u32,
    /// Consumers currently attached to the queue.
    pub consumers: u32,
}

// ---------------------------------------------------------------------------
// Exchange kinds (used by the in-memory backend's topology)
// ---------------------------------------------------------------------------

/// Routing behavior of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    /// Exact routing-key match.
    Direct,
    /// Dot-separated pattern match with `*` as a one-segment wildcard.
    Topic,
}

// ---------------------------------------------------------------------------
// Acknowledgment decisions
// ---------------------------------------------------------------------------

/// The handler's verdict on one delivery.
///
/// Decided exclusively by the handler, consumed exactly once by the
/// delivery loop immediately after the handler returns. The enum is closed,
/// so unlike loosely-typed renditions of this protocol there is no
/// "unrecognized decision" case to paper over with a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// Terminal success: remove the message from the queue.
    Ack,
    /// Transient failure: return the message to the front of the queue
    /// for redelivery (e.g. the event doesn't apply to this consumer yet).
    NackRequeue,
    /// Unrecoverable for this consumer: remove the message without success
    /// semantics, routing it to the dead-letter exchange.
    NackDiscard,
}

// =========================================================================
// Tests
// =========================================================================
