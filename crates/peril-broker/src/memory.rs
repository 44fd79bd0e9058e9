//! In-process broker backend.
//!
//! Implements just enough broker semantics for integration tests and local
//! runs without a broker daemon: direct and topic exchanges (single-segment
//! `*` wildcard), FIFO queues, requeue to the front of the queue, and
//! dead-letter routing on discard. Not intended for production use.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};
use peril_protocol::{Envelope, routing};
use tokio::sync::{Mutex, Notify};

use crate::{
    Broker, BrokerError, Channel, Delivery, ExchangeKind, QueueInfo, QueueSpec,
};

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

struct Binding {
    exchange: String,
    queue: String,
    pattern: String,
}

struct StoredMessage {
    routing_key: String,
    envelope: Envelope,
    redelivered: bool,
}

struct QueueState {
    spec: QueueSpec,
    pending: VecDeque<StoredMessage>,
    notify: Arc<Notify>,
    consumers: u32,
    consumer_prefetch: Option<u16>,
}

#[derive(Default)]
struct Topology {
    exchanges: HashMap<String, ExchangeKind>,
    bindings: Vec<Binding>,
    queues: HashMap<String, QueueState>,
}

impl Topology {
    /// Routes one message through `exchange` to every bound queue.
    ///
    /// Messages that match no binding are dropped, like a real broker.
    fn route(
        &mut self,
        exchange: &str,
        routing_key: &str,
        envelope: Envelope,
        redelivered: bool,
    ) -> Result<(), BrokerError> {
        let kind = *self
            .exchanges
            .get(exchange)
            .ok_or_else(|| BrokerError::UnknownExchange(exchange.to_string()))?;

        let targets: Vec<String> = self
            .bindings
            .iter()
            .filter(|b| b.exchange == exchange && matches(kind, &b.pattern, routing_key))
            .map(|b| b.queue.clone())
            .collect();

        for queue in targets {
            if let Some(state) = self.queues.get_mut(&queue) {
                state.pending.push_back(StoredMessage {
                    routing_key: routing_key.to_string(),
                    envelope: envelope.clone(),
                    redelivered,
                });
                state.notify.notify_one();
            }
        }
        Ok(())
    }
}

/// Returns whether `routing_key` matches `pattern` under the exchange kind.
fn matches(kind: ExchangeKind, pattern: &str, routing_key: &str) -> bool {
    match kind {
        ExchangeKind::Direct => pattern == routing_key,
        ExchangeKind::Topic => {
            let pattern: Vec<&str> = pattern.split('.').collect();
            let key: Vec<&str> = routing_key.split('.').collect();
            pattern.len() == key.len()
                && pattern
                    .iter()
                    .zip(&key)
                    .all(|(p, k)| *p == "*" || p == k)
        }
    }
}

// ---------------------------------------------------------------------------
// Broker
// ---------------------------------------------------------------------------

/// An in-process broker shared by every channel opened from it.
#[derive(Clone)]
pub struct MemoryBroker {
    topology: Arc<Mutex<Topology>>,
}

impl MemoryBroker {
    /// Creates an empty broker with no exchanges.
    pub fn new() -> Self {
        Self {
            topology: Arc::new(Mutex::new(Topology::default())),
        }
    }

    /// Declares an exchange. Idempotent for a matching kind.
    pub async fn declare_exchange(&self, name: &str, kind: ExchangeKind) {
        self.topology
            .lock()
            .await
            .exchanges
            .insert(name.to_string(), kind);
    }

    /// Number of messages currently queued on `queue` (test observability).
    pub async fn queued(&self, queue: &str) -> usize {
        self.topology
            .lock()
            .await
            .queues
            .get(queue)
            .map_or(0, |q| q.pending.len())
    }

    /// Number of consumers attached to `queue` (test observability).
    pub async fn consumers(&self, queue: &str) -> u32 {
        self.topology
            .lock()
            .await
            .queues
            .get(queue)
            .map_or(0, |q| q.consumers)
    }

    /// The prefetch applied by the consumer attached to `queue`, if any
    /// (test observability).
    pub async fn consumer_prefetch(&self, queue: &str) -> Option<u16> {
        self.topology
            .lock()
            .await
            .queues
            .get(queue)
            .and_then(|q| q.consumer_prefetch)
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker for MemoryBroker {
    type Channel = MemoryChannel;

    async fn open_channel(&self) -> Result<MemoryChannel, BrokerError> {
        Ok(MemoryChannel {
            topology: Arc::clone(&self.topology),
            prefetch: std::sync::Mutex::new(None),
        })
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// One in-process channel.
pub struct MemoryChannel {
    topology: Arc<Mutex<Topology>>,
    prefetch: std::sync::Mutex<Option<u16>>,
}

impl Channel for MemoryChannel {
    type Delivery = MemoryDelivery;
    type Deliveries = BoxStream<'static, MemoryDelivery>;

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<QueueInfo, BrokerError> {
        let mut topology = self.topology.lock().await;

        if !topology.exchanges.contains_key(&spec.exchange) {
            return Err(BrokerError::UnknownExchange(spec.exchange.clone()));
        }

        if let Some(existing) = topology.queues.get(&spec.queue) {
            // Idempotent only for an identical declaration.
            if existing.spec != *spec {
                return Err(BrokerError::DeclareRejected(format!(
                    "queue '{}' already declared with different parameters",
                    spec.queue
                )));
            }
        } else {
            topology.queues.insert(
                spec.queue.clone(),
                QueueState {
                    spec: spec.clone(),
                    pending: VecDeque::new(),
                    notify: Arc::new(Notify::new()),
                    consumers: 0,
                    consumer_prefetch: None,
                },
            );
        }

        let already_bound = topology.bindings.iter().any(|b| {
            b.exchange == spec.exchange
                && b.queue == spec.queue
                && b.pattern == spec.routing_key
        });
        if !already_bound {
            topology.bindings.push(Binding {
                exchange: spec.exchange.clone(),
                queue: spec.queue.clone(),
                pattern: spec.routing_key.clone(),
            });
        }

        let state = &topology.queues[&spec.queue];
        Ok(QueueInfo {
            name: spec.queue.clone(),
            messages: state.pending.len() as u32,
            consumers: state.consumers,
        })
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        envelope: Envelope,
    ) -> Result<(), BrokerError> {
        self.topology
            .lock()
            .await
            .route(exchange, routing_key, envelope, false)
    }

    async fn set_prefetch(&self, count: u16) -> Result<(), BrokerError> {
        *self.prefetch.lock().expect("prefetch lock poisoned") = Some(count);
        Ok(())
    }

    async fn consume(&self, queue: &str) -> Result<Self::Deliveries, BrokerError> {
        let prefetch = *self.prefetch.lock().expect("prefetch lock poisoned");
        let notify = {
            let mut topology = self.topology.lock().await;
            let state = topology
                .queues
                .get_mut(queue)
                .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;
            state.consumers += 1;
            state.consumer_prefetch = prefetch;
            Arc::clone(&state.notify)
        };

        let topology = Arc::clone(&self.topology);
        let queue = queue.to_string();
        let deliveries =
            futures_util::stream::unfold((topology, queue, notify), |ctx| async move {
                let message = {
                    let (topology, queue, notify) = &ctx;
                    loop {
                        // Register interest before checking the queue so a
                        // publish between the check and the await is not lost.
                        let notified = notify.notified();
                        tokio::pin!(notified);
                        notified.as_mut().enable();

                        let popped = {
                            let mut topo = topology.lock().await;
                            topo.queues
                                .get_mut(queue.as_str())
                                .and_then(|q| q.pending.pop_front())
                        };
                        if let Some(message) = popped {
                            break message;
                        }
                        notified.await;
                    }
                };
                let delivery = MemoryDelivery {
                    topology: Arc::clone(&ctx.0),
                    queue: ctx.1.clone(),
                    message,
                };
                Some((delivery, ctx))
            });
        Ok(deliveries.boxed())
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// One in-process delivery.
pub struct MemoryDelivery {
    topology: Arc<Mutex<Topology>>,
    queue: String,
    message: StoredMessage,
}

impl Delivery for MemoryDelivery {
    fn body(&self) -> &[u8] {
        &self.message.envelope.body
    }

    fn redelivered(&self) -> bool {
        self.message.redelivered
    }

    async fn ack(self) -> Result<(), BrokerError> {
        // The message was removed from the queue when it was delivered.
        Ok(())
    }

    async fn nack(mut self, requeue: bool) -> Result<(), BrokerError> {
        let mut topology = self.topology.lock().await;
        if requeue {
            self.message.redelivered = true;
            if let Some(state) = topology.queues.get_mut(&self.queue) {
                state.pending.push_front(self.message);
                state.notify.notify_one();
            }
            return Ok(());
        }

        // Discard: dead-letter under the original routing key. A broker
        // with no dead-letter exchange configured drops the message.
        let StoredMessage {
            routing_key,
            envelope,
            ..
        } = self.message;
        let _ = topology.route(routing::EXCHANGE_PERIL_DEAD_LETTER, &routing_key, envelope, false);
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_matching_is_exact() {
        assert!(matches(ExchangeKind::Direct, "pause", "pause"));
        assert!(!matches(ExchangeKind::Direct, "pause", "pause.alice"));
    }

    #[test]
    fn test_topic_wildcard_matches_one_segment() {
        assert!(matches(ExchangeKind::Topic, "army_moves.*", "army_moves.alice"));
        assert!(matches(ExchangeKind::Topic, "war.*", "war.bob"));
        assert!(!matches(ExchangeKind::Topic, "army_moves.*", "army_moves"));
        assert!(!matches(ExchangeKind::Topic, "army_moves.*", "army_moves.a.b"));
        assert!(!matches(ExchangeKind::Topic, "war.*", "game_logs.alice"));
    }

    #[test]
    fn test_topic_exact_key_still_matches() {
        assert!(matches(ExchangeKind::Topic, "game_logs.alice", "game_logs.alice"));
        assert!(!matches(ExchangeKind::Topic, "game_logs.alice", "game_logs.bob"));
    }
}
