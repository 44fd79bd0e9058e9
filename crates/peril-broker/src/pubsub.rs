//! The publish / provision / subscribe operations.
//!
//! These are the generic entry points the rest of the system uses. They are
//! parameterized over the payload type and the codec, so the same machinery
//! carries JSON gameplay traffic and MessagePack log records — the codec is
//! a per-call-site choice, not a property of the channel.

use std::future::Future;

use futures_util::StreamExt;
use peril_protocol::Codec;
use serde::{Serialize, de::DeserializeOwned};

use crate::{AckDecision, Broker, BrokerError, Channel, Delivery, QueueInfo, QueueSpec};

/// Provisions the queue described by `spec` on a fresh channel.
///
/// Returns the channel (usable for subsequent consume and publish calls)
/// together with the resolved queue metadata. Declaration errors are
/// surfaced to the caller, not retried.
pub async fn declare_and_bind<B: Broker>(
    broker: &B,
    spec: &QueueSpec,
) -> Result<(B::Channel, QueueInfo), BrokerError> {
    let channel = broker.open_channel().await?;
    let info = channel.declare_queue(spec).await?;
    tracing::debug!(
        queue = %info.name,
        exchange = %spec.exchange,
        routing_key = %spec.routing_key,
        kind = %spec.kind,
        "queue provisioned"
    );
    Ok((channel, info))
}

/// Encodes `value` with `codec` and hands it to the broker under
/// `exchange`/`routing_key`.
///
/// Exactly one message is handed to the broker per call; there is no
/// internal retry. Encode failures abort the call before anything is sent.
pub async fn publish<Ch, C, T>(
    channel: &Ch,
    exchange: &str,
    routing_key: &str,
    codec: &C,
    value: &T,
) -> Result<(), BrokerError>
where
    Ch: Channel,
    C: Codec,
    T: Serialize,
{
    let envelope = codec.seal(value)?;
    channel.publish(exchange, routing_key, envelope).await
}

/// Provisions a queue and runs its delivery loop until the underlying
/// stream closes.
///
/// For each delivery, in order and one at a time: decode the body with
/// `codec`, invoke `handler` with the decoded value, and settle according
/// to the returned [`AckDecision`]:
///
/// - `Ack` — remove the message (terminal success).
/// - `NackRequeue` — return it to the front of the queue for redelivery.
/// - `NackDiscard` — remove it without success semantics (dead-letter).
///
/// A delivery that fails to decode is a poison message: it is logged,
/// discarded to the dead-letter exchange, and the loop continues — one bad
/// message never takes down the subscription.
///
/// `prefetch` caps the number of unacknowledged in-flight deliveries; pass
/// `None` for unbounded (acceptable only for low-volume control traffic).
pub async fn subscribe<B, C, T, H, F>(
    broker: &B,
    spec: QueueSpec,
    codec: C,
    prefetch: Option<u16>,
    mut handler: H,
) -> Result<(), BrokerError>
where
    B: Broker,
    C: Codec,
    T: DeserializeOwned + Send,
    H: FnMut(T) -> F + Send,
    F: Future<Output = AckDecision> + Send,
{
    let (channel, _info) = declare_and_bind(broker, &spec).await?;
    if let Some(count) = prefetch {
        channel.set_prefetch(count).await?;
    }

    let mut deliveries = channel.consume(&spec.queue).await?;
    tracing::info!(queue = %spec.queue, "subscription started");

    while let Some(delivery) = deliveries.next().await {
        let value: T = match codec.decode(delivery.body()) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(
                    queue = %spec.queue,
                    %error,
                    redelivered = delivery.redelivered(),
                    "discarding undecodable delivery"
                );
                delivery.nack(false).await?;
                continue;
            }
        };

        let decision = handler(value).await;
        match decision {
            AckDecision::Ack => delivery.ack().await?,
            AckDecision::NackRequeue => delivery.nack(true).await?,
            AckDecision::NackDiscard => delivery.nack(false).await?,
        }
        tracing::trace!(queue = %spec.queue, ?decision, "delivery settled");
    }

    tracing::info!(queue = %spec.queue, "subscription ended");
    Ok(())
}
