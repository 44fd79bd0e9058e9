//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and raw message bodies. The messaging
//! layer doesn't care how a value is serialized — it only needs something
//! that implements [`Codec`]. The codec is a strategy chosen per call site:
//! control and gameplay traffic uses [`JsonCodec`] (self-describing,
//! human-inspectable), while the high-volume log fan-in uses [`MsgpackCodec`]
//! (compact binary records, throughput over inspectability).

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// The content encoding carried alongside a message body.
///
/// Recorded on every published message so consumers and broker tooling can
/// tell the two formats apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// Structured text (`application/json`).
    Json,
    /// Compact binary records (`application/msgpack`).
    Msgpack,
}

impl ContentEncoding {
    /// Returns the MIME type used as the broker-side content type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Msgpack => "application/msgpack",
        }
    }
}

/// An encoded message body plus its content encoding.
///
/// Produced by [`Codec::seal`] on the publishing side; the body is decoded
/// back into the same type on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub encoding: ContentEncoding,
    pub body: Vec<u8>,
}

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `encode`/`decode` are generic over the payload type, bounded by serde's
/// `Serialize`/`DeserializeOwned` — the decoded value owns all its data, so
/// the delivery buffer can be dropped immediately after decoding.
pub trait Codec: Send + Sync + 'static {
    /// The content encoding this codec produces.
    fn encoding(&self) -> ContentEncoding;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// truncated, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Encodes a value into an [`Envelope`] tagged with this codec's encoding.
    fn seal<T: Serialize>(&self, value: &T) -> Result<Envelope, ProtocolError>
    where
        Self: Sized,
    {
        Ok(Envelope {
            encoding: self.encoding(),
            body: self.encode(value)?,
        })
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Used for control and gameplay messages, where being able to read a body
/// off the wire matters more than its size.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encoding(&self) -> ContentEncoding {
        ContentEncoding::Json
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::decode)
    }
}

// ---------------------------------------------------------------------------
// MsgpackCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `rmp-serde` (MessagePack).
///
/// Used for the game-log fan-in, where many producers feed one durable
/// consumer and body size dominates.
#[cfg(feature = "msgpack")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackCodec;

#[cfg(feature = "msgpack")]
impl Codec for MsgpackCodec {
    fn encoding(&self) -> ContentEncoding {
        ContentEncoding::Msgpack
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec_named(value).map_err(ProtocolError::encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        rmp_serde::from_slice(data).map_err(ProtocolError::decode)
    }
}

// =========================================================================
// Tests
// =========================================================================
