//! Error types for the protocol layer.

/// Boxed source error so one variant can wrap failures from any codec
/// backend (`serde_json`, `rmp-serde`, ...).
type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while encoding or decoding a message body.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] Source),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed bodies, truncated messages, or a message
    /// published with the other codec.
    #[error("decode failed: {0}")]
    Decode(#[source] Source),
}

impl ProtocolError {
    pub(crate) fn encode(source: impl Into<Source>) -> Self {
        Self::Encode(source.into())
    }

    pub(crate) fn decode(source: impl Into<Source>) -> Self {
        Self::Decode(source.into())
    }
}
