//! Wire protocol for Peril.
//!
//! This crate defines the "language" every Peril process speaks over the
//! broker:
//!
//! - **Types** ([`PlayingState`], [`ArmyMove`], [`RecognitionOfWar`],
//!   [`GameLog`], ...) — the message structures that travel on the wire.
//! - **Routing** ([`routing`]) — exchange names and routing-key conventions,
//!   reproduced bit-for-bit for interoperability.
//! - **Codec** ([`Codec`], [`JsonCodec`], [`MsgpackCodec`]) — how messages
//!   are converted to and from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! The protocol layer sits below the broker abstraction: it knows nothing
//! about queues, acknowledgments, or game rules.

mod codec;
mod error;
pub mod routing;
mod types;

pub use codec::{Codec, ContentEncoding, Envelope};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
#[cfg(feature = "msgpack")]
pub use codec::MsgpackCodec;
pub use error::ProtocolError;
pub use types::{
    ArmyMove, GameLog, Location, PlayerSnapshot, PlayingState, RecognitionOfWar,
    Unit, UnitId, UnitRank,
};
