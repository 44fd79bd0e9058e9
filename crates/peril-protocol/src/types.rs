//! Core wire types for Peril's messaging layer.
//!
//! Everything in this module travels "on the wire": these structures are
//! serialized by a [`Codec`](crate::Codec), published to the broker, and
//! deserialized on the receiving side. Control and gameplay messages
//! ([`PlayingState`], [`ArmyMove`], [`RecognitionOfWar`]) use the
//! structured-text codec; the high-volume [`GameLog`] uses the binary codec.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a unit within one player's army.
///
/// Newtype wrapper so a unit id can't be confused with any other `u64`.
/// `#[serde(transparent)]` keeps the wire shape a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A named territory on the game map.
///
/// Serialized as a plain string so clients built against other stacks can
/// interoperate without caring about the newtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Creates a location from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the territory name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Units and players
// ---------------------------------------------------------------------------

/// The rank of a unit. Ranks differ only in battle strength.
///
/// Serialized lowercase (`"infantry"`) to match the established wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRank {
    Infantry,
    Cavalry,
    Artillery,
}

impl fmt::Display for UnitRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infantry => f.write_str("infantry"),
            Self::Cavalry => f.write_str("cavalry"),
            Self::Artillery => f.write_str("artillery"),
        }
    }
}

/// One army unit: an id, a rank, and its current territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub rank: UnitRank,
    pub location: Location,
}

/// A player's identity and army at a single point in time.
///
/// Snapshots are embedded in gameplay messages so receivers can reason about
/// the sender's forces without any shared state. `units` is ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub username: String,
    pub units: Vec<Unit>,
}

impl PlayerSnapshot {
    /// Returns the units stationed at `location`.
    pub fn units_at(&self, location: &Location) -> Vec<&Unit> {
        self.units.iter().filter(|u| &u.location == location).collect()
    }
}

// ---------------------------------------------------------------------------
// Gameplay messages
// ---------------------------------------------------------------------------

/// Broadcast pause/resume control value.
///
/// No history is retained; receivers apply last-write-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayingState {
    pub is_paused: bool,
}

/// One player moving part of their army to a territory.
///
/// `units` is the moved detachment (already relocated to `to_location`);
/// `player` is the mover's full snapshot at the time of the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyMove {
    pub player: PlayerSnapshot,
    pub units: Vec<Unit>,
    pub to_location: Location,
}

/// A declaration that two players' armies contest the same territory.
///
/// Emitted by the client that observed the collision; the `defender` is
/// always the emitting player's own snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionOfWar {
    pub attacker: PlayerSnapshot,
    pub defender: PlayerSnapshot,
}

/// An append-only log entry, fanned in from every client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLog {
    pub current_time: DateTime<Utc>,
    pub username: String,
    pub message: String,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_serializes_as_plain_number() {
        // `#[serde(transparent)]` means UnitId(42) → `42`, not `{"0":42}`.
        let json = serde_json::to_string(&UnitId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_location_serializes_as_plain_string() {
        let json = serde_json::to_string(&Location::new("europe")).unwrap();
        assert_eq!(json, "\"europe\"");
    }

    #[test]
    fn test_unit_rank_serializes_lowercase() {
        let json = serde_json::to_string(&UnitRank::Artillery).unwrap();
        assert_eq!(json, "\"artillery\"");
    }

    #[test]
    fn test_playing_state_json_field_name() {
        // Receivers key on the exact field name `is_paused`.
        let json: serde_json::Value =
            serde_json::to_value(PlayingState { is_paused: true }).unwrap();
        assert_eq!(json["is_paused"], true);
    }

    #[test]
    fn test_player_snapshot_units_at() {
        let snap = PlayerSnapshot {
            username: "alice".into(),
            units: vec![
                Unit {
                    id: UnitId(1),
                    rank: UnitRank::Infantry,
                    location: "europe".into(),
                },
                Unit {
                    id: UnitId(2),
                    rank: UnitRank::Cavalry,
                    location: "asia".into(),
                },
            ],
        };
        let at_europe = snap.units_at(&"europe".into());
        assert_eq!(at_europe.len(), 1);
        assert_eq!(at_europe[0].id, UnitId(1));
        assert!(snap.units_at(&"africa".into()).is_empty());
    }

    #[test]
    fn test_army_move_round_trip() {
        let mv = ArmyMove {
            player: PlayerSnapshot {
                username: "bob".into(),
                units: vec![],
            },
            units: vec![Unit {
                id: UnitId(7),
                rank: UnitRank::Artillery,
                location: "americas".into(),
            }],
            to_location: "americas".into(),
        };
        let bytes = serde_json::to_vec(&mv).unwrap();
        let decoded: ArmyMove = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(mv, decoded);
    }

    #[test]
    fn test_game_log_round_trip_preserves_timestamp() {
        let entry = GameLog {
            current_time: Utc::now(),
            username: "carol".into(),
            message: "carol won a war against dave".into(),
        };
        let bytes = serde_json::to_vec(&entry).unwrap();
        let decoded: GameLog = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entry, decoded);
    }
}
