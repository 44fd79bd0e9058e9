//! The per-process game state machine.
//!
//! [`GameState`] holds one player's view of the game: their own army, the
//! foreign armies they have observed per territory, and the shared pause
//! flag. It is mutated from two directions — local player commands and
//! inbound broker events — and exposes a decision function per inbound
//! event type. The decisions themselves carry no acknowledgment semantics;
//! the caller maps each outcome onto an ack decision and any follow-up
//! publish.
//!
//! State accumulates monotonically: territory observations are only ever
//! overwritten by newer observations, never rolled back. `GameState` is not
//! thread-safe on its own; callers running multiple subscription workers
//! must guard it with a single mutex.

use std::collections::{BTreeMap, HashMap};

use peril_protocol::{
    ArmyMove, Location, PlayerSnapshot, PlayingState, RecognitionOfWar, Unit,
    UnitId, UnitRank,
};

use crate::GameError;

/// The territories every army can occupy.
pub const LOCATIONS: [&str; 6] = [
    "americas",
    "europe",
    "africa",
    "asia",
    "antarctica",
    "australia",
];

// ---------------------------------------------------------------------------
// Decision outcomes
// ---------------------------------------------------------------------------

/// The decision for one inbound [`ArmyMove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move landed on unowned territory; recorded without conflict.
    Safe,
    /// The destination is held by this player — a war must be recognized.
    MakeWar,
    /// The move originated from this player; nothing to do.
    SamePlayer,
}

/// The decision for one inbound [`RecognitionOfWar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarOutcome {
    /// This player is neither attacker nor defender; another consumer
    /// should claim the event.
    NotInvolved,
    /// The two sides share no contested territory with units to fight.
    NoUnits,
    /// This player lost the battle.
    OpponentWon { winner: String, loser: String },
    /// This player won the battle.
    YouWon { winner: String, loser: String },
    /// Forces were exactly balanced.
    Draw { attacker: String, defender: String },
}

/// Battle strength of a single unit rank.
pub fn rank_power(rank: UnitRank) -> u32 {
    match rank {
        UnitRank::Infantry => 1,
        UnitRank::Cavalry => 5,
        UnitRank::Artillery => 10,
    }
}

fn army_power(units: &[&Unit]) -> u32 {
    units.iter().map(|u| rank_power(u.rank)).sum()
}

/// Finds the first territory where both snapshots have units stationed.
///
/// Attacker unit order decides which territory is contested when there is
/// more than one overlap, keeping resolution deterministic on every client.
fn overlapping_location(
    attacker: &PlayerSnapshot,
    defender: &PlayerSnapshot,
) -> Option<Location> {
    attacker
        .units
        .iter()
        .map(|u| &u.location)
        .find(|loc| defender.units.iter().any(|d| &d.location == *loc))
        .cloned()
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// One player's view of the game.
pub struct GameState {
    username: String,
    units: BTreeMap<UnitId, Unit>,
    /// Last observed foreign detachment per territory.
    occupants: HashMap<Location, PlayerSnapshot>,
    paused: bool,
    next_unit_id: u64,
}

impl GameState {
    /// Creates a fresh state for `username`: no units, nothing observed,
    /// not paused.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            units: BTreeMap::new(),
            occupants: HashMap::new(),
            paused: false,
            next_unit_id: 1,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// This player's units, ordered by id.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// The foreign detachment last observed at `location`, if any.
    pub fn occupant(&self, location: &Location) -> Option<&PlayerSnapshot> {
        self.occupants.get(location)
    }

    /// This player's identity and army, ordered by unit id.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            username: self.username.clone(),
            units: self.units.values().cloned().collect(),
        }
    }

    // -- Local commands ----------------------------------------------------

    /// Raises a new unit of `rank` at `location`.
    ///
    /// # Errors
    /// [`GameError::UnknownLocation`] if the territory is not on the map.
    pub fn spawn(&mut self, location: Location, rank: UnitRank) -> Result<Unit, GameError> {
        if !LOCATIONS.contains(&location.as_str()) {
            return Err(GameError::UnknownLocation(location.to_string()));
        }
        let unit = Unit {
            id: UnitId(self.next_unit_id),
            rank,
            location,
        };
        self.next_unit_id += 1;
        self.units.insert(unit.id, unit.clone());
        tracing::debug!(unit = %unit.id, rank = %unit.rank, location = %unit.location, "unit spawned");
        Ok(unit)
    }

    /// Relocates the selected own units to `to` and returns the move to
    /// publish.
    ///
    /// # Errors
    /// Rejected while paused, when `to` is off the map, when `ids` is
    /// empty, or when any id doesn't belong to this player. On error no
    /// unit has moved.
    pub fn move_units(&mut self, to: Location, ids: &[UnitId]) -> Result<ArmyMove, GameError> {
        if self.paused {
            return Err(GameError::Paused);
        }
        if !LOCATIONS.contains(&to.as_str()) {
            return Err(GameError::UnknownLocation(to.to_string()));
        }
        if ids.is_empty() {
            return Err(GameError::NoUnitsSelected);
        }
        if let Some(missing) = ids.iter().find(|id| !self.units.contains_key(id)) {
            return Err(GameError::UnknownUnit(*missing));
        }

        let mut moved = Vec::with_capacity(ids.len());
        for id in ids {
            let unit = self.units.get_mut(id).expect("ids validated above");
            unit.location = to.clone();
            moved.push(unit.clone());
        }
        tracing::debug!(count = moved.len(), location = %to, "units moved");

        Ok(ArmyMove {
            player: self.snapshot(),
            units: moved,
            to_location: to,
        })
    }

    // -- Inbound event decisions -------------------------------------------

    /// Applies a pause/resume broadcast. Last write wins; always succeeds.
    pub fn handle_pause(&mut self, state: PlayingState) {
        self.paused = state.is_paused;
        tracing::info!(paused = self.paused, "playing state updated");
    }

    /// Decides the outcome of another player's move.
    ///
    /// Moves from this player are rejected without touching state. Foreign
    /// moves are recorded in the territory map; the move provokes a war
    /// exactly when this player already holds the destination.
    pub fn handle_move(&mut self, mv: &ArmyMove) -> MoveOutcome {
        if mv.player.username == self.username {
            return MoveOutcome::SamePlayer;
        }

        self.occupants.insert(
            mv.to_location.clone(),
            PlayerSnapshot {
                username: mv.player.username.clone(),
                units: mv.units.clone(),
            },
        );

        let contested = self
            .units
            .values()
            .any(|u| u.location == mv.to_location);
        if contested {
            tracing::debug!(
                mover = %mv.player.username,
                location = %mv.to_location,
                "move contests held territory"
            );
            MoveOutcome::MakeWar
        } else {
            MoveOutcome::Safe
        }
    }

    /// Resolves a war recognition from this player's perspective.
    ///
    /// Pure with respect to state: battle resolution is a deterministic
    /// power comparison over both sides' units at the contested territory,
    /// so every involved client reaches the same winner.
    pub fn handle_war(&self, war: &RecognitionOfWar) -> WarOutcome {
        let involved = self.username == war.attacker.username
            || self.username == war.defender.username;
        if !involved {
            return WarOutcome::NotInvolved;
        }

        let Some(location) = overlapping_location(&war.attacker, &war.defender) else {
            return WarOutcome::NoUnits;
        };
        let attackers = war.attacker.units_at(&location);
        let defenders = war.defender.units_at(&location);
        if attackers.is_empty() || defenders.is_empty() {
            return WarOutcome::NoUnits;
        }

        let attacker_power = army_power(&attackers);
        let defender_power = army_power(&defenders);
        tracing::debug!(
            attacker = %war.attacker.username,
            defender = %war.defender.username,
            location = %location,
            attacker_power,
            defender_power,
            "resolving war"
        );

        let (winner, loser) = match attacker_power.cmp(&defender_power) {
            std::cmp::Ordering::Greater => (&war.attacker, &war.defender),
            std::cmp::Ordering::Less => (&war.defender, &war.attacker),
            std::cmp::Ordering::Equal => {
                return WarOutcome::Draw {
                    attacker: war.attacker.username.clone(),
                    defender: war.defender.username.clone(),
                };
            }
        };

        if winner.username == self.username {
            WarOutcome::YouWon {
                winner: winner.username.clone(),
                loser: loser.username.clone(),
            }
        } else {
            WarOutcome::OpponentWon {
                winner: winner.username.clone(),
                loser: loser.username.clone(),
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str) -> GameState {
        GameState::new(name)
    }

    fn snapshot(name: &str, units: &[(u64, UnitRank, &str)]) -> PlayerSnapshot {
        PlayerSnapshot {
            username: name.into(),
            units: units
                .iter()
                .map(|(id, rank, loc)| Unit {
                    id: UnitId(*id),
                    rank: *rank,
                    location: Location::new(*loc),
                })
                .collect(),
        }
    }

    fn move_from(name: &str, units: &[(u64, UnitRank, &str)], to: &str) -> ArmyMove {
        let player = snapshot(name, units);
        ArmyMove {
            units: player.units_at(&Location::new(to)).into_iter().cloned().collect(),
            player,
            to_location: Location::new(to),
        }
    }

    // -- Commands ----------------------------------------------------------

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut gs = state("alice");
        let a = gs.spawn("europe".into(), UnitRank::Infantry).unwrap();
        let b = gs.spawn("asia".into(), UnitRank::Cavalry).unwrap();
        assert_eq!(a.id, UnitId(1));
        assert_eq!(b.id, UnitId(2));
        assert_eq!(gs.units().count(), 2);
    }

    #[test]
    fn test_spawn_rejects_unknown_location() {
        let mut gs = state("alice");
        let err = gs.spawn("atlantis".into(), UnitRank::Infantry).unwrap_err();
        assert!(matches!(err, GameError::UnknownLocation(_)));
    }

    #[test]
    fn test_move_units_relocates_and_snapshots() {
        let mut gs = state("alice");
        let a = gs.spawn("europe".into(), UnitRank::Infantry).unwrap();
        gs.spawn("asia".into(), UnitRank::Cavalry).unwrap();

        let mv = gs.move_units("africa".into(), &[a.id]).unwrap();

        assert_eq!(mv.to_location, "africa".into());
        assert_eq!(mv.units.len(), 1);
        assert_eq!(mv.units[0].location, "africa".into());
        // The embedded snapshot reflects the post-move army.
        assert_eq!(mv.player.units_at(&"africa".into()).len(), 1);
        assert_eq!(mv.player.units_at(&"europe".into()).len(), 0);
    }

    #[test]
    fn test_move_units_rejected_while_paused() {
        let mut gs = state("alice");
        let a = gs.spawn("europe".into(), UnitRank::Infantry).unwrap();
        gs.handle_pause(PlayingState { is_paused: true });

        let err = gs.move_units("asia".into(), &[a.id]).unwrap_err();
        assert!(matches!(err, GameError::Paused));
        // The unit did not move.
        assert_eq!(gs.snapshot().units_at(&"europe".into()).len(), 1);
    }

    #[test]
    fn test_move_units_rejects_unknown_unit_without_moving_any() {
        let mut gs = state("alice");
        let a = gs.spawn("europe".into(), UnitRank::Infantry).unwrap();

        let err = gs.move_units("asia".into(), &[a.id, UnitId(99)]).unwrap_err();
        assert!(matches!(err, GameError::UnknownUnit(UnitId(99))));
        assert_eq!(gs.snapshot().units_at(&"europe".into()).len(), 1);
    }

    #[test]
    fn test_move_units_requires_a_selection() {
        let mut gs = state("alice");
        let err = gs.move_units("asia".into(), &[]).unwrap_err();
        assert!(matches!(err, GameError::NoUnitsSelected));
    }

    // -- Pause -------------------------------------------------------------

    #[test]
    fn test_handle_pause_is_last_write_wins() {
        let mut gs = state("alice");
        gs.handle_pause(PlayingState { is_paused: true });
        assert!(gs.is_paused());
        gs.handle_pause(PlayingState { is_paused: false });
        assert!(!gs.is_paused());
    }

    // -- Moves -------------------------------------------------------------

    #[test]
    fn test_handle_move_same_player_never_mutates() {
        let mut gs = state("alice");
        let mv = move_from("alice", &[(1, UnitRank::Infantry, "europe")], "europe");

        assert_eq!(gs.handle_move(&mv), MoveOutcome::SamePlayer);
        assert!(gs.occupant(&"europe".into()).is_none());
    }

    #[test]
    fn test_handle_move_safe_records_foreign_armies() {
        let mut gs = state("alice");
        let mv = move_from("bob", &[(1, UnitRank::Cavalry, "asia")], "asia");

        assert_eq!(gs.handle_move(&mv), MoveOutcome::Safe);
        let occupant = gs.occupant(&"asia".into()).unwrap();
        assert_eq!(occupant.username, "bob");
        assert_eq!(occupant.units.len(), 1);
    }

    #[test]
    fn test_handle_move_makes_war_iff_destination_is_held() {
        let mut gs = state("alice");
        gs.spawn("europe".into(), UnitRank::Infantry).unwrap();

        let safe = move_from("bob", &[(1, UnitRank::Cavalry, "asia")], "asia");
        assert_eq!(gs.handle_move(&safe), MoveOutcome::Safe);

        let contested = move_from("bob", &[(2, UnitRank::Cavalry, "europe")], "europe");
        assert_eq!(gs.handle_move(&contested), MoveOutcome::MakeWar);
    }

    // -- Wars --------------------------------------------------------------

    #[test]
    fn test_handle_war_not_involved() {
        let gs = state("carol");
        let war = RecognitionOfWar {
            attacker: snapshot("bob", &[(1, UnitRank::Infantry, "europe")]),
            defender: snapshot("alice", &[(1, UnitRank::Infantry, "europe")]),
        };
        assert_eq!(gs.handle_war(&war), WarOutcome::NotInvolved);
    }

    #[test]
    fn test_handle_war_no_overlap_is_no_units() {
        let gs = state("alice");
        let war = RecognitionOfWar {
            attacker: snapshot("bob", &[(1, UnitRank::Infantry, "asia")]),
            defender: snapshot("alice", &[(1, UnitRank::Infantry, "europe")]),
        };
        assert_eq!(gs.handle_war(&war), WarOutcome::NoUnits);
    }

    #[test]
    fn test_handle_war_defender_without_units_is_no_units() {
        let gs = state("alice");
        let war = RecognitionOfWar {
            attacker: snapshot("bob", &[(1, UnitRank::Infantry, "europe")]),
            defender: snapshot("alice", &[]),
        };
        assert_eq!(gs.handle_war(&war), WarOutcome::NoUnits);
    }

    #[test]
    fn test_handle_war_stronger_attacker_wins() {
        let gs = state("alice");
        let war = RecognitionOfWar {
            attacker: snapshot("bob", &[(1, UnitRank::Artillery, "europe")]),
            defender: snapshot("alice", &[(1, UnitRank::Infantry, "europe")]),
        };
        assert_eq!(
            gs.handle_war(&war),
            WarOutcome::OpponentWon {
                winner: "bob".into(),
                loser: "alice".into(),
            }
        );
    }

    #[test]
    fn test_handle_war_stronger_defender_wins() {
        let gs = state("alice");
        let war = RecognitionOfWar {
            attacker: snapshot("bob", &[(1, UnitRank::Infantry, "europe")]),
            defender: snapshot("alice", &[(1, UnitRank::Cavalry, "europe")]),
        };
        assert_eq!(
            gs.handle_war(&war),
            WarOutcome::YouWon {
                winner: "alice".into(),
                loser: "bob".into(),
            }
        );
    }

    #[test]
    fn test_handle_war_draw_is_symmetric() {
        // Two cavalry vs one artillery: 10 vs 10.
        let attacker = snapshot(
            "bob",
            &[(1, UnitRank::Cavalry, "europe"), (2, UnitRank::Cavalry, "europe")],
        );
        let defender = snapshot("alice", &[(1, UnitRank::Artillery, "europe")]);

        let war = RecognitionOfWar {
            attacker: attacker.clone(),
            defender: defender.clone(),
        };
        let gs = state("alice");
        assert_eq!(
            gs.handle_war(&war),
            WarOutcome::Draw {
                attacker: "bob".into(),
                defender: "alice".into(),
            }
        );

        // Swapping sides with equal strengths still draws.
        let swapped = RecognitionOfWar {
            attacker: defender,
            defender: attacker,
        };
        let gs = state("bob");
        assert_eq!(
            gs.handle_war(&swapped),
            WarOutcome::Draw {
                attacker: "alice".into(),
                defender: "bob".into(),
            }
        );
    }

    #[test]
    fn test_handle_war_resolution_agrees_on_both_clients() {
        let war = RecognitionOfWar {
            attacker: snapshot("bob", &[(1, UnitRank::Artillery, "europe")]),
            defender: snapshot("alice", &[(1, UnitRank::Infantry, "europe")]),
        };
        let alice = state("alice").handle_war(&war);
        let bob = state("bob").handle_war(&war);

        assert_eq!(
            alice,
            WarOutcome::OpponentWon { winner: "bob".into(), loser: "alice".into() }
        );
        assert_eq!(
            bob,
            WarOutcome::YouWon { winner: "bob".into(), loser: "alice".into() }
        );
    }
}
