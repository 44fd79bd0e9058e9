//! Exchange names and routing-key conventions.
//!
//! These strings are the interoperability contract with every other process
//! on the broker — they must match bit-for-bit. Queue and key builders live
//! here so call sites never format routing strings by hand.
//!
//! | message            | exchange       | publish key             | bind key        |
//! |--------------------|----------------|-------------------------|-----------------|
//! | [`PlayingState`]   | `peril_direct` | `pause`                 | `pause`         |
//! | [`ArmyMove`]       | `peril_topic`  | `army_moves.<username>` | `army_moves.*`  |
//! | [`RecognitionOfWar`]| `peril_topic` | `war.<username>`        | `war.*`         |
//! | [`GameLog`]        | `peril_topic`  | `game_logs.<username>`  | `game_logs.*`   |
//!
//! [`PlayingState`]: crate::PlayingState
//! [`ArmyMove`]: crate::ArmyMove
//! [`RecognitionOfWar`]: crate::RecognitionOfWar
//! [`GameLog`]: crate::GameLog

/// Direct exchange for pause/resume control.
pub const EXCHANGE_PERIL_DIRECT: &str = "peril_direct";

/// Topic exchange for gameplay and log traffic.
pub const EXCHANGE_PERIL_TOPIC: &str = "peril_topic";

/// Dead-letter exchange attached to every declared queue.
pub const EXCHANGE_PERIL_DEAD_LETTER: &str = "peril_dlx";

/// Routing key for pause/resume broadcasts.
pub const PAUSE_KEY: &str = "pause";

/// Routing-key prefix for army movements.
pub const ARMY_MOVES_PREFIX: &str = "army_moves";

/// Routing-key prefix for war recognitions.
pub const WAR_RECOGNITIONS_PREFIX: &str = "war";

/// Routing-key prefix for game log fan-in.
pub const GAME_LOGS_SLUG: &str = "game_logs";

/// Shared durable queue all clients consume war recognitions from.
pub const WAR_QUEUE: &str = WAR_RECOGNITIONS_PREFIX;

/// Durable queue the server aggregates game logs on.
pub const GAME_LOGS_QUEUE: &str = GAME_LOGS_SLUG;

/// Per-client pause queue: `pause.<username>`.
pub fn pause_queue(username: &str) -> String {
    format!("{PAUSE_KEY}.{username}")
}

/// Per-client army-move queue: `army_moves.<username>`.
pub fn army_moves_queue(username: &str) -> String {
    format!("{ARMY_MOVES_PREFIX}.{username}")
}

/// Publish key for one player's moves: `army_moves.<username>`.
pub fn army_moves_key(username: &str) -> String {
    format!("{ARMY_MOVES_PREFIX}.{username}")
}

/// Subscription pattern matching every player's moves.
pub fn army_moves_wildcard() -> String {
    format!("{ARMY_MOVES_PREFIX}.*")
}

/// Publish key for a war recognized by one player: `war.<username>`.
pub fn war_key(username: &str) -> String {
    format!("{WAR_RECOGNITIONS_PREFIX}.{username}")
}

/// Subscription pattern matching every war recognition.
pub fn war_wildcard() -> String {
    format!("{WAR_RECOGNITIONS_PREFIX}.*")
}

/// Publish key for one player's log entries: `game_logs.<username>`.
pub fn game_logs_key(username: &str) -> String {
    format!("{GAME_LOGS_SLUG}.{username}")
}

/// Subscription pattern matching every player's log entries.
pub fn game_logs_wildcard() -> String {
    format!("{GAME_LOGS_SLUG}.*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_names_are_stable() {
        // Changing any of these breaks interop with already-deployed peers.
        assert_eq!(EXCHANGE_PERIL_DIRECT, "peril_direct");
        assert_eq!(EXCHANGE_PERIL_TOPIC, "peril_topic");
        assert_eq!(EXCHANGE_PERIL_DEAD_LETTER, "peril_dlx");
    }

    #[test]
    fn test_key_builders() {
        assert_eq!(pause_queue("alice"), "pause.alice");
        assert_eq!(army_moves_key("alice"), "army_moves.alice");
        assert_eq!(army_moves_queue("alice"), "army_moves.alice");
        assert_eq!(army_moves_wildcard(), "army_moves.*");
        assert_eq!(war_key("alice"), "war.alice");
        assert_eq!(war_wildcard(), "war.*");
        assert_eq!(game_logs_key("alice"), "game_logs.alice");
        assert_eq!(game_logs_wildcard(), "game_logs.*");
    }

    #[test]
    fn test_shared_queue_names() {
        assert_eq!(WAR_QUEUE, "war");
        assert_eq!(GAME_LOGS_QUEUE, "game_logs");
    }
}
