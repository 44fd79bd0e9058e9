//! Inbound event handlers run by the client subscription workers.
//!
//! Each handler takes the shared game state and (where it publishes) the
//! worker's own channel, applies the game-rule decision, and maps it onto an
//! [`AckDecision`]. Handlers never panic on bad input; anything the rules
//! reject is expressed through the settle decision.

use chrono::Utc;
use peril_broker::{AckDecision, BrokerError, Channel, publish};
use peril_game::{GameState, MoveOutcome, WarOutcome};
use peril_protocol::{
    ArmyMove, GameLog, JsonCodec, MsgpackCodec, PlayingState, RecognitionOfWar,
    routing,
};
use tokio::sync::Mutex;

/// Applies a pause/resume broadcast. Always acks: the message is a control
/// value with no failure mode.
pub(crate) async fn handle_pause(
    state: &Mutex<GameState>,
    playing: PlayingState,
) -> AckDecision {
    state.lock().await.handle_pause(playing);
    AckDecision::Ack
}

/// Records another player's move and, when it contests held territory,
/// declares war on the topic exchange.
///
/// The mover receives their own move too (the binding is a wildcard); those
/// echoes are discarded. A failed war publish requeues the move so the
/// declaration is retried rather than lost.
pub(crate) async fn handle_move<Ch: Channel>(
    state: &Mutex<GameState>,
    channel: &Ch,
    mv: ArmyMove,
) -> AckDecision {
    let mut gs = state.lock().await;
    match gs.handle_move(&mv) {
        MoveOutcome::Safe => AckDecision::Ack,
        MoveOutcome::SamePlayer => AckDecision::NackDiscard,
        MoveOutcome::MakeWar => {
            let key = routing::war_key(gs.username());
            let war = RecognitionOfWar {
                attacker: mv.player,
                defender: gs.snapshot(),
            };
            drop(gs);
            match publish(channel, routing::EXCHANGE_PERIL_TOPIC, &key, &JsonCodec, &war).await
            {
                Ok(()) => AckDecision::Ack,
                Err(error) => {
                    tracing::warn!(%error, "war recognition publish failed, requeueing move");
                    AckDecision::NackRequeue
                }
            }
        }
    }
}

/// Resolves a war recognition and reports the result to the game log.
///
/// Wars the local player is not part of are requeued so an involved consumer
/// on the shared queue can claim them. Wars with no fighting units are
/// discarded outright.
pub(crate) async fn handle_war<Ch: Channel>(
    state: &Mutex<GameState>,
    channel: &Ch,
    war: RecognitionOfWar,
) -> AckDecision {
    let outcome = state.lock().await.handle_war(&war);
    let message = match outcome {
        WarOutcome::NotInvolved => return AckDecision::NackRequeue,
        WarOutcome::NoUnits => return AckDecision::NackDiscard,
        WarOutcome::YouWon { winner, loser } | WarOutcome::OpponentWon { winner, loser } => {
            format!("{winner} won a war against {loser}")
        }
        WarOutcome::Draw { attacker, defender } => {
            format!("A war between {attacker} and {defender} resulted in a draw")
        }
    };

    match publish_game_log(channel, &war.attacker.username, message).await {
        Ok(()) => AckDecision::Ack,
        Err(error) => {
            tracing::warn!(%error, "war log publish failed, requeueing recognition");
            AckDecision::NackRequeue
        }
    }
}

/// Stamps a [`GameLog`] entry with the current time and publishes it in the
/// binary codec to `game_logs.<username>`.
pub async fn publish_game_log<Ch: Channel>(
    channel: &Ch,
    username: &str,
    message: impl Into<String>,
) -> Result<(), BrokerError> {
    let entry = GameLog {
        current_time: Utc::now(),
        username: username.to_string(),
        message: message.into(),
    };
    publish(
        channel,
        routing::EXCHANGE_PERIL_TOPIC,
        &routing::game_logs_key(username),
        &MsgpackCodec,
        &entry,
    )
    .await
}

// =========================================================================
// Tests
// =========================================================================
