//! The client glue: one [`Client`] per player process.
//!
//! `Client::join` provisions the player's three subscriptions and spawns a
//! worker task for each. All three workers guard the same game state behind
//! one mutex; each worker that publishes does so on a channel it owns
//! exclusively.

use std::sync::Arc;

use peril_broker::{Broker, QueueKind, QueueSpec, publish, subscribe};
use peril_game::GameState;
use peril_protocol::{
    ArmyMove, JsonCodec, Location, PlayerSnapshot, PlayingState,
    RecognitionOfWar, Unit, UnitId, UnitRank, routing,
};
use tokio::sync::Mutex;

use crate::{PerilError, handlers};

/// A connected player: three running subscription workers plus a command
/// surface for the local player's actions.
pub struct Client<B: Broker> {
    username: String,
    state: Arc<Mutex<GameState>>,
    publisher: B::Channel,
}

impl<B: Broker + Clone> Client<B> {
    /// Joins the game as `username`.
    ///
    /// Provisions and spawns the three subscriptions:
    ///
    /// - pause: transient `pause.<username>` on the direct exchange;
    /// - moves: transient `army_moves.<username>` bound to `army_moves.*`;
    /// - wars: the shared durable `war` queue bound to `war.*`.
    ///
    /// The workers run until the process exits or their delivery stream
    /// closes.
    pub async fn join(broker: &B, username: impl Into<String>) -> Result<Self, PerilError> {
        let username = username.into();
        let state = Arc::new(Mutex::new(GameState::new(username.clone())));
        tracing::info!(%username, "joining game");

        let pause_spec = QueueSpec::new(
            routing::EXCHANGE_PERIL_DIRECT,
            routing::pause_queue(&username),
            routing::PAUSE_KEY,
            QueueKind::Transient,
        );
        {
            let broker = broker.clone();
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let result = subscribe(
                    &broker,
                    pause_spec,
                    JsonCodec,
                    None,
                    move |playing: PlayingState| {
                        let state = Arc::clone(&state);
                        async move { handlers::handle_pause(&state, playing).await }
                    },
                )
                .await;
                if let Err(error) = result {
                    tracing::error!(%error, "pause subscription terminated");
                }
            });
        }

        let move_spec = QueueSpec::new(
            routing::EXCHANGE_PERIL_TOPIC,
            routing::army_moves_queue(&username),
            routing::army_moves_wildcard(),
            QueueKind::Transient,
        );
        {
            let broker = broker.clone();
            let state = Arc::clone(&state);
            // War declarations go out on this worker's own channel.
            let channel = Arc::new(broker.open_channel().await?);
            tokio::spawn(async move {
                let result = subscribe(
                    &broker,
                    move_spec,
                    JsonCodec,
                    None,
                    move |mv: ArmyMove| {
                        let state = Arc::clone(&state);
                        let channel = Arc::clone(&channel);
                        async move { handlers::handle_move(&state, channel.as_ref(), mv).await }
                    },
                )
                .await;
                if let Err(error) = result {
                    tracing::error!(%error, "move subscription terminated");
                }
            });
        }

        let war_spec = QueueSpec::new(
            routing::EXCHANGE_PERIL_TOPIC,
            routing::WAR_QUEUE,
            routing::war_wildcard(),
            QueueKind::Durable,
        );
        {
            let broker = broker.clone();
            let state = Arc::clone(&state);
            let channel = Arc::new(broker.open_channel().await?);
            tokio::spawn(async move {
                let result = subscribe(
                    &broker,
                    war_spec,
                    JsonCodec,
                    None,
                    move |war: RecognitionOfWar| {
                        let state = Arc::clone(&state);
                        let channel = Arc::clone(&channel);
                        async move { handlers::handle_war(&state, channel.as_ref(), war).await }
                    },
                )
                .await;
                if let Err(error) = result {
                    tracing::error!(%error, "war subscription terminated");
                }
            });
        }

        let publisher = broker.open_channel().await?;
        Ok(Self {
            username,
            state,
            publisher,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Raises a new unit at `location`. Allowed while the game is paused.
    pub async fn spawn_unit(
        &self,
        location: Location,
        rank: UnitRank,
    ) -> Result<Unit, PerilError> {
        Ok(self.state.lock().await.spawn(location, rank)?)
    }

    /// Moves the selected units and announces the move to every player.
    pub async fn move_units(
        &self,
        to: Location,
        ids: &[UnitId],
    ) -> Result<ArmyMove, PerilError> {
        let mv = self.state.lock().await.move_units(to, ids)?;
        publish(
            &self.publisher,
            routing::EXCHANGE_PERIL_TOPIC,
            &routing::army_moves_key(&self.username),
            &JsonCodec,
            &mv,
        )
        .await?;
        Ok(mv)
    }

    /// Publishes a free-form entry to this player's game log.
    pub async fn publish_log(&self, message: impl Into<String>) -> Result<(), PerilError> {
        handlers::publish_game_log(&self.publisher, &self.username, message).await?;
        Ok(())
    }

    /// This player's current army, ordered by unit id.
    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.state.lock().await.snapshot()
    }

    /// The foreign detachment last observed at `location`, if any.
    pub async fn occupant(&self, location: &Location) -> Option<PlayerSnapshot> {
        self.state.lock().await.occupant(location).cloned()
    }

    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.is_paused()
    }
}
