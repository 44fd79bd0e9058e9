//! The server glue: pause/resume broadcasts and the game-log aggregator.

use std::path::Path;
use std::sync::Arc;

use peril_broker::{AckDecision, Broker, QueueKind, QueueSpec, publish, subscribe};
use peril_protocol::{GameLog, JsonCodec, MsgpackCodec, PlayingState, routing};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::PerilError;

/// Prefetch cap applied to the game-log consumer. Log traffic is the only
/// high-volume stream, so it is the only bounded one.
pub const GAME_LOG_PREFETCH: u16 = 10;

// ---------------------------------------------------------------------------
// LogJournal
// ---------------------------------------------------------------------------

/// Append-only file sink for aggregated [`GameLog`] entries.
pub struct LogJournal {
    file: File,
}

impl LogJournal {
    /// Opens (or creates) the journal file in append mode.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self { file })
    }

    /// Appends one entry as a single line and flushes it to disk.
    pub async fn append(&mut self, entry: &GameLog) -> std::io::Result<()> {
        let line = format!(
            "{} {}: {}\n",
            entry.current_time.format("%b %d %H:%M:%S"),
            entry.username,
            entry.message,
        );
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// The game server: broadcasts pause/resume and aggregates game logs.
pub struct Server<B: Broker> {
    broker: B,
    publisher: B::Channel,
}

impl<B: Broker + Clone> Server<B> {
    /// Opens the server's own publisher channel on `broker`.
    pub async fn start(broker: B) -> Result<Self, PerilError> {
        let publisher = broker.open_channel().await?;
        Ok(Self { broker, publisher })
    }

    /// Suspends movement for every connected player.
    pub async fn pause(&self) -> Result<(), PerilError> {
        self.broadcast(PlayingState { is_paused: true }).await
    }

    /// Resumes movement for every connected player.
    pub async fn resume(&self) -> Result<(), PerilError> {
        self.broadcast(PlayingState { is_paused: false }).await
    }

    async fn broadcast(&self, playing: PlayingState) -> Result<(), PerilError> {
        tracing::info!(is_paused = playing.is_paused, "broadcasting playing state");
        publish(
            &self.publisher,
            routing::EXCHANGE_PERIL_DIRECT,
            routing::PAUSE_KEY,
            &JsonCodec,
            &playing,
        )
        .await?;
        Ok(())
    }

    /// Consumes the shared durable `game_logs` queue and appends every entry
    /// to `journal`, running until the delivery stream closes.
    ///
    /// A journal write failure requeues the entry rather than dropping it;
    /// the broker redelivers it once the disk recovers.
    pub async fn run_log_aggregator(&self, journal: LogJournal) -> Result<(), PerilError> {
        let spec = QueueSpec::new(
            routing::EXCHANGE_PERIL_TOPIC,
            routing::GAME_LOGS_QUEUE,
            routing::game_logs_wildcard(),
            QueueKind::Durable,
        );
        let journal = Arc::new(Mutex::new(journal));
        subscribe(
            &self.broker,
            spec,
            MsgpackCodec,
            Some(GAME_LOG_PREFETCH),
            move |entry: GameLog| {
                let journal = Arc::clone(&journal);
                async move {
                    match journal.lock().await.append(&entry).await {
                        Ok(()) => AckDecision::Ack,
                        Err(error) => {
                            tracing::warn!(%error, "journal write failed, requeueing entry");
                            AckDecision::NackRequeue
                        }
                    }
                }
            },
        )
        .await?;
        Ok(())
    }
}
