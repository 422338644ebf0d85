//! Reader event pump.
//!
//! This module provides the `ReaderManager`, which runs the registered card
//! reader in its own task and forwards its events into a single bounded
//! channel for consumption by the session.
//!
//! ```text
//! ┌──────────┐       ┌─────────────────┐
//! │ Reader   │──────►│  Event Channel  │──────► Session
//! │ Task     │       │  (mpsc)         │
//! └──────────┘       └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use thaiid_hardware::manager::{ReaderManager, ReaderManagerConfig};
//! use thaiid_hardware::devices::AnyCardReader;
//! use thaiid_hardware::mock::MockReader;
//!
//! #[tokio::main]
//! async fn main() -> thaiid_hardware::Result<()> {
//!     let mut manager = ReaderManager::new(ReaderManagerConfig::default());
//!
//!     let (reader, _handle) = MockReader::new();
//!     manager.register_reader(AnyCardReader::Mock(reader));
//!
//!     let mut handle = manager.start();
//!
//!     while let Some(event) = handle.recv().await {
//!         println!("Event: {}", event.kind());
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::Result;
use crate::devices::AnyCardReader;
use crate::traits::{CardReader, ReaderEvent};
use std::time::Duration;
use thaiid_core::constants::{DEFAULT_POLL_INTERVAL_MS, EVENT_CHANNEL_CAPACITY};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Configuration for the reader event pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderManagerConfig {
    /// Minimum delay between two polls of the reader.
    pub poll_interval: Duration,

    /// Capacity of the event channel.
    pub channel_capacity: usize,
}

impl Default for ReaderManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for receiving reader events.
///
/// Can be held independently of the manager and drained by the session in
/// its main loop.
pub struct ReaderHandle {
    /// Event receiver for consuming events from the reader.
    event_rx: mpsc::Receiver<ReaderEvent>,

    /// Running reader tasks.
    tasks: JoinSet<Result<()>>,
}

impl ReaderHandle {
    /// Receive the next reader event.
    ///
    /// Returns `None` once the reader task has terminated and every queued
    /// event has been received.
    pub async fn recv(&mut self) -> Option<ReaderEvent> {
        self.event_rx.recv().await
    }

    /// Stop the reader task.
    ///
    /// Aborts the task and waits for it to terminate. Task errors and panics
    /// are logged but do not fail shutdown.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
                TaskTermination::Cancelled => {}
            }
        }

        if error_count + panic_count > 0 {
            warn!(
                errors = error_count,
                panics = panic_count,
                "Reader tasks ended abnormally"
            );
        } else {
            debug!("Reader tasks stopped");
        }

        Ok(())
    }

    /// Classify the termination status of a task.
    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(_)) => TaskTermination::Error,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    /// Task completed successfully.
    Success,
    /// Task returned an error.
    Error,
    /// Task was cancelled (expected during shutdown).
    Cancelled,
    /// Task panicked.
    Panic,
}

/// Runs the card reader and forwards its events.
///
/// # Lifecycle
///
/// 1. Create manager with configuration
/// 2. Register the reader with `register_reader`
/// 3. Call `start()` to spawn the reader task and get the event handle
/// 4. Use the handle to receive events
/// 5. The reader task runs until a terminal error or the handle is dropped
pub struct ReaderManager {
    /// Registered reader.
    reader: Option<AnyCardReader>,

    /// Event sender (cloned for each task).
    event_tx: mpsc::Sender<ReaderEvent>,

    /// Event receiver, moved into the handle on start.
    event_rx: mpsc::Receiver<ReaderEvent>,

    /// Configuration.
    config: ReaderManagerConfig,
}

impl ReaderManager {
    /// Create new reader manager with configuration.
    pub fn new(config: ReaderManagerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity.max(1));

        Self {
            reader: None,
            event_tx,
            event_rx,
            config,
        }
    }

    /// Register the card reader. Replaces any previously registered reader.
    pub fn register_reader(&mut self, reader: AnyCardReader) {
        self.reader = Some(reader);
    }

    /// Check whether a reader has been registered.
    pub fn has_reader(&self) -> bool {
        self.reader.is_some()
    }

    /// Start the reader task and return the event handle.
    ///
    /// Starting without a registered reader yields a handle whose `recv()`
    /// returns `None` immediately.
    pub fn start(mut self) -> ReaderHandle {
        let mut tasks = JoinSet::new();

        if let Some(reader) = self.reader.take() {
            let tx = self.event_tx.clone();
            tasks.spawn(Self::reader_task(reader, tx, self.config.poll_interval));
        }

        ReaderHandle {
            event_rx: self.event_rx,
            tasks,
        }
    }

    async fn reader_task(
        mut reader: AnyCardReader,
        tx: mpsc::Sender<ReaderEvent>,
        poll_interval: Duration,
    ) -> Result<()> {
        match reader.reader_info().await {
            Ok(info) => info!(reader = %info.name, driver = %info.driver, "Reader task started"),
            Err(e) => warn!(error = %e, "Reader info unavailable"),
        }

        loop {
            let start = tokio::time::Instant::now();

            let event = match reader.next_event().await {
                Ok(event) => event,
                Err(e) if e.is_terminal() => {
                    error!(error = %e, "Reader stopped");
                    let _ = tx.send(ReaderEvent::Error(e.to_string())).await;
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, "Reader fault");
                    ReaderEvent::Error(e.to_string())
                }
            };

            debug!(event = event.kind(), "Reader event");

            // Use try_send to detect backpressure
            match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    warn!("Reader event channel full, waiting for the session");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(TrySendError::Closed(_)) => break,
            }

            // Rate limiting to prevent excessive CPU usage
            let elapsed = start.elapsed();
            if elapsed < poll_interval {
                tokio::time::sleep(poll_interval - elapsed).await;
            }
        }

        debug!("Reader event channel closed");
        Ok(())
    }
}
