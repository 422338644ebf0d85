//! Mock card reader implementation for testing and development.
//!
//! This module provides a simulated reader that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{
    HardwareError, Result,
    devices::AnyIdCard,
    mock::{CardFixture, MockCard},
    traits::{CardReader, ReaderEvent},
    types::ReaderInfo,
};
use thaiid_core::constants::EVENT_CHANNEL_CAPACITY;
use tokio::sync::mpsc;

/// Name of a mock reader created with [`MockReader::new`].
pub const MOCK_READER_NAME: &str = "Mock Smart Card Reader";

/// Mock card reader for testing and development.
///
/// The reader replays whatever its [`MockReaderHandle`] does: plugging the
/// device in, inserting and removing cards, and injecting faults.
///
/// # Examples
///
/// ```
/// use thaiid_hardware::mock::{CardFixture, MockReader};
/// use thaiid_hardware::traits::{CardReader, ReaderEvent};
///
/// #[tokio::main]
/// async fn main() -> thaiid_hardware::Result<()> {
///     let (mut reader, mut handle) = MockReader::new();
///
///     handle.plug().await?;
///     handle.insert_card(CardFixture::sample()).await?;
///
///     assert!(matches!(reader.next_event().await?, ReaderEvent::DeviceActivated { .. }));
///     assert!(matches!(reader.next_event().await?, ReaderEvent::CardInserted(_)));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for reader events
    event_rx: mpsc::Receiver<ReaderEvent>,

    /// Device name
    name: String,
}

impl MockReader {
    /// Create a new mock reader with the default name.
    ///
    /// Returns a tuple of (MockReader, MockReaderHandle) where the handle
    /// drives the simulated device.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name(MOCK_READER_NAME)
    }

    /// Create a new mock reader with a custom name.
    ///
    /// # Examples
    ///
    /// ```
    /// use thaiid_hardware::mock::MockReader;
    ///
    /// let (reader, handle) = MockReader::with_name("Counter 1");
    /// assert_eq!(handle.name(), "Counter 1");
    /// ```
    pub fn with_name(name: impl Into<String>) -> (Self, MockReaderHandle) {
        let name = name.into();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reader = Self {
            event_rx,
            name: name.clone(),
        };

        let handle = MockReaderHandle {
            event_tx,
            name,
            plugged: false,
            card_present: false,
        };

        (reader, handle)
    }
}

impl CardReader for MockReader {
    async fn next_event(&mut self) -> Result<ReaderEvent> {
        self.event_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(format!("{} event channel closed", self.name)))
    }

    async fn reader_info(&self) -> Result<ReaderInfo> {
        Ok(ReaderInfo::new(self.name.clone(), "mock").with_protocols(vec!["T=1".to_string()]))
    }
}

/// Handle for controlling a mock card reader.
///
/// Tracks whether the simulated device is plugged in and holds a card, and
/// refuses card operations a physical reader could not produce.
///
/// Cloned handles share the event channel but track state independently.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    /// Channel sender for reader events
    event_tx: mpsc::Sender<ReaderEvent>,

    /// Device name
    name: String,

    /// Device is plugged in
    plugged: bool,

    /// A card sits in the reader
    card_present: bool,
}

impl MockReaderHandle {
    /// Plug the reader in.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn plug(&mut self) -> Result<()> {
        self.plugged = true;
        self.send(ReaderEvent::DeviceActivated {
            reader: self.name.clone(),
        })
        .await
    }

    /// Unplug the reader. Any inserted card goes with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn unplug(&mut self) -> Result<()> {
        self.plugged = false;
        self.card_present = false;
        self.send(ReaderEvent::DeviceDeactivated {
            reader: self.name.clone(),
        })
        .await
    }

    /// Insert a card built from `fixture`.
    ///
    /// # Errors
    ///
    /// See [`MockReaderHandle::insert`].
    pub async fn insert_card(&mut self, fixture: CardFixture) -> Result<()> {
        let card = MockCard::new(self.name.clone(), fixture);
        self.insert(card).await
    }

    /// Insert a prepared card, e.g. one with injected failures.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reader is not plugged in
    /// - A card is already inserted
    /// - The reader has been dropped and the channel is closed
    pub async fn insert(&mut self, card: MockCard) -> Result<()> {
        if !self.plugged {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        if self.card_present {
            return Err(HardwareError::invalid_data(format!(
                "{} already holds a card",
                self.name
            )));
        }

        self.card_present = true;
        self.send(ReaderEvent::CardInserted(AnyIdCard::Mock(card))).await
    }

    /// Take the card out of the reader. Does nothing if no card is inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn remove_card(&mut self) -> Result<()> {
        if !self.card_present {
            return Ok(());
        }

        self.card_present = false;
        self.send(ReaderEvent::CardRemoved {
            reader: self.name.clone(),
        })
        .await
    }

    /// Report a driver fault without changing device or card state.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn fault(&mut self, message: impl Into<String>) -> Result<()> {
        self.send(ReaderEvent::Error(message.into())).await
    }

    /// Check if the reader is plugged in.
    pub fn is_plugged(&self) -> bool {
        self.plugged
    }

    /// Check if a card is currently inserted.
    pub fn is_card_present(&self) -> bool {
        self.card_present
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: ReaderEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected(format!("{} event channel closed", self.name)))
    }
}
