//! Reader and card trait definitions.
//!
//! This module defines the contract between the session layer and card
//! reader drivers. A [`CardReader`] reports what happens at the reader
//! (devices coming and going, cards inserted and removed) as a stream of
//! [`ReaderEvent`]s; each inserted card arrives as an [`IdCard`] handle whose
//! fields are fetched on demand.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::devices::AnyIdCard;
use crate::error::Result;
use crate::types::ReaderInfo;
use thaiid_core::{CardDate, PersonName};

/// Something that happened at a card reader.
///
/// Events are delivered in the order the driver observed them. A driver never
/// emits card events for a reader it has not activated.
#[derive(Debug)]
#[non_exhaustive]
pub enum ReaderEvent {
    /// A reader was plugged in or became available.
    DeviceActivated {
        /// Reader name.
        reader: String,
    },

    /// A reader was unplugged or became unavailable.
    DeviceDeactivated {
        /// Reader name.
        reader: String,
    },

    /// A card was inserted; fields are read through the handle.
    CardInserted(AnyIdCard),

    /// The card was taken out of the reader.
    CardRemoved {
        /// Reader name.
        reader: String,
    },

    /// The driver hit a fault that did not change device or card state.
    Error(String),
}

impl ReaderEvent {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeviceActivated { .. } => "device-activated",
            Self::DeviceDeactivated { .. } => "device-deactivated",
            Self::CardInserted(_) => "card-inserted",
            Self::CardRemoved { .. } => "card-removed",
            Self::Error(_) => "error",
        }
    }
}

/// Card reader device.
///
/// Implementations watch one or more physical (or simulated) readers and
/// turn their state changes into [`ReaderEvent`]s.
///
/// # Examples
///
/// ```no_run
/// use thaiid_hardware::traits::{CardReader, ReaderEvent};
/// use thaiid_hardware::error::Result;
///
/// async fn wait_for_card<R: CardReader>(reader: &mut R) -> Result<()> {
///     loop {
///         if let ReaderEvent::CardInserted(_) = reader.next_event().await? {
///             return Ok(());
///         }
///     }
/// }
/// ```
pub trait CardReader: Send + Sync {
    /// Wait for the next reader event.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot observe the reader any more.
    /// Errors for which [`HardwareError::is_terminal`] holds end the event
    /// stream.
    ///
    /// [`HardwareError::is_terminal`]: crate::HardwareError::is_terminal
    async fn next_event(&mut self) -> Result<ReaderEvent>;

    /// Get reader information.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be queried.
    async fn reader_info(&self) -> Result<ReaderInfo>;
}

/// An inserted Thai national ID card.
///
/// Every getter talks to the card and may fail on its own, for example when
/// the card is pulled out halfway through a read.
pub trait IdCard: Send + Sync {
    /// Name of the reader the card sits in.
    fn reader(&self) -> &str;

    /// 13-digit citizen identification number.
    async fn cid(&mut self) -> Result<String>;

    /// Name in Thai script.
    async fn name_th(&mut self) -> Result<PersonName>;

    /// Name in Latin script.
    async fn name_en(&mut self) -> Result<PersonName>;

    /// Date of birth.
    async fn date_of_birth(&mut self) -> Result<CardDate>;

    /// Date the card was issued.
    async fn issue_date(&mut self) -> Result<CardDate>;

    /// Date the card expires.
    async fn expire_date(&mut self) -> Result<CardDate>;

    /// Registered address as a single raw string.
    async fn address(&mut self) -> Result<String>;

    /// Issuing office.
    async fn issuer(&mut self) -> Result<String>;

    /// Holder photo as JPEG bytes.
    async fn photo(&mut self) -> Result<Vec<u8>>;
}
