//! Enum wrappers for reader and card dispatch.
//!
//! Native `async fn` in traits (Edition 2024 RPITIT) are not object-safe, so
//! `Box<dyn CardReader>` is not available. These enums provide concrete type
//! dispatch instead, with hardware drivers compiled in behind feature flags.
//!
//! # Examples
//!
//! ```
//! use thaiid_hardware::devices::AnyCardReader;
//! use thaiid_hardware::mock::MockReader;
//!
//! let (reader, _handle) = MockReader::new();
//! let any_reader = AnyCardReader::Mock(reader);
//! ```

use crate::mock::{MockCard, MockReader};
use crate::traits::{CardReader, IdCard, ReaderEvent};
use crate::{ReaderInfo, Result};
use thaiid_core::{CardDate, PersonName};

#[cfg(feature = "pcsc")]
use crate::pcsc::{PcscCard, PcscReader};

/// Enum wrapper for card reader dispatch.
///
/// # Examples
///
/// ```
/// use thaiid_hardware::devices::AnyCardReader;
/// use thaiid_hardware::traits::CardReader;
/// use thaiid_hardware::mock::MockReader;
///
/// #[tokio::main]
/// async fn main() -> thaiid_hardware::Result<()> {
///     let (reader, _handle) = MockReader::new();
///     let any_reader = AnyCardReader::Mock(reader);
///
///     let info = any_reader.reader_info().await?;
///     println!("Reader: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCardReader {
    /// Mock reader for development and testing.
    Mock(MockReader),

    /// PC/SC smart-card readers.
    #[cfg(feature = "pcsc")]
    Pcsc(PcscReader),
}

impl CardReader for AnyCardReader {
    async fn next_event(&mut self) -> Result<ReaderEvent> {
        match self {
            Self::Mock(reader) => reader.next_event().await,
            #[cfg(feature = "pcsc")]
            Self::Pcsc(reader) => reader.next_event().await,
        }
    }

    async fn reader_info(&self) -> Result<ReaderInfo> {
        match self {
            Self::Mock(reader) => reader.reader_info().await,
            #[cfg(feature = "pcsc")]
            Self::Pcsc(reader) => reader.reader_info().await,
        }
    }
}

/// Enum wrapper for inserted card dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyIdCard {
    /// Simulated card.
    Mock(MockCard),

    /// Card in a PC/SC reader.
    #[cfg(feature = "pcsc")]
    Pcsc(PcscCard),
}

/// Dispatch an `IdCard` getter to the wrapped card.
macro_rules! dispatch_card {
    ($self:ident, $method:ident) => {
        match $self {
            Self::Mock(card) => card.$method().await,
            #[cfg(feature = "pcsc")]
            Self::Pcsc(card) => card.$method().await,
        }
    };
}

impl IdCard for AnyIdCard {
    fn reader(&self) -> &str {
        match self {
            Self::Mock(card) => card.reader(),
            #[cfg(feature = "pcsc")]
            Self::Pcsc(card) => card.reader(),
        }
    }

    async fn cid(&mut self) -> Result<String> {
        dispatch_card!(self, cid)
    }

    async fn name_th(&mut self) -> Result<PersonName> {
        dispatch_card!(self, name_th)
    }

    async fn name_en(&mut self) -> Result<PersonName> {
        dispatch_card!(self, name_en)
    }

    async fn date_of_birth(&mut self) -> Result<CardDate> {
        dispatch_card!(self, date_of_birth)
    }

    async fn issue_date(&mut self) -> Result<CardDate> {
        dispatch_card!(self, issue_date)
    }

    async fn expire_date(&mut self) -> Result<CardDate> {
        dispatch_card!(self, expire_date)
    }

    async fn address(&mut self) -> Result<String> {
        dispatch_card!(self, address)
    }

    async fn issuer(&mut self) -> Result<String> {
        dispatch_card!(self, issuer)
    }

    async fn photo(&mut self) -> Result<Vec<u8>> {
        dispatch_card!(self, photo)
    }
}
