//! Card reader abstraction layer for the Thai ID bridge.
//!
//! This crate provides the seam between the session and smart-card hardware:
//! a [`CardReader`] reports device and card events, and each inserted card is
//! an [`IdCard`] whose fields are fetched one at a time. Concrete drivers are
//! selected through the [`AnyCardReader`] / [`AnyIdCard`] enums.
//!
//! # Drivers
//!
//! - [`mock`]: a simulated reader driven from a [`MockReaderHandle`], with
//!   cards built from JSON-loadable [`CardFixture`]s. Always available.
//! - `pcsc` (feature `pcsc`): PC/SC readers with hot-plug detection and the
//!   Thai ID applet APDU set.
//!
//! # Event flow
//!
//! ```no_run
//! use thaiid_hardware::{AnyCardReader, ReaderEvent, ReaderManager, ReaderManagerConfig};
//! use thaiid_hardware::mock::{CardFixture, MockReader};
//!
//! #[tokio::main]
//! async fn main() -> thaiid_hardware::Result<()> {
//!     let (reader, mut mock) = MockReader::new();
//!
//!     let mut manager = ReaderManager::new(ReaderManagerConfig::default());
//!     manager.register_reader(AnyCardReader::Mock(reader));
//!     let mut events = manager.start();
//!
//!     mock.plug().await?;
//!     mock.insert_card(CardFixture::sample()).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         if let ReaderEvent::CardInserted(_) = event {
//!             break;
//!         }
//!     }
//!
//!     events.shutdown().await
//! }
//! ```
//!
//! [`CardReader`]: traits::CardReader
//! [`IdCard`]: traits::IdCard
//! [`MockReaderHandle`]: mock::MockReaderHandle
//! [`CardFixture`]: mock::CardFixture

pub mod devices;
pub mod error;
pub mod manager;
pub mod mock;
#[cfg(feature = "pcsc")]
pub mod pcsc;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{AnyCardReader, AnyIdCard};
pub use error::{HardwareError, Result};
pub use manager::{ReaderHandle, ReaderManager, ReaderManagerConfig};
pub use traits::{CardReader, IdCard, ReaderEvent};
pub use types::ReaderInfo;
