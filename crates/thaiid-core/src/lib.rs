//! Core types for the Thai national ID card bridge.
//!
//! Holds the person record produced by a card read, the address decomposer
//! and the error taxonomy shared by the session and server crates.

pub mod address;
pub mod constants;
pub mod error;
pub mod types;

pub use address::{AddressPart, AddressRecord, decompose};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
