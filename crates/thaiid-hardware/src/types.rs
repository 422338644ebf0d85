//! Common types shared across reader implementations.

use serde::{Deserialize, Serialize};

/// Card reader information.
///
/// Contains reader-specific metadata such as the driver backing it and the
/// transmission protocols it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "ACS ACR39U ICC Reader 00 00").
    pub name: String,

    /// Driver backing the reader ("mock", "pcsc").
    pub driver: String,

    /// List of supported protocols (e.g., ["T=0", "T=1"]).
    pub protocols: Vec<String>,
}

impl ReaderInfo {
    /// Create a new ReaderInfo.
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            protocols: Vec::new(),
        }
    }

    /// Set the supported protocols.
    pub fn with_protocols(mut self, protocols: Vec<String>) -> Self {
        self.protocols = protocols;
        self
    }
}

impl std::fmt::Display for ReaderInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.driver)
    }
}
