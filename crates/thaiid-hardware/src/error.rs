//! Error types for card reader operations.
//!
//! Reader-level failures (the device vanished, the PC/SC service cannot be
//! reached) are terminal for the reader task. Card-level failures only fail
//! the field being read.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during reader and card operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reader is gone or its event source has closed.
    #[error("Reader disconnected: {reader}")]
    Disconnected { reader: String },

    /// Reader service could not be set up.
    #[error("Initialization failed: {message}")]
    Initialization { message: String },

    /// Card answered with an error status word.
    #[error("Card returned status {sw1:02X} {sw2:02X}")]
    Status { sw1: u8, sw2: u8 },

    /// Field could not be read from the card.
    #[error("Card read error: {message}")]
    CardRead { message: String },

    /// Card answered with bytes that do not decode.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Card or reader does not support the Thai ID applet.
    #[error("Unsupported card: {message}")]
    Unsupported { message: String },

    /// Transport between host and reader failed.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Mock card fixture could not be loaded.
    #[error("Fixture error: {message}")]
    Fixture { message: String },

    /// Blocking reader task panicked or was cancelled.
    #[error("Reader task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(reader: impl Into<String>) -> Self {
        Self::Disconnected {
            reader: reader.into(),
        }
    }

    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardRead {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Whether the reader can no longer produce events after this error.
    ///
    /// The reader task stops on terminal errors and keeps polling otherwise.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected { .. } | Self::Initialization { .. })
    }
}

impl From<tokio::task::JoinError> for HardwareError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Task(error.to_string())
    }
}

#[cfg(feature = "pcsc")]
impl From<pcsc::Error> for HardwareError {
    fn from(error: pcsc::Error) -> Self {
        match error {
            pcsc::Error::NoService | pcsc::Error::ServiceStopped => {
                Self::disconnected(format!("PC/SC service: {error}"))
            }
            pcsc::Error::RemovedCard | pcsc::Error::ResetCard => Self::card_read(error.to_string()),
            pcsc::Error::UnsupportedCard | pcsc::Error::UnsupportedFeature => {
                Self::unsupported(error.to_string())
            }
            _ => Self::transport(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_display() {
        let error = HardwareError::disconnected("ACS ACR39U");
        assert_eq!(error.to_string(), "Reader disconnected: ACS ACR39U");
    }

    #[test]
    fn test_status_display() {
        let error = HardwareError::Status {
            sw1: 0x6A,
            sw2: 0x82,
        };
        assert_eq!(error.to_string(), "Card returned status 6A 82");
    }

    #[test]
    fn test_terminal_errors() {
        assert!(HardwareError::disconnected("reader").is_terminal());
        assert!(HardwareError::initialization("no context").is_terminal());
        assert!(!HardwareError::transport("transmit failed").is_terminal());
        assert!(!HardwareError::card_read("card removed").is_terminal());
        assert!(!HardwareError::Status { sw1: 0x6A, sw2: 0x82 }.is_terminal());
        assert!(!HardwareError::fixture("missing file").is_terminal());
    }

    #[tokio::test]
    async fn test_from_join_error() {
        let join = tokio::spawn(async { panic!("reader thread died") }).await;
        let error = HardwareError::from(join.unwrap_err());

        assert!(matches!(error, HardwareError::Task(_)));
        assert!(!error.is_terminal());
    }
}
