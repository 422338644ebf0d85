use thiserror::Error;

use crate::types::CardField;

#[derive(Error, Debug)]
pub enum Error {
    // Query errors
    #[error("Card reader is not connected")]
    DeviceUnavailable,

    #[error("No card data available")]
    NoCardData,

    // Card read errors
    #[error("Failed to read {field} from card: {message}")]
    FieldExtraction { field: CardField, message: String },

    #[error("Cannot decompose address: {address}")]
    AddressParse { address: String },

    // Driver errors
    #[error("Device error: {0}")]
    Device(String),

    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a field extraction error for `field`.
    pub fn field_extraction(field: CardField, message: impl Into<String>) -> Self {
        Self::FieldExtraction {
            field,
            message: message.into(),
        }
    }

    /// Whether this error is answered to HTTP clients rather than only logged.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::DeviceUnavailable | Self::NoCardData)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_extraction_display() {
        let error = Error::field_extraction(CardField::Photo, "card removed");
        assert_eq!(error.to_string(), "Failed to read photo from card: card removed");
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = Error::InvalidStateTransition {
            from: "IdleDisconnected".into(),
            to: "ConnectedHasCard".into(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid state transition from IdleDisconnected to ConnectedHasCard"
        );
    }

    #[test]
    fn test_query_errors() {
        assert!(Error::DeviceUnavailable.is_query_error());
        assert!(Error::NoCardData.is_query_error());
        assert!(!Error::Device("reader unplugged".into()).is_query_error());
        assert!(
            !Error::AddressParse {
                address: "x".into()
            }
            .is_query_error()
        );
    }
}
