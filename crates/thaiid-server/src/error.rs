//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thaiid_core::Error;
use thaiid_core::constants::{MESSAGE_DEVICE_UNAVAILABLE, MESSAGE_NO_CARD_DATA};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No reader is attached.
    #[error("device unavailable")]
    DeviceUnavailable,

    /// A reader is attached but no card has been read.
    #[error("no card data")]
    NoCardData,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::DeviceUnavailable => ApiError::DeviceUnavailable,
            Error::NoCardData => ApiError::NoCardData,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::DeviceUnavailable => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": MESSAGE_DEVICE_UNAVAILABLE, "status": false })),
            )
                .into_response(),
            ApiError::NoCardData => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": MESSAGE_NO_CARD_DATA })),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": message })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thaiid_core::CardField;

    #[test]
    fn test_from_core_error() {
        assert!(matches!(
            ApiError::from(Error::DeviceUnavailable),
            ApiError::DeviceUnavailable
        ));
        assert!(matches!(ApiError::from(Error::NoCardData), ApiError::NoCardData));
        assert!(matches!(
            ApiError::from(Error::field_extraction(CardField::Photo, "timeout")),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::DeviceUnavailable.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NoCardData.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
