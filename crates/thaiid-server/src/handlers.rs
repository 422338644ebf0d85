//! Query handlers. None of them mutate the session.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use thaiid_session::SessionStatus;
use tracing::debug;

use crate::{AppState, error::ApiError};

/// `GET /api/person`: the most recently read card.
pub async fn person(State(state): State<AppState>) -> Result<Response, ApiError> {
    let record = state
        .view
        .person()
        .inspect_err(|e| debug!(error = %e, "Person query refused"))?;

    Ok(Json(&*record).into_response())
}

/// `GET /api/status`: connectivity and data availability.
pub async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.view.status())
}
