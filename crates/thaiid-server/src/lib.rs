//! HTTP query layer for the Thai ID bridge.
//!
//! Exposes an axum [`Router`] answering from a [`SessionView`]:
//!
//! - `GET /api/person`: the last card read, 400 without a reader, 404
//!   without a card
//! - `GET /api/status`: `{"connected", "hasData", "state"}`
//!
//! ```no_run
//! use thaiid_server::{AppState, router};
//! use thaiid_session::Session;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let (_session, view) = Session::new();
//!     let app = router(AppState::new(view));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;

pub use config::{ReaderBackend, ReaderConfig, ServerConfig};
pub use error::ApiError;

use axum::{Router, routing::get};
use thaiid_session::SessionView;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state threaded through all axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub view: SessionView,
}

impl AppState {
    pub fn new(view: SessionView) -> Self {
        Self { view }
    }
}

/// Build the API [`Router`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/person", get(handlers::person))
        .route("/api/status", get(handlers::status))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
