//! API route modules.

pub mod health;
pub mod index;
pub mod stream;

use axum::Router;
use axum::routing::get;

use crate::server::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .nest("/stream", stream::router())
        .nest("/health", health::router())
        .with_state(state)
}
