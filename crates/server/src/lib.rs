use std::sync::Arc;

use axum::Router;
use services::services::quote::QuoteSource;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod routes;

/// Shared handler state. Handlers keep no per-request mutable state.
#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<dyn QuoteSource>,
}

impl AppState {
    pub fn new(quotes: Arc<dyn QuoteSource>) -> Self {
        Self { quotes }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
