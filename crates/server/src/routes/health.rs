use axum::{Router, routing::get};

use crate::AppState;

pub async fn health_check() -> &'static str {
    "OK"
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
