use axum::Router;

use crate::AppState;

pub mod health;
pub mod quote;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(quote::router())
}
