use axum::{
    Router,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::get,
};

use crate::{AppState, error::ApiError};

/// Freshness hint for caches in front of the proxy.
const QUOTE_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60";

/// GET /api/quote
/// Current spot price from the configured upstream provider
pub async fn get_quote(State(state): State<AppState>) -> Result<Response, ApiError> {
    let quote = state.quotes.fetch_price().await?;
    tracing::debug!(source = state.quotes.name(), price = quote.price, "Serving quote");

    let mut response = ResponseJson(quote).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(QUOTE_CACHE_CONTROL),
    );
    Ok(response)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", get(get_quote))
}
