use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::services::quote::QuoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Quote(err) => (
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::BAD_GATEWAY),
                err.code(),
            ),
        };
        tracing::warn!(status = status.as_u16(), error = %self, code = %code, "Request failed");

        let mut response = (status, Json(ErrorBody { error: code })).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}
