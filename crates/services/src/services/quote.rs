//! Upstream spot-price providers behind the quote proxy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_GOLDAPI_BASE_URL: &str = "https://www.goldapi.io/api";

/// One spot-price snapshot, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

/// The commodity/currency pair a source is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTarget {
    pub symbol: String,
    pub currency: String,
    /// Currency label reported to clients, e.g. `USD/oz`.
    pub unit_label: String,
    /// Lowercase commodity name used in the `no_<commodity>` error code.
    pub commodity: String,
}

impl QuoteTarget {
    pub fn gold() -> Self {
        Self {
            symbol: "XAU".to_string(),
            currency: "USD".to_string(),
            unit_label: "USD/oz".to_string(),
            commodity: "gold".to_string(),
        }
    }

    fn quote(&self, price: f64, updated_at: DateTime<Utc>) -> Quote {
        Quote {
            symbol: self.symbol.clone(),
            price,
            currency: self.unit_label.clone(),
            updated_at,
        }
    }
}

impl Default for QuoteTarget {
    fn default() -> Self {
        Self::gold()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("upstream credential is not configured")]
    MissingToken,
    #[error("upstream responded with status {0}")]
    UpstreamStatus(u16),
    #[error("upstream response has no usable {commodity} price")]
    NoPrice { commodity: String },
    #[error("upstream request failed: {0}")]
    Request(String),
}

impl QuoteError {
    /// Stable machine-readable code returned to clients.
    pub fn code(&self) -> String {
        match self {
            Self::MissingToken => "missing_token".to_string(),
            Self::UpstreamStatus(_) => "failed_to_fetch".to_string(),
            Self::NoPrice { commodity } => format!("no_{commodity}"),
            Self::Request(_) => "request_failed".to_string(),
        }
    }

    /// HTTP status code: misconfiguration is a 500, upstream trouble a 502.
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingToken => 500,
            Self::UpstreamStatus(_) | Self::NoPrice { .. } | Self::Request(_) => 502,
        }
    }
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// A provider of the current spot price.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    async fn fetch_price(&self) -> Result<Quote, QuoteError>;
}

/// Only finite, strictly positive prices are usable.
fn usable_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price > 0.0).then_some(price)
}

async fn read_json(res: reqwest::Response) -> Result<Value, QuoteError> {
    let status = res.status();
    if !status.is_success() {
        return Err(QuoteError::UpstreamStatus(status.as_u16()));
    }
    let body = res.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| QuoteError::Request(format!("malformed upstream body: {e}")))
}

/// Token-authenticated provider (goldapi.io shape: `{price, timestamp?}`).
pub struct GoldApiSource {
    http: Client,
    base_url: String,
    token: Option<SecretString>,
    target: QuoteTarget,
}

impl GoldApiSource {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        token: Option<SecretString>,
        target: QuoteTarget,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token,
            target,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.target.symbol,
            self.target.currency
        )
    }

    fn parse(&self, body: &Value) -> Result<Quote, QuoteError> {
        let price = body
            .get("price")
            .and_then(usable_price)
            .ok_or_else(|| QuoteError::NoPrice {
                commodity: self.target.commodity.clone(),
            })?;
        let updated_at = body
            .get("timestamp")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);
        Ok(self.target.quote(price, updated_at))
    }
}

#[async_trait]
impl QuoteSource for GoldApiSource {
    fn name(&self) -> &'static str {
        "goldapi"
    }

    async fn fetch_price(&self) -> Result<Quote, QuoteError> {
        let Some(token) = self.token.as_ref() else {
            warn!("Quote request rejected: no upstream token configured");
            return Err(QuoteError::MissingToken);
        };

        let res = self
            .http
            .get(self.url())
            .header("x-access-token", token.expose_secret())
            .send()
            .await?;
        let body = read_json(res).await?;
        let quote = self.parse(&body)?;
        debug!(source = self.name(), price = quote.price, "Fetched quote");
        Ok(quote)
    }
}

/// Unauthenticated provider returning `[label, price]` pairs.
///
/// The pairs may be the top-level array or sit under an `items` key.
pub struct PublicFeedSource {
    http: Client,
    url: String,
    target: QuoteTarget,
}

impl PublicFeedSource {
    pub fn new(http: Client, url: impl Into<String>, target: QuoteTarget) -> Self {
        Self {
            http,
            url: url.into(),
            target,
        }
    }

    fn is_target_label(&self, label: &str) -> bool {
        let label = label.trim();
        label.eq_ignore_ascii_case(&self.target.symbol)
            || label.eq_ignore_ascii_case(&self.target.commodity)
    }

    fn parse(&self, body: &Value) -> Result<Quote, QuoteError> {
        let pairs = body
            .as_array()
            .or_else(|| body.get("items").and_then(Value::as_array));

        let price = pairs
            .into_iter()
            .flatten()
            .filter_map(|entry| match entry.as_array()?.as_slice() {
                [Value::String(label), price, ..] => Some((label.as_str(), price)),
                _ => None,
            })
            .find(|(label, _)| self.is_target_label(label))
            .and_then(|(_, price)| usable_price(price))
            .ok_or_else(|| QuoteError::NoPrice {
                commodity: self.target.commodity.clone(),
            })?;

        Ok(self.target.quote(price, Utc::now()))
    }
}

#[async_trait]
impl QuoteSource for PublicFeedSource {
    fn name(&self) -> &'static str {
        "public"
    }

    async fn fetch_price(&self) -> Result<Quote, QuoteError> {
        let res = self.http.get(&self.url).send().await?;
        let body = read_json(res).await?;
        let quote = self.parse(&body)?;
        debug!(source = self.name(), price = quote.price, "Fetched quote");
        Ok(quote)
    }
}
