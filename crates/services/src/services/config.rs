//! Quote proxy configuration, read once at startup.

use std::{sync::Arc, time::Duration};

use reqwest::Client;
use secrecy::SecretString;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::{info, warn};

use super::{
    quote::{DEFAULT_GOLDAPI_BASE_URL, GoldApiSource, PublicFeedSource, QuoteSource, QuoteTarget},
    quote_cache::CachedQuoteSource,
};

pub const DEFAULT_CACHE_SECS: u64 = 60;

/// Which upstream strategy the deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QuoteProvider {
    /// Token-authenticated goldapi.io.
    #[default]
    GoldApi,
    /// Unauthenticated feed of `[label, price]` pairs.
    Public,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown QUOTE_PROVIDER `{0}` (expected goldapi or public)")]
    UnknownProvider(String),
    #[error("PUBLIC_FEED_URL must be set when QUOTE_PROVIDER=public")]
    MissingFeedUrl,
    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("QUOTE_CACHE_SECS must be a whole number of seconds, got `{0}`")]
    InvalidCacheSecs(String),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub provider: QuoteProvider,
    /// Absent credentials are not a startup error; requests answer `missing_token`.
    pub goldapi_token: Option<SecretString>,
    pub goldapi_base_url: String,
    pub public_feed_url: Option<String>,
    pub cache_ttl: Duration,
    pub target: QuoteTarget,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            provider: QuoteProvider::default(),
            goldapi_token: None,
            goldapi_base_url: DEFAULT_GOLDAPI_BASE_URL.to_string(),
            public_feed_url: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_SECS),
            target: QuoteTarget::gold(),
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(raw) = var("QUOTE_PROVIDER") {
            config.provider = raw
                .parse()
                .map_err(|_| ConfigError::UnknownProvider(raw.clone()))?;
        }

        config.goldapi_token = var("GOLDAPI_TOKEN").map(SecretString::from);

        if let Some(base) = var("GOLDAPI_BASE_URL") {
            validate_url("GOLDAPI_BASE_URL", &base)?;
            config.goldapi_base_url = base;
        }

        if let Some(feed) = var("PUBLIC_FEED_URL") {
            validate_url("PUBLIC_FEED_URL", &feed)?;
            config.public_feed_url = Some(feed);
        }
        if config.provider == QuoteProvider::Public && config.public_feed_url.is_none() {
            return Err(ConfigError::MissingFeedUrl);
        }

        if let Some(raw) = var("QUOTE_CACHE_SECS") {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidCacheSecs(raw.clone()))?;
            config.cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Instantiates the configured strategy, wrapped in the freshness cache
    /// unless the TTL is zero.
    pub fn build_source(&self) -> Result<Arc<dyn QuoteSource>, ConfigError> {
        let http = Client::builder()
            .user_agent(concat!("focus-todo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let source: Arc<dyn QuoteSource> = match self.provider {
            QuoteProvider::GoldApi => {
                if self.goldapi_token.is_none() {
                    warn!("GOLDAPI_TOKEN is not set; /api/quote will answer missing_token");
                }
                Arc::new(GoldApiSource::new(
                    http,
                    self.goldapi_base_url.clone(),
                    self.goldapi_token.clone(),
                    self.target.clone(),
                ))
            }
            QuoteProvider::Public => {
                let url = self
                    .public_feed_url
                    .clone()
                    .ok_or(ConfigError::MissingFeedUrl)?;
                Arc::new(PublicFeedSource::new(http, url, self.target.clone()))
            }
        };

        info!(
            provider = %self.provider,
            cache_secs = self.cache_ttl.as_secs(),
            "Quote source configured"
        );

        if self.cache_ttl.is_zero() {
            return Ok(source);
        }
        Ok(Arc::new(CachedQuoteSource::new(source, self.cache_ttl)))
    }
}

fn validate_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidUrl { var, source })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ProxyConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProxyConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.provider, QuoteProvider::GoldApi);
        assert!(config.goldapi_token.is_none());
        assert_eq!(config.goldapi_base_url, DEFAULT_GOLDAPI_BASE_URL);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let config = config_from(&[("GOLDAPI_TOKEN", "  ")]).unwrap();
        assert!(config.goldapi_token.is_none());

        let config = config_from(&[("GOLDAPI_TOKEN", "abc")]).unwrap();
        assert_eq!(config.goldapi_token.unwrap().expose_secret(), "abc");
    }

    #[test]
    fn test_public_provider_requires_feed_url() {
        let err = config_from(&[("QUOTE_PROVIDER", "public")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFeedUrl));

        let config = config_from(&[
            ("QUOTE_PROVIDER", "Public"),
            ("PUBLIC_FEED_URL", "https://example.com/prices"),
        ])
        .unwrap();
        assert_eq!(config.provider, QuoteProvider::Public);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            config_from(&[("QUOTE_PROVIDER", "bloomberg")]).unwrap_err(),
            ConfigError::UnknownProvider(_)
        ));
        assert!(matches!(
            config_from(&[("GOLDAPI_BASE_URL", "not a url")]).unwrap_err(),
            ConfigError::InvalidUrl { .. }
        ));
        assert!(matches!(
            config_from(&[("QUOTE_CACHE_SECS", "soon")]).unwrap_err(),
            ConfigError::InvalidCacheSecs(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_token_source_still_builds() {
        let config = config_from(&[("QUOTE_CACHE_SECS", "0")]).unwrap();
        let source = config.build_source().unwrap();
        let err = source.fetch_price().await.unwrap_err();
        assert_eq!(err.code(), "missing_token");
    }
}
