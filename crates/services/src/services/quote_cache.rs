//! Freshness cache in front of a quote source.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::future::Cache;

use super::quote::{Quote, QuoteError, QuoteSource};

/// Reuses one successful upstream answer for `ttl`.
///
/// Failures are never cached, so the next request retries upstream.
/// Concurrent misses share a single upstream call.
pub struct CachedQuoteSource {
    inner: Arc<dyn QuoteSource>,
    cache: Cache<(), Quote>,
}

impl CachedQuoteSource {
    pub fn new(inner: Arc<dyn QuoteSource>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { inner, cache }
    }
}

#[async_trait]
impl QuoteSource for CachedQuoteSource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_price(&self) -> Result<Quote, QuoteError> {
        let inner = self.inner.clone();
        self.cache
            .try_get_with((), async move { inner.fetch_price().await })
            .await
            .map_err(|e| (*e).clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use chrono::Utc;

    use super::*;

    struct Scripted {
        calls: AtomicUsize,
        results: Mutex<Vec<Result<f64, QuoteError>>>,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<f64, QuoteError>>) -> Arc<Self> {
            results.reverse();
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(results),
            })
        }
    }

    #[async_trait]
    impl QuoteSource for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_price(&self) -> Result<Quote, QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.results.lock().unwrap().pop().unwrap();
            next.map(|price| Quote {
                symbol: "XAU".to_string(),
                price,
                currency: "USD/oz".to_string(),
                updated_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_success_is_reused_within_ttl() {
        let inner = Scripted::new(vec![Ok(1.0), Ok(2.0)]);
        let cached = CachedQuoteSource::new(inner.clone(), Duration::from_secs(60));

        assert_eq!(cached.fetch_price().await.unwrap().price, 1.0);
        assert_eq!(cached.fetch_price().await.unwrap().price, 1.0);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Scripted::new(vec![Err(QuoteError::UpstreamStatus(503)), Ok(3.0)]);
        let cached = CachedQuoteSource::new(inner.clone(), Duration::from_secs(60));

        let err = cached.fetch_price().await.unwrap_err();
        assert_eq!(err, QuoteError::UpstreamStatus(503));
        assert_eq!(cached.fetch_price().await.unwrap().price, 3.0);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
