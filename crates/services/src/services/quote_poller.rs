//! Background polling of the quote proxy for the list view's price badge.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval, timeout},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::quote::Quote;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {0}")]
    Http(u16),
    #[error("json error: {0}")]
    Serde(String),
}

/// Client side of `GET /api/quote`.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    async fn fetch_quote(&self) -> Result<Quote, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpQuoteClient {
    http: Client,
    endpoint: String,
}

impl HttpQuoteClient {
    pub fn new(proxy_base_url: &str) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("focus-todo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/quote", proxy_base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl QuoteClient for HttpQuoteClient {
    async fn fetch_quote(&self) -> Result<Quote, FetchError> {
        let res = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }
        res.json::<Quote>()
            .await
            .map_err(|e| FetchError::Serde(e.to_string()))
    }
}

/// What the price badge should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuoteDisplay<'a> {
    Loading,
    Available(&'a Quote),
    Unavailable,
}

/// Poller state: the last good quote plus whether the latest attempt failed.
///
/// A failure never clears a quote that was already obtained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSnapshot {
    pub quote: Option<Quote>,
    pub last_fetch_failed: bool,
}

impl QuoteSnapshot {
    pub fn display(&self) -> QuoteDisplay<'_> {
        match (&self.quote, self.last_fetch_failed) {
            (Some(quote), _) => QuoteDisplay::Available(quote),
            (None, true) => QuoteDisplay::Unavailable,
            (None, false) => QuoteDisplay::Loading,
        }
    }

    pub fn apply(&mut self, result: Result<Quote, FetchError>) {
        match result {
            Ok(quote) => {
                self.quote = Some(quote);
                self.last_fetch_failed = false;
            }
            Err(_) => self.last_fetch_failed = true,
        }
    }
}

/// Spawns the polling loop: one fetch immediately, then one per `every`.
///
/// Polls never overlap. Each fetch gets at most `every` to complete; one that
/// is still pending when the next tick comes due is dropped and recorded as a
/// failure, and the next fetch starts on that tick.
pub struct QuotePoller;

impl QuotePoller {
    pub fn spawn(client: Arc<dyn QuoteClient>, every: Duration) -> QuotePollerHandle {
        let (tx, rx) = watch::channel(QuoteSnapshot::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(client, every, tx, cancel.clone()));
        QuotePollerHandle {
            rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn run(
    client: Arc<dyn QuoteClient>,
    every: Duration,
    tx: watch::Sender<QuoteSnapshot>,
    cancel: CancellationToken,
) {
    info!(interval = ?every, "Starting quote poller");
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = timeout(every, client.fetch_quote()) => result.unwrap_or_else(|_| {
                Err(FetchError::Transport(format!("no response within {every:?}")))
            }),
        };

        // The view may have gone away while the request was in flight.
        if cancel.is_cancelled() {
            break;
        }
        match &result {
            Ok(quote) => debug!(price = quote.price, "Quote refreshed"),
            Err(e) => warn!(error = %e, "Quote refresh failed"),
        }
        tx.send_modify(|snapshot| snapshot.apply(result));
    }
    debug!("Quote poller stopped");
}

/// Owner of a running poller. Dropping it stops polling.
pub struct QuotePollerHandle {
    rx: watch::Receiver<QuoteSnapshot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl QuotePollerHandle {
    /// Receiver notified after every completed poll.
    pub fn subscribe(&self) -> watch::Receiver<QuoteSnapshot> {
        self.rx.clone()
    }

    pub fn snapshot(&self) -> QuoteSnapshot {
        self.rx.borrow().clone()
    }

    /// Stops polling and waits for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Quote poller task ended abnormally");
            }
        }
    }
}

impl Drop for QuotePollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use chrono::Utc;
    use tokio::sync::Notify;

    use super::*;

    fn quote(price: f64) -> Quote {
        Quote {
            symbol: "XAU".to_string(),
            price,
            currency: "USD/oz".to_string(),
            updated_at: Utc::now(),
        }
    }

    struct ScriptedClient {
        calls: AtomicUsize,
        script: Mutex<VecDeque<Result<f64, u16>>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<f64, u16>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl QuoteClient for ScriptedClient {
        async fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(price)) => Ok(quote(price)),
                Some(Err(status)) => Err(FetchError::Http(status)),
                None => Err(FetchError::Transport("script exhausted".to_string())),
            }
        }
    }

    #[test]
    fn test_display_states() {
        let mut snapshot = QuoteSnapshot::default();
        assert_eq!(snapshot.display(), QuoteDisplay::Loading);

        snapshot.apply(Err(FetchError::Http(502)));
        assert_eq!(snapshot.display(), QuoteDisplay::Unavailable);

        snapshot.apply(Ok(quote(10.0)));
        assert!(matches!(snapshot.display(), QuoteDisplay::Available(q) if q.price == 10.0));

        // Last known good quote survives a transient failure.
        snapshot.apply(Err(FetchError::Http(502)));
        assert!(snapshot.last_fetch_failed);
        assert!(matches!(snapshot.display(), QuoteDisplay::Available(q) if q.price == 10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_on_interval() {
        let client = ScriptedClient::new(vec![Ok(1.0), Err(503), Ok(3.0)]);
        let handle = QuotePoller::spawn(client.clone(), DEFAULT_POLL_INTERVAL);
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().quote.as_ref().unwrap().price, 1.0);

        rx.changed().await.unwrap();
        {
            let snapshot = rx.borrow_and_update();
            assert!(snapshot.last_fetch_failed);
            assert_eq!(snapshot.quote.as_ref().unwrap().price, 1.0);
        }

        rx.changed().await.unwrap();
        {
            let snapshot = rx.borrow_and_update();
            assert!(!snapshot.last_fetch_failed);
            assert_eq!(snapshot.quote.as_ref().unwrap().price, 3.0);
        }

        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_failure_shows_unavailable() {
        let client = ScriptedClient::new(vec![Err(500)]);
        let handle = QuotePoller::spawn(client, DEFAULT_POLL_INTERVAL);
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().display(), QuoteDisplay::Unavailable);
        handle.shutdown().await;
    }

    /// Blocks every fetch until released, to hold a request in flight.
    struct GatedClient {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl QuoteClient for GatedClient {
        async fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(quote(42.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_after_shutdown_is_ignored() {
        let client = Arc::new(GatedClient {
            started: Notify::new(),
            release: Notify::new(),
        });
        let handle = QuotePoller::spawn(client.clone(), DEFAULT_POLL_INTERVAL);
        let rx = handle.subscribe();

        client.started.notified().await;
        handle.shutdown().await;
        client.release.notify_one();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(*rx.borrow(), QuoteSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let client = ScriptedClient::new(vec![Ok(1.0), Ok(2.0), Ok(3.0)]);
        let handle = QuotePoller::spawn(client.clone(), DEFAULT_POLL_INTERVAL);
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();

        drop(handle);
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    /// Records when each fetch starts, then takes `delay` to answer.
    struct SlowClient {
        delay: Duration,
        started_at: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait]
    impl QuoteClient for SlowClient {
        async fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.started_at.lock().unwrap().push(tokio::time::Instant::now());
            tokio::time::sleep(self.delay).await;
            Ok(quote(7.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_overrunning_the_interval_fails_and_polling_continues() {
        let origin = tokio::time::Instant::now();
        let client = Arc::new(SlowClient {
            delay: Duration::from_secs(90),
            started_at: Mutex::new(Vec::new()),
        });
        let handle = QuotePoller::spawn(client.clone(), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_secs(150)).await;

        let offsets: Vec<u64> = client
            .started_at
            .lock()
            .unwrap()
            .iter()
            .map(|at| at.duration_since(origin).as_secs())
            .collect();
        assert_eq!(offsets, vec![0, 60, 120]);
        assert_eq!(handle.snapshot().display(), QuoteDisplay::Unavailable);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_within_the_interval_is_applied() {
        let client = Arc::new(SlowClient {
            delay: Duration::from_secs(30),
            started_at: Mutex::new(Vec::new()),
        });
        let handle = QuotePoller::spawn(client.clone(), DEFAULT_POLL_INTERVAL);
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        assert!(matches!(rx.borrow().display(), QuoteDisplay::Available(q) if q.price == 7.0));
        handle.shutdown().await;
    }

    /// Never answers.
    struct HungClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuoteClient for HungClient {
        async fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_request_does_not_stall_polling() {
        let client = Arc::new(HungClient {
            calls: AtomicUsize::new(0),
        });
        let handle = QuotePoller::spawn(client.clone(), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_secs(630)).await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 11);
        let snapshot = handle.snapshot();
        assert!(snapshot.last_fetch_failed);
        assert_eq!(snapshot.display(), QuoteDisplay::Unavailable);
        handle.shutdown().await;
    }
}
