//! Kalshi events client
//!
//! Walks the cursor-paginated `/events` endpoint and shapes every event into
//! a `MarketSnapshot`. Pages are requested strictly one after another.

use reality_core::{MarketSnapshot, RealityError, RealityResult};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::FetchError;
use crate::retry::RetryPolicy;
use crate::transport::{EventsQuery, EventsTransport, HttpEventsTransport};
use crate::types::{EventsResponse, KalshiEvent};

/// Base URL for Kalshi API
pub const KALSHI_API_BASE: &str = "https://api.elections.kalshi.com/trade-api/v2";

/// Events requested per page
pub const DEFAULT_PAGE_LIMIT: u32 = 200;

/// Per-request network timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the events client
#[derive(Debug, Clone, PartialEq)]
pub struct KalshiConfig {
    pub base_url: String,
    pub page_limit: u32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl KalshiConfig {
    /// Check the settings before building a client
    pub fn validate(&self) -> RealityResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| RealityError::config(format!("Invalid Kalshi base URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RealityError::config(format!(
                "Kalshi base URL must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.page_limit == 0 {
            return Err(RealityError::config("Kalshi page limit must be > 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(RealityError::config("Kalshi request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for KalshiConfig {
    fn default() -> Self {
        Self {
            base_url: KALSHI_API_BASE.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Kalshi events client
pub struct KalshiClient<T = HttpEventsTransport> {
    transport: T,
    retry: RetryPolicy,
    page_limit: u32,
}

impl KalshiClient<HttpEventsTransport> {
    /// Create a client talking to the real API
    pub fn new(config: &KalshiConfig) -> RealityResult<Self> {
        config.validate()?;
        let transport = HttpEventsTransport::new(&config.base_url, config.request_timeout)?;
        Ok(Self::with_transport(transport, config.retry, config.page_limit))
    }
}

impl<T: EventsTransport> KalshiClient<T> {
    /// Create a client over any transport
    pub fn with_transport(transport: T, retry: RetryPolicy, page_limit: u32) -> Self {
        Self {
            transport,
            retry,
            page_limit,
        }
    }

    /// Fetch every open event across all pages
    ///
    /// Stops when a page has no continuation cursor or when a page body is
    /// empty; in the latter case the events gathered so far are returned.
    /// A page that still fails after all retries fails the whole fetch.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<MarketSnapshot>, FetchError> {
        let mut snapshots = Vec::new();
        let mut query = EventsQuery::open(self.page_limit);
        let mut pages = 0usize;
        let mut skipped = 0usize;

        loop {
            debug!("Fetching Kalshi events page {}, cursor: {:?}", pages + 1, query.cursor);

            let body = self.request_page(&query).await?;
            pages += 1;

            let Some(page) = EventsResponse::from_body(body)? else {
                if query.cursor.is_some() {
                    warn!(
                        "Empty response on page {}, stopping with {} events",
                        pages,
                        snapshots.len()
                    );
                }
                break;
            };

            for event in page.events() {
                match event.as_ref().and_then(KalshiEvent::to_snapshot) {
                    Some(snapshot) => snapshots.push(snapshot),
                    None => skipped += 1,
                }
            }

            // Check for more pages
            match page.next_cursor() {
                Some(c) => query.cursor = Some(c.to_string()),
                None => break,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} malformed events or events without ticker or title", skipped);
        }
        info!("Fetched {} Kalshi events across {} pages", snapshots.len(), pages);
        Ok(snapshots)
    }

    /// Issue one request, retrying with exponential backoff
    async fn request_page(&self, query: &EventsQuery) -> Result<Value, FetchError> {
        let attempts = self.retry.attempts();
        let mut attempt = 0;

        loop {
            match self.transport.get_events(query).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt + 1 < attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Kalshi request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(FetchError::RetriesExhausted {
                        attempts,
                        source: e,
                    })
                }
            }
        }
    }
}

impl<T> std::fmt::Debug for KalshiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiClient")
            .field("retry", &self.retry)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}
