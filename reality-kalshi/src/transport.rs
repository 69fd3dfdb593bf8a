//! HTTP transport for the events endpoint
//!
//! `EventsTransport` performs exactly one GET per call and never retries;
//! retrying and pagination live in `KalshiClient`.

use async_trait::async_trait;
use reality_core::{RealityError, RealityResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// User agent sent with every request
const USER_AGENT_VALUE: &str = "RealityCheck/1.0";

/// Query for one page of events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsQuery {
    pub status: String,
    pub limit: u32,
    pub with_nested_markets: bool,
    pub cursor: Option<String>,
}

impl EventsQuery {
    /// First page of open events with nested markets
    pub fn open(limit: u32) -> Self {
        Self {
            status: "open".to_string(),
            limit,
            with_nested_markets: true,
            cursor: None,
        }
    }

    /// Query string parameters
    ///
    /// The cursor is left out entirely when there is none.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("status", self.status.clone()),
            ("limit", self.limit.to_string()),
            ("with_nested_markets", self.with_nested_markets.to_string()),
        ];
        if let Some(cursor) = self.cursor.as_deref().filter(|c| !c.is_empty()) {
            params.push(("cursor", cursor.to_string()));
        }
        params
    }
}

/// A single request against the events endpoint
#[async_trait]
pub trait EventsTransport: Send + Sync {
    /// Fetch one page and return the decoded JSON body
    async fn get_events(&self, query: &EventsQuery) -> RealityResult<Value>;
}

/// `reqwest`-backed transport
#[derive(Clone)]
pub struct HttpEventsTransport {
    client: Client,
    base_url: String,
}

impl HttpEventsTransport {
    /// Create a transport against `base_url` (e.g. `.../trade-api/v2`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RealityResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RealityError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }
}

#[async_trait]
impl EventsTransport for HttpEventsTransport {
    async fn get_events(&self, query: &EventsQuery) -> RealityResult<Value> {
        let url = self.events_url();
        debug!("Fetching Kalshi events from: {} (cursor: {:?})", url, query.cursor);

        let response = self
            .client
            .get(&url)
            .query(&query.params())
            .send()
            .await
            .map_err(|e| RealityError::network(format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RealityError::api(format!(
                "Kalshi API error ({}): {}",
                status, body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RealityError::parse(format!("Failed to parse events response: {}", e)))
    }
}

impl std::fmt::Debug for HttpEventsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEventsTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_omits_cursor() {
        let params = EventsQuery::open(200).params();
        assert_eq!(
            params,
            vec![
                ("status", "open".to_string()),
                ("limit", "200".to_string()),
                ("with_nested_markets", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_cursor_attached_when_present() {
        let mut query = EventsQuery::open(50);
        query.cursor = Some("c1".to_string());
        assert!(query.params().contains(&("cursor", "c1".to_string())));

        query.cursor = Some(String::new());
        assert!(query.params().iter().all(|(k, _)| *k != "cursor"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let transport =
            HttpEventsTransport::new("https://example.com/trade-api/v2/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(transport.events_url(), "https://example.com/trade-api/v2/events");
    }
}
