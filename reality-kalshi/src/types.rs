//! Kalshi API response types
//!
//! These types mirror the `/events` response and are converted to
//! `reality_core::MarketSnapshot` for the rest of the workspace. Events are
//! decoded one at a time, so an event with missing or mistyped fields is
//! dropped instead of failing the whole page.

use reality_core::MarketSnapshot;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;

/// Response from GET /events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    /// Raw events, decoded lazily by `events()`
    #[serde(default)]
    pub events: Option<Vec<Value>>,

    /// Continuation token for the next page
    #[serde(default)]
    pub cursor: Option<String>,
}

impl EventsResponse {
    /// Decode a page body
    ///
    /// Returns `None` for an empty body (`null`, `false`, `0`, `""`, `[]` or
    /// `{}`), which ends pagination.
    pub fn from_body(body: Value) -> Result<Option<Self>, FetchError> {
        if is_empty_body(&body) {
            return Ok(None);
        }

        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| FetchError::Payload(format!("Failed to parse events page: {}", e)))
    }

    /// Cursor for the next page, if there is one
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }

    /// Events on this page, `None` for each entry that fails to decode
    pub fn events(&self) -> impl Iterator<Item = Option<KalshiEvent>> + '_ {
        self.events
            .iter()
            .flatten()
            .map(|value| KalshiEvent::deserialize(value).ok())
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// A Kalshi event from the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KalshiEvent {
    /// Event ticker (unique identifier)
    #[serde(default)]
    pub event_ticker: Option<String>,

    /// Event title
    #[serde(default)]
    pub title: Option<String>,

    /// Nested markets (requested with `with_nested_markets=true`)
    #[serde(default)]
    pub markets: Option<Vec<KalshiMarket>>,
}

impl KalshiEvent {
    /// YES probability taken from the first nested market
    ///
    /// Multi-market events are reduced to their first market. An event
    /// without markets has probability 0.
    pub fn yes_probability(&self) -> f64 {
        self.markets
            .as_deref()
            .and_then(|markets| markets.first())
            .map(KalshiMarket::yes_probability)
            .unwrap_or(0.0)
    }

    /// Convert to a snapshot, or `None` if the ticker or title is missing
    pub fn to_snapshot(&self) -> Option<MarketSnapshot> {
        let id = self.event_ticker.as_deref().filter(|t| !t.is_empty())?;
        let title = clean_title(self.title.as_deref()?);
        if title.is_empty() {
            return None;
        }

        Some(MarketSnapshot {
            id: id.to_string(),
            title,
            probability: self.yes_probability(),
        })
    }
}

/// A market nested inside an event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KalshiMarket {
    /// YES price in cents (0-100)
    #[serde(default)]
    pub yes_price: Option<f64>,

    /// Best YES bid in cents
    #[serde(default)]
    pub yes_bid: Option<f64>,

    /// Best YES ask in cents
    #[serde(default)]
    pub yes_ask: Option<f64>,
}

impl KalshiMarket {
    /// Convert cents to probability (0.00 - 1.00)
    pub fn cents_to_probability(cents: f64) -> f64 {
        cents / 100.0
    }

    /// YES probability
    ///
    /// Prefers `yes_price`, then the bid/ask midpoint. A missing bid counts
    /// as 0 and a missing or zero ask counts as 100.
    pub fn yes_probability(&self) -> f64 {
        if let Some(price) = self.yes_price {
            return Self::cents_to_probability(price);
        }

        let bid = self.yes_bid.unwrap_or(0.0);
        let ask = self.yes_ask.filter(|a| *a != 0.0).unwrap_or(100.0);
        Self::cents_to_probability((bid + ask) / 2.0)
    }
}

/// Collapse whitespace runs to single spaces and trim
pub fn clean_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> KalshiEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_yes_price_preferred() {
        let e = event(json!({
            "event_ticker": "KXA",
            "title": "A",
            "markets": [{"yes_price": 63, "yes_bid": 10, "yes_ask": 20}]
        }));
        assert_eq!(e.yes_probability(), 0.63);
    }

    #[test]
    fn test_bid_ask_midpoint() {
        let e = event(json!({
            "event_ticker": "KXB",
            "title": "B",
            "markets": [{"yes_bid": 40, "yes_ask": 60}]
        }));
        assert_eq!(e.yes_probability(), 0.50);
    }

    #[test]
    fn test_missing_bid_and_ask_defaults() {
        let only_bid = event(json!({"markets": [{"yes_bid": 20}]}));
        assert_eq!(only_bid.yes_probability(), 0.6);

        let only_ask = event(json!({"markets": [{"yes_ask": 30}]}));
        assert_eq!(only_ask.yes_probability(), 0.15);

        let zero_ask = event(json!({"markets": [{"yes_bid": 0, "yes_ask": 0}]}));
        assert_eq!(zero_ask.yes_probability(), 0.5);

        let null_price = event(json!({
            "markets": [{"yes_price": null, "yes_bid": 40, "yes_ask": 60}]
        }));
        assert_eq!(null_price.yes_probability(), 0.5);
    }

    #[test]
    fn test_no_markets_is_zero() {
        assert_eq!(event(json!({"markets": []})).yes_probability(), 0.0);
        assert_eq!(event(json!({})).yes_probability(), 0.0);
    }

    #[test]
    fn test_only_first_market_used() {
        let e = event(json!({
            "markets": [{"yes_price": 10}, {"yes_price": 90}]
        }));
        assert_eq!(e.yes_probability(), 0.1);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Will\tthe   Fed\n cut rates?  "), "Will the Fed cut rates?");
        assert_eq!(clean_title("   "), "");
    }

    #[test]
    fn test_to_snapshot_skips_incomplete_events() {
        assert!(event(json!({"title": "No ticker"})).to_snapshot().is_none());
        let empty_ticker = event(json!({"event_ticker": "", "title": "Empty ticker"}));
        assert!(empty_ticker.to_snapshot().is_none());
        assert!(event(json!({"event_ticker": "KXC"})).to_snapshot().is_none());
        assert!(event(json!({"event_ticker": "KXC", "title": ""})).to_snapshot().is_none());
        assert!(event(json!({"event_ticker": "KXC", "title": "  \n "})).to_snapshot().is_none());

        let snapshot = event(json!({
            "event_ticker": "KXC",
            "title": " Spaced   title ",
            "markets": [{"yes_price": 25}]
        }))
        .to_snapshot()
        .unwrap();
        assert_eq!(snapshot, MarketSnapshot::new("KXC", "Spaced title", 0.25));
    }

    #[test]
    fn test_from_body() {
        assert!(EventsResponse::from_body(Value::Null).unwrap().is_none());
        assert!(EventsResponse::from_body(json!({})).unwrap().is_none());
        assert!(EventsResponse::from_body(json!(0)).unwrap().is_none());
        assert!(EventsResponse::from_body(json!("")).unwrap().is_none());
        assert!(EventsResponse::from_body(json!([])).unwrap().is_none());

        let page = EventsResponse::from_body(json!({"events": [], "cursor": ""}))
            .unwrap()
            .unwrap();
        assert_eq!(page.events().count(), 0);
        assert_eq!(page.next_cursor(), None);

        let page = EventsResponse::from_body(json!({"events": null, "cursor": "c1"}))
            .unwrap()
            .unwrap();
        assert_eq!(page.events().count(), 0);
        assert_eq!(page.next_cursor(), Some("c1"));

        assert!(EventsResponse::from_body(json!({"events": "nope"})).is_err());
        assert!(EventsResponse::from_body(json!(5)).is_err());
    }

    #[test]
    fn test_mistyped_event_decodes_as_none() {
        let page = EventsResponse::from_body(json!({
            "events": [
                {"event_ticker": "A", "title": 5},
                {"event_ticker": "B", "title": "Fine", "markets": [{"yes_price": "high"}]},
                {"event_ticker": "C", "title": "Fine"},
            ]
        }))
        .unwrap()
        .unwrap();

        let decoded: Vec<Option<String>> = page
            .events()
            .map(|e| e.and_then(|e| e.event_ticker))
            .collect();
        assert_eq!(decoded, vec![None, None, Some("C".to_string())]);
    }
}
