//! Canonical News Event Types
//!
//! Core domain types for news normalization: the raw upstream news
//! payload and the canonical event delivered to the webhook.
//!
//! Normalization is a pure function: every optional upstream field has
//! a deterministic default, so a canonical event is always fully
//! populated for downstream consumers. Malformed input is filtered out
//! by the feed codec before it ever reaches this module.

use serde::{Deserialize, Serialize};

/// Fixed platform name used when the upstream omits the article source.
pub const DEFAULT_SOURCE: &str = "Finnhub";

/// Category applied when the upstream omits one.
pub const DEFAULT_CATEGORY: &str = "general";

/// Raw news payload as received from the upstream feed.
///
/// # Wire Format (JSON)
///
/// ```json
/// {
///   "type": "news",
///   "symbol": "AAPL",
///   "headline": "Apple announces...",
///   "summary": "...",
///   "source": "Reuters",
///   "url": "https://...",
///   "image": "https://...",
///   "datetime": 1735689600000,
///   "category": "company",
///   "id": "7281930",
///   "related": ["AAPL", "MSFT"]
/// }
/// ```
///
/// Only `symbol` and `headline` are mandatory; everything else is
/// defaulted during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNews {
    /// Ticker symbol the article is attached to.
    pub symbol: String,

    /// Article headline.
    pub headline: String,

    /// Article summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Originating news source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Article URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Article image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Publication timestamp (unix milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<i64>,

    /// Article category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Upstream article identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Other symbols related to the article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<String>>,
}

/// Normalized news event forwarded to the webhook.
///
/// Constructed by [`CanonicalEvent::from_raw`], consumed exactly once
/// by the forwarding sink, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Event kind discriminator (always "news").
    pub kind: String,

    /// Topic (ticker symbol) the event belongs to.
    pub topic: String,

    /// Article headline.
    pub headline: String,

    /// Article summary; empty string when the upstream omitted it.
    pub summary: String,

    /// Originating source; [`DEFAULT_SOURCE`] when omitted.
    pub source: String,

    /// Article URL, if any.
    pub url: Option<String>,

    /// Article image URL, if any.
    pub image: Option<String>,

    /// Publication timestamp (unix milliseconds), if provided upstream.
    pub timestamp: Option<i64>,

    /// Article category; [`DEFAULT_CATEGORY`] when omitted.
    pub category: String,

    /// Event identity for downstream deduplication. Synthesized as
    /// `<topic>-<millis>` when the upstream omits an id; best-effort
    /// only, not collision-proof.
    pub id: String,

    /// Related topics; defaults to the event's own topic.
    pub related: Vec<String>,
}

impl CanonicalEvent {
    /// Normalize a raw news payload.
    ///
    /// `now_millis` is used only to synthesize an id when the upstream
    /// did not provide one; passing it in keeps the function pure.
    #[must_use]
    pub fn from_raw(raw: RawNews, now_millis: i64) -> Self {
        let id = match raw.id {
            Some(id) if !id.is_empty() => id,
            _ => format!("{}-{now_millis}", raw.symbol),
        };

        let related = match raw.related {
            Some(related) if !related.is_empty() => related,
            _ => vec![raw.symbol.clone()],
        };

        Self {
            kind: "news".to_string(),
            topic: raw.symbol,
            headline: raw.headline,
            summary: raw.summary.unwrap_or_default(),
            source: raw.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            url: raw.url,
            image: raw.image,
            timestamp: raw.datetime,
            category: raw.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            id,
            related,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_raw(symbol: &str, headline: &str) -> RawNews {
        RawNews {
            symbol: symbol.to_string(),
            headline: headline.to_string(),
            summary: None,
            source: None,
            url: None,
            image: None,
            datetime: None,
            category: None,
            id: None,
            related: None,
        }
    }

    #[test]
    fn minimal_payload_gets_all_defaults() {
        let event = CanonicalEvent::from_raw(minimal_raw("AAPL", "X"), 1_700_000_000_000);

        assert_eq!(event.kind, "news");
        assert_eq!(event.topic, "AAPL");
        assert_eq!(event.headline, "X");
        assert_eq!(event.summary, "");
        assert_eq!(event.source, DEFAULT_SOURCE);
        assert_eq!(event.category, DEFAULT_CATEGORY);
        assert_eq!(event.id, "AAPL-1700000000000");
        assert_eq!(event.related, vec!["AAPL".to_string()]);
        assert!(event.url.is_none());
        assert!(event.timestamp.is_none());
    }

    #[test]
    fn provided_fields_pass_through() {
        let raw = RawNews {
            summary: Some("A summary".to_string()),
            source: Some("Reuters".to_string()),
            url: Some("https://example.com/a".to_string()),
            image: Some("https://example.com/a.png".to_string()),
            datetime: Some(1_700_000_000_000),
            category: Some("company".to_string()),
            id: Some("7281930".to_string()),
            related: Some(vec!["AAPL".to_string(), "MSFT".to_string()]),
            ..minimal_raw("AAPL", "X")
        };

        let event = CanonicalEvent::from_raw(raw, 42);

        assert_eq!(event.summary, "A summary");
        assert_eq!(event.source, "Reuters");
        assert_eq!(event.url.as_deref(), Some("https://example.com/a"));
        assert_eq!(event.image.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(event.timestamp, Some(1_700_000_000_000));
        assert_eq!(event.category, "company");
        assert_eq!(event.id, "7281930");
        assert_eq!(event.related, vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[test]
    fn empty_id_is_synthesized() {
        let raw = RawNews {
            id: Some(String::new()),
            ..minimal_raw("TSLA", "Y")
        };
        let event = CanonicalEvent::from_raw(raw, 99);
        assert_eq!(event.id, "TSLA-99");
    }

    #[test]
    fn empty_related_defaults_to_own_topic() {
        let raw = RawNews {
            related: Some(vec![]),
            ..minimal_raw("TSLA", "Y")
        };
        let event = CanonicalEvent::from_raw(raw, 0);
        assert_eq!(event.related, vec!["TSLA".to_string()]);
    }

    #[test]
    fn raw_news_deserializes_minimal_frame() {
        let raw: RawNews =
            serde_json::from_str(r#"{"symbol":"AAPL","headline":"X"}"#).unwrap();
        assert_eq!(raw.symbol, "AAPL");
        assert_eq!(raw.headline, "X");
        assert!(raw.summary.is_none());
    }

    #[test]
    fn raw_news_missing_headline_fails() {
        let result = serde_json::from_str::<RawNews>(r#"{"symbol":"AAPL"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn canonical_event_serializes_nullable_fields() {
        let event = CanonicalEvent::from_raw(minimal_raw("AAPL", "X"), 1);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "news");
        assert_eq!(json["summary"], "");
        assert!(json["url"].is_null());
    }
}
