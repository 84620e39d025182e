//! Feed Codec
//!
//! JSON encoding and decoding for the news feed WebSocket.
//!
//! Inbound frames are single JSON objects dispatched on their `type`
//! field. A frame that fails to parse, or that parses but lacks a
//! usable discriminator, is a codec error; the connection manager
//! treats codec errors as local faults and keeps the connection open.

use crate::infrastructure::feed::messages::{FeedFrame, OutboundFrame};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame is valid JSON but not an object.
    #[error("invalid frame format: {0}")]
    InvalidFormat(String),

    /// Frame object has no string `type` discriminator.
    #[error("frame is missing a type discriminator")]
    MissingType,
}

/// JSON codec for the news feed stream.
#[derive(Debug, Default, Clone)]
pub struct FeedCodec;

impl FeedCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into a [`FeedFrame`].
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object, has no
    /// `type` discriminator, or declares `news` but fails to carry the
    /// mandatory news fields.
    pub fn decode(&self, text: &str) -> Result<FeedFrame, CodecError> {
        let value: serde_json::Value = serde_json::from_str(text.trim())?;

        if !value.is_object() {
            // Truncate on char boundaries; payloads are untrusted UTF-8
            let preview: String = text.chars().take(50).collect();
            return Err(CodecError::InvalidFormat(format!(
                "expected JSON object, got: {preview}..."
            )));
        }

        let Some(kind) = value.get("type").and_then(|v| v.as_str()) else {
            return Err(CodecError::MissingType);
        };

        match kind {
            "news" => {
                let raw = serde_json::from_value(value)?;
                Ok(FeedFrame::News(raw))
            }
            "ping" => Ok(FeedFrame::Ping),
            other => Ok(FeedFrame::Other {
                kind: other.to_string(),
            }),
        }
    }

    /// Encode an outbound control frame to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode(&self, frame: &OutboundFrame) -> Result<String, CodecError> {
        Ok(serde_json::to_string(frame)?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_news_frame() {
        let codec = FeedCodec::new();
        let frame = codec
            .decode(r#"{"type":"news","symbol":"AAPL","headline":"X"}"#)
            .unwrap();

        match frame {
            FeedFrame::News(raw) => {
                assert_eq!(raw.symbol, "AAPL");
                assert_eq!(raw.headline, "X");
            }
            other => panic!("expected news frame, got {other:?}"),
        }
    }

    #[test]
    fn decode_news_frame_with_all_fields() {
        let codec = FeedCodec::new();
        let frame = codec
            .decode(
                r#"{"type":"news","symbol":"AAPL","headline":"X","summary":"S",
                    "source":"Reuters","url":"u","image":"i","datetime":123,
                    "category":"company","id":"1","related":["AAPL"]}"#,
            )
            .unwrap();

        match frame {
            FeedFrame::News(raw) => {
                assert_eq!(raw.summary.as_deref(), Some("S"));
                assert_eq!(raw.datetime, Some(123));
            }
            other => panic!("expected news frame, got {other:?}"),
        }
    }

    #[test]
    fn decode_ping_frame() {
        let codec = FeedCodec::new();
        assert_eq!(codec.decode(r#"{"type":"ping"}"#).unwrap(), FeedFrame::Ping);
    }

    #[test]
    fn decode_unrecognized_type() {
        let codec = FeedCodec::new();
        let frame = codec.decode(r#"{"type":"trade","data":[]}"#).unwrap();
        assert_eq!(
            frame,
            FeedFrame::Other {
                kind: "trade".to_string()
            }
        );
    }

    #[test]
    fn decode_invalid_json_fails() {
        let codec = FeedCodec::new();
        assert!(matches!(
            codec.decode("not json at all"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn decode_non_object_fails() {
        let codec = FeedCodec::new();
        assert!(matches!(
            codec.decode("[1,2,3]"),
            Err(CodecError::InvalidFormat(_))
        ));
    }

    #[test]
    fn decode_long_multibyte_non_object_fails_without_panicking() {
        let codec = FeedCodec::new();
        // Multibyte chars straddle the preview cutoff
        let payload = format!("[\"a{}\"]", "€".repeat(30));
        assert!(matches!(
            codec.decode(&payload),
            Err(CodecError::InvalidFormat(_))
        ));
    }

    #[test]
    fn decode_missing_type_fails() {
        let codec = FeedCodec::new();
        assert!(matches!(
            codec.decode(r#"{"symbol":"AAPL"}"#),
            Err(CodecError::MissingType)
        ));
    }

    #[test]
    fn decode_news_missing_headline_fails() {
        let codec = FeedCodec::new();
        assert!(matches!(
            codec.decode(r#"{"type":"news","symbol":"AAPL"}"#),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn encode_subscribe_round_trips_symbol() {
        let codec = FeedCodec::new();
        let json = codec.encode(&OutboundFrame::subscribe("TSLA")).unwrap();
        assert!(json.contains(r#""symbol":"TSLA""#));
    }
}
