//! Wire types returned by the kadmin backend.
//!
//! The backend deserializes Kafka records itself and hands them back as JSON;
//! this module only mirrors the envelope shapes.  Message bodies stay as
//! [`serde_json::Value`] because their schema is whatever the selected
//! deserializer produced.
//!
//! ## For contributors
//!
//! Field names on the wire are camelCase.  New optional fields should carry
//! `#[serde(default)]` so older backends keep working.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Response of `GET /api/kafka/read/<topic>`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResponse {
    /// Backend-assigned id of the consumer serving this session.
    pub consumer_id: String,
    pub page: MessagePage,
}

/// One page of buffered messages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Records in buffer order (oldest first).
    #[serde(default)]
    pub content: Vec<MessageRecord>,

    /// Number of messages the consumer has seen since it was created or last
    /// truncated.  May exceed `content.len()` once the buffer wraps.
    #[serde(default)]
    pub total_elements: u64,
}

/// A single Kafka record as rendered by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(default)]
    pub key: Option<String>,

    /// When the backend received the record, in epoch milliseconds.
    pub write_time: i64,

    pub offset: i64,

    #[serde(default)]
    pub topic: String,

    #[serde(default)]
    pub partition: Option<i32>,

    /// Deserialized payload; `null` for tombstones.
    #[serde(default)]
    pub message: serde_json::Value,

    #[serde(default)]
    pub headers: Vec<MessageHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageHeader {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl MessageRecord {
    /// Write time in the local timezone, if the timestamp is representable.
    pub fn written_at(&self) -> Option<DateTime<Local>> {
        DateTime::<Utc>::from_timestamp_millis(self.write_time).map(|t| t.with_timezone(&Local))
    }

    /// Pretty-printed payload, or `"null"` when the record carries none.
    pub fn message_text(&self) -> String {
        match &self.message {
            serde_json::Value::Null => "null".to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }

    /// Headers as `key: value` lines.
    pub fn headers_text(&self) -> String {
        self.headers
            .iter()
            .map(|h| format!("{}: {}", h.key, h.value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A deserializer registered with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeserializerInfo {
    pub id: String,
    pub name: String,
}

/// `GET /api/manager/deserializers` answers either a bare list or a page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DeserializerListing {
    Paged { content: Vec<DeserializerInfo> },
    Bare(Vec<DeserializerInfo>),
}

impl From<DeserializerListing> for Vec<DeserializerInfo> {
    fn from(listing: DeserializerListing) -> Self {
        match listing {
            DeserializerListing::Paged { content } => content,
            DeserializerListing::Bare(list) => list,
        }
    }
}

/// A consumer held open by the backend, from `GET /api/manager/consumers`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerInfo {
    pub consumer_group_id: String,
    pub topic: String,
    #[serde(default)]
    pub deserializer_id: String,
    #[serde(default)]
    pub deserializer_name: String,
    /// Epoch ms of the newest buffered message, `-1` when the buffer is empty.
    #[serde(default)]
    pub last_message_time: i64,
    #[serde(default)]
    pub last_used_time: i64,
    #[serde(default)]
    pub queue_size: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConsumerListing {
    #[serde(default)]
    pub content: Vec<ConsumerInfo>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_response_parses_backend_payload() {
        let body = json!({
            "consumerId": "c1",
            "page": {
                "page": 0,
                "size": 1,
                "totalElements": 7,
                "content": [{
                    "key": "order-1",
                    "writeTime": 1_700_000_000_000_i64,
                    "offset": 42,
                    "topic": "orders",
                    "message": {"id": 1, "state": "NEW"}
                }]
            }
        });

        let resp: ReadResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.consumer_id, "c1");
        assert_eq!(resp.page.total_elements, 7);
        assert_eq!(resp.page.content.len(), 1);

        let rec = &resp.page.content[0];
        assert_eq!(rec.key.as_deref(), Some("order-1"));
        assert_eq!(rec.offset, 42);
        assert!(rec.partition.is_none());
        assert!(rec.headers.is_empty());
        assert!(rec.written_at().is_some());
    }

    #[test]
    fn empty_page_parses() {
        let resp: ReadResponse =
            serde_json::from_value(json!({"consumerId": "c1", "page": {"content": [], "totalElements": 0}}))
                .unwrap();
        assert!(resp.page.content.is_empty());
        assert_eq!(resp.page.total_elements, 0);
    }

    #[test]
    fn null_message_renders_as_null() {
        let rec: MessageRecord =
            serde_json::from_value(json!({"writeTime": 0, "offset": 0, "message": null})).unwrap();
        assert_eq!(rec.message_text(), "null");
    }

    #[test]
    fn object_message_is_pretty_printed() {
        let rec: MessageRecord =
            serde_json::from_value(json!({"writeTime": 0, "offset": 0, "message": {"a": 1}})).unwrap();
        assert_eq!(rec.message_text(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn headers_render_one_per_line() {
        let rec: MessageRecord = serde_json::from_value(json!({
            "writeTime": 0,
            "offset": 0,
            "headers": [{"key": "trace", "value": "abc"}, {"key": "source", "value": "api"}]
        }))
        .unwrap();
        assert_eq!(rec.headers_text(), "trace: abc\nsource: api");
    }

    #[test]
    fn deserializer_listing_accepts_both_shapes() {
        let bare: DeserializerListing =
            serde_json::from_value(json!([{"id": "string", "name": "String"}])).unwrap();
        let paged: DeserializerListing =
            serde_json::from_value(json!({"content": [{"id": "avro", "name": "Avro"}]})).unwrap();

        let bare: Vec<DeserializerInfo> = bare.into();
        let paged: Vec<DeserializerInfo> = paged.into();
        assert_eq!(bare[0].id, "string");
        assert_eq!(paged[0].name, "Avro");
    }

    #[test]
    fn consumer_listing_parses() {
        let listing: ConsumerListing = serde_json::from_value(json!({
            "content": [{
                "consumerGroupId": "kadmin-1",
                "topic": "orders",
                "deserializerId": "string",
                "deserializerName": "String",
                "lastMessageTime": -1,
                "lastUsedTime": 1_700_000_000_000_i64,
                "queueSize": 50,
                "total": 3
            }],
            "totalElements": 1
        }))
        .unwrap();
        assert_eq!(listing.content.len(), 1);
        assert_eq!(listing.content[0].queue_size, 50);
    }
}
