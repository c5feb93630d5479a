//! Session parameters and the request they produce.
//!
//! [`FormValues`] is whatever the UI collected, loosely typed as strings.
//! [`build_config`] validates it once and yields a [`SessionConfig`] that the
//! rest of the session core can trust.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::error::ValidationError;

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub source_url: String,
    pub schema_url: String,
    pub topic: String,
    pub key_filter: String,
    pub message_filter: String,
    pub deserializer_id: String,
    pub refresh_interval_ms: u64,
    pub queue_size: Option<u32>,
}

/// Lower bound for message write times the session has observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Since {
    /// Nothing fetched yet; the wire sentinel is `-1`.
    #[default]
    Beginning,
    At(DateTime<Utc>),
}

impl Since {
    /// Epoch milliseconds, `-1` for [`Since::Beginning`].
    pub fn as_millis(&self) -> i64 {
        match self {
            Self::Beginning => -1,
            Self::At(t) => t.timestamp_millis(),
        }
    }
}

/// Validated parameters of one consumer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub started: bool,
    pub source_url: Option<String>,
    pub schema_url: Option<String>,
    pub topic: String,
    pub key_filter: Option<String>,
    pub message_filter: Option<String>,
    pub since: Since,
    /// Zero disables automatic refresh.
    pub refresh_interval: Duration,
    pub deserializer_id: String,
    /// Size of the backend's message buffer for a new consumer.
    pub queue_size: Option<u32>,
}

impl SessionConfig {
    /// Bookmarkable page for this topic and deserializer.
    pub fn permalink(&self, base: &Url) -> Url {
        let mut url = base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["consumer", "topic", self.topic.as_str(), self.deserializer_id.as_str()]);
        }
        url
    }
}

/// Validate form input into a [`SessionConfig`].
///
/// Blank optional fields become `None`, so an empty filter and no filter are
/// the same thing downstream.
pub fn build_config(form: &FormValues) -> Result<SessionConfig, ValidationError> {
    let topic = non_blank(&form.topic).ok_or(ValidationError::MissingTopic)?;
    let deserializer_id =
        non_blank(&form.deserializer_id).ok_or(ValidationError::MissingDeserializer)?;

    Ok(SessionConfig {
        started: true,
        source_url: non_blank(&form.source_url),
        schema_url: non_blank(&form.schema_url),
        topic,
        key_filter: non_blank(&form.key_filter),
        message_filter: non_blank(&form.message_filter),
        since: Since::Beginning,
        refresh_interval: Duration::from_millis(form.refresh_interval_ms),
        deserializer_id,
        queue_size: form.queue_size,
    })
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The read endpoint for `config` below `base`.
///
/// Query order is fixed: `deserializerId`, then whichever of `sourceUrl`,
/// `schemaUrl`, `keyFilter`, `messageFilter`, `size` are set.
pub fn build_request_url(base: &Url, config: &SessionConfig) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty()
            .extend(["api", "kafka", "read", config.topic.as_str()]);
    }

    let size = config.queue_size.map(|s| s.to_string());
    let optional = [
        ("sourceUrl", config.source_url.as_deref()),
        ("schemaUrl", config.schema_url.as_deref()),
        ("keyFilter", config.key_filter.as_deref()),
        ("messageFilter", config.message_filter.as_deref()),
        ("size", size.as_deref()),
    ];

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("deserializerId", &config.deserializer_id);
        for (name, value) in optional {
            if let Some(value) = value {
                query.append_pair(name, value);
            }
        }
    }
    url
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn form(topic: &str) -> FormValues {
        FormValues {
            topic: topic.into(),
            deserializer_id: "string".into(),
            ..FormValues::default()
        }
    }

    fn base() -> Url {
        Url::parse("http://localhost:8080").unwrap()
    }

    // -- build_config --------------------------------------------------------

    #[test]
    fn missing_topic_is_rejected() {
        for topic in ["", "   "] {
            assert_eq!(build_config(&form(topic)), Err(ValidationError::MissingTopic));
        }
    }

    #[test]
    fn topic_is_checked_before_deserializer() {
        assert_eq!(
            build_config(&FormValues::default()),
            Err(ValidationError::MissingTopic)
        );
        let mut values = form("orders");
        values.deserializer_id.clear();
        assert_eq!(build_config(&values), Err(ValidationError::MissingDeserializer));
    }

    #[test]
    fn blank_optionals_become_none() {
        let config = build_config(&FormValues {
            source_url: "".into(),
            schema_url: " ".into(),
            key_filter: "".into(),
            message_filter: "".into(),
            ..form("orders")
        })
        .unwrap();

        assert!(config.started);
        assert_eq!(config.topic, "orders");
        assert_eq!(config.since, Since::Beginning);
        assert!(config.source_url.is_none());
        assert!(config.schema_url.is_none());
        assert!(config.key_filter.is_none());
        assert!(config.message_filter.is_none());
    }

    #[test]
    fn build_config_is_deterministic() {
        let values = FormValues {
            key_filter: "abc".into(),
            refresh_interval_ms: 1000,
            ..form("orders")
        };
        assert_eq!(build_config(&values), build_config(&values));
        assert_eq!(
            build_config(&values).unwrap().refresh_interval,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn since_sentinel_is_minus_one() {
        assert_eq!(Since::Beginning.as_millis(), -1);
    }

    // -- build_request_url ---------------------------------------------------

    #[test]
    fn url_carries_only_required_params_when_optionals_blank() {
        let config = build_config(&FormValues {
            source_url: "".into(),
            key_filter: "".into(),
            ..form("orders")
        })
        .unwrap();

        let url = build_request_url(&base(), &config);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/kafka/read/orders?deserializerId=string"
        );
    }

    #[test]
    fn url_lists_optionals_in_stable_order() {
        let config = build_config(&FormValues {
            source_url: "kafka:9092".into(),
            schema_url: "http://registry:8081".into(),
            key_filter: "k1".into(),
            message_filter: "needle".into(),
            queue_size: Some(20),
            ..form("orders")
        })
        .unwrap();

        let url = build_request_url(&base(), &config);
        let names: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            names,
            ["deserializerId", "sourceUrl", "schemaUrl", "keyFilter", "messageFilter", "size"]
        );
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "schemaUrl" && v == "http://registry:8081"));
    }

    #[test]
    fn url_escapes_topic_and_filters() {
        let config = build_config(&FormValues {
            message_filter: "a&b=c".into(),
            ..form("my topic")
        })
        .unwrap();

        let url = build_request_url(&base(), &config);
        assert_eq!(url.path(), "/api/kafka/read/my%20topic");
        assert!(url.query_pairs().any(|(k, v)| k == "messageFilter" && v == "a&b=c"));
    }

    #[test]
    fn url_keeps_context_path() {
        let base = Url::parse("http://localhost:8080/kadmin/").unwrap();
        let url = build_request_url(&base, &build_config(&form("orders")).unwrap());
        assert_eq!(url.path(), "/kadmin/api/kafka/read/orders");
    }

    #[test]
    fn permalink_points_at_topic_page() {
        let config = build_config(&form("orders")).unwrap();
        assert_eq!(
            config.permalink(&base()).as_str(),
            "http://localhost:8080/consumer/topic/orders/string"
        );
    }
}
