//! reqwest-backed implementation of [`ConsumerApi`].

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::message::{ConsumerListing, DeserializerListing};
use super::{ConsumerApi, ConsumerInfo, DeserializerInfo, ReadResponse};
use crate::error::BackendError;
use crate::session::{build_request_url, SessionConfig};

/// Talks to a kadmin backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    /// Create a client for the backend at `base_url`.
    ///
    /// `base_url` may carry a context path (e.g. `http://host:8080/kadmin`);
    /// every endpoint is resolved below it.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid API URL {base_url:?}"))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!("API URL must be http or https, got {base_url:?}");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // http(s) URLs always have a path, checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn delete(&self, url: Url) -> Result<(), BackendError> {
        debug!(%url, "DELETE");
        self.client.delete(url).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ConsumerApi for HttpApi {
    async fn list_topics(&self, source_url: Option<&str>) -> Result<Vec<String>, BackendError> {
        let mut url = self.endpoint(&["api", "topics"]);
        if let Some(source) = source_url.filter(|s| !s.is_empty()) {
            url.query_pairs_mut().append_pair("source-url", source);
        }
        debug!(%url, "GET");
        let topics = self.client.get(url).send().await?.error_for_status()?.json().await?;
        Ok(topics)
    }

    async fn list_deserializers(&self) -> Result<Vec<DeserializerInfo>, BackendError> {
        let url = self.endpoint(&["api", "manager", "deserializers"]);
        debug!(%url, "GET");
        let listing: DeserializerListing =
            self.client.get(url).send().await?.error_for_status()?.json().await?;
        Ok(listing.into())
    }

    async fn read(&self, config: &SessionConfig) -> Result<ReadResponse, BackendError> {
        let url = build_request_url(&self.base, config);
        debug!(%url, "GET");
        let resp = self.client.get(url).send().await?.error_for_status()?.json().await?;
        Ok(resp)
    }

    async fn truncate(&self, session_id: &str) -> Result<(), BackendError> {
        self.delete(self.endpoint(&["api", "manager", "consumers", session_id, "truncate"]))
            .await
    }

    async fn dispose(&self, session_id: &str) -> Result<(), BackendError> {
        self.delete(self.endpoint(&["api", "manager", "consumers", session_id]))
            .await
    }

    async fn list_consumers(&self) -> Result<Vec<ConsumerInfo>, BackendError> {
        let url = self.endpoint(&["api", "manager", "consumers"]);
        debug!(%url, "GET");
        let listing: ConsumerListing =
            self.client.get(url).send().await?.error_for_status()?.json().await?;
        Ok(listing.content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{build_config, FormValues};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> HttpApi {
        HttpApi::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn orders_config() -> SessionConfig {
        build_config(&FormValues {
            topic: "orders".into(),
            deserializer_id: "string".into(),
            ..FormValues::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(HttpApi::new("ftp://example.com", Duration::from_secs(1)).is_err());
        assert!(HttpApi::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn list_topics_passes_source_url_only_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/topics"))
            .and(query_param("source-url", "kafka:9092"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["orders"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/topics"))
            .and(query_param_is_missing("source-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["orders", "payments"])))
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert_eq!(api.list_topics(Some("kafka:9092")).await.unwrap(), vec!["orders"]);
        assert_eq!(api.list_topics(None).await.unwrap().len(), 2);
        assert_eq!(api.list_topics(Some("")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_deserializers_unwraps_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/manager/deserializers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"id": "string", "name": "String"}, {"id": "avro", "name": "Avro"}]
            })))
            .mount(&server)
            .await;

        let list = api_for(&server).list_deserializers().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].id, "avro");
    }

    #[tokio::test]
    async fn read_hits_topic_endpoint_with_deserializer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/kafka/read/orders"))
            .and(query_param("deserializerId", "string"))
            .and(query_param_is_missing("keyFilter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "consumerId": "c1",
                "page": {"content": [], "totalElements": 0}
            })))
            .mount(&server)
            .await;

        let resp = api_for(&server).read(&orders_config()).await.unwrap();
        assert_eq!(resp.consumer_id, "c1");
        assert_eq!(resp.page.total_elements, 0);
    }

    #[tokio::test]
    async fn read_honours_context_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kadmin/api/kafka/read/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "consumerId": "c1",
                "page": {"content": [], "totalElements": 0}
            })))
            .mount(&server)
            .await;

        let api = HttpApi::new(&format!("{}/kadmin", server.uri()), Duration::from_secs(5)).unwrap();
        assert!(api.read(&orders_config()).await.is_ok());
    }

    #[tokio::test]
    async fn http_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = api_for(&server).read(&orders_config()).await.unwrap_err();
        assert_eq!(err, BackendError::HttpStatus(404));
    }

    #[tokio::test]
    async fn garbage_body_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = api_for(&server).read(&orders_config()).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn truncate_and_dispose_issue_deletes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/manager/consumers/c1/truncate"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/manager/consumers/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        api.truncate("c1").await.unwrap();
        api.dispose("c1").await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_failure() {
        // Port 9 (discard) is closed on test machines.
        let api = HttpApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = api.dispose("c1").await.unwrap_err();
        assert!(matches!(err, BackendError::NetworkFailure(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn list_consumers_reads_page_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/manager/consumers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"consumerGroupId": "g1", "topic": "orders", "total": 2}]
            })))
            .mount(&server)
            .await;

        let consumers = api_for(&server).list_consumers().await.unwrap();
        assert_eq!(consumers[0].consumer_group_id, "g1");
        assert_eq!(consumers[0].total, 2);
    }
}
