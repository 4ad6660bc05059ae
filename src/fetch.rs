//! JMX payload retrieval.
//!
//! A [`BeanSource`] yields the bean list of one endpoint. The HTTP source
//! issues a GET against the daemon's `/jmx` URL; decoding is kept separate in
//! [`parse_payload`] so it can be exercised without a server.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::time::timeout;
use url::Url;

use crate::bean::Bean;

/// Default request timeout (10 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures while fetching a payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("payload has no 'beans' array")]
    MissingBeans,
}

/// Source of JMX beans for one endpoint.
#[async_trait::async_trait]
pub trait BeanSource: Send + Sync {
    /// Endpoint identifier for logging.
    fn endpoint(&self) -> &str;

    /// Fetch and decode the current bean list.
    async fn fetch(&self) -> Result<Vec<Bean>, FetchError>;
}

#[derive(Deserialize)]
struct JmxPayload {
    #[serde(default)]
    beans: Option<Vec<Bean>>,
}

/// Decode a `/jmx` response body.
pub fn parse_payload(body: &[u8]) -> Result<Vec<Bean>, FetchError> {
    let payload: JmxPayload = serde_json::from_slice(body)?;
    payload.beans.ok_or(FetchError::MissingBeans)
}

/// Bean source backed by an HTTP `/jmx` endpoint.
#[derive(Debug, Clone)]
pub struct HttpBeanSource {
    url: Url,
    client: Client,
    timeout: Duration,
}

impl HttpBeanSource {
    /// Create a source for `url` with the given request timeout.
    ///
    /// # Errors
    /// Returns `FetchError::Client` if the HTTP client cannot be built.
    pub fn new(url: Url, request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            url,
            client,
            timeout: request_timeout,
        })
    }

    async fn request(&self) -> Result<Vec<Bean>, FetchError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        parse_payload(&body)
    }
}

#[async_trait::async_trait]
impl BeanSource for HttpBeanSource {
    fn endpoint(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch(&self) -> Result<Vec<Bean>, FetchError> {
        let start = Instant::now();
        let beans = timeout(self.timeout, self.request())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        tracing::debug!(
            url = %self.url,
            beans = beans.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched JMX payload"
        );
        Ok(beans)
    }
}

/// Fixed bean list, for tests and offline replays.
#[derive(Debug, Clone, Default)]
pub struct StaticBeanSource {
    beans: Vec<Bean>,
}

impl StaticBeanSource {
    pub fn new(beans: Vec<Bean>) -> Self {
        Self { beans }
    }
}

#[async_trait::async_trait]
impl BeanSource for StaticBeanSource {
    fn endpoint(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<Bean>, FetchError> {
        Ok(self.beans.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        let beans = parse_payload(
            br#"{"beans":[{"name":"Hadoop:service=NameNode,name=JvmMetrics","MemHeapUsedM":12.5}]}"#,
        )
        .unwrap();
        assert_eq!(beans.len(), 1);
        assert_eq!(beans[0].name(), "Hadoop:service=NameNode,name=JvmMetrics");
    }

    #[test]
    fn test_parse_payload_errors() {
        assert!(matches!(
            parse_payload(br#"{"other":[]}"#),
            Err(FetchError::MissingBeans)
        ));
        assert!(matches!(parse_payload(b"<html>"), Err(FetchError::Decode(_))));
        assert!(matches!(parse_payload(br#"[1,2]"#), Err(FetchError::Decode(_))));
        assert!(parse_payload(br#"{"beans":[]}"#).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticBeanSource::new(parse_payload(br#"{"beans":[{"name":"x"}]}"#).unwrap());
        assert_eq!(source.fetch().await.unwrap().len(), 1);
        assert_eq!(source.endpoint(), "static");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let url = Url::parse("http://127.0.0.1:1/jmx").unwrap();
        let source = HttpBeanSource::new(url, Duration::from_secs(2)).unwrap();
        assert!(source.fetch().await.is_err());
    }
}
