//! HTTP Client Module
//!
//! Paginated fetcher for upstream open-data APIs:
//! - Query string construction that leaves pre-encoded credentials untouched
//! - Bounded request timeouts
//! - Explicit JSON content negotiation
//! - Semaphore-based concurrency limiting
//!
//! A non-success status or an upstream error envelope fails the page. Nothing
//! is retried here; the collection loop decides what a failed page means.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::collector::PageFetch;
use crate::config::{Config, SourceConfig};
use crate::error::{IngestionError, Result};
use crate::sources::{parse_page, ParsedPage};

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum concurrent requests across all sources
    pub max_concurrent_requests: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("PlaceIngestion/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        }
    }
}

/// Fetches and parses one page at a time
pub struct PageFetcher {
    /// Inner reqwest client
    client: Client,
    /// Global concurrency semaphore
    semaphore: Arc<Semaphore>,
}

impl PageFetcher {
    /// Creates a new page fetcher
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));

        Ok(Self { client, semaphore })
    }

    /// Creates a fetcher with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpClientConfig::default())
    }

    /// Builds `<base><endpoint>?<query>` for one page.
    ///
    /// The credential is appended verbatim because issuers hand it out already
    /// percent-encoded; encoding it again would corrupt the key. Every other
    /// parameter is form-encoded.
    pub fn page_url(source: &SourceConfig, page: u32) -> String {
        let mut query = format!("{}={}", encode(&source.credential_param), source.credential);

        let mut push = |key: &str, value: &str| {
            query.push('&');
            query.push_str(&encode(key));
            query.push('=');
            query.push_str(&encode(value));
        };

        push(&source.page_param, &page.to_string());
        push(&source.size_param, &source.page_size.to_string());
        if let Some(ref mobile_os) = source.mobile_os {
            push("MobileOS", mobile_os);
        }
        if let Some(ref mobile_app) = source.mobile_app {
            push("MobileApp", mobile_app);
        }
        for (key, value) in &source.params {
            push(key, value);
        }

        format!("{}{}?{}", source.base_url, source.endpoint, query)
    }

    /// GETs a URL and decodes the JSON body. Non-success statuses fail.
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| IngestionError::ShutdownRequested)?;

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(IngestionError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        // XML gateway errors land here as JSON failures and fail the page
        let body: Value = serde_json::from_str(&text)?;
        Ok(body)
    }
}

#[async_trait]
impl PageFetch for PageFetcher {
    async fn fetch_page(&self, source: &SourceConfig, page: u32) -> Result<ParsedPage> {
        let url = Self::page_url(source, page);

        // The URL carries the credential, so only the page coordinates are logged
        debug!(
            source = %source.api,
            page,
            page_size = source.page_size,
            "Requesting page"
        );

        let body = self.fetch_json(&url).await.map_err(|e| {
            warn!(source = %source.api, page, error = %e, "Page request failed");
            e
        })?;

        let parsed = parse_page(source, &body)?;

        debug!(
            source = %source.api,
            page,
            records = parsed.records.len(),
            dropped = parsed.dropped,
            "Page parsed"
        );

        Ok(parsed)
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::SourceApi;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tour_source(base: &str) -> SourceConfig {
        SourceConfig::new(SourceApi::KorPetTour, base, "/areaBasedList", "abc%2Bdef%3D%3D")
            .with_page_size(3)
            .with_client_app("ETC", "Place App")
    }

    #[test]
    fn test_config_defaults() {
        let config = HttpClientConfig::default();
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_page_url_keeps_credential_encoding() {
        let source = tour_source("https://apis.example.org/svc").with_param("keyword", "서울 공원");
        let url = PageFetcher::page_url(&source, 2);

        assert!(url.starts_with("https://apis.example.org/svc/areaBasedList?serviceKey=abc%2Bdef%3D%3D&"));
        assert!(!url.contains("%252B"));
        assert!(url.contains("&pageNo=2&numOfRows=3"));
        assert!(url.contains("&MobileOS=ETC&MobileApp=Place+App"));
        assert!(url.contains("&_type=json"));
        assert!(url.contains("keyword=%EC%84%9C%EC%9A%B8+%EA%B3%B5%EC%9B%90"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("가나다라마", 2), "가나...");
    }

    #[tokio::test]
    async fn test_fetch_page_sends_json_accept_and_decoded_key_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/areaBasedList"))
            .and(header("accept", "application/json"))
            .and(query_param("serviceKey", "abc+def=="))
            .and(query_param("pageNo", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {
                    "header": {"resultCode": "0000", "resultMsg": "OK"},
                    "body": {"items": {"item": {"contentid": "1", "title": "공원"}}}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::with_defaults().unwrap();
        let page = fetcher.fetch_page(&tour_source(&server.uri()), 1).await.unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::with_defaults().unwrap();
        let err = fetcher.fetch_page(&tour_source(&server.uri()), 1).await.unwrap_err();
        assert!(matches!(err, IngestionError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_error_envelope_with_success_status_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"header": {"resultCode": "30", "resultMsg": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR"}}
            })))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::with_defaults().unwrap();
        let err = fetcher.fetch_page(&tour_source(&server.uri()), 1).await.unwrap_err();
        match err {
            IngestionError::ApiError { code, message } => {
                assert_eq!(code, "30");
                assert_eq!(message, "SERVICE_KEY_IS_NOT_REGISTERED_ERROR");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<OpenAPI_ServiceResponse/>"))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::with_defaults().unwrap();
        let err = fetcher.fetch_page(&tour_source(&server.uri()), 1).await.unwrap_err();
        assert!(matches!(err, IngestionError::JsonError(_)));
    }

    #[tokio::test]
    async fn test_timeout_fails_the_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(HttpClientConfig {
            request_timeout: Duration::from_millis(50),
            ..Default::default()
        })
        .unwrap();

        let err = fetcher.fetch_page(&tour_source(&server.uri()), 1).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }
}
