use crate::feed::{FeedItem, FeedQuery, FeedResponse};
use futures::StreamExt;
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default upper bound on a single feed response body.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024; // 5MB

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from a single feed page request.
///
/// The variants exist for diagnostics only. Callers treat every one of them
/// as "the fetch failed".
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// No complete response (headers and body) within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body was not a JSON object of the expected shape
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Connection settings for [`FeedClient`].
pub struct ClientSettings {
    pub base_url: Url,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
    pub max_response_bytes: usize,
}

impl ClientSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

/// HTTP client for the feed endpoint.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted, so a
/// clone can be moved into a spawned fetch task.
#[derive(Clone, Debug)]
pub struct FeedClient {
    http: reqwest::Client,
    settings: Arc<ClientSettings>,
}

/// Redirect policy: at most 3 hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

impl FeedClient {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            http,
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Full request URL for `query`, with all three parameters present.
    pub fn page_url(&self, query: &FeedQuery) -> Url {
        let mut url = self.settings.base_url.clone();
        url.query_pairs_mut().extend_pairs(query.params());
        url
    }

    /// Fetch one page of the feed. Single attempt, no retry.
    ///
    /// The configured timeout covers the whole exchange, body included.
    pub async fn fetch_page(&self, query: &FeedQuery) -> Result<Vec<FeedItem>, FetchError> {
        let url = self.page_url(query);
        tracing::debug!(
            category = %query.category,
            query = %query.query,
            page = query.page,
            "Requesting feed page"
        );

        let mut request = self.http.get(url).header("Accept", "application/json");
        if let Some(key) = &self.settings.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }

        let timeout = self.settings.timeout;
        let body = match tokio::time::timeout(timeout, self.exchange(request)).await {
            Ok(Ok(body)) => body,
            Ok(Err(FetchError::Network(e))) if e.is_timeout() => {
                return Err(FetchError::Timeout(timeout))
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(FetchError::Timeout(timeout)),
        };

        let parsed: FeedResponse = serde_json::from_slice(&body)?;
        tracing::debug!(page = query.page, count = parsed.feed.len(), "Feed page received");
        Ok(parsed.feed)
    }

    async fn exchange(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, FetchError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        read_limited_bytes(response, self.settings.max_response_bytes).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> FeedClient {
        let base = Url::parse(&format!("{}/api/feed", server.uri())).unwrap();
        FeedClient::new(ClientSettings::new(base)).unwrap()
    }

    fn query(category: &str, text: &str, page: u32) -> FeedQuery {
        FeedQuery {
            category: category.to_string(),
            query: text.to_string(),
            page,
        }
    }

    #[tokio::test]
    async fn test_page_url_includes_empty_params() {
        let base = Url::parse("https://news.example/api/feed").unwrap();
        let client = FeedClient::new(ClientSettings::new(base)).unwrap();
        let url = client.page_url(&query("", "mars rover", 2));
        assert_eq!(
            url.as_str(),
            "https://news.example/api/feed?category=&query=mars+rover&page=2"
        );
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let mut settings = ClientSettings::new(Url::parse("https://news.example").unwrap());
        settings.api_key = Some(SecretString::from("super-secret".to_string()));
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_fetch_sends_params_and_decodes_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feed"))
            .and(query_param("category", "science"))
            .and(query_param("query", ""))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"feed": [{"url": "https://a.example/1", "title": "One"},
                             {"url": "https://a.example/2", "title": "Two"}],
                    "total": 40}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let items = client_for(&server)
            .fetch_page(&query("science", "", 3))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "Two");
    }

    #[tokio::test]
    async fn test_missing_feed_field_is_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"message": "none"}"#))
            .mount(&server)
            .await;

        let items = client_for(&server).fetch_page(&query("", "x", 1)).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_page(&query("top", "", 1)).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(502))));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_page(&query("top", "", 1)).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let server = MockServer::start().await;
        let body = format!(r#"{{"feed": [{{"summary": "{}"}}]}}"#, "x".repeat(4096));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/api/feed", server.uri())).unwrap();
        let mut settings = ClientSettings::new(base);
        settings.max_response_bytes = 1024;
        let client = FeedClient::new(settings).unwrap();

        let result = client.fetch_page(&query("top", "", 1)).await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge(1024))));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"feed": []}"#)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/api/feed", server.uri())).unwrap();
        let mut settings = ClientSettings::new(base);
        settings.timeout = Duration::from_millis(200);
        let client = FeedClient::new(settings).unwrap();

        let result = client.fetch_page(&query("top", "", 1)).await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_body_stalling_after_headers_times_out() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"feed\":",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let base = Url::parse(&format!("http://{}/api/feed", addr)).unwrap();
        let mut settings = ClientSettings::new(base);
        settings.timeout = Duration::from_millis(300);
        let client = FeedClient::new(settings).unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            client.fetch_page(&query("top", "", 1)),
        )
        .await
        .expect("fetch_page must give up on its own");
        assert!(matches!(result, Err(FetchError::Timeout(_))));

        server.abort();
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer k-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"feed": []}"#))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/api/feed", server.uri())).unwrap();
        let mut settings = ClientSettings::new(base);
        settings.api_key = Some(SecretString::from("k-123".to_string()));
        let client = FeedClient::new(settings).unwrap();

        assert!(client.fetch_page(&query("top", "", 1)).await.is_ok());
    }
}
