//! HTTP client for the image service.

use crate::error::{Result, StudioError};
use crate::normalize::{CanonicalResult, NormalizeContext, Normalizer};
use crate::operations::{extract_enhanced, OperationRequest, PromptEnhanceRequest};
use crate::poll::UrlProber;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BRIA_API_KEY";
/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "BRIA_API_BASE";
/// Production API base.
pub const DEFAULT_BASE_URL: &str = "https://engine.prod.bria-api.com/v1";

/// Upper bound for a single readiness probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const API_TOKEN_HEADER: &str = "api_token";

/// Builder for [`StudioClient`].
#[derive(Clone)]
pub struct StudioClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
    probe_timeout: Duration,
    normalizer: Option<Arc<Normalizer>>,
}

impl Default for StudioClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: REQUEST_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            normalizer: None,
        }
    }
}

impl std::fmt::Debug for StudioClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioClientBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StudioClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `BRIA_API_KEY` env var when not called.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL. Falls back to `BRIA_API_BASE`, then production.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the timeout for readiness probes.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Replaces the response normalizer.
    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    /// Builds the client, resolving credentials.
    pub fn build(self) -> Result<StudioClient> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => std::env::var(API_KEY_ENV).map_err(|_| {
                StudioError::Configuration(format!(
                    "{API_KEY_ENV} not set and no API key provided"
                ))
            })?,
        };
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(StudioError::Configuration("API key is empty".into()));
        }

        let base_url = self
            .base_url
            .or_else(|| std::env::var(API_BASE_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(StudioClient {
            prober: HttpProber::with_client(http.clone()).timeout(self.probe_timeout),
            http,
            api_key,
            base_url,
            normalizer: self.normalizer.unwrap_or_default(),
        })
    }
}

/// Client for the image service.
///
/// Cheap to clone; clones share the connection pool and normalizer.
#[derive(Clone)]
pub struct StudioClient {
    http: reqwest::Client,
    prober: HttpProber,
    api_key: String,
    base_url: String,
    normalizer: Arc<Normalizer>,
}

impl std::fmt::Debug for StudioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

impl StudioClient {
    /// Creates a new [`StudioClientBuilder`].
    pub fn builder() -> StudioClientBuilder {
        StudioClientBuilder::new()
    }

    /// API base in use.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The normalizer applied by [`StudioClient::run`].
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Submits a request and returns the parsed response body.
    ///
    /// Parameters are validated before anything is sent.
    pub async fn submit(&self, request: &OperationRequest) -> Result<Value> {
        let body = request.to_body()?;
        let path = request.path();
        let url = format!("{}{}", self.base_url, path);
        let operation = request.kind();
        let start = Instant::now();

        tracing::debug!(%operation, path = %path, "submitting request");

        let response = self
            .http
            .post(&url)
            .header(API_TOKEN_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(%operation, status = status.as_u16(), "request rejected");
            return Err(StudioError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!(
            %operation,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "request complete"
        );
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(%operation, "response body is not JSON: {e}");
            StudioError::Normalization {
                raw: Value::String(text),
            }
        })
    }

    /// Submits a request and normalizes the response.
    ///
    /// An unrecognized response is returned with empty URL lists; see
    /// [`CanonicalResult::into_recognized`].
    pub async fn run(&self, request: &OperationRequest) -> Result<CanonicalResult> {
        let raw = self.submit(request).await?;
        Ok(self
            .normalizer
            .normalize(raw, &NormalizeContext::for_request(request)))
    }

    /// Returns an enhanced prompt, or the original one on any failure.
    pub async fn enhance_prompt(&self, prompt: &str) -> String {
        self.enhance_prompt_with(PromptEnhanceRequest::new(prompt)).await
    }

    /// Like [`StudioClient::enhance_prompt`], with passthrough fields.
    pub async fn enhance_prompt_with(&self, request: PromptEnhanceRequest) -> String {
        let original = request.prompt.clone();
        match self.submit(&OperationRequest::PromptEnhance(request)).await {
            Ok(raw) => match extract_enhanced(&raw) {
                Some(enhanced) => enhanced,
                None => {
                    tracing::warn!("prompt enhancement returned no variations, keeping original");
                    original
                }
            },
            Err(e) => {
                tracing::warn!("prompt enhancement failed, keeping original: {e}");
                original
            }
        }
    }

    /// Checks whether a result URL is ready with a HEAD request.
    pub async fn probe(&self, url: &str) -> bool {
        self.prober.probe(url).await
    }

    /// Downloads a ready result.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.prober.download(url).await
    }

    /// The credential-free prober used for result URLs.
    pub fn prober(&self) -> &HttpProber {
        &self.prober
    }
}

#[async_trait]
impl UrlProber for StudioClient {
    async fn is_ready(&self, url: &str) -> bool {
        self.probe(url).await
    }
}

/// Credential-free access to result URLs.
///
/// Result URLs are public; probing and downloading them needs no API key.
#[derive(Debug, Clone)]
pub struct HttpProber {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    /// Creates a prober with its own connection pool.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(http))
    }

    fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Sets the per-probe timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if a HEAD request answers 200 within the timeout.
    pub async fn probe(&self, url: &str) -> bool {
        match self.http.head(url).timeout(self.timeout).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::debug!(url = %url, "probe failed: {e}");
                false
            }
        }
    }

    /// Downloads a result URL.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl UrlProber for HttpProber {
    async fn is_ready(&self, url: &str) -> bool {
        self.probe(url).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::operations::{GenFillRequest, PackshotRequest, ShadowRequest};
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Loopback port with nothing listening.
    pub(crate) const UNREACHABLE_BASE: &str = "http://127.0.0.1:9";

    /// A request as seen by [`MockServer`].
    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub head: String,
        pub body: String,
    }

    impl Recorded {
        pub fn json(&self) -> Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    /// Minimal HTTP/1.1 responder serving canned responses in order.
    pub(crate) struct MockServer {
        pub base: String,
        pub requests: std::sync::Arc<Mutex<Vec<Recorded>>>,
    }

    impl MockServer {
        pub async fn start(responses: Vec<(u16, String)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let base = format!("http://{addr}");
            // `{base}` in a canned body expands to this server's address.
            let responses: Vec<(u16, String)> = responses
                .into_iter()
                .map(|(status, body)| (status, body.replace("{base}", &base)))
                .collect();
            let requests = std::sync::Arc::new(Mutex::new(Vec::new()));
            let recorded = requests.clone();

            tokio::spawn(async move {
                for (status, body) in responses {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        return;
                    };
                    let request = read_request(&mut socket).await;
                    recorded.lock().unwrap().push(request);

                    let response = format!(
                        "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            Self {
                base,
                requests,
            }
        }

        pub fn recorded(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> Recorded {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find_header_end(&buf) {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let len = content_length(&head);
                while buf.len() < end + 4 + len {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                let body_end = (end + 4 + len).min(buf.len());
                let body = String::from_utf8_lossy(&buf[end + 4..body_end]).to_string();
                return Recorded { head, body };
            }
        }
        Recorded {
            head: String::from_utf8_lossy(&buf).to_string(),
            body: String::new(),
        }
    }

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    pub(crate) fn client_for(base: &str) -> StudioClient {
        StudioClient::builder()
            .api_key("test-key")
            .base_url(base)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let client = StudioClientBuilder::new()
            .api_key("test-key")
            .base_url("https://example.test/v1/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://example.test/v1");
    }

    #[test]
    fn test_builder_empty_key_is_configuration_error() {
        let err = StudioClientBuilder::new().api_key("  ").build().unwrap_err();
        assert!(matches!(err, StudioError::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = client_for(UNREACHABLE_BASE);
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("test-key"));
        assert!(rendered.contains("<redacted>"));

        let builder = StudioClientBuilder::new().api_key("secret-value");
        assert!(!format!("{:?}", builder).contains("secret-value"));
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_network() {
        let client = client_for(UNREACHABLE_BASE);
        let err = client
            .submit(&ShadowRequest::new().into())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_network_failure_on_submit() {
        let client = client_for(UNREACHABLE_BASE);
        let err = client
            .submit(&PackshotRequest::new(vec![1]).into())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Network(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_enhance_prompt_fails_soft_on_network_error() {
        let client = client_for(UNREACHABLE_BASE);
        assert_eq!(client.enhance_prompt("a red mug").await, "a red mug");
    }

    #[tokio::test]
    async fn test_probe_unreachable_is_not_ready() {
        let client = client_for(UNREACHABLE_BASE);
        assert!(!client.is_ready("http://127.0.0.1:9/result.png").await);
    }

    #[tokio::test]
    async fn test_submit_sends_headers_and_body() {
        let server = MockServer::start(vec![(
            200,
            json!({"result_url": "https://cdn/packshot.png"}).to_string(),
        )])
        .await;
        let client = client_for(&server.base);

        let result = client
            .run(&PackshotRequest::new(vec![1, 2, 3]).with_sku("A1").into())
            .await
            .unwrap();
        assert_eq!(result.ready_urls, vec!["https://cdn/packshot.png"]);

        let recorded = server.recorded();
        assert_eq!(recorded.len(), 1);
        let head = recorded[0].head.to_lowercase();
        assert!(head.starts_with("post /product/packshot "));
        assert!(head.contains("api_token: test-key"));
        assert!(head.contains("content-type: application/json"));

        let body = recorded[0].json();
        assert_eq!(body["file"], "AQID");
        assert_eq!(body["sku"], "A1");
    }

    #[tokio::test]
    async fn test_content_moderation_rejection() {
        let server =
            MockServer::start(vec![(422, r#"{"error":"moderation"}"#.to_string())]).await;
        let client = client_for(&server.base);

        let err = client
            .submit(&PackshotRequest::new(vec![1]).into())
            .await
            .unwrap_err();
        assert!(err.is_content_moderation());
        match err {
            StudioError::Api { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("moderation"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_generic_api_error() {
        let server = MockServer::start(vec![(500, "boom".to_string())]).await;
        let client = client_for(&server.base);

        let err = client
            .submit(&PackshotRequest::new(vec![1]).into())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_content_moderation());
    }

    #[tokio::test]
    async fn test_async_gen_fill_yields_pending() {
        let server = MockServer::start(vec![(
            200,
            json!({"urls": ["https://cdn/1.png", "https://cdn/2.png", "https://cdn/3.png"]})
                .to_string(),
        )])
        .await;
        let client = client_for(&server.base);

        let request = GenFillRequest::new(vec![1], vec![2], "a vase").with_num_results(2);
        let result = client.run(&request.into()).await.unwrap();
        assert!(result.ready_urls.is_empty());
        assert_eq!(result.pending_urls, vec!["https://cdn/1.png", "https://cdn/2.png"]);
    }

    #[tokio::test]
    async fn test_enhance_prompt_reads_variations() {
        let server = MockServer::start(vec![
            (
                200,
                json!({"prompt variations": "a glossy red mug on oak"}).to_string(),
            ),
            (200, json!({"unexpected": true}).to_string()),
        ])
        .await;
        let client = client_for(&server.base);

        assert_eq!(client.enhance_prompt("red mug").await, "a glossy red mug on oak");
        assert_eq!(client.enhance_prompt("red mug").await, "red mug");
        assert_eq!(server.recorded()[0].json()["prompt"], "red mug");
    }

    #[tokio::test]
    async fn test_probe_and_download() {
        let server = MockServer::start(vec![
            (200, String::new()),
            (404, String::new()),
            (200, "PNGDATA".to_string()),
        ])
        .await;
        let client = client_for(&server.base);
        let url = format!("{}/result.png", server.base);

        assert!(client.probe(&url).await);
        assert!(!client.probe(&url).await);
        assert_eq!(client.download(&url).await.unwrap(), b"PNGDATA");
        assert!(server.recorded()[0].head.starts_with("HEAD /result.png"));
    }

    #[tokio::test]
    async fn test_non_json_success_keeps_body() {
        let server =
            MockServer::start(vec![(200, "<html>gateway ok</html>".to_string())]).await;
        let client = client_for(&server.base);

        let err = client
            .run(&PackshotRequest::new(vec![1]).into())
            .await
            .unwrap_err();
        match &err {
            StudioError::Normalization { raw } => {
                assert_eq!(raw, &Value::String("<html>gateway ok</html>".into()));
            }
            other => panic!("expected normalization error, got {:?}", other),
        }
        assert!(err.user_message().contains("gateway ok"));
    }

    #[tokio::test]
    async fn test_http_prober_needs_no_credentials() {
        let server = MockServer::start(vec![(200, String::new())]).await;
        let prober = HttpProber::new().unwrap();
        let url = format!("{}/result.png", server.base);

        assert!(prober.is_ready(&url).await);
        let head = server.recorded()[0].head.to_lowercase();
        assert!(head.starts_with("head /result.png"));
        assert!(!head.contains("api_token"));
    }

    #[tokio::test]
    async fn test_check_and_save_without_api_key() {
        let server =
            MockServer::start(vec![(200, String::new()), (200, "PNG".to_string())]).await;
        let prober = HttpProber::new().unwrap();
        let url = format!("{}/result_1.png", server.base);

        let poller = crate::Poller::new();
        let mut state = poller.start(vec![url.clone()]);
        assert_eq!(poller.probe_round(&mut state, &prober).await, vec![url.clone()]);
        assert!(state.pending().is_empty());

        assert_eq!(prober.download(&url).await.unwrap(), b"PNG".to_vec());
        let recorded = server.recorded();
        assert!(recorded[1].head.starts_with("GET /result_1.png "));
        assert!(recorded.iter().all(|r| !r.head.contains("api_token")));
    }

    #[tokio::test]
    async fn test_stalled_probe_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and never answer.
            let held = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(held);
        });

        let client = StudioClient::builder()
            .api_key("test-key")
            .base_url(UNREACHABLE_BASE)
            .probe_timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let started = Instant::now();
        assert!(!client.probe(&format!("http://{addr}/result.png")).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
