use crate::config::HttpConfig;
use reqwest::header::HeaderMap;
use reqwest::Proxy;
use serde::Serialize;
use std::env;
use std::time::Duration;

/// Diagnostic headers captured from a provider response. Logged, never acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub ratelimit_remaining: Option<String>,
    pub ratelimit_reset: Option<String>,
    pub request_id: Option<String>,
}

impl ResponseMetadata {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ratelimit_remaining: header_first(
                headers,
                &["x-ratelimit-remaining", "x-ratelimit-remaining-requests"],
            ),
            ratelimit_reset: header_first(
                headers,
                &["x-ratelimit-reset", "x-ratelimit-reset-requests"],
            ),
            request_id: header_first(headers, &["x-request-id", "x-ms-request-id"]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ratelimit_remaining.is_none()
            && self.ratelimit_reset.is_none()
            && self.request_id.is_none()
    }
}

fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// How the credential travels with the request.
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    /// `?key=...` query parameter (Gemini).
    QueryKey(&'a str),
}

/// Status, captured headers and body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub metadata: ResponseMetadata,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Shared HTTP client for every adapter. One call per method invocation, no retries.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let pool_max_idle = env::var("PEN2PDF_HTTP_POOL_MAX_IDLE_PER_HOST")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(16);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(pool_max_idle)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = config.proxy_url.as_deref() {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| TransportError::Other(format!("invalid proxy url {proxy_url}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }

    pub async fn post_json(
        &self,
        url: &str,
        auth: Auth<'_>,
        body: &serde_json::Value,
    ) -> Result<RawResponse, TransportError> {
        let request = self.client.post(url).json(body);
        self.send(request, auth).await
    }

    pub async fn get(&self, url: &str, auth: Auth<'_>) -> Result<RawResponse, TransportError> {
        let request = self.client.get(url);
        self.send(request, auth).await
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        auth: Auth<'_>,
    ) -> Result<RawResponse, TransportError> {
        request = match auth {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::QueryKey(key) => request.query(&[("key", key)]),
        };
        let response = request.send().await?;
        let status = response.status().as_u16();
        let metadata = ResponseMetadata::from_headers(response.headers());
        let body = response.text().await?;
        Ok(RawResponse {
            status,
            metadata,
            body,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
