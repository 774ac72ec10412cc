use std::sync::Arc;
use std::time::{Duration, Instant};

use dashboard_logging::{dash_debug, dash_info, dash_warn};
use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use crate::auth::TokenProvider;
use crate::types::{CrawlRequest, ErrorBody};
use crate::{ApiError, CrawlAccepted, FailureKind, UrlDetailRecord, UrlId, UrlRecord};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Extra attempts for idempotent reads. Mutations are never retried.
    pub read_retries: u32,
    pub retry_backoff: Duration,
    pub max_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            read_retries: 2,
            retry_backoff: Duration::from_millis(250),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// The remote crawl service.
#[async_trait::async_trait]
pub trait CrawlApi: Send + Sync {
    async fn list_urls(&self) -> Result<Vec<UrlRecord>, ApiError>;

    async fn url_detail(&self, id: UrlId) -> Result<UrlDetailRecord, ApiError>;

    /// Queues a new URL for crawling.
    async fn submit_url(&self, url: &str) -> Result<CrawlAccepted, ApiError>;

    /// Re-runs the crawl of an existing entry.
    async fn recrawl(&self, id: UrlId) -> Result<CrawlAccepted, ApiError>;

    async fn delete_url(&self, id: UrlId) -> Result<(), ApiError>;
}

pub struct ReqwestApi {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|err| ApiError::new(FailureKind::InvalidBaseUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidBaseUrl,
                format!("{} cannot be a base url", settings.base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidBaseUrl, err.to_string()))
    }

    /// GET with bounded retry on transient failures.
    async fn get(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let mut attempt = 0;
        loop {
            match self.send_once(Method::GET, path, None).await {
                Err(err) if attempt < self.settings.read_retries && err.is_retryable() => {
                    attempt += 1;
                    dash_warn!(
                        "GET /{} failed ({}), retry {}/{}",
                        path,
                        err,
                        attempt,
                        self.settings.read_retries
                    );
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let token = self.tokens.bearer()?;
        let url = self.endpoint(path)?;
        let started = Instant::now();

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(AUTHORIZATION, format!("Bearer {token}"));
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = self.read_body(response).await?;
        dash_info!(
            "{} /{} -> {} in {} ms",
            method,
            path,
            status.as_u16(),
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            let code = status.as_u16();
            return Err(ApiError::new(
                FailureKind::HttpStatus(code),
                error_message(&bytes, code),
            ));
        }
        Ok(bytes)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn post_crawl(&self, request: CrawlRequest<'_>) -> Result<CrawlAccepted, ApiError> {
        let body = serde_json::to_vec(&request)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let bytes = self.send_once(Method::POST, "crawl", Some(body)).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CrawlAccepted::default());
        }
        decode(&bytes)
    }
}

#[async_trait::async_trait]
impl CrawlApi for ReqwestApi {
    async fn list_urls(&self) -> Result<Vec<UrlRecord>, ApiError> {
        let bytes = self.get("urls").await?;
        // The server encodes an empty table as `null`.
        let rows: Option<Vec<UrlRecord>> = decode(&bytes)?;
        Ok(rows.unwrap_or_default())
    }

    async fn url_detail(&self, id: UrlId) -> Result<UrlDetailRecord, ApiError> {
        let bytes = self.get(&format!("urls/{id}")).await?;
        decode(&bytes)
    }

    async fn submit_url(&self, url: &str) -> Result<CrawlAccepted, ApiError> {
        self.post_crawl(CrawlRequest::Submit { url }).await
    }

    async fn recrawl(&self, id: UrlId) -> Result<CrawlAccepted, ApiError> {
        self.post_crawl(CrawlRequest::Rerun { id }).await
    }

    async fn delete_url(&self, id: UrlId) -> Result<(), ApiError> {
        self.send_once(Method::DELETE, &format!("urls/{id}"), None)
            .await
            .map(|_| ())
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|err| {
        dash_debug!("undecodable body ({} bytes): {}", bytes.len(), err);
        ApiError::new(FailureKind::Decode, err.to_string())
    })
}

fn error_message(body: &[u8], code: u16) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {code}"))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
