//! Policy-wrapped HTTP delivery client.
//!
//! [`HttpDeliveryClient`] composes the shared connection-pooled hyper
//! client with a target's [`AuthStrategy`], [`RetryPolicy`], and
//! [`RateLimiter`]. One logical `request` may issue up to
//! `max_attempts` physical requests: transport failures and forcelist
//! statuses are retried with a linear backoff, a 429 defers to the
//! rate limiter for an adaptive wait, and any other error status is
//! terminal. Submodules provide authentication ([`auth`]), adaptive
//! waiting ([`ratelimit`]), cursor pagination ([`paginate`]), and
//! nested-path lookup ([`path`]).

pub mod auth;
pub mod paginate;
pub mod path;
pub mod ratelimit;

use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use url::Url;

use crate::config::model::RetryConfig;
use crate::error::DeliveryError;
use auth::AuthStrategy;
use paginate::{PageQuery, Paginator};
use ratelimit::RateLimiter;

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Full<Bytes>>;

#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls
    // cannot auto-detect which one to use. Explicitly install `ring`
    // as the default provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// Which statuses to retry, how often, and how hard to back off.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: f64,
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    /// Standalone default. Includes 429 so a bare client handles
    /// throttling out of the box; the config-level default forcelist
    /// is the narrower `[500, 502, 503, 504]`.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: 0.5,
            status_forcelist: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            backoff_factor: cfg.backoff_factor.max(0.0),
            status_forcelist: cfg.status_forcelist.clone(),
        }
    }

    fn is_retryable(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Sleep inserted after a failed attempt `n` (1-based).
    fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_factor * f64::from(attempt))
    }
}

/// A fully collected response. The body is buffered so the rate
/// limiter and pagination can inspect it after the status check.
#[derive(Debug)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ClientResponse {
    /// Parse the body as JSON, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Clone)]
pub struct HttpDeliveryClient {
    http: HttpClient,
    headers: HeaderMap,
    auth: AuthStrategy,
    retry: RetryPolicy,
    limiter: RateLimiter,
    timeout: Duration,
}

impl HttpDeliveryClient {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            headers: HeaderMap::new(),
            auth: AuthStrategy::None,
            retry: RetryPolicy::default(),
            limiter: RateLimiter::default(),
            timeout: Duration::from_millis(5000),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthStrategy) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        self.auth.apply(&mut headers);
        headers
    }

    /// Execute one logical request with auth, retry, and rate-limit
    /// policy applied. Issues at most `max_attempts` physical requests
    /// and never sleeps after the final one.
    pub async fn request(
        &self,
        method: Method,
        url: &Url,
        body: Bytes,
    ) -> Result<ClientResponse, DeliveryError> {
        let headers = self.request_headers();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.send_once(&method, url, &headers, body.clone()).await {
                Err(message) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(DeliveryError::Transport {
                            attempts: attempt,
                            message,
                        });
                    }
                    tracing::warn!(url = %url, attempt, error = %message, "request failed, retrying");
                    tokio::time::sleep(self.retry.backoff_after(attempt)).await;
                }
                Ok(response) => {
                    let status = response.status.as_u16();

                    if self.retry.is_retryable(status) {
                        if attempt >= self.retry.max_attempts {
                            return Err(DeliveryError::ExhaustedRetries {
                                attempts: attempt,
                                status,
                            });
                        }
                        tracing::warn!(url = %url, attempt, status, "retryable status");
                        if status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
                            self.limiter
                                .wait_for(&response.headers, &response.body)
                                .await;
                        } else {
                            tokio::time::sleep(self.retry.backoff_after(attempt)).await;
                        }
                        continue;
                    }

                    if response.status.is_client_error() || response.status.is_server_error() {
                        return Err(DeliveryError::TerminalStatus { status });
                    }

                    return Ok(response);
                }
            }
        }
    }

    /// Serialize `payload` as a JSON body and send it via [`Self::request`].
    pub async fn send_json(
        &self,
        method: Method,
        url: &Url,
        payload: &Value,
    ) -> Result<ClientResponse, DeliveryError> {
        let body = serde_json::to_vec(payload).map_err(|e| DeliveryError::RequestBuild {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        self.request(method, url, Bytes::from(body)).await
    }

    /// Lazily page through a cursor-paginated endpoint.
    #[must_use]
    pub fn paginate(&self, query: PageQuery) -> Paginator<'_> {
        Paginator::new(self, query)
    }

    /// One physical request. `Err` carries a transport-level failure
    /// message (connect error, timeout, body read).
    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ClientResponse, String> {
        let mut builder = hyper::Request::builder()
            .method(method.clone())
            .uri(url.as_str());

        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if !headers.contains_key(CONTENT_TYPE) && !body.is_empty() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }

        let request = builder
            .body(Full::new(body))
            .map_err(|e| format!("invalid request: {e}"))?;

        // The timeout covers the whole exchange, body included. A
        // server that returns headers and then stalls the body must
        // not hold the delivery open past the budget.
        tokio::time::timeout(self.timeout, async {
            let response = self
                .http
                .request(request)
                .await
                .map_err(|e| e.to_string())?;

            let status = response.status();
            let resp_headers = response.headers().clone();
            let collected = response
                .into_body()
                .collect()
                .await
                .map_err(|e| format!("body read error: {e}"))?;

            Ok(ClientResponse {
                status,
                headers: resp_headers,
                body: collected.to_bytes(),
            })
        })
        .await
        .map_err(|_| "request timed out".to_string())?
    }
}
