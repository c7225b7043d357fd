//! HTTP Reasoning Client
//!
//! `reqwest`-backed implementation of the `ReasoningClient` capability.
//! The wire shape is a single POST of the `ReasoningRequest` JSON to the
//! service's analyze endpoint; HTTP status codes map onto the typed error
//! taxonomy so the executor's retry decision stays transport-agnostic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::client::ReasoningClient;
use crate::error::{classify_http_status, ReasoningError, ReasoningResult};
use crate::rate_limit::RateLimiter;
use crate::types::{RawStepAnswer, ReasoningRequest};

/// Configuration for the HTTP reasoning client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL of the reasoning service
    pub base_url: Url,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Network-level timeout per request
    pub request_timeout: Duration,
}

impl HttpClientConfig {
    /// Create a config for the given base URL with defaults.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Set the bearer token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the network-level request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Build a `reqwest::Client` with the given network timeout.
pub fn build_http_client(request_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .expect("failed to build reqwest client")
}

/// HTTP-backed reasoning client.
pub struct HttpReasoningClient {
    config: HttpClientConfig,
    http_client: reqwest::Client,
    analyze_url: Url,
    limiter: Option<Arc<RateLimiter>>,
}

impl HttpReasoningClient {
    /// Create a client from config.
    pub fn new(config: HttpClientConfig) -> ReasoningResult<Self> {
        let analyze_url =
            config
                .base_url
                .join("v1/analyze")
                .map_err(|e| ReasoningError::InvalidRequest {
                    message: format!("invalid base URL: {}", e),
                })?;
        let http_client = build_http_client(config.request_timeout);
        tracing::info!("reasoning client initialized: url={}", analyze_url);
        Ok(Self {
            config,
            http_client,
            analyze_url,
            limiter: None,
        })
    }

    /// Attach a shared rate-limit budget.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    fn map_transport_error(e: reqwest::Error, timeout: Duration) -> ReasoningError {
        if e.is_timeout() {
            ReasoningError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if e.is_connect() {
            ReasoningError::Unavailable {
                message: e.to_string(),
            }
        } else {
            ReasoningError::network(e.to_string())
        }
    }
}

#[async_trait]
impl ReasoningClient for HttpReasoningClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn invoke(&self, request: ReasoningRequest) -> ReasoningResult<RawStepAnswer> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        tracing::debug!(
            "reasoning invoke POST {} step={} document={}",
            self.analyze_url,
            request.step_id,
            request.document_id
        );

        let mut builder = self
            .http_client
            .post(self.analyze_url.as_str())
            .header("content-type", "application/json")
            .json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, self.config.request_timeout))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| Self::map_transport_error(e, self.config.request_timeout))?;

        if status != 200 {
            tracing::warn!(
                "reasoning service error: HTTP {} for step {}: {}",
                status,
                request.step_id,
                body_text
            );
            return Err(classify_http_status(status, &body_text));
        }

        serde_json::from_str(&body_text).map_err(|e| {
            ReasoningError::malformed(format!("failed to parse service answer: {}", e))
        })
    }

    async fn health_check(&self) -> ReasoningResult<()> {
        let health_url = self
            .config
            .base_url
            .join("v1/health")
            .map_err(|e| ReasoningError::InvalidRequest {
                message: format!("invalid base URL: {}", e),
            })?;
        let response = self
            .http_client
            .get(health_url.as_str())
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, self.config.request_timeout))?;
        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            Err(classify_http_status(status, "health check failed"))
        }
    }
}
