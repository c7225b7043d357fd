//! Reasoning Error Types
//!
//! Typed failures from the reasoning service, split into two classes:
//! transient errors are retried by the step executor, permanent errors fail
//! the step immediately. The classification lives here, next to the errors,
//! so that every client implementation reports through the same taxonomy.

use serde::{Deserialize, Serialize};

/// Retry classification of a reasoning error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Retryable: timeouts, rate limits, 5xx-equivalents
    Transient,
    /// Non-retryable: bad request, auth, unparseable answer
    Permanent,
}

/// Error types for reasoning service operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReasoningError {
    /// The attempt exceeded its timeout
    Timeout { timeout_ms: u64 },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Server-side failure from the service
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection failure
    Network { message: String },
    /// Service reachable but not accepting work
    Unavailable { message: String },
    /// Authentication failed (invalid credentials)
    AuthenticationFailed { message: String },
    /// The request was rejected as malformed
    InvalidRequest { message: String },
    /// The answer could not be parsed into the step contract
    MalformedAnswer { message: String },
}

impl std::fmt::Display for ReasoningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasoningError::Timeout { timeout_ms } => {
                write!(f, "reasoning call timed out after {}ms", timeout_ms)
            }
            ReasoningError::RateLimited { message, .. } => {
                write!(f, "rate limited: {}", message)
            }
            ReasoningError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "server error ({}): {}", s, message)
                } else {
                    write!(f, "server error: {}", message)
                }
            }
            ReasoningError::Network { message } => {
                write!(f, "network error: {}", message)
            }
            ReasoningError::Unavailable { message } => {
                write!(f, "service unavailable: {}", message)
            }
            ReasoningError::AuthenticationFailed { message } => {
                write!(f, "authentication failed: {}", message)
            }
            ReasoningError::InvalidRequest { message } => {
                write!(f, "invalid request: {}", message)
            }
            ReasoningError::MalformedAnswer { message } => {
                write!(f, "malformed answer: {}", message)
            }
        }
    }
}

impl std::error::Error for ReasoningError {}

/// Result type for reasoning operations
pub type ReasoningResult<T> = Result<T, ReasoningError>;

impl ReasoningError {
    /// Classify this error for the executor's retry decision.
    pub fn class(&self) -> ErrorClass {
        match self {
            ReasoningError::Timeout { .. }
            | ReasoningError::RateLimited { .. }
            | ReasoningError::ServerError { .. }
            | ReasoningError::Network { .. }
            | ReasoningError::Unavailable { .. } => ErrorClass::Transient,
            ReasoningError::AuthenticationFailed { .. }
            | ReasoningError::InvalidRequest { .. }
            | ReasoningError::MalformedAnswer { .. } => ErrorClass::Permanent,
        }
    }

    /// Whether the executor may retry after this error.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Create a malformed-answer error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedAnswer {
            message: msg.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
        }
    }
}

/// Map an HTTP status code and body into a typed reasoning error.
pub fn classify_http_status(status: u16, body: &str) -> ReasoningError {
    match status {
        401 | 403 => ReasoningError::AuthenticationFailed {
            message: format!("HTTP {}: {}", status, body),
        },
        400 | 404 | 422 => ReasoningError::InvalidRequest {
            message: format!("HTTP {}: {}", status, body),
        },
        429 => ReasoningError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        503 => ReasoningError::Unavailable {
            message: body.to_string(),
        },
        500..=599 => ReasoningError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => ReasoningError::ServerError {
            message: format!("unexpected HTTP {}: {}", status, body),
            status: Some(status),
        },
    }
}
