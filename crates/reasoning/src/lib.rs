//! Redline Reasoning
//!
//! The capability boundary to the external reasoning service:
//! - the `ReasoningClient` trait with its typed request/answer contract
//! - the transient/permanent error taxonomy driving retry decisions
//! - an HTTP implementation with status-code classification
//! - a shared fixed-window rate-limit budget
//! - a deterministic scripted client for tests and offline replay
//!
//! The rest of the engine depends only on the trait; transports are
//! swappable behind it.

pub mod client;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod stub;
pub mod types;

// Re-export main types
pub use client::ReasoningClient;
pub use error::{classify_http_status, ErrorClass, ReasoningError, ReasoningResult};
pub use http::{build_http_client, HttpClientConfig, HttpReasoningClient};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use stub::{RecordedCall, ScriptedClient, ScriptedOutcome};
pub use types::{RawStepAnswer, ReasoningRequest};
