//! Reasoning Client Trait
//!
//! Defines the capability boundary to the external reasoning service. The
//! orchestrator and executor depend only on this trait; concrete transport
//! (HTTP, queue, in-memory script) is an implementation detail behind it.

use async_trait::async_trait;

use crate::error::ReasoningResult;
use crate::types::{RawStepAnswer, ReasoningRequest};

/// Trait that all reasoning clients must implement.
///
/// A single suspension point per step attempt: `invoke`. Errors must be
/// reported through the `ReasoningError` taxonomy so the executor's
/// transient/permanent retry decision works for every implementation.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Returns the client name for identification.
    fn name(&self) -> &'static str;

    /// Submit one step request and wait for the structured answer.
    ///
    /// Implementations must classify failures via `ReasoningError`; a
    /// transport-level timeout belongs to the caller (the step executor
    /// bounds each attempt), but implementations may enforce their own
    /// tighter limits.
    async fn invoke(&self, request: ReasoningRequest) -> ReasoningResult<RawStepAnswer>;

    /// Check if the service is healthy and reachable.
    ///
    /// Default implementation reports healthy; transport-backed clients
    /// should override.
    async fn health_check(&self) -> ReasoningResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoClient;

    #[async_trait]
    impl ReasoningClient for EchoClient {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn invoke(&self, request: ReasoningRequest) -> ReasoningResult<RawStepAnswer> {
            Ok(RawStepAnswer::new(json!({ "echo": request.step_id })))
        }
    }

    #[tokio::test]
    async fn test_trait_object_invocation() {
        let client: Box<dyn ReasoningClient> = Box::new(EchoClient);
        let answer = client
            .invoke(ReasoningRequest::new(
                "clause_extraction",
                "extract clauses",
                "doc-1",
                Vec::new(),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(answer.content["echo"], "clause_extraction");
        assert!(client.health_check().await.is_ok());
    }
}
