//! Integration Tests Module
//!
//! End-to-end tests for the Redline analysis engine against a scripted
//! reasoning client: full pipeline runs, determinism, failure degradation,
//! retry accounting, sequential isolation, cancellation, and scheduler
//! backpressure.

// Full pipeline runs: scenarios, determinism, degradation, retries
mod pipeline_test;

// Scheduler lifecycle: concurrency, cancellation, backpressure
mod scheduler_test;

// Report JSON contract for the API layer
mod report_shape_test;
