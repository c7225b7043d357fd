//! Shared Rate-Limit Budget
//!
//! Fixed-window request budget shared by all concurrent runs that go
//! through one reasoning client. The window state sits behind a mutex; the
//! async `acquire` path computes the wait inside the lock and sleeps
//! outside it, so the lock is never held across an await.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate limit configuration for a reasoning client.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitConfig {
    /// Create a config of `max_requests` per `window_secs` seconds.
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // 60 reasoning calls per minute
        Self::new(60, 60)
    }
}

/// Window state for a limiter.
#[derive(Debug)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// A fixed-window rate limiter, safe under concurrent access.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// Create a limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState {
                count: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Try to take one slot. Returns `Err(wait)` with the time until the
    /// current window rolls over when the budget is spent.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let elapsed = now.duration_since(state.window_start);

        if elapsed >= self.config.window {
            state.window_start = now;
            state.count = 0;
        }

        if state.count < self.config.max_requests {
            state.count += 1;
            Ok(())
        } else {
            Err(self.config.window - elapsed)
        }
    }

    /// Take one slot, waiting out the window if the budget is spent.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    tracing::debug!(
                        "rate limit budget spent, waiting {}ms for next window",
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
