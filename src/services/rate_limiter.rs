//! Token-bucket rate limiter guarding outbound API calls.
//!
//! A sliding window of call timestamps, pruned on every acquire. When the
//! window is full the caller sleeps until the oldest entry expires and then
//! re-checks in a loop rather than trusting a single sleep, so clock drift
//! or a racing waiter cannot hand out a token early.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Configuration for one rate budget.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum calls allowed inside one window.
    pub max_calls: u32,
    /// Window duration.
    pub period: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // GitHub's documented authenticated REST budget. Real limits vary by
        // auth type, so this is a default, not a constant baked into callers.
        Self {
            max_calls: 5000,
            period: Duration::from_secs(3600),
        }
    }
}

/// Shared, mutable window state. Only ever touched under the limiter mutex.
#[derive(Debug)]
struct RateBudget {
    config: RateLimitConfig,
    window: VecDeque<Instant>,
}

impl RateBudget {
    /// Drop timestamps that have aged out of the window.
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.window.front() {
            if now.duration_since(*oldest) >= self.config.period {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record a call if the window has room; otherwise return how long the
    /// caller must wait for the oldest entry to expire.
    fn try_take(&mut self, now: Instant) -> Result<(), Duration> {
        self.prune(now);
        if (self.window.len() as u32) < self.config.max_calls {
            self.window.push_back(now);
            Ok(())
        } else {
            // Window full; front is guaranteed present.
            let oldest = *self.window.front().unwrap();
            let elapsed = now.duration_since(oldest);
            Err(self.config.period.saturating_sub(elapsed))
        }
    }
}

/// Token-bucket limiter. One instance per `GitHubOperations`; the budget is
/// the sole shared mutable state, protected by this single mutex.
#[derive(Debug)]
pub struct RateLimiter {
    budget: Mutex<RateBudget>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            budget: Mutex::new(RateBudget {
                config,
                window: VecDeque::new(),
            }),
        }
    }

    /// Block until a token is available.
    ///
    /// Cancel-safe: dropping the future between sleeps consumes no token.
    /// The limiter itself has no timeout; callers wanting a bounded wait
    /// wrap this in `tokio::time::timeout`. Waiters are served in roughly
    /// arrival order under low contention (mutex fairness), with no stronger
    /// guarantee.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut budget = self.budget.lock().await;
                match budget.try_take(Instant::now()) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };
            trace!(wait_ms = wait.as_millis() as u64, "rate budget exhausted, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Non-blocking variant: `Err(wait)` reports how long until the next
    /// token frees up.
    pub async fn try_acquire(&self) -> Result<(), Duration> {
        let mut budget = self.budget.lock().await;
        budget.try_take(Instant::now())
    }
}
