use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A simple rate limiter using a sliding window algorithm.
///
/// It tracks the timestamps of outgoing API requests to decide whether one
/// more request fits into the budget.
pub struct RateLimiter {
    /// Timestamps of requests inside the current window, oldest first.
    requests: VecDeque<Instant>,
    /// The maximum number of requests allowed within the `window`.
    limit: usize,
    /// The duration of the sliding window.
    window: Duration,
}

impl RateLimiter {
    /// Creates a new `RateLimiter`.
    ///
    /// # Arguments
    ///
    /// * `limit` - The number of requests allowed per `window`.
    /// * `window` - The time duration of the sliding window.
    pub fn new(limit: usize, window: Duration) -> Self {
        RateLimiter {
            requests: VecDeque::new(),
            limit,
            window,
        }
    }

    /// Requests allowed per hour, the budget data.gov.in keys are issued with.
    pub fn per_hour(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(3600))
    }

    /// Records a request if the budget allows it.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the request was recorded, or `Err(wait)` with the time
    /// until the oldest request leaves the window.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        let now = Instant::now();

        // Remove timestamps older than the window
        while let Some(&oldest) = self.requests.front() {
            if now.duration_since(oldest) >= self.window {
                self.requests.pop_front();
            } else {
                break;
            }
        }

        if self.requests.len() < self.limit {
            self.requests.push_back(now);
            Ok(())
        } else {
            let oldest = self.requests.front().copied().unwrap_or(now);
            Err(self.window.saturating_sub(now.duration_since(oldest)))
        }
    }

    /// Requests still available in the current window.
    pub fn remaining(&self) -> usize {
        let now = Instant::now();
        let live = self
            .requests
            .iter()
            .filter(|&&t| now.duration_since(t) < self.window)
            .count();
        self.limit.saturating_sub(live)
    }
}
