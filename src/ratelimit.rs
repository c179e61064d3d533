// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-client windowed rate limiting for the search endpoint

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default maximum requests per client within one window
pub const DEFAULT_MAX_REQUESTS: u32 = 1000;

/// Default window length in seconds (one hour)
pub const DEFAULT_WINDOW_SECS: u64 = 3600;

/// Default period between sweeps of expired entries (ten minutes)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// Rate limiting configuration, read from environment variables
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per client key within one window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
    /// How often the background sweeper prunes expired entries, in seconds
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_REQUESTS),
            window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_WINDOW_SECS),
            sweep_interval_secs: env::var("RATE_LIMIT_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("RATE_LIMIT_MAX_REQUESTS must be greater than 0".to_string());
        }
        if self.window_secs == 0 {
            return Err("RATE_LIMIT_WINDOW_SECS must be greater than 0".to_string());
        }
        if self.sweep_interval_secs == 0 {
            return Err("RATE_LIMIT_SWEEP_INTERVAL_SECS must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Window length as a [`Duration`]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Sweep interval as a [`Duration`]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_secs: DEFAULT_WINDOW_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

/// One client's usage within the current window
struct WindowEntry {
    count: u32,
    window_reset_at: Instant,
}

/// Per-client windowed request counter.
///
/// Each client key gets a counter anchored to its first request; once
/// `window` has elapsed the next request starts a fresh window. Rejected
/// requests do not mutate the entry, so a burst past the limit cannot
/// extend a client's penalty.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a rate limiter from configuration
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_window(config.max_requests, config.window())
    }

    /// Create a rate limiter with a custom window duration (for testing)
    pub fn with_window(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Check-and-record in one critical section: returns `true` and counts
    /// the request if the client is within its limit, `false` otherwise.
    pub fn allow(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(client_key) {
            Some(entry) if now < entry.window_reset_at => {
                if entry.count >= self.max_requests {
                    false
                } else {
                    entry.count += 1;
                    true
                }
            }
            // No entry yet, or the previous window has expired
            _ => {
                entries.insert(
                    client_key.to_string(),
                    WindowEntry {
                        count: 1,
                        window_reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    /// Drop entries whose window has expired
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.window_reset_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "swept expired rate limit entries");
        }
    }

    /// Number of client keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Spawn the background sweep task. The returned handle stops the task
    /// on shutdown.
    pub fn start_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> SweeperHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so sweeps run on the period
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => limiter.sweep(),
                }
            }
        });
        SweeperHandle { token, handle }
    }
}

/// Handle to the background sweep task
pub struct SweeperHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep task and wait for it to exit
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}
