//! Retry logic for transient connection failures
//!
//! Only failures where no response arrived at all (connect errors and
//! timeouts) are retried. Anything the server actually answered is final.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Fixed-delay retry policy for connection errors
#[derive(Debug, Clone, Copy)]
pub struct ConnectionRetry {
    /// Total attempts, including the first one
    max_attempts: u32,
    /// Delay between attempts
    delay: Duration,
}

impl Default for ConnectionRetry {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            delay: Duration::from_millis(250),
        }
    }
}

impl ConnectionRetry {
    /// Create a retry policy with custom settings
    pub fn with_config(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Check whether an error means the request never reached the server
    pub fn is_transient(error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }

    /// Run `send` until it succeeds, fails permanently, or attempts run out
    pub async fn run<F, Fut, T>(&self, send: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match send().await {
                Ok(value) => return Ok(value),
                Err(e) if Self::is_transient(&e) => {
                    if attempt >= self.max_attempts {
                        return Err(Error::Connection {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    warn!(
                        "Connection failed ({}). Retrying in {:?} ({}/{})...",
                        e,
                        self.delay,
                        attempt,
                        self.max_attempts()
                    );
                    sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(Error::Request(e)),
            }
        }
    }
}
