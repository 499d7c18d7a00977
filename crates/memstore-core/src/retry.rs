//! Retry with exponential backoff for transient storage failures.
//!
//! `delay = min(initial_delay * multiplier^attempt, max_delay)`, optionally
//! jittered by up to 30% in either direction so concurrent processes do not
//! retry in lockstep. Only errors classified as transient are retried; on
//! exhaustion the last error is returned unchanged.

use std::fmt::Display;
use std::future::Future;
use std::io;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MemstoreError;
use crate::obs;
use crate::storage::StorageError;

/// Maximum relative jitter applied to a backoff delay.
pub const JITTER_RATIO: f64 = 0.3;

/// Backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 5_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// More patient policy for network-adjacent operations
    /// (e.g. stores rooted on network filesystems).
    pub fn network() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 200,
            multiplier: 2.0,
            max_delay_ms: 10_000,
            jitter: true,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Un-jittered delay before retry number `attempt` (0-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
        let raw = self.initial_delay_ms as f64 * exp;
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `attempt` (0-based), jittered when enabled
    /// and never above `max_delay_ms`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let factor = rand::thread_rng().gen_range((1.0 - JITTER_RATIO)..=(1.0 + JITTER_RATIO));
        let jittered = (base.as_millis() as f64 * factor) as u64;
        Duration::from_millis(jittered.min(self.max_delay_ms))
    }
}

/// Errors that know whether retrying them can help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for StorageError {
    fn is_retryable(&self) -> bool {
        StorageError::is_retryable(self)
    }
}

impl Retryable for MemstoreError {
    fn is_retryable(&self) -> bool {
        match self {
            MemstoreError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl Retryable for io::Error {
    fn is_retryable(&self) -> bool {
        let copy = match self.raw_os_error() {
            Some(code) => io::Error::from_raw_os_error(code),
            None => io::Error::from(self.kind()),
        };
        StorageError::from_io(copy, "").is_retryable()
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are exhausted.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !err.is_retryable() || attempt >= max_attempts {
                    return Err(err);
                }
                let delay = policy.delay(attempt - 1);
                obs::emit_storage_retry(op_name, attempt, delay.as_millis() as u64, &err);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
