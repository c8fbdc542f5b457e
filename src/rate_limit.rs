//! Shared rate-limit cooldown.
//!
//! When a provider learns that its upstream is throttling it, the whole
//! provider type backs off: the manager's [`RateLimiter`] is set, and it
//! clears itself after the requested cooldown. Requests to start a cooldown
//! while one is running are dropped, so any number of instances hitting the
//! limit at once produce a single cooldown.
//!
//! # Examples
//!
//! ```rust
//! use provider_worker::rate_limit::RateLimiter;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = RateLimiter::new();
//! assert!(limiter.trigger(Duration::from_secs(5)));
//! assert!(!limiter.trigger(Duration::from_secs(5))); // already cooling down
//! assert!(limiter.is_limited());
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{Instant, sleep, sleep_until};

/// Debounced boolean gate with at most one cooldown timer.
///
/// The flag only goes up through [`trigger`](RateLimiter::trigger) and only
/// comes down when the timer armed by that call fires. There is no way to
/// cancel a running cooldown.
///
/// # Thread Safety
///
/// Clones share the same flag. Arming is a single compare-and-swap, so two
/// callers racing to trigger cannot both arm a timer.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    limited: Arc<AtomicBool>,
}

impl RateLimiter {
    /// Creates a limiter with no cooldown running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a cooldown is running.
    pub fn is_limited(&self) -> bool {
        self.limited.load(Ordering::Acquire)
    }

    /// Starts a cooldown of `cooldown` unless one is already running.
    ///
    /// Returns `true` if this call armed the timer. The timer runs on the
    /// current tokio runtime; outside a runtime a plain thread is used.
    /// Cooldowns too long to represent as a deadline run until the far
    /// future instead of failing.
    pub fn trigger(&self, cooldown: Duration) -> bool {
        let deadline = Instant::now().checked_add(cooldown);

        if self
            .limited
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        tracing::debug!(
            cooldown_ms = u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX),
            "Rate limit cooldown armed"
        );

        let flag = self.limited.clone();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => sleep(cooldown).await,
                    }
                    flag.store(false, Ordering::Release);
                    tracing::debug!("Rate limit cooldown cleared");
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(cooldown);
                    flag.store(false, Ordering::Release);
                    tracing::debug!("Rate limit cooldown cleared");
                });
            }
        }

        true
    }
}
