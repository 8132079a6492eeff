//! Token-bucket rate limiting for outbound provider calls.
//!
//! This module provides the [`RateLimiter`] struct which wraps any async
//! operation and bounds three things at once:
//!
//! - **Burst rate**: a reservoir of permits, refilled to its full size every
//!   refresh interval.
//! - **Concurrency**: a hard cap on operations in flight.
//! - **Spacing**: a minimum delay between consecutive operation starts.
//!
//! Operations that would violate any bound wait in line; they never fail.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use link_analyzer::download::{RateLimitSettings, RateLimiter};
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(RateLimitSettings {
//!     reservoir: 50,
//!     refresh_interval: Duration::from_secs(10),
//!     max_concurrent: 1,
//!     min_spacing: Duration::from_millis(250),
//! });
//!
//! let answer = limiter.run(|| async { 42 }).await;
//! assert_eq!(answer, 42);
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::constants::{
    DEFAULT_MAX_CONCURRENT, DEFAULT_MIN_SPACING, DEFAULT_RESERVOIR, DEFAULT_RESERVOIR_REFRESH,
};

/// Warning threshold for a single queueing delay.
const LONG_WAIT_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Limits applied by a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Permits available per refresh interval.
    pub reservoir: u32,
    /// How often the reservoir is refilled to `reservoir`.
    pub refresh_interval: Duration,
    /// Maximum operations in flight at once.
    pub max_concurrent: usize,
    /// Minimum time between two operation starts.
    pub min_spacing: Duration,
}

impl Default for RateLimitSettings {
    /// The Google Drive quota profile: 50 calls per 10 s, one at a time,
    /// at least 250 ms apart.
    fn default() -> Self {
        Self {
            reservoir: DEFAULT_RESERVOIR,
            refresh_interval: DEFAULT_RESERVOIR_REFRESH,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            min_spacing: DEFAULT_MIN_SPACING,
        }
    }
}

/// Token-bucket limiter with a concurrency cap.
///
/// Designed to be wrapped in `Arc` and owned by the component that talks to a
/// rate-limited dependency. Each instance is independent, so several providers
/// can each carry their own limiter, and tests can inject
/// [`RateLimiter::disabled`].
#[derive(Debug)]
pub struct RateLimiter {
    settings: RateLimitSettings,

    /// Whether limiting is disabled (tests, local mocks).
    disabled: bool,

    /// In-flight cap. Tokio semaphores are fair, so waiters are served FIFO.
    slots: Semaphore,

    /// Reservoir and spacing state, protected for atomic read-update.
    bucket: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    /// Permits left in the current interval.
    tokens: u32,
    /// Start of the current refill interval.
    interval_start: Instant,
    /// When the last operation was allowed to start.
    last_start: Option<Instant>,
}

impl BucketState {
    /// Refills the reservoir for every full interval that has elapsed.
    fn refill(&mut self, now: Instant, settings: &RateLimitSettings) {
        if settings.refresh_interval.is_zero() {
            self.tokens = settings.reservoir;
            return;
        }
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed >= settings.refresh_interval {
            let intervals = elapsed.as_nanos() / settings.refresh_interval.as_nanos();
            let advance = settings
                .refresh_interval
                .saturating_mul(u32::try_from(intervals).unwrap_or(u32::MAX));
            self.interval_start += advance;
            self.tokens = settings.reservoir;
        }
    }

    /// Takes a permit if one is available now, else returns how long to wait.
    fn try_take(&mut self, now: Instant, settings: &RateLimitSettings) -> Result<(), Duration> {
        self.refill(now, settings);

        if self.tokens == 0 {
            let next_refill = self.interval_start + settings.refresh_interval;
            return Err(next_refill.saturating_duration_since(now));
        }

        if let Some(last) = self.last_start {
            let earliest = last + settings.min_spacing;
            if earliest > now {
                return Err(earliest.saturating_duration_since(now));
            }
        }

        self.tokens -= 1;
        self.last_start = Some(now);
        Ok(())
    }
}

impl RateLimiter {
    /// Creates a limiter with the given settings.
    ///
    /// A `max_concurrent` of zero is treated as one.
    #[must_use]
    #[instrument(skip_all, fields(
        reservoir = settings.reservoir,
        refresh_ms = settings.refresh_interval.as_millis(),
        max_concurrent = settings.max_concurrent,
        spacing_ms = settings.min_spacing.as_millis()
    ))]
    pub fn new(settings: RateLimitSettings) -> Self {
        debug!("creating rate limiter");
        let settings = RateLimitSettings {
            max_concurrent: settings.max_concurrent.max(1),
            ..settings
        };
        Self {
            settings,
            disabled: false,
            slots: Semaphore::new(settings.max_concurrent),
            bucket: Mutex::new(BucketState {
                tokens: settings.reservoir,
                interval_start: Instant::now(),
                last_start: None,
            }),
        }
    }

    /// Creates a limiter that lets every operation through immediately.
    #[must_use]
    #[instrument]
    pub fn disabled() -> Self {
        debug!("creating disabled rate limiter");
        let settings = RateLimitSettings {
            reservoir: u32::MAX,
            refresh_interval: Duration::ZERO,
            max_concurrent: Semaphore::MAX_PERMITS,
            min_spacing: Duration::ZERO,
        };
        Self {
            settings,
            disabled: true,
            slots: Semaphore::new(Semaphore::MAX_PERMITS),
            bucket: Mutex::new(BucketState {
                tokens: u32::MAX,
                interval_start: Instant::now(),
                last_start: None,
            }),
        }
    }

    /// Returns whether limiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn settings(&self) -> RateLimitSettings {
        self.settings
    }

    /// Runs `operation` once a slot and a permit are available.
    ///
    /// The concurrency slot is held until the operation's future completes.
    pub async fn run<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.disabled {
            return operation().await;
        }

        // The semaphore is never closed, so acquire cannot fail; fall back to
        // running unguarded rather than panicking if that ever changes.
        let _slot = match self.slots.acquire().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                warn!("rate limiter semaphore closed; running without concurrency cap");
                None
            }
        };

        self.take_permit().await;
        operation().await
    }

    /// Waits until the reservoir and spacing rules allow another start.
    async fn take_permit(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                match bucket.try_take(Instant::now(), &self.settings) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };

            if wait >= LONG_WAIT_WARNING_THRESHOLD {
                warn!(
                    wait_secs = wait.as_secs(),
                    "long rate limit wait - provider quota nearly exhausted"
                );
            } else {
                debug!(wait_ms = wait.as_millis(), "applying rate limit delay");
            }
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitSettings::default())
    }
}
