//! Cycle timing and duration parsing
//!
//! A phase lasts a duration drawn uniformly from `[min, max]`. The cycling
//! thread checks elapsed time every `poll` quantum rather than sleeping for
//! the whole interval, so a cancellation request is noticed within one
//! quantum.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ControllerError;

/// Default lower bound of a phase duration.
pub const DEFAULT_MIN_CYCLE: Duration = Duration::from_millis(4000);

/// Default upper bound of a phase duration.
pub const DEFAULT_MAX_CYCLE: Duration = Duration::from_millis(6000);

/// Default sleep between two elapsed-time checks.
pub const DEFAULT_POLL: Duration = Duration::from_millis(1);

/// Interval range and polling quantum for the cycling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    min: Duration,
    max: Duration,
    poll: Duration,
    seed: Option<u64>,
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_CYCLE,
            max: DEFAULT_MAX_CYCLE,
            poll: DEFAULT_POLL,
            seed: None,
        }
    }
}

impl CycleTiming {
    /// Creates a timing with phase durations drawn from `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidArgument`] if `min > max` or `poll`
    /// is zero.
    pub fn new(min: Duration, max: Duration, poll: Duration) -> Result<Self, ControllerError> {
        if min > max {
            return Err(ControllerError::InvalidArgument(format!(
                "minimum cycle {} exceeds maximum cycle {}",
                humantime::format_duration(min),
                humantime::format_duration(max)
            )));
        }
        if poll.is_zero() {
            return Err(ControllerError::InvalidArgument(
                "poll quantum must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            min,
            max,
            poll,
            seed: None,
        })
    }

    /// Makes interval draws reproducible.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Lower bound of a phase duration.
    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound of a phase duration.
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Sleep between two elapsed-time checks.
    #[must_use]
    pub const fn poll(&self) -> Duration {
        self.poll
    }

    /// Seed for interval draws, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Builds the random source for interval draws.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }

    /// Draws a phase duration uniformly from `[min, max]` at nanosecond
    /// resolution.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Duration {
        let lo = duration_nanos(self.min);
        let hi = duration_nanos(self.max);
        Duration::from_nanos(rng.random_range(lo..=hi))
    }
}

/// Whole milliseconds, for log fields and events.
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn whole_millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// Saturates at `u64::MAX` nanoseconds (about 584 years).
fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Parses a human-readable duration such as `"4000ms"`, `"5s"`, or `"1m 30s"`.
///
/// # Errors
///
/// Returns [`ControllerError::InvalidArgument`] if the string is not a valid
/// duration.
pub fn parse_duration(s: &str) -> Result<Duration, ControllerError> {
    humantime::parse_duration(s.trim())
        .map_err(|e| ControllerError::InvalidArgument(format!("invalid duration '{s}': {e}")))
}
