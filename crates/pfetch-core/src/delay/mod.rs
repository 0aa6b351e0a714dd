//! Randomized delay windows and the inter-batch countdown.
//!
//! A [`DelayWindow`] is drawn once per use; the same window type backs the
//! per-URL polite delay, retry backoff, and the pause between batches.

mod countdown;

pub use countdown::{run_countdown, run_delay, Countdown, DelayTick};

use rand::Rng;
use std::time::Duration;

use crate::config::ConfigError;

/// Inclusive `[min, max]` range a delay is drawn from, at millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    min: Duration,
    max: Duration,
}

impl DelayWindow {
    pub const ZERO: DelayWindow = DelayWindow {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    /// Window with `min == max`.
    pub fn fixed(d: Duration) -> Self {
        Self { min: d, max: d }
    }

    /// Window from `min` to `max`; `name` labels the error when `min > max`.
    pub fn checked(name: &'static str, min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedDelayWindow {
                name,
                min_ms: min.as_millis() as u64,
                max_ms: max.as_millis() as u64,
            });
        }
        Ok(Self { min, max })
    }

    pub fn from_millis(name: &'static str, min_ms: u64, max_ms: u64) -> Result<Self, ConfigError> {
        Self::checked(name, Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_zero(&self) -> bool {
        self.max.is_zero()
    }

    /// Draws a duration using the thread-local RNG.
    pub fn draw(&self) -> Duration {
        self.draw_with(&mut rand::thread_rng())
    }

    pub fn draw_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        if lo >= hi {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rng.gen_range(lo..=hi))
    }
}

/// Delay windows applied by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Applied after every fetch and between retry attempts.
    pub per_task: DelayWindow,
    /// Pause between batches; `None` when no inter-batch delay is required.
    pub between_batches: Option<DelayWindow>,
}

impl TimeoutPolicy {
    /// No waiting anywhere. Useful for local targets and tests.
    pub fn none() -> Self {
        Self {
            per_task: DelayWindow::ZERO,
            between_batches: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn draw_stays_in_window() {
        let w = DelayWindow::from_millis("test", 3000, 6000).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let d = w.draw_with(&mut rng);
            assert!(d >= Duration::from_millis(3000) && d <= Duration::from_millis(6000));
        }
    }

    #[test]
    fn fixed_window_always_same() {
        let w = DelayWindow::fixed(Duration::from_millis(2500));
        assert_eq!(w.draw(), Duration::from_millis(2500));
        assert_eq!(DelayWindow::ZERO.draw(), Duration::ZERO);
        assert!(DelayWindow::ZERO.is_zero());
    }

    #[test]
    fn inverted_window_rejected() {
        assert_eq!(
            DelayWindow::from_millis("batch", 10, 5),
            Err(ConfigError::InvertedDelayWindow {
                name: "batch",
                min_ms: 10,
                max_ms: 5
            })
        );
    }
}
