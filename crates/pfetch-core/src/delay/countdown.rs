//! Per-second countdown over a drawn delay.

use std::time::Duration;

use super::DelayWindow;

const TICK: Duration = Duration::from_secs(1);

/// One elapsed second of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayTick {
    /// Seconds elapsed including this tick (1-based).
    pub elapsed_secs: u64,
    pub total_secs: u64,
}

impl DelayTick {
    pub fn remaining_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.elapsed_secs)
    }

    pub fn minutes_remaining(&self) -> u64 {
        self.remaining_secs() / 60
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.remaining_secs() % 60
    }

    /// `MM:SS` of the time still to wait.
    pub fn clock(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.minutes_remaining(),
            self.seconds_remaining()
        )
    }
}

/// Lazy sequence of one-second ticks covering the whole seconds of a delay.
/// A sub-second remainder is dropped.
#[derive(Debug, Clone)]
pub struct Countdown {
    elapsed_secs: u64,
    total_secs: u64,
}

impl Countdown {
    pub fn new(total: Duration) -> Self {
        Self {
            elapsed_secs: 0,
            total_secs: total.as_secs(),
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }
}

impl Iterator for Countdown {
    type Item = DelayTick;

    fn next(&mut self) -> Option<DelayTick> {
        if self.elapsed_secs >= self.total_secs {
            return None;
        }
        self.elapsed_secs += 1;
        Some(DelayTick {
            elapsed_secs: self.elapsed_secs,
            total_secs: self.total_secs,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.total_secs - self.elapsed_secs) as usize;
        (n, Some(n))
    }
}

/// Sleeps through `countdown`, handing each tick to `on_tick` after its second has passed.
/// Runs to completion; there is no cancellation.
pub async fn run_countdown<F>(countdown: Countdown, mut on_tick: F)
where
    F: FnMut(DelayTick),
{
    for tick in countdown {
        tokio::time::sleep(TICK).await;
        on_tick(tick);
    }
}

/// Draws a fresh duration from `window` and counts it down. Returns the number of ticks.
pub async fn run_delay<F>(window: &DelayWindow, on_tick: F) -> u64
where
    F: FnMut(DelayTick),
{
    let countdown = Countdown::new(window.draw());
    let total = countdown.total_secs();
    tracing::debug!(total_secs = total, "delay started");
    run_countdown(countdown, on_tick).await;
    total
}
