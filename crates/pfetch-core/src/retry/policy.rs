use std::time::Duration;

use crate::delay::DelayWindow;

/// Attempts per task, including the first.
pub const MAX_ATTEMPTS: u32 = 10;

/// High-level classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Worth another attempt (HTTP errors, timeouts, resets).
    Transient,
    /// Retrying cannot help.
    Fatal,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop: attempts exhausted.
    GiveUp,
    /// Stop: error is not retryable.
    Abort,
    /// Try again after the given delay.
    RetryAfter(Duration),
}

/// Per-task retry bookkeeping. Re-armed for every task, dropped when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempts_remaining: u32,
    attempts_made: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::armed(MAX_ATTEMPTS)
    }
}

impl RetryState {
    pub fn armed(max_attempts: u32) -> Self {
        Self {
            attempts_remaining: max_attempts.max(1),
            attempts_made: 0,
        }
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Counts the start of an attempt.
    pub fn begin_attempt(&mut self) {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        self.attempts_made += 1;
    }

    /// Decides what follows a failed attempt; backoff is drawn from `backoff`.
    pub fn after_failure(&self, kind: ErrorKind, backoff: &DelayWindow) -> RetryDecision {
        match kind {
            ErrorKind::Fatal => RetryDecision::Abort,
            ErrorKind::Transient if self.attempts_remaining == 0 => RetryDecision::GiveUp,
            ErrorKind::Transient => RetryDecision::RetryAfter(backoff.draw()),
        }
    }
}
