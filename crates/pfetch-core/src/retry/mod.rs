//! Per-task retry policy and the retrying fetcher.
//!
//! Every fetch failure is retried up to [`MAX_ATTEMPTS`] times with a backoff
//! drawn from the per-URL delay window; only an unusable fetcher aborts early.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::classify;
pub use error::{FetchError, TaskError};
pub use policy::{ErrorKind, RetryDecision, RetryState, MAX_ATTEMPTS};
pub use run::{AttemptFailure, FetchedTask, RetryingFetcher};
