//! Batch planning: partition an ordered task list into contiguous batches.
//!
//! Batches are planned as half-open index spans over the task list, so the
//! list itself is never copied or reordered.

use rand::Rng;

use crate::config::ConfigError;

/// How batch sizes are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Fixed-size batches; the last one holds the remainder.
    Uniform { size: usize },
    /// Each batch size drawn uniformly from `[min, max]` (inclusive).
    Randomized { min: usize, max: usize },
}

impl BatchPolicy {
    /// Policy that places every task in a single batch.
    pub fn whole_list() -> Self {
        BatchPolicy::Uniform { size: usize::MAX }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            BatchPolicy::Uniform { size } if size == 0 => Err(ConfigError::ZeroBatchSize),
            BatchPolicy::Randomized { min, max } if min > max => {
                Err(ConfigError::InvertedBatchRange { min, max })
            }
            BatchPolicy::Randomized { min, .. } if min == 0 => Err(ConfigError::ZeroBatchSize),
            _ => Ok(()),
        }
    }
}

/// One batch: task indices [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    pub start: usize,
    pub end: usize,
}

impl BatchSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// 1-based number of the first task in this batch.
    pub fn first_task_number(&self) -> usize {
        self.start + 1
    }

    /// 1-based number of the last task in this batch.
    pub fn last_task_number(&self) -> usize {
        self.end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.start..self.end]
    }
}

/// Plans batch spans for `total` tasks using the thread-local RNG.
pub fn plan_batches(total: usize, policy: &BatchPolicy) -> Result<Vec<BatchSpan>, ConfigError> {
    plan_batches_with(total, policy, &mut rand::thread_rng())
}

/// Plans batch spans for `total` tasks, drawing random sizes from `rng`.
///
/// Fails with a [`ConfigError`] for an invalid policy even when `total` is 0.
pub fn plan_batches_with<R: Rng + ?Sized>(
    total: usize,
    policy: &BatchPolicy,
    rng: &mut R,
) -> Result<Vec<BatchSpan>, ConfigError> {
    policy.validate()?;

    let mut out = Vec::new();
    let mut start = 0usize;
    while start < total {
        let remaining = total - start;
        let size = match *policy {
            BatchPolicy::Uniform { size } => size.min(remaining),
            BatchPolicy::Randomized { max, .. } if remaining <= max => remaining,
            BatchPolicy::Randomized { min, max } => rng.gen_range(min..=max),
        };
        out.push(BatchSpan {
            start,
            end: start + size,
        });
        start += size;
    }
    Ok(out)
}

/// Splits `items` into ordered batches according to `policy`.
pub fn partition<'a, T>(items: &'a [T], policy: &BatchPolicy) -> Result<Vec<&'a [T]>, ConfigError> {
    partition_with_rng(items, policy, &mut rand::thread_rng())
}

pub fn partition_with_rng<'a, T, R: Rng + ?Sized>(
    items: &'a [T],
    policy: &BatchPolicy,
    rng: &mut R,
) -> Result<Vec<&'a [T]>, ConfigError> {
    let spans = plan_batches_with(items.len(), policy, rng)?;
    Ok(spans.iter().map(|s| s.slice(items)).collect())
}
