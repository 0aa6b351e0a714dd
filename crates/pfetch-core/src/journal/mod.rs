//! Run journal (SQLite via sqlx).
//!
//! Records every `pfetch run` and the outcome of each of its tasks: where the
//! output was written, how many attempts it took, and the SHA-256 of the
//! stored content.

mod db;
mod runs;
mod types;

pub use db::Journal;
#[cfg(test)]
pub(crate) use db::open_memory;
pub use types::*;
