pub mod config;
pub mod logging;

pub mod checksum;
pub mod chunker;
pub mod delay;
pub mod fetch;
pub mod journal;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod task;
pub mod url_model;
