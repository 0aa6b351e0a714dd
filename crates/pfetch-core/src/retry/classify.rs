//! Classify fetch errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Every failure is retryable except an unusable fetcher.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Unavailable(_) => ErrorKind::Fatal,
        FetchError::Http(_) | FetchError::Transfer(_) => ErrorKind::Transient,
    }
}
