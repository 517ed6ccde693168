// CivicTV - API Error Types

use thiserror::Error;

/// Failure surfaced by the remote archive API clients after retries are
/// exhausted. Thumbnail generation never produces one of these; it
/// degrades to a fallback image instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to parse response: {0}")]
    Decode(String),
}
