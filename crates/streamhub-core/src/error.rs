//! Error types for Streamhub Core

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Client error types
///
/// Boundary operations the UI consumes never surface these; they degrade
/// to empty collections or faults on the playback session. The variants
/// exist for the seams (login transport, stream locator, adaptive
/// engine) whose implementations need to report failure upward.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Login failed: {0}")]
    Login(String),

    #[error("Stream resolution failed: {0}")]
    Resolution(String),

    #[error("Autoplay rejected by the runtime")]
    AutoplayBlocked,

    #[error("Engine attach failed: {0}")]
    EngineAttach(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
