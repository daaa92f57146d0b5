//! Error types for the scoreboard library.

use thiserror::Error;

/// Result type alias for scoreboard operations
pub type Result<T> = std::result::Result<T, ScoreError>;

#[derive(Error, Debug)]
pub enum ScoreError {
    /// An increment referenced a stat outside the configured catalog
    #[error("unknown stat: {0:?}")]
    InvalidStat(String),

    /// No session is registered under this id
    #[error("unknown session: {0}")]
    UnknownSession(u64),

    /// PNG encoding of a composed image failed
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Invalid catalog or font configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}
