//! Error types for timer operations and persistence

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by timer construction and controller operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Total duration is zero
    #[error("Please set a time greater than 0 seconds")]
    InvalidDuration,

    /// Label is empty or whitespace only
    #[error("Please provide a label for your timer")]
    EmptyLabel,

    /// Hours/minutes/seconds do not fit into a duration
    #[error("Timer duration is too large")]
    DurationOverflow,

    /// No timer with the given id exists in the collection
    #[error("Timer {0} not found")]
    NotFound(Uuid),
}

impl TimerError {
    /// Whether the error was caused by user input rather than a missing timer
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, TimerError::NotFound(_))
    }
}

/// Errors raised by a key-value store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
