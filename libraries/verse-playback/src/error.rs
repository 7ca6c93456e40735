//! Error types for playback orchestration

use thiserror::Error;
use verse_core::types::TrackId;

/// Playback errors
///
/// The first four variants are the user-facing taxonomy; the rest are
/// command-surface errors (bad indices, empty queue) in the usual style.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The gate evaluated and said no. Recoverable by acquiring access.
    #[error("Access denied: requires {required}, have {actual}")]
    GateDenied {
        /// Balance the rule demands
        required: u64,
        /// Balance the listener actually holds
        actual: u64,
    },

    /// The gate could not be evaluated (backend failure or timeout)
    #[error("Gate check failed: {reason}")]
    GateCheckFailed {
        /// What went wrong
        reason: String,
        /// Whether retrying the same check may succeed
        retryable: bool,
    },

    /// The audio payload could not be loaded or decoded
    #[error("Track unplayable: {0}")]
    TrackUnplayable(TrackId),

    /// A telemetry report was rejected. Never interrupts playback.
    #[error("Telemetry report failed: {0}")]
    TelemetryReportFailed(String),

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
