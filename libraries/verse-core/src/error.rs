/// Core error types for Verse
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for collaborator contracts
///
/// Implementations of the contracts in [`crate::traits`] map their transport
/// and backend failures into these variants. Whether a failure is fatal is
/// decided by the caller: the playback engine treats gate failures as
/// retryable denials and telemetry failures as droppable.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Gate evaluation could not complete (RPC failure, malformed rule, ...)
    #[error("Gate evaluation failed: {0}")]
    Gate(String),

    /// Telemetry backend rejected or failed to receive a report
    #[error("Telemetry report failed: {0}")]
    Telemetry(String),

    /// Input that the contract cannot act on
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors from store-backed implementations
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
