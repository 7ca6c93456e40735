//! Error types for spectral analysis

use thiserror::Error;

/// Result type alias using `SpectrumError`
pub type Result<T> = std::result::Result<T, SpectrumError>;

/// Spectral analysis errors
#[derive(Debug, Error)]
pub enum SpectrumError {
    /// Transform size must be a power of two in a sane range
    #[error("Invalid FFT size: {0} (must be a power of two between 32 and 32768)")]
    InvalidFftSize(usize),
}
