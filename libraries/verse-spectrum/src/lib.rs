//! Verse Spectrum
//!
//! Real-time banded spectral-energy analysis for visualization consumers.
//!
//! This crate provides:
//! - [`SpectrumAnalyzer`]: fixed-size FFT over the most recent audio samples,
//!   split into perceptual bass/mid/high bands
//! - [`SpectrumSampler`]: a cancellable cooperative task that samples the
//!   analyzer at display-refresh cadence and publishes [`FrequencyData`]
//!   snapshots over a watch channel
//! - [`AudioTap`]: the rebindable, identity-carrying handle onto the active
//!   audio output
//!
//! The analyzer is deliberately stateless beyond one smoothed spectrum: each
//! frame produces a fresh [`FrequencyData`] and nothing else is retained.
//! When no tap is bound (or the tap yields no samples) the output degrades to
//! constant zero - consumers must treat all-zero as a valid steady state, not
//! an error.
//!
//! # Example
//!
//! ```rust
//! use verse_spectrum::{FrequencyData, SpectrumAnalyzer};
//!
//! let mut analyzer = SpectrumAnalyzer::new();
//!
//! // Nothing bound: valid all-zero output
//! let data = analyzer.sample();
//! assert_eq!(data, FrequencyData::default());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod error;
pub mod sampler;

pub use analyzer::{AudioTap, FrequencyData, SpectrumAnalyzer, TapId};
pub use error::{Result, SpectrumError};
pub use sampler::SpectrumSampler;
