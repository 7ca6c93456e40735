//! Banded spectral-energy analyzer
//!
//! Computes bass/mid/high band energy from the most recent audio samples of
//! a bound [`AudioTap`]. One fixed-size transform per call, one smoothed
//! spectrum as the only retained state.

use crate::error::{Result, SpectrumError};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Default transform size (256 samples -> 128 usable bins)
pub const DEFAULT_FFT_SIZE: usize = 256;

/// Exponential smoothing constant applied to bin magnitudes
///
/// Matches the fixed smoothing of the sampling primitive this analyzer
/// replaces; no additional buffering is applied, to bound latency.
const SMOOTHING: f32 = 0.8;

/// Band weights for the composite intensity (bass-weighted for beat-sync)
const BASS_WEIGHT: f32 = 0.5;
const MID_WEIGHT: f32 = 0.3;
const HIGH_WEIGHT: f32 = 0.2;

/// Opaque identity of an audio source handle
///
/// Rebinding is decided by comparing these values, never by reference
/// identity of the handle object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TapId(Uuid);

impl TapId {
    /// Generate a fresh tap identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rebindable handle onto the active audio output
///
/// Implementations expose the most recent mono samples of whatever is
/// currently audible. `fill` is called once per analysis frame from the
/// sampling task, so implementations use interior mutability (typically a
/// ring buffer) and must be cheap.
pub trait AudioTap: Send + Sync {
    /// Identity of the underlying source
    ///
    /// Two taps reading the same output node report the same ID; swapping
    /// the output's source produces a new ID.
    fn id(&self) -> TapId;

    /// Copy the most recent samples into `buf`, returning how many were
    /// written
    ///
    /// Samples are mono f32 in `[-1.0, 1.0]`. Returning 0 means nothing is
    /// audible right now; the analyzer decays to silence.
    fn fill(&self, buf: &mut [f32]) -> usize;
}

/// One frame of banded spectral measurements
///
/// All values are normalized to `[0, 1]`. Recomputed every analysis frame;
/// the analyzer retains no history of these.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrequencyData {
    /// Bass-weighted composite of the three bands
    pub intensity: f32,

    /// Mean magnitude of the lowest ~10% of bins
    pub bass_level: f32,

    /// Mean magnitude of the 10-50% bin range
    pub mid_level: f32,

    /// Mean magnitude of the upper half of bins
    pub high_level: f32,
}

impl FrequencyData {
    /// Whether this frame is the all-zero steady state
    pub fn is_silent(&self) -> bool {
        self.intensity == 0.0
            && self.bass_level == 0.0
            && self.mid_level == 0.0
            && self.high_level == 0.0
    }
}

/// Fixed-size FFT analyzer over a rebindable audio tap
///
/// The processing state (transform plan, window, smoothed spectrum) is
/// rebuilt only when the bound source identity changes; rebinding the same
/// source is a no-op since the underlying sampling primitive can bind an
/// output node only once.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,

    /// Hann window, precomputed
    window: Vec<f32>,

    /// Normalization so a full-scale windowed sine lands at magnitude 1.0
    norm: f32,

    /// Smoothed bin magnitudes (fft_size / 2 entries)
    smoothed: Vec<f32>,

    /// Reusable buffers to keep per-frame work allocation-free
    input: Vec<f32>,
    scratch: Vec<Complex<f32>>,

    /// Currently bound source, if any
    tap: Option<Arc<dyn AudioTap>>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer with the default transform size
    pub fn new() -> Self {
        // DEFAULT_FFT_SIZE is a valid power of two
        match Self::with_fft_size(DEFAULT_FFT_SIZE) {
            Ok(analyzer) => analyzer,
            Err(_) => unreachable!("default FFT size is valid"),
        }
    }

    /// Create an analyzer with an explicit transform size
    ///
    /// # Errors
    /// Returns [`SpectrumError::InvalidFftSize`] unless `fft_size` is a
    /// power of two in `32..=32768`.
    pub fn with_fft_size(fft_size: usize) -> Result<Self> {
        if !fft_size.is_power_of_two() || !(32..=32768).contains(&fft_size) {
            return Err(SpectrumError::InvalidFftSize(fft_size));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let phase = (i as f32 / fft_size as f32) * std::f32::consts::TAU;
                0.5 * (1.0 - phase.cos())
            })
            .collect();
        let window_sum: f32 = window.iter().sum();

        Ok(Self {
            fft,
            fft_size,
            window,
            norm: 2.0 / window_sum,
            smoothed: vec![0.0; fft_size / 2],
            input: vec![0.0; fft_size],
            scratch: vec![Complex::default(); fft_size],
            tap: None,
        })
    }

    /// Number of usable frequency bins
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Bind the analyzer to an audio source
    ///
    /// Binding the source that is already bound is a no-op. Binding a
    /// different source resets the smoothed spectrum so stale energy from
    /// the previous source never bleeds into the new one.
    ///
    /// Returns true if a rebind actually occurred.
    pub fn bind(&mut self, tap: Arc<dyn AudioTap>) -> bool {
        if let Some(ref bound) = self.tap {
            if bound.id() == tap.id() {
                return false;
            }
        }

        debug!(tap_id = %tap.id(), "Rebinding spectrum analyzer");
        self.smoothed.fill(0.0);
        self.tap = Some(tap);
        true
    }

    /// Unbind the current source
    ///
    /// The next `sample` call returns all-zero output.
    pub fn unbind(&mut self) {
        if self.tap.take().is_some() {
            debug!("Spectrum analyzer unbound");
        }
        self.smoothed.fill(0.0);
    }

    /// Identity of the currently bound source, if any
    pub fn bound_id(&self) -> Option<TapId> {
        self.tap.as_ref().map(|t| t.id())
    }

    /// Compute one frame of banded measurements
    ///
    /// With no source bound (or a source yielding no samples that has
    /// decayed out), this returns the all-zero steady state.
    pub fn sample(&mut self) -> FrequencyData {
        let Some(tap) = self.tap.clone() else {
            return FrequencyData::default();
        };

        self.input.fill(0.0);
        let filled = tap.fill(&mut self.input);
        if filled == 0 && self.smoothed.iter().all(|m| *m == 0.0) {
            return FrequencyData::default();
        }

        for (i, sample) in self.input.iter().enumerate() {
            self.scratch[i] = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (i, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = (self.scratch[i].norm() * self.norm).clamp(0.0, 1.0);
            *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;
        }

        self.bands()
    }

    /// Split the smoothed spectrum into bass/mid/high band averages
    ///
    /// Lowest ~10% of bins approximate bass, 10-50% mid, the upper half
    /// treble.
    fn bands(&self) -> FrequencyData {
        let bins = self.bin_count();
        let bass_end = bins / 10;
        let mid_end = bins / 2;

        let bass_level = Self::band_average(&self.smoothed[..bass_end]);
        let mid_level = Self::band_average(&self.smoothed[bass_end..mid_end]);
        let high_level = Self::band_average(&self.smoothed[mid_end..]);

        let intensity = (BASS_WEIGHT * bass_level + MID_WEIGHT * mid_level
            + HIGH_WEIGHT * high_level)
            .clamp(0.0, 1.0);

        FrequencyData {
            intensity,
            bass_level,
            mid_level,
            high_level,
        }
    }

    fn band_average(bins: &[f32]) -> f32 {
        if bins.is_empty() {
            return 0.0;
        }
        (bins.iter().sum::<f32>() / bins.len() as f32).clamp(0.0, 1.0)
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Tap producing a pure tone centered on one FFT bin
    struct ToneTap {
        id: TapId,
        bin: usize,
        amplitude: f32,
    }

    impl ToneTap {
        fn new(bin: usize, amplitude: f32) -> Self {
            Self {
                id: TapId::generate(),
                bin,
                amplitude,
            }
        }
    }

    impl AudioTap for ToneTap {
        fn id(&self) -> TapId {
            self.id
        }

        fn fill(&self, buf: &mut [f32]) -> usize {
            let n = buf.len() as f32;
            for (i, sample) in buf.iter_mut().enumerate() {
                let phase = std::f32::consts::TAU * self.bin as f32 * i as f32 / n;
                *sample = self.amplitude * phase.sin();
            }
            buf.len()
        }
    }

    /// Tap that never yields samples
    struct SilentTap {
        id: TapId,
    }

    impl AudioTap for SilentTap {
        fn id(&self) -> TapId {
            self.id
        }

        fn fill(&self, _buf: &mut [f32]) -> usize {
            0
        }
    }

    fn settled(analyzer: &mut SpectrumAnalyzer) -> FrequencyData {
        // Let the exponential smoothing converge
        let mut data = FrequencyData::default();
        for _ in 0..60 {
            data = analyzer.sample();
        }
        data
    }

    #[test]
    fn unbound_analyzer_outputs_zero() {
        let mut analyzer = SpectrumAnalyzer::new();
        let data = analyzer.sample();
        assert!(data.is_silent());
    }

    #[test]
    fn invalid_fft_size_is_rejected() {
        assert!(SpectrumAnalyzer::with_fft_size(100).is_err());
        assert!(SpectrumAnalyzer::with_fft_size(16).is_err());
        assert!(SpectrumAnalyzer::with_fft_size(65536).is_err());
        assert!(SpectrumAnalyzer::with_fft_size(256).is_ok());
    }

    #[test]
    fn values_stay_within_unit_range() {
        let mut analyzer = SpectrumAnalyzer::new();
        // Deliberately hot signal: full-scale tone
        analyzer.bind(Arc::new(ToneTap::new(4, 1.0)));

        for _ in 0..120 {
            let data = analyzer.sample();
            for value in [data.intensity, data.bass_level, data.mid_level, data.high_level] {
                assert!((0.0..=1.0).contains(&value), "out of range: {value}");
            }
        }
    }

    #[test]
    fn bass_tone_lands_in_bass_band() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.bind(Arc::new(ToneTap::new(4, 0.8)));

        let data = settled(&mut analyzer);
        assert!(data.bass_level > 0.01);
        assert!(data.bass_level > data.mid_level * 10.0);
        assert!(data.bass_level > data.high_level * 10.0);
    }

    #[test]
    fn high_tone_lands_in_high_band() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.bind(Arc::new(ToneTap::new(100, 0.8)));

        let data = settled(&mut analyzer);
        assert!(data.high_level > 0.001);
        assert!(data.high_level > data.bass_level);
        assert!(data.high_level > data.mid_level);
    }

    #[test]
    fn intensity_is_bass_weighted_composite() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.bind(Arc::new(ToneTap::new(4, 0.8)));

        let data = settled(&mut analyzer);
        let expected = 0.5 * data.bass_level + 0.3 * data.mid_level + 0.2 * data.high_level;
        assert_relative_eq!(data.intensity, expected, epsilon = 1e-6);
    }

    #[test]
    fn smoothing_rises_gradually() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.bind(Arc::new(ToneTap::new(4, 0.8)));

        let first = analyzer.sample().bass_level;
        let later = settled(&mut analyzer).bass_level;
        assert!(first > 0.0);
        assert!(later > first, "smoothed level should rise: {first} -> {later}");
    }

    #[test]
    fn rebinding_same_source_is_noop() {
        let mut analyzer = SpectrumAnalyzer::new();
        let tap = Arc::new(ToneTap::new(4, 0.8));

        assert!(analyzer.bind(tap.clone()));
        let warmed = settled(&mut analyzer);

        // Same identity: no rebuild, smoothed state survives
        assert!(!analyzer.bind(tap));
        let after = analyzer.sample();
        assert!(after.bass_level >= warmed.bass_level * 0.5);
    }

    #[test]
    fn rebinding_new_source_resets_spectrum() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.bind(Arc::new(ToneTap::new(4, 0.8)));
        settled(&mut analyzer);

        // New identity: smoothed bass from the old source must not bleed in
        assert!(analyzer.bind(Arc::new(SilentTap { id: TapId::generate() })));
        let data = analyzer.sample();
        assert!(data.is_silent());
    }

    #[test]
    fn unbind_zeroes_output_within_one_frame() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.bind(Arc::new(ToneTap::new(4, 0.8)));
        assert!(settled(&mut analyzer).intensity > 0.0);

        analyzer.unbind();
        assert!(analyzer.sample().is_silent());
    }
}
