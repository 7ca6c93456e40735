//! Platform-agnostic audio output seam
//!
//! The single audio output is exclusively owned by whichever queue item is
//! current. Only the engine swaps its source; the spectrum analyzer reads
//! from it through the [`AudioTap`] the output hands out.

use crate::error::Result;
use std::sync::Arc;
use verse_core::types::TrackDescriptor;
use verse_spectrum::AudioTap;

/// Exclusive handle on the platform audio output
///
/// Implementations decode and render; the engine only ever swaps sources
/// and flips play/pause. A `set_source` failure means the payload is
/// unplayable - the engine reports it and advances rather than stalling.
pub trait AudioOutput: Send {
    /// Swap the output's source to the given track's payload
    ///
    /// Returning an error marks the track unplayable.
    fn set_source(&mut self, track: &TrackDescriptor) -> Result<()>;

    /// Tap over whatever the output currently renders, for spectral analysis
    ///
    /// The tap's identity changes when the source changes. None while no
    /// source is bound.
    fn tap(&self) -> Option<Arc<dyn AudioTap>>;

    /// Seek the current source back to its start
    fn restart(&mut self);

    /// Start or stop rendering
    fn set_playing(&mut self, playing: bool);
}

/// Output that renders nothing
///
/// Default for headless deployments (and the test suites): every source
/// loads, no audio exists, no tap is handed out.
#[derive(Debug, Default)]
pub struct NullAudioOutput {
    playing: bool,
}

impl NullAudioOutput {
    /// Create a silent output
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioOutput for NullAudioOutput {
    fn set_source(&mut self, _track: &TrackDescriptor) -> Result<()> {
        Ok(())
    }

    fn tap(&self) -> Option<Arc<dyn AudioTap>> {
        None
    }

    fn restart(&mut self) {}

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}
