//! Persisted playback settings
//!
//! Wraps the injected [`PreferenceStore`] around an in-memory
//! [`PlaybackSettings`]. Values load once at engine construction
//! (default on missing or unparsable) and every mutation writes back
//! immediately - the three scalar keys are the only cross-session state
//! this core owns.

use crate::types::{PlaybackSettings, RepeatMode, CROSSFADE_MAX_SECS};
use tracing::debug;
use verse_core::traits::PreferenceStore;

const PREF_SHUFFLE: &str = "shuffle";
const PREF_REPEAT: &str = "repeat";
const PREF_CROSSFADE: &str = "crossfade";

/// Settings backed by the preference store
pub struct SettingsManager {
    store: Box<dyn PreferenceStore>,
    settings: PlaybackSettings,
}

impl SettingsManager {
    /// Load settings from the store, defaulting anything missing or invalid
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let defaults = PlaybackSettings::default();
        let settings = PlaybackSettings {
            shuffle: store
                .get(PREF_SHUFFLE)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shuffle),
            repeat: store
                .get(PREF_REPEAT)
                .and_then(|v| RepeatMode::parse(&v))
                .unwrap_or(defaults.repeat),
            crossfade_secs: store
                .get(PREF_CROSSFADE)
                .and_then(|v| v.parse::<f32>().ok())
                .filter(|v| v.is_finite())
                .map_or(defaults.crossfade_secs, |v| {
                    v.clamp(0.0, CROSSFADE_MAX_SECS)
                }),
        };

        debug!(?settings, "Loaded playback settings");
        Self { store, settings }
    }

    /// Current settings snapshot
    pub fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    /// Whether shuffle is on
    pub fn shuffle(&self) -> bool {
        self.settings.shuffle
    }

    /// Current repeat mode
    pub fn repeat(&self) -> RepeatMode {
        self.settings.repeat
    }

    /// Current crossfade overlap in seconds
    pub fn crossfade_secs(&self) -> f32 {
        self.settings.crossfade_secs
    }

    /// Flip shuffle and persist; returns the new value
    pub fn toggle_shuffle(&mut self) -> bool {
        self.settings.shuffle = !self.settings.shuffle;
        self.store
            .set(PREF_SHUFFLE, if self.settings.shuffle { "true" } else { "false" });
        self.settings.shuffle
    }

    /// Cycle repeat off -> all -> one -> off and persist; returns the new mode
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.settings.repeat = self.settings.repeat.cycled();
        self.store.set(PREF_REPEAT, self.settings.repeat.as_str());
        self.settings.repeat
    }

    /// Clamp to [0, 12] seconds and persist; returns the clamped value
    pub fn set_crossfade(&mut self, secs: f32) -> f32 {
        let clamped = if secs.is_finite() {
            secs.clamp(0.0, CROSSFADE_MAX_SECS)
        } else {
            0.0
        };
        self.settings.crossfade_secs = clamped;
        self.store.set(PREF_CROSSFADE, &clamped.to_string());
        clamped
    }
}
