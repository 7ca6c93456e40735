//! Core types for playback orchestration

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use verse_core::types::TrackDescriptor;

/// Playback engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No current item and nothing playable
    Empty,

    /// A gate check for the next item is in flight; no audio may start
    TransitionPending,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Queue ran out under repeat-off
    Ended,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,

    /// Loop the entire queue
    All,

    /// Loop the current track only
    One,
}

impl RepeatMode {
    /// Advance through the toggle cycle: off -> all -> one -> off
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    /// Stable string form used by the preference store
    pub fn as_str(self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::All => "all",
            RepeatMode::One => "one",
        }
    }

    /// Parse the preference-store string form
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(RepeatMode::Off),
            "all" => Some(RepeatMode::All),
            "one" => Some(RepeatMode::One),
            _ => None,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum configurable crossfade overlap in seconds
pub const CROSSFADE_MAX_SECS: f32 = 12.0;

/// The three persisted playback preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Whether the upcoming queue is shuffled
    pub shuffle: bool,

    /// Repeat mode
    pub repeat: RepeatMode,

    /// Crossfade overlap between tracks, clamped to [0, 12]
    pub crossfade_secs: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatMode::Off,
            crossfade_secs: 0.0,
        }
    }
}

/// Opaque identity of one queue slot
///
/// Distinct from the track's identity: the same track may sit in several
/// slots at once, and slot identity is what shuffle restoration and index
/// relocation key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueItemId(Uuid);

impl QueueItemId {
    /// Generate a fresh slot identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One queue slot: a track plus the slot's own identity
///
/// Created on enqueue, destroyed on removal or consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// The catalog track this slot references
    pub track: TrackDescriptor,

    /// Identity of the slot itself
    pub queue_id: QueueItemId,
}

impl QueueItem {
    /// Wrap a track in a fresh slot
    pub fn new(track: TrackDescriptor) -> Self {
        Self {
            track,
            queue_id: QueueItemId::generate(),
        }
    }
}
