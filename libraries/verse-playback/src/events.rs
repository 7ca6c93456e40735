//! Playback events
//!
//! Event-based communication for UI synchronization. The engine queues
//! events at key points (state changes, track changes, gate outcomes) and
//! consumers drain them with [`crate::engine::PlaybackEngine::take_events`].

use crate::gate::GateStatus;
use crate::types::{PlaybackSettings, PlaybackState};
use serde::{Deserialize, Serialize};
use verse_core::types::TrackId;

/// Collects events the engine queues for its UI consumers
///
/// Thin wrapper so the engine body stays readable; drained wholesale by
/// `take_events`.
#[derive(Debug, Default)]
pub(crate) struct EventSink {
    pending: Vec<PlaybackEvent>,
}

impl EventSink {
    pub(crate) fn emit(&mut self, event: PlaybackEvent) {
        self.pending.push(event);
    }

    pub(crate) fn drain(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// A new current track was established
    TrackChanged {
        /// ID of the new current track
        track_id: TrackId,
        /// ID of the previous track, if any
        previous_track_id: Option<TrackId>,
    },

    /// The current track was restarted from the top (scrub, not skip)
    TrackRestarted {
        /// ID of the restarted track
        track_id: TrackId,
    },

    /// Queue contents changed (added/removed/reordered/replaced)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// A gate check started or resolved
    GateStatusChanged {
        /// The new gate status snapshot
        status: GateStatus,
    },

    /// Shuffle/repeat/crossfade settings changed
    SettingsChanged {
        /// The new settings
        settings: PlaybackSettings,
    },

    /// A non-fatal error the UI may want to surface
    Error {
        /// Error message
        message: String,
    },
}
