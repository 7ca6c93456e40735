//! Verse Playback
//!
//! Queue orchestration and gated playback for Verse.
//!
//! This crate provides:
//! - Ordered queue with slot identity, cursor, and restorable pre-shuffle order
//! - Playback history (bounded, for "recently played")
//! - Shuffle (Fisher-Yates) and repeat modes (Off, All, One)
//! - Asynchronous entitlement gating with a bounded timeout and a
//!   stale-response guard - gated content is never briefly audible
//! - Play telemetry (start / 30s periodic / terminal reports, non-blocking)
//! - Crossfade scheduling setting and the three persisted preferences
//! - Spectrum analyzer rebinding on every source swap
//!
//! # Architecture
//!
//! `verse-playback` is platform-agnostic. The application root constructs a
//! [`PlaybackEngine`] and injects the external collaborators behind the
//! `verse-core` traits plus an [`AudioOutput`] implementation; UI consumers
//! read snapshots, drain [`PlaybackEvent`]s, and subscribe to the frequency
//! stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use verse_core::traits::MemoryPreferenceStore;
//! use verse_playback::{NullAudioOutput, PlaybackEngine};
//! # use async_trait::async_trait;
//! # use verse_core::traits::{AccessGateEvaluator, PlayTelemetryReporter};
//! # use verse_core::types::*;
//! # struct Gate;
//! # #[async_trait]
//! # impl AccessGateEvaluator for Gate {
//! #     async fn evaluate(&self, _: &Identity, _: &GatingRule) -> verse_core::Result<AccessDecision> {
//! #         Ok(AccessDecision::granted())
//! #     }
//! # }
//! # struct Reporter;
//! # #[async_trait]
//! # impl PlayTelemetryReporter for Reporter {
//! #     async fn report_start(&self, _: Option<&Identity>, _: &TrackId, _: &str) -> verse_core::Result<PlayId> {
//! #         Ok(PlayId::generate())
//! #     }
//! #     async fn report_progress(&self, _: &PlayId, _: std::time::Duration, _: bool) -> verse_core::Result<()> {
//! #         Ok(())
//! #     }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> verse_playback::Result<()> {
//! let mut engine = PlaybackEngine::new(
//!     Arc::new(Gate),
//!     Arc::new(Reporter),
//!     Box::new(MemoryPreferenceStore::new()),
//!     Box::new(NullAudioOutput::new()),
//! );
//!
//! let tracks = vec![
//!     TrackDescriptor::new("First", "verse://first"),
//!     TrackDescriptor::new("Second", "verse://second"),
//! ];
//! engine.play_tracks(tracks, 0).await?;
//! assert!(engine.is_playing());
//!
//! engine.next().await?;
//! engine.toggle_shuffle();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod events;
pub mod gate;
pub mod history;
pub mod output;
pub mod queue;
pub mod settings;
pub mod shuffle;
pub mod telemetry;
pub mod types;

// Public exports
pub use engine::{PlaybackEngine, PREVIOUS_RESTART_THRESHOLD};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use gate::{GateStatus, GATE_CHECK_TIMEOUT};
pub use history::{History, HISTORY_LIMIT};
pub use output::{AudioOutput, NullAudioOutput};
pub use queue::Queue;
pub use settings::SettingsManager;
pub use telemetry::{PlayRecord, PERIODIC_REPORT_INTERVAL};
pub use types::{
    PlaybackSettings, PlaybackState, QueueItem, QueueItemId, RepeatMode, CROSSFADE_MAX_SECS,
};

// Re-export the analyzer surface that AudioOutput implementors need
pub use verse_spectrum::{AudioTap, FrequencyData, TapId};
