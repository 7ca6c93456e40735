//! Playback engine - core orchestration
//!
//! Owns the queue, history, settings, gate glue, telemetry glue, the audio
//! output handle, and the spectrum sampler. Explicitly constructed by the
//! application root with its collaborators injected; there is no module
//! state.
//!
//! # Concurrency model
//!
//! Single-threaded cooperative: all commands take `&mut self`, so queue
//! state is never mutated in parallel and no locking exists. Asynchronous
//! gate checks are serialized against new transition requests with an
//! epoch guard: every superseding command bumps the epoch, and a gate
//! decision that resolves for a stale epoch is discarded, never applied.
//! A gated transition never starts audio before its check resolves.

use crate::error::{PlaybackError, Result};
use crate::events::{EventSink, PlaybackEvent};
use crate::gate::{self, GateStatus};
use crate::history::History;
use crate::output::AudioOutput;
use crate::queue::Queue;
use crate::settings::SettingsManager;
use crate::telemetry::{PlayRecord, TelemetryTracker};
use crate::types::{PlaybackSettings, PlaybackState, QueueItem, QueueItemId, RepeatMode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use verse_core::traits::{AccessGateEvaluator, PlayTelemetryReporter, PreferenceStore};
use verse_core::types::{Identity, TrackDescriptor};
use verse_spectrum::{FrequencyData, SpectrumAnalyzer, SpectrumSampler};

/// Elapsed time above which `previous()` restarts the current track
/// instead of moving back one slot
pub const PREVIOUS_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// What to do about the outgoing track's telemetry inside a transition
enum Outgoing {
    /// Caller already closed the session (or there is nothing to close)
    Settled,

    /// Close the session as abandoned once the transition is committed
    Abandon,
}

/// Central playback orchestration
///
/// Drives all queue transitions, invokes the gate evaluator before any
/// gated one, reports listening durations, and rebinds the spectrum
/// analyzer whenever the audio source swaps.
pub struct PlaybackEngine {
    // State machine
    state: PlaybackState,
    resume_state: PlaybackState,
    current: Option<QueueItem>,

    // Queue and history
    queue: Queue,
    history: History,

    // Settings (persisted through the preference store)
    settings: SettingsManager,

    // Gate glue
    evaluator: Arc<dyn AccessGateEvaluator>,
    gate_status: GateStatus,
    identity: Option<Identity>,

    // Telemetry glue
    telemetry: TelemetryTracker,
    source_tag: String,

    // The single audio output and its analyzer
    output: Box<dyn AudioOutput>,
    sampler: SpectrumSampler,

    // Event queue for UI synchronization
    events: EventSink,

    // Stale-response guard for in-flight gate checks
    epoch: u64,

    // Consecutive unplayable-track counter (bounded skip-forward)
    consecutive_failures: usize,
}

impl PlaybackEngine {
    /// Create an engine with its collaborators injected
    ///
    /// Settings load from the preference store immediately; everything else
    /// starts empty.
    pub fn new(
        evaluator: Arc<dyn AccessGateEvaluator>,
        reporter: Arc<dyn PlayTelemetryReporter>,
        preferences: Box<dyn PreferenceStore>,
        output: Box<dyn AudioOutput>,
    ) -> Self {
        Self {
            state: PlaybackState::Empty,
            resume_state: PlaybackState::Empty,
            current: None,
            queue: Queue::new(),
            history: History::new(),
            settings: SettingsManager::load(preferences),
            evaluator,
            gate_status: GateStatus::idle(),
            identity: None,
            telemetry: TelemetryTracker::new(reporter),
            source_tag: "queue".to_string(),
            output,
            sampler: SpectrumSampler::new(SpectrumAnalyzer::new()),
            events: EventSink::default(),
            epoch: 0,
            consecutive_failures: 0,
        }
    }

    // ===== Identity & reporting context =====

    /// Set or clear the listener identity used for gating and telemetry
    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }

    /// Tag sent with telemetry start reports (where playback originated)
    pub fn set_source_tag(&mut self, tag: impl Into<String>) {
        self.source_tag = tag.into();
    }

    // ===== Snapshots =====

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether audio is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Currently playing queue item
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current.as_ref()
    }

    /// Currently playing track
    pub fn current_track(&self) -> Option<&TrackDescriptor> {
        self.current.as_ref().map(|item| &item.track)
    }

    /// All queue slots in play order
    pub fn queue_items(&self) -> &[QueueItem] {
        self.queue.items()
    }

    /// Queue cursor position
    pub fn queue_index(&self) -> Option<usize> {
        self.queue.index()
    }

    /// Previously played items, oldest first
    pub fn history(&self) -> Vec<&QueueItem> {
        self.history.items().collect()
    }

    /// Current settings snapshot
    pub fn settings(&self) -> PlaybackSettings {
        self.settings.settings()
    }

    /// Latest gate status snapshot
    pub fn gate_status(&self) -> &GateStatus {
        &self.gate_status
    }

    /// State of the current play session
    pub fn play_record(&self) -> &PlayRecord {
        self.telemetry.record()
    }

    /// Listening time on the current track
    pub fn position(&self) -> Duration {
        self.telemetry.position()
    }

    /// Whether `next()` has somewhere to go
    pub fn has_next(&self) -> bool {
        match self.queue.index() {
            None => !self.queue.is_empty(),
            Some(i) => {
                i + 1 < self.queue.len()
                    || matches!(self.settings.repeat(), RepeatMode::All | RepeatMode::One)
            }
        }
    }

    /// Whether `previous()` can move back a slot
    pub fn has_previous(&self) -> bool {
        match self.queue.index() {
            Some(i) => i > 0 || self.settings.repeat() == RepeatMode::All,
            None => false,
        }
    }

    /// Drain queued UI events
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        self.events.drain()
    }

    // ===== Frequency stream =====

    /// Subscribe to per-frame frequency snapshots
    pub fn frequency_stream(&self) -> watch::Receiver<FrequencyData> {
        self.sampler.subscribe()
    }

    /// Start or cancel the sampling loop
    ///
    /// Call with `true` while at least one visualization consumer is on
    /// screen; the loop is never redundantly restarted.
    pub fn set_visualizer_active(&mut self, active: bool) {
        if active {
            self.sampler.start();
        } else {
            self.sampler.stop();
        }
    }

    // ===== Playback commands =====

    /// Play a single track
    ///
    /// Requesting the track that is already current toggles play/pause
    /// without touching queue index or history. Anything else replaces the
    /// queue with a singleton and transitions to it (gated path included).
    pub async fn play_track(&mut self, track: TrackDescriptor) -> Result<()> {
        self.supersede_pending();

        if self.current.as_ref().is_some_and(|c| c.track.id == track.id) {
            return self.toggle_current();
        }

        self.consecutive_failures = 0;
        self.queue.replace_tracks(vec![track]);
        self.emit_queue_changed();
        self.transition_to(0, Outgoing::Abandon).await
    }

    /// Replace the queue wholesale and start at `start_index`
    ///
    /// With shuffle on, the chosen track stays first and the remainder is
    /// Fisher-Yates shuffled; otherwise the given order is preserved.
    /// An empty list clears playback entirely.
    pub async fn play_tracks(
        &mut self,
        tracks: Vec<TrackDescriptor>,
        start_index: usize,
    ) -> Result<()> {
        self.supersede_pending();

        if tracks.is_empty() {
            self.telemetry.finalize(false).await;
            self.queue.clear();
            self.current = None;
            self.output.set_playing(false);
            self.sampler.unbind().await;
            self.set_state(PlaybackState::Empty);
            self.emit_queue_changed();
            return Ok(());
        }
        if start_index >= tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds(start_index));
        }

        self.consecutive_failures = 0;
        self.queue.replace_tracks(tracks);
        let target = if self.settings.shuffle() {
            self.queue.shuffle_for_start(start_index);
            0
        } else {
            start_index
        };
        self.emit_queue_changed();
        self.transition_to(target, Outgoing::Abandon).await
    }

    /// Toggle play/pause on the current track
    ///
    /// With no current track but a non-empty queue, starts from the cursor
    /// (or the head).
    pub async fn toggle_play(&mut self) -> Result<()> {
        if self.current.is_some() {
            return self.toggle_current();
        }
        if self.queue.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }
        let start = self.queue.index().unwrap_or(0);
        self.transition_to(start, Outgoing::Abandon).await
    }

    /// Advance to the next track
    ///
    /// The outgoing track is always reported complete before any transition
    /// work. Repeat-one replays the same slot; end-of-queue wraps under
    /// repeat-all and otherwise ends playback.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Result<()> {
        self.supersede_pending();

        if self.queue.is_empty() && self.current.is_none() {
            return Err(PlaybackError::QueueEmpty);
        }

        self.telemetry.finalize(true).await;

        if self.settings.repeat() == RepeatMode::One && self.current.is_some() {
            return self.replay_current().await;
        }

        let len = self.queue.len();
        let target = match self.queue.index() {
            None if len > 0 => Some(0),
            None => None,
            Some(i) if i + 1 < len => Some(i + 1),
            Some(_) => match self.settings.repeat() {
                RepeatMode::All if len > 0 => Some(0),
                _ => None,
            },
        };

        match target {
            Some(index) => self.transition_to(index, Outgoing::Settled).await,
            None => {
                debug!("Queue exhausted, ending playback");
                self.output.set_playing(false);
                self.set_state(PlaybackState::Ended);
                Ok(())
            }
        }
    }

    /// Go back: restart the current track if it has played >=3s, otherwise
    /// move to the prior slot (wrapping only under repeat-all)
    pub async fn previous(&mut self) -> Result<()> {
        self.supersede_pending();

        if self.current.is_none() && self.queue.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }

        // Scrub, not skip: same play session, clock back to zero
        if self.current.is_some() && self.telemetry.position() >= PREVIOUS_RESTART_THRESHOLD {
            return self.restart_current();
        }

        let len = self.queue.len();
        let target = match self.queue.index() {
            Some(i) if i > 0 => Some(i - 1),
            Some(_) if self.settings.repeat() == RepeatMode::All && len > 1 => Some(len - 1),
            Some(_) => None,
            None if len > 0 => Some(0),
            None => None,
        };

        match target {
            Some(index) => self.transition_to(index, Outgoing::Abandon).await,
            None => self.restart_current(),
        }
    }

    /// Jump to a queue slot by index (gated path, same as `play_track`)
    pub async fn skip_to(&mut self, index: usize) -> Result<()> {
        self.supersede_pending();

        if index >= self.queue.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        self.transition_to(index, Outgoing::Abandon).await
    }

    // ===== Queue mutations =====

    /// Append a track to the end of the queue
    pub fn add_to_queue(&mut self, track: TrackDescriptor) -> QueueItemId {
        let item = QueueItem::new(track);
        let id = item.queue_id;
        self.queue.push_end(item);
        self.emit_queue_changed();
        id
    }

    /// Insert a track right after the current slot
    pub fn add_next(&mut self, track: TrackDescriptor) -> QueueItemId {
        let item = QueueItem::new(track);
        let id = item.queue_id;
        self.queue.insert_next(item);
        self.emit_queue_changed();
        id
    }

    /// Remove the slot at `index`
    ///
    /// Removing the currently playing slot leaves the audio running; the
    /// engine's current item is detached from the queue from then on.
    pub fn remove_from_queue(&mut self, index: usize) -> Result<QueueItem> {
        let removed = self
            .queue
            .remove(index)
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.emit_queue_changed();
        Ok(removed)
    }

    /// Move a slot from one position to another
    pub fn reorder_queue(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.reorder(from, to)?;
        self.emit_queue_changed();
        Ok(())
    }

    /// Drop every queued slot; the current track keeps playing detached
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.emit_queue_changed();
    }

    // ===== Settings =====

    /// Flip shuffle
    ///
    /// Enabling shuffles only the upcoming slice; history and the current
    /// slot are untouched. Disabling restores the original insertion order
    /// and relocates the cursor by queue-id lookup. Either way any pending
    /// gate check is superseded.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.supersede_pending();

        let enabled = self.settings.toggle_shuffle();
        if enabled {
            self.queue.shuffle_upcoming();
        } else {
            let current_id = self.current.as_ref().map(|c| c.queue_id);
            self.queue.restore_original(current_id);
        }

        info!(shuffle = enabled, "Shuffle toggled");
        self.emit_settings_changed();
        self.emit_queue_changed();
        enabled
    }

    /// Cycle repeat off -> all -> one -> off
    pub fn toggle_repeat(&mut self) -> RepeatMode {
        self.supersede_pending();

        let mode = self.settings.cycle_repeat();
        info!(repeat = %mode, "Repeat toggled");
        self.emit_settings_changed();
        mode
    }

    /// Set the crossfade overlap, clamped to [0, 12] seconds
    ///
    /// Scheduling contract only: the driver reads this to decide when to
    /// overlap track ends; mixing happens downstream.
    pub fn set_crossfade(&mut self, secs: f32) -> f32 {
        let clamped = self.settings.set_crossfade(secs);
        self.emit_settings_changed();
        clamped
    }

    // ===== Driver notifications =====

    /// Accumulate listening time while playing
    ///
    /// The playback driver feeds elapsed wall time here; the engine fires
    /// the 30-second periodic telemetry reports off it and resets the
    /// unplayable-track counter (progress proves the source plays).
    pub fn advance_position(&mut self, dt: Duration) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.consecutive_failures = 0;
        if self.telemetry.advance(dt) {
            self.telemetry.spawn_periodic();
        }
    }

    /// The current track reached its natural end
    ///
    /// Triggers the automatic `next()`; the outgoing track's completed
    /// report is sent before the new session opens.
    pub async fn on_track_ended(&mut self) -> Result<()> {
        debug!(
            crossfade_secs = self.settings.crossfade_secs(),
            "Track ended, advancing"
        );
        self.next().await
    }

    /// The current track turned out to be unplayable mid-play
    ///
    /// Reports zero duration / not completed, then advances one step.
    /// If every queue item fails consecutively, playback stops and a
    /// "nothing playable" state is surfaced instead of looping.
    pub async fn on_track_failed(&mut self) -> Result<()> {
        if let Some(item) = self.current.as_ref() {
            warn!(track = %item.track.id, "Current track unplayable");
        }
        self.telemetry.finalize_failed().await;

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.queue.len().max(1) {
            self.enter_nothing_playable().await;
            return Ok(());
        }
        self.next().await
    }

    /// Close the current play session explicitly (e.g. on app shutdown)
    pub async fn record_play(&mut self, completed: bool) {
        self.telemetry.finalize(completed).await;
    }

    // ===== Internal transitions =====

    /// Invalidate any in-flight gate check
    ///
    /// A later command supersedes the pending transition: the epoch bump
    /// makes the eventual decision stale, and the visible pending state is
    /// rolled back immediately.
    fn supersede_pending(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.state == PlaybackState::TransitionPending {
            self.set_state(self.resume_state);
        }
        if self.gate_status.checking {
            self.set_gate_status(GateStatus::idle());
        }
    }

    /// The gated transition path
    ///
    /// Gate first - no audio may start while the check is in flight. A
    /// denial or failure leaves the previous playback state untouched and
    /// surfaces through [`GateStatus`]. A decision arriving after the
    /// transition was superseded is discarded.
    async fn transition_to(&mut self, index: usize, outgoing: Outgoing) -> Result<()> {
        let Some(item) = self.queue.get(index).cloned() else {
            return Err(PlaybackError::IndexOutOfBounds(index));
        };

        if item.track.gating.is_gated() {
            let epoch = self.begin_gate_check();
            let outcome = self.resolve_gate(&item.track).await;

            if self.epoch != epoch {
                debug!(track = %item.track.id, "Discarding stale gate decision");
                return Ok(());
            }
            self.set_state(self.resume_state);

            match outcome {
                Ok(balance) => self.set_gate_status(GateStatus::granted(balance)),
                Err(err) => {
                    let status = match &err {
                        PlaybackError::GateDenied { required, actual } => {
                            GateStatus::denied(*required, *actual)
                        }
                        other => GateStatus::failed(other.to_string()),
                    };
                    info!(track = %item.track.id, error = %err, "Gated transition aborted");
                    self.set_gate_status(status);
                    return Err(err);
                }
            }
        }

        self.apply_transition(item, index, outgoing).await
    }

    /// Mark the pending-check state and return the epoch to match against
    fn begin_gate_check(&mut self) -> u64 {
        self.resume_state = self.state;
        self.set_state(PlaybackState::TransitionPending);
        self.set_gate_status(GateStatus::pending());
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch
    }

    /// Evaluate the track's rule for the configured identity
    ///
    /// No identity means automatic denial for any gated rule, without
    /// consulting the evaluator. Returns the granted balance on success.
    async fn resolve_gate(&self, track: &TrackDescriptor) -> Result<Option<u64>> {
        let required = track.gating.required_amount().unwrap_or(1);

        let Some(identity) = self.identity.clone() else {
            return Err(PlaybackError::GateDenied { required, actual: 0 });
        };

        let decision = gate::evaluate(self.evaluator.as_ref(), &identity, &track.gating).await?;
        if decision.has_access {
            Ok(decision.balance)
        } else {
            Err(PlaybackError::GateDenied {
                required,
                actual: decision.balance.unwrap_or(0),
            })
        }
    }

    /// Commit a transition whose gate (if any) has resolved
    ///
    /// Order matters: the outgoing session closes, then the source swaps,
    /// then history/telemetry/current/index update, then the analyzer
    /// rebinds, and the start report goes out last.
    async fn apply_transition(
        &mut self,
        item: QueueItem,
        index: usize,
        outgoing: Outgoing,
    ) -> Result<()> {
        if matches!(outgoing, Outgoing::Abandon) {
            self.telemetry.finalize(false).await;
        }

        if let Err(err) = self.output.set_source(&item.track) {
            warn!(track = %item.track.id, error = %err, "Source unplayable at load, advancing");
            return self.advance_past_unplayable(index).await;
        }

        let previous_track_id = self.current.as_ref().map(|c| c.track.id.clone());
        if let Some(outgoing_item) = self.current.take() {
            self.history.push(outgoing_item);
        }

        self.telemetry.reset();
        self.queue.set_index(Some(index));
        self.current = Some(item.clone());
        self.set_state(PlaybackState::Playing);
        self.output.set_playing(true);

        if let Some(tap) = self.output.tap() {
            self.sampler.bind(tap).await;
        }

        self.events.emit(PlaybackEvent::TrackChanged {
            track_id: item.track.id.clone(),
            previous_track_id,
        });
        info!(track = %item.track.id, index, "Now playing");

        self.telemetry
            .start(self.identity.as_ref(), &item.track.id, &self.source_tag)
            .await;
        Ok(())
    }

    /// Replay the current slot (repeat-one)
    async fn replay_current(&mut self) -> Result<()> {
        let Some(item) = self.current.clone() else {
            return Err(PlaybackError::QueueEmpty);
        };

        self.history.push(item.clone());
        self.telemetry.reset();
        self.output.restart();
        self.set_state(PlaybackState::Playing);
        self.output.set_playing(true);

        self.events.emit(PlaybackEvent::TrackChanged {
            track_id: item.track.id.clone(),
            previous_track_id: Some(item.track.id.clone()),
        });

        self.telemetry
            .start(self.identity.as_ref(), &item.track.id, &self.source_tag)
            .await;
        Ok(())
    }

    /// Scrub the current track back to its start, same play session
    fn restart_current(&mut self) -> Result<()> {
        let Some(item) = self.current.as_ref() else {
            return Err(PlaybackError::QueueEmpty);
        };

        self.telemetry.restart_clock();
        self.output.restart();
        self.events.emit(PlaybackEvent::TrackRestarted {
            track_id: item.track.id.clone(),
        });
        Ok(())
    }

    /// Toggle play/pause on the existing current track
    fn toggle_current(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing => {
                self.output.set_playing(false);
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Paused => {
                self.output.set_playing(true);
                self.set_state(PlaybackState::Playing);
            }
            PlaybackState::Ended => {
                // Resume after the queue ended: restart the last track
                self.telemetry.restart_clock();
                self.output.restart();
                self.output.set_playing(true);
                self.set_state(PlaybackState::Playing);
            }
            _ => {}
        }
        Ok(())
    }

    /// Skip forward past an unplayable slot, bounded by queue length
    async fn advance_past_unplayable(&mut self, failed_index: usize) -> Result<()> {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.queue.len().max(1) {
            self.enter_nothing_playable().await;
            return Ok(());
        }

        let next_index = if failed_index + 1 < self.queue.len() {
            failed_index + 1
        } else if self.settings.repeat() == RepeatMode::All && !self.queue.is_empty() {
            0
        } else {
            self.output.set_playing(false);
            self.set_state(PlaybackState::Ended);
            return Ok(());
        };

        // The outgoing session (if any) was already settled before the
        // failed load; nothing further to finalize here.
        Box::pin(self.transition_to(next_index, Outgoing::Settled)).await
    }

    /// Every queue item failed consecutively: stop and surface it
    async fn enter_nothing_playable(&mut self) {
        warn!("Every queue item failed consecutively, stopping playback");
        self.current = None;
        self.queue.set_index(None);
        self.output.set_playing(false);
        self.sampler.unbind().await;
        self.set_state(PlaybackState::Empty);
        self.events.emit(PlaybackEvent::Error {
            message: "nothing playable".to_string(),
        });
    }

    // ===== Event helpers =====

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.events.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn set_gate_status(&mut self, status: GateStatus) {
        if self.gate_status != status {
            self.gate_status = status.clone();
            self.events.emit(PlaybackEvent::GateStatusChanged { status });
        }
    }

    fn emit_queue_changed(&mut self) {
        self.events.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit_settings_changed(&mut self) {
        self.events.emit(PlaybackEvent::SettingsChanged {
            settings: self.settings.settings(),
        });
    }
}
