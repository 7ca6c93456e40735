//! Play-telemetry glue
//!
//! Owns the [`PlayRecord`] lifecycle: a session opens at track start, gets
//! a periodic report every 30 elapsed seconds, and closes with exactly one
//! terminal report at end/skip/failure. Reporter failures are logged and
//! dropped - playback never blocks on telemetry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use verse_core::traits::PlayTelemetryReporter;
use verse_core::types::{Identity, PlayId, TrackId};

/// Cadence of periodic duration reports
pub const PERIODIC_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// State of the current play session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayRecord {
    /// Session handle from the telemetry backend; None until a start report
    /// succeeds, and again after the terminal report
    pub play_id: Option<PlayId>,

    /// Listening time accumulated on the current track
    pub elapsed: Duration,

    /// Whether the terminal report marked a natural completion
    pub completed: bool,
}

/// Tracks one play session at a time against the external reporter
pub(crate) struct TelemetryTracker {
    reporter: Arc<dyn PlayTelemetryReporter>,
    record: PlayRecord,
    last_periodic: Duration,
}

impl TelemetryTracker {
    pub(crate) fn new(reporter: Arc<dyn PlayTelemetryReporter>) -> Self {
        Self {
            reporter,
            record: PlayRecord::default(),
            last_periodic: Duration::ZERO,
        }
    }

    /// Current session state
    pub(crate) fn record(&self) -> &PlayRecord {
        &self.record
    }

    /// Listening time on the current track
    pub(crate) fn position(&self) -> Duration {
        self.record.elapsed
    }

    /// Drop any session state without reporting
    ///
    /// Runs at every transition: `play_id` goes back to None and the
    /// elapsed timer restarts.
    pub(crate) fn reset(&mut self) {
        self.record = PlayRecord::default();
        self.last_periodic = Duration::ZERO;
    }

    /// Restart the elapsed timer within the same session (scrub to start)
    pub(crate) fn restart_clock(&mut self) {
        self.record.elapsed = Duration::ZERO;
        self.last_periodic = Duration::ZERO;
    }

    /// Open a session for a freshly started track
    ///
    /// A failed start report leaves `play_id` as None; later reports for
    /// this track are then skipped entirely.
    pub(crate) async fn start(
        &mut self,
        identity: Option<&Identity>,
        track_id: &TrackId,
        source_tag: &str,
    ) {
        self.reset();
        match self.reporter.report_start(identity, track_id, source_tag).await {
            Ok(play_id) => {
                debug!(track = %track_id, play = %play_id, "Play session opened");
                self.record.play_id = Some(play_id);
            }
            Err(err) => {
                warn!(track = %track_id, error = %err, "Telemetry start failed, dropping session");
            }
        }
    }

    /// Accumulate listening time; true when a periodic report is due
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.record.elapsed += dt;
        if self.record.elapsed - self.last_periodic >= PERIODIC_REPORT_INTERVAL {
            self.last_periodic = self.record.elapsed;
            return true;
        }
        false
    }

    /// Fire-and-forget periodic report for the open session
    pub(crate) fn spawn_periodic(&self) {
        let Some(play_id) = self.record.play_id.clone() else {
            return;
        };
        let reporter = Arc::clone(&self.reporter);
        let elapsed = self.record.elapsed;
        tokio::spawn(async move {
            if let Err(err) = reporter.report_progress(&play_id, elapsed, false).await {
                warn!(play = %play_id, error = %err, "Periodic telemetry report dropped");
            }
        });
    }

    /// Close the session with a terminal report
    ///
    /// Idempotent: the session handle is consumed, so a second call is a
    /// no-op and per-track report ordering stays strictly monotonic.
    pub(crate) async fn finalize(&mut self, completed: bool) {
        let Some(play_id) = self.record.play_id.take() else {
            return;
        };
        self.record.completed = completed;
        if let Err(err) = self
            .reporter
            .report_progress(&play_id, self.record.elapsed, completed)
            .await
        {
            warn!(play = %play_id, error = %err, "Terminal telemetry report dropped");
        }
    }

    /// Close the session for an unplayable track: zero duration, not completed
    pub(crate) async fn finalize_failed(&mut self) {
        let Some(play_id) = self.record.play_id.take() else {
            return;
        };
        self.record.completed = false;
        if let Err(err) = self
            .reporter
            .report_progress(&play_id, Duration::ZERO, false)
            .await
        {
            warn!(play = %play_id, error = %err, "Failure telemetry report dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        starts: Mutex<Vec<TrackId>>,
        reports: Mutex<Vec<(PlayId, Duration, bool)>>,
        fail_start: bool,
    }

    #[async_trait]
    impl PlayTelemetryReporter for RecordingReporter {
        async fn report_start(
            &self,
            _identity: Option<&Identity>,
            track_id: &TrackId,
            _source_tag: &str,
        ) -> verse_core::Result<PlayId> {
            if self.fail_start {
                return Err(verse_core::CoreError::Telemetry("down".to_string()));
            }
            self.starts.lock().unwrap().push(track_id.clone());
            Ok(PlayId::generate())
        }

        async fn report_progress(
            &self,
            play_id: &PlayId,
            elapsed: Duration,
            completed: bool,
        ) -> verse_core::Result<()> {
            self.reports
                .lock()
                .unwrap()
                .push((play_id.clone(), elapsed, completed));
            Ok(())
        }
    }

    #[tokio::test]
    async fn start_opens_session() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = TelemetryTracker::new(reporter.clone());

        tracker.start(None, &TrackId::new("t1"), "queue").await;
        assert!(tracker.record().play_id.is_some());
        assert_eq!(reporter.starts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_start_drops_the_session() {
        let reporter = Arc::new(RecordingReporter {
            fail_start: true,
            ..Default::default()
        });
        let mut tracker = TelemetryTracker::new(reporter.clone());

        tracker.start(None, &TrackId::new("t1"), "queue").await;
        assert!(tracker.record().play_id.is_none());

        // Finalize on a dropped session reports nothing
        tracker.finalize(true).await;
        assert!(reporter.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn advance_signals_thirty_second_boundaries() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = TelemetryTracker::new(reporter);
        tracker.start(None, &TrackId::new("t1"), "queue").await;

        assert!(!tracker.advance(Duration::from_secs(10)));
        assert!(!tracker.advance(Duration::from_secs(10)));
        assert!(tracker.advance(Duration::from_secs(10)));
        assert!(!tracker.advance(Duration::from_secs(29)));
        assert!(tracker.advance(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn finalize_reports_once() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = TelemetryTracker::new(reporter.clone());
        tracker.start(None, &TrackId::new("t1"), "queue").await;
        tracker.advance(Duration::from_secs(42));

        tracker.finalize(true).await;
        tracker.finalize(true).await;

        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].1, Duration::from_secs(42));
        assert!(reports[0].2);
    }

    #[tokio::test]
    async fn failure_finalize_reports_zero_duration() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = TelemetryTracker::new(reporter.clone());
        tracker.start(None, &TrackId::new("t1"), "queue").await;
        tracker.advance(Duration::from_secs(5));

        tracker.finalize_failed().await;

        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].1, Duration::ZERO);
        assert!(!reports[0].2);
    }

    #[tokio::test]
    async fn periodic_report_is_fire_and_forget() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = TelemetryTracker::new(reporter.clone());
        tracker.start(None, &TrackId::new("t1"), "queue").await;
        tracker.advance(Duration::from_secs(30));

        tracker.spawn_periodic();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].2);
    }

    #[tokio::test]
    async fn scrub_restarts_the_clock_but_keeps_the_session() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut tracker = TelemetryTracker::new(reporter.clone());
        tracker.start(None, &TrackId::new("t1"), "queue").await;
        tracker.advance(Duration::from_secs(20));

        let session = tracker.record().play_id.clone();
        tracker.restart_clock();
        assert_eq!(tracker.position(), Duration::ZERO);
        assert_eq!(tracker.record().play_id, session);
    }
}
