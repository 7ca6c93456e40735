//! Display-cadence sampling task
//!
//! Drives a [`SpectrumAnalyzer`] at ~60 Hz and publishes each frame over a
//! watch channel. The loop is an explicit cancellable cooperative task: it
//! runs only while a consumer is active, and environments with a real
//! display-refresh callback can substitute their own driver and call
//! [`SpectrumAnalyzer::sample`] directly.

use crate::analyzer::{AudioTap, FrequencyData, SpectrumAnalyzer, TapId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Sampling cadence (~60 frames per second)
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Owns the analyzer and the sampling loop
///
/// The sampler is the single writer of the frequency stream. Consumers
/// subscribe for a `watch::Receiver` and always observe the latest frame;
/// there is no backlog to drain and no history retained.
pub struct SpectrumSampler {
    analyzer: Arc<Mutex<SpectrumAnalyzer>>,
    tx: watch::Sender<FrequencyData>,
    task: Option<JoinHandle<()>>,
}

impl SpectrumSampler {
    /// Create a sampler around an analyzer
    pub fn new(analyzer: SpectrumAnalyzer) -> Self {
        let (tx, _rx) = watch::channel(FrequencyData::default());
        Self {
            analyzer: Arc::new(Mutex::new(analyzer)),
            tx,
            task: None,
        }
    }

    /// Subscribe to the frequency stream
    ///
    /// The receiver holds the latest frame at all times; all-zero frames are
    /// a valid steady state (nothing bound, or silence).
    pub fn subscribe(&self) -> watch::Receiver<FrequencyData> {
        self.tx.subscribe()
    }

    /// Bind the analyzer to an audio source
    ///
    /// Rebinding the currently bound source is a no-op; returns whether a
    /// rebind occurred. Safe to call while the loop is running - the next
    /// frame picks up the new source.
    pub async fn bind(&self, tap: Arc<dyn AudioTap>) -> bool {
        self.analyzer.lock().await.bind(tap)
    }

    /// Unbind the current source and publish one zero frame
    pub async fn unbind(&self) {
        self.analyzer.lock().await.unbind();
        self.tx.send_replace(FrequencyData::default());
    }

    /// Identity of the currently bound source, if any
    pub async fn bound_id(&self) -> Option<TapId> {
        self.analyzer.lock().await.bound_id()
    }

    /// Start the sampling loop
    ///
    /// A no-op if the loop is already running: the task is never redundantly
    /// restarted for an unchanged source.
    pub fn start(&mut self) {
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        debug!("Starting spectrum sampling loop");
        let analyzer = Arc::clone(&self.analyzer);
        let tx = self.tx.clone();

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                // Stop cooperating once every consumer is gone
                if tx.receiver_count() == 0 {
                    debug!("No frequency consumers left, stopping sampling loop");
                    break;
                }

                let frame = analyzer.lock().await.sample();
                tx.send_replace(frame);
            }
        }));
    }

    /// Cancel the sampling loop and publish a final zero frame
    ///
    /// Call when no visualization consumer is active; `start` brings the
    /// loop back later.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Stopping spectrum sampling loop");
            task.abort();
        }
        self.tx.send_replace(FrequencyData::default());
    }

    /// Whether the sampling loop is currently running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SpectrumSampler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
