//! Collaborator contracts for the playback engine
//!
//! The playback core never talks to the chain, the analytics backend, or the
//! preference file directly. It goes through these traits, and the
//! application root injects concrete implementations at engine construction.

use crate::error::Result;
use crate::types::{AccessDecision, GatingRule, Identity, PlayId, TrackId};
use async_trait::async_trait;
use std::time::Duration;

/// Resolves whether an identity may play content under a gating rule
///
/// Implementations must be idempotent: the engine may re-evaluate the same
/// (identity, rule) pair at any time, and a denial can become a grant once
/// the listener acquires access.
///
/// The engine never calls this for [`GatingRule::None`], and resolves
/// "no identity" as an automatic denial without a call.
#[async_trait]
pub trait AccessGateEvaluator: Send + Sync {
    /// Evaluate the rule for the given identity
    ///
    /// # Returns
    /// * `Ok(decision)` - the rule was evaluated (grant or deny)
    /// * `Err(_)` - the evaluation itself failed (backend unreachable, ...)
    async fn evaluate(&self, identity: &Identity, rule: &GatingRule) -> Result<AccessDecision>;
}

/// Receives listening-duration reports
///
/// The engine reports at track start, every 30 elapsed seconds, and once
/// more at track end or skip. Failures are never allowed to affect
/// playback; the engine logs and drops them.
#[async_trait]
pub trait PlayTelemetryReporter: Send + Sync {
    /// Open a play session; the returned ID keys all subsequent reports
    async fn report_start(
        &self,
        identity: Option<&Identity>,
        track_id: &TrackId,
        source_tag: &str,
    ) -> Result<PlayId>;

    /// Report elapsed listening time for an open session
    ///
    /// `completed` is true only on the terminal report of a track that
    /// reached its natural end.
    async fn report_progress(
        &self,
        play_id: &PlayId,
        elapsed: Duration,
        completed: bool,
    ) -> Result<()>;
}

/// Synchronous storage for the three persisted playback preferences
///
/// Keys are scalar strings (`shuffle`, `repeat`, `crossfade`). A missing or
/// unparsable value falls back to the default; the store is written on
/// every settings change.
pub trait PreferenceStore: Send {
    /// Read a preference value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a preference value
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory preference store
///
/// Default store for tests and for applications that have not wired a
/// persistent backend yet.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: std::collections::HashMap<String, String>,
}

impl MemoryPreferenceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}
