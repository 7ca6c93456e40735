//! Access-gate glue
//!
//! Wraps the external evaluator with the bound timeout and produces the
//! transient [`GateStatus`] snapshots the UI reads. A check is always
//! re-callable; the status is overwritten per check and never persisted.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use verse_core::traits::AccessGateEvaluator;
use verse_core::types::{AccessDecision, GatingRule, Identity};

/// Upper bound on a single gate evaluation
///
/// "Checking" must never be an indefinite state; expiry is treated as a
/// retryable failure.
pub const GATE_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Transient snapshot of the most recent gate check
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateStatus {
    /// A check is currently in flight
    pub checking: bool,

    /// Outcome of the last resolved check, if any
    pub has_access: Option<bool>,

    /// Human-readable failure/denial message
    pub error: Option<String>,

    /// Balance observed by the last check
    pub balance: Option<u64>,

    /// Balance the rule demanded (for required-vs-actual messaging)
    pub required: Option<u64>,
}

impl GateStatus {
    /// No check performed or a previous status cleared
    pub fn idle() -> Self {
        Self::default()
    }

    /// A check is in flight
    pub fn pending() -> Self {
        Self {
            checking: true,
            ..Self::default()
        }
    }

    /// Access granted
    pub fn granted(balance: Option<u64>) -> Self {
        Self {
            has_access: Some(true),
            balance,
            ..Self::default()
        }
    }

    /// Access denied, with required-vs-actual balances for messaging
    pub fn denied(required: u64, actual: u64) -> Self {
        Self {
            has_access: Some(false),
            error: Some(format!("requires {required}, have {actual}")),
            balance: Some(actual),
            required: Some(required),
            ..Self::default()
        }
    }

    /// The check itself failed (retryable)
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            has_access: Some(false),
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Run one bounded gate evaluation and normalize the outcome
///
/// * `Ok(decision)` - evaluated, grant or deny inside
/// * `Err(GateCheckFailed)` - evaluator error or timeout, retryable
pub(crate) async fn evaluate(
    evaluator: &dyn AccessGateEvaluator,
    identity: &Identity,
    rule: &GatingRule,
) -> Result<AccessDecision> {
    match tokio::time::timeout(GATE_CHECK_TIMEOUT, evaluator.evaluate(identity, rule)).await {
        Ok(Ok(decision)) => Ok(decision),
        Ok(Err(err)) => {
            warn!(%identity, error = %err, "Gate evaluation failed");
            Err(PlaybackError::GateCheckFailed {
                reason: err.to_string(),
                retryable: true,
            })
        }
        Err(_elapsed) => {
            warn!(%identity, timeout_secs = GATE_CHECK_TIMEOUT.as_secs(), "Gate evaluation timed out");
            Err(PlaybackError::GateCheckFailed {
                reason: "gate check timed out".to_string(),
                retryable: true,
            })
        }
    }
}
