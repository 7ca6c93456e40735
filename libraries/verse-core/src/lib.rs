//! Verse Core
//!
//! Shared domain types and collaborator contracts for the Verse playback
//! engine.
//!
//! This crate defines:
//! - **Domain Types**: `TrackDescriptor`, `GatingRule`, `Identity`, id newtypes
//! - **Collaborator Contracts**: `AccessGateEvaluator`, `PlayTelemetryReporter`,
//!   `PreferenceStore`
//! - **Error Handling**: unified `CoreError` and `Result` types
//!
//! The playback engine (`verse-playback`) and the signal analyzer
//! (`verse-spectrum`) both build on these types. Implementations of the
//! contracts live with the application (RPC clients, analytics backends,
//! preference files) and are injected into the engine at construction.
//!
//! # Example
//!
//! ```rust
//! use verse_core::types::{GatingRule, TrackDescriptor, TrackId};
//!
//! let track = TrackDescriptor::new("Midnight Run", "https://cdn.verse.fm/t/abc.mp3");
//!
//! let gated = TrackDescriptor {
//!     gating: GatingRule::TokenGate {
//!         mint: "VRSE111".to_string(),
//!         min_amount: 100,
//!     },
//!     ..track
//! };
//! assert!(gated.gating.is_gated());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{AccessGateEvaluator, PlayTelemetryReporter, PreferenceStore};
pub use types::{AccessDecision, GatingRule, Identity, PlayId, TrackDescriptor, TrackId};
