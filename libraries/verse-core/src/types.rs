//! Core domain types for the Verse playback engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Track identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random track ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listener identity as known to the gate evaluator and telemetry backend
///
/// Opaque to the playback core; typically a wallet or account address.
/// Playback without an identity is allowed, but gated content is then
/// denied without consulting the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create a new identity from an address string
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get the inner address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle for one play session, issued by the telemetry backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayId(String);

impl PlayId {
    /// Create a play ID from a backend-issued token
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random play ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access policy attached to a track
///
/// Tagged so that invalid combinations (a token gate without a mint, an NFT
/// gate with a balance threshold) are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GatingRule {
    /// Freely playable
    #[default]
    None,

    /// Requires holding at least `min_amount` of the token at `mint`
    TokenGate {
        /// Token mint address
        mint: String,
        /// Minimum balance required to play
        min_amount: u64,
    },

    /// Requires owning any item from the collection
    NftGate {
        /// Collection address
        collection: String,
    },
}

impl GatingRule {
    /// Whether playing under this rule requires an entitlement check
    pub fn is_gated(&self) -> bool {
        !matches!(self, GatingRule::None)
    }

    /// The balance threshold this rule demands, if it has one
    pub fn required_amount(&self) -> Option<u64> {
        match self {
            GatingRule::TokenGate { min_amount, .. } => Some(*min_amount),
            GatingRule::NftGate { .. } => Some(1),
            GatingRule::None => None,
        }
    }
}

/// Immutable catalog unit
///
/// Owned by the content catalog; the playback core holds clones and never
/// mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Unique track identifier from the catalog
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Locator for the audio payload (URL or asset path)
    pub source_locator: String,

    /// Expected duration, when the catalog knows it
    pub duration_hint: Option<Duration>,

    /// Access policy for this track
    pub gating: GatingRule,
}

impl TrackDescriptor {
    /// Create an ungated track with a generated ID
    pub fn new(title: impl Into<String>, source_locator: impl Into<String>) -> Self {
        Self {
            id: TrackId::generate(),
            title: title.into(),
            source_locator: source_locator.into(),
            duration_hint: None,
            gating: GatingRule::None,
        }
    }
}

/// Outcome of a gate evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether the identity may play the track
    pub has_access: bool,

    /// Observed balance, when the rule involves one
    pub balance: Option<u64>,
}

impl AccessDecision {
    /// An unconditional grant (ungated content)
    pub fn granted() -> Self {
        Self {
            has_access: true,
            balance: None,
        }
    }

    /// A denial with the observed balance
    pub fn denied(balance: Option<u64>) -> Self {
        Self {
            has_access: false,
            balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_id_generation_creates_unique_ids() {
        let id1 = TrackId::generate();
        let id2 = TrackId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn track_id_from_string() {
        let id = TrackId::new("track-123");
        assert_eq!(id.as_str(), "track-123");
    }

    #[test]
    fn gating_rule_default_is_ungated() {
        assert!(!GatingRule::default().is_gated());
        assert_eq!(GatingRule::default().required_amount(), None);
    }

    #[test]
    fn token_gate_requires_min_amount() {
        let rule = GatingRule::TokenGate {
            mint: "VRSE111".to_string(),
            min_amount: 250,
        };
        assert!(rule.is_gated());
        assert_eq!(rule.required_amount(), Some(250));
    }

    #[test]
    fn nft_gate_requires_one_item() {
        let rule = GatingRule::NftGate {
            collection: "genesis".to_string(),
        };
        assert!(rule.is_gated());
        assert_eq!(rule.required_amount(), Some(1));
    }

    #[test]
    fn track_descriptor_roundtrips_through_serde() {
        let track = TrackDescriptor {
            id: TrackId::new("t1"),
            title: "Night Drive".to_string(),
            source_locator: "https://cdn.verse.fm/t/t1.mp3".to_string(),
            duration_hint: Some(Duration::from_secs(204)),
            gating: GatingRule::NftGate {
                collection: "genesis".to_string(),
            },
        };

        let json = serde_json::to_string(&track).unwrap();
        let back: TrackDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(track, back);
    }
}
