//! Playback history tracking
//!
//! A bounded record of previously-played queue items. Distinct from queue
//! rewinding: `previous()` navigates by index, the history is what the UI
//! shows as "recently played".

use crate::types::QueueItem;
use std::collections::VecDeque;

/// Default maximum number of remembered items
pub const HISTORY_LIMIT: usize = 50;

/// Bounded playback history
///
/// A ring of recently played items; the oldest entry is discarded once the
/// cap is reached.
#[derive(Debug, Clone, Default)]
pub struct History {
    items: VecDeque<QueueItem>,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self {
            items: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Record a played item, dropping the oldest entry at the cap
    pub fn push(&mut self, item: QueueItem) {
        if self.items.len() >= HISTORY_LIMIT {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// All remembered items, oldest first
    pub fn items(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    /// Most recently played item
    pub fn last(&self) -> Option<&QueueItem> {
        self.items.back()
    }

    /// Number of remembered items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether anything has been played yet
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
