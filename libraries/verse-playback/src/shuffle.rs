//! Shuffle algorithms for queue randomization
//!
//! Plain Fisher-Yates throughout. The queue decides *which slice* gets
//! shuffled (never history, never the current slot); this module only
//! randomizes what it is handed.

use crate::types::QueueItem;
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Fisher-Yates shuffle of a slice of queue items
///
/// Each permutation is equally likely.
pub fn shuffle_items(items: &mut [QueueItem]) {
    let mut rng = thread_rng();
    items.shuffle(&mut rng);
}

/// Shuffle all items except the first
///
/// Used when starting a shuffled queue from a chosen track: the chosen item
/// stays first and only the remainder is randomized.
pub fn shuffle_keep_first(items: &mut [QueueItem]) {
    if items.len() > 2 {
        shuffle_items(&mut items[1..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use verse_core::types::TrackDescriptor;

    fn items(n: usize) -> Vec<QueueItem> {
        (0..n)
            .map(|i| QueueItem::new(TrackDescriptor::new(format!("t{i}"), format!("verse://t{i}"))))
            .collect()
    }

    #[test]
    fn shuffle_preserves_all_items() {
        let original = items(20);
        let mut shuffled = original.clone();
        shuffle_items(&mut shuffled);

        let before: HashSet<_> = original.iter().map(|i| i.queue_id).collect();
        let after: HashSet<_> = shuffled.iter().map(|i| i.queue_id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn shuffle_changes_order() {
        let original = items(20);
        let mut shuffled = original.clone();
        shuffle_items(&mut shuffled);

        // Probability of identity permutation on 20 items is negligible
        let same: Vec<_> = original.iter().map(|i| i.queue_id).collect();
        let now: Vec<_> = shuffled.iter().map(|i| i.queue_id).collect();
        assert_ne!(same, now);
    }

    #[test]
    fn keep_first_pins_the_first_item() {
        let original = items(20);
        let mut shuffled = original.clone();
        shuffle_keep_first(&mut shuffled);

        assert_eq!(shuffled[0].queue_id, original[0].queue_id);
    }

    #[test]
    fn tiny_slices_are_untouched() {
        let original = items(2);
        let mut shuffled = original.clone();
        shuffle_keep_first(&mut shuffled);

        let before: Vec<_> = original.iter().map(|i| i.queue_id).collect();
        let after: Vec<_> = shuffled.iter().map(|i| i.queue_id).collect();
        assert_eq!(before, after);
    }
}
