//! Ordered playback queue
//!
//! Owns the item list, the playback cursor, and the pre-shuffle order.
//! Slot identity (`QueueItemId`) is what everything keys on: a track may
//! occupy several slots at once, so relocation after un-shuffling is done
//! by queue-id lookup, never by track equality.

use crate::error::{PlaybackError, Result};
use crate::shuffle;
use crate::types::{QueueItem, QueueItemId};
use verse_core::types::TrackDescriptor;

/// Ordered queue with cursor and restorable original order
///
/// Invariant: `index` is `None` or a valid position in `items`.
/// `original` preserves insertion order while the visible list is shuffled,
/// so disabling shuffle is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<QueueItem>,
    index: Option<usize>,
    original: Vec<QueueItem>,
    shuffled: bool,
}

impl Queue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue with fresh slots for the given tracks
    pub fn replace_tracks(&mut self, tracks: Vec<TrackDescriptor>) {
        self.items = tracks.into_iter().map(QueueItem::new).collect();
        self.original = self.items.clone();
        self.index = None;
        self.shuffled = false;
    }

    /// All slots in play order
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// Current cursor position
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Move the cursor
    ///
    /// The invariant holds by construction everywhere this is called; the
    /// debug assertion catches regressions.
    pub fn set_index(&mut self, index: Option<usize>) {
        debug_assert!(index.is_none() || index.is_some_and(|i| i < self.items.len()));
        self.index = index;
    }

    /// Slot under the cursor
    pub fn current(&self) -> Option<&QueueItem> {
        self.index.and_then(|i| self.items.get(i))
    }

    /// Slot at a position
    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    /// Position of a slot by its identity
    pub fn position_of(&self, queue_id: QueueItemId) -> Option<usize> {
        self.items.iter().position(|item| item.queue_id == queue_id)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue has no slots
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the visible order is currently shuffled
    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Drop every slot and reset the cursor
    pub fn clear(&mut self) {
        self.items.clear();
        self.original.clear();
        self.index = None;
        self.shuffled = false;
    }

    /// Append a track at the end of the queue
    pub fn push_end(&mut self, item: QueueItem) {
        self.original.push(item.clone());
        self.items.push(item);
    }

    /// Insert a track right after the cursor (or at the front of an idle queue)
    pub fn insert_next(&mut self, item: QueueItem) {
        let pos = self.index.map_or(0, |i| i + 1);
        self.items.insert(pos.min(self.items.len()), item.clone());
        if self.shuffled {
            // Insertion order for un-shuffling is "when it was enqueued"
            self.original.push(item);
        } else {
            self.original = self.items.clone();
        }
    }

    /// Remove the slot at `index`
    ///
    /// The cursor shifts left when a preceding slot is removed. Removing the
    /// slot under the cursor moves the cursor to its predecessor (None at
    /// the head) so that a subsequent `next()` lands on the slot that
    /// followed the removed one; the audible item itself lives on as the
    /// engine's detached current.
    pub fn remove(&mut self, index: usize) -> Option<QueueItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.original.retain(|item| item.queue_id != removed.queue_id);

        self.index = match self.index {
            Some(idx) if index < idx => Some(idx - 1),
            Some(idx) if index == idx => idx.checked_sub(1),
            other => other,
        };

        Some(removed)
    }

    /// Move the slot at `from` to position `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.items.len();
        if from >= len {
            return Err(PlaybackError::IndexOutOfBounds(from));
        }
        if to >= len {
            return Err(PlaybackError::IndexOutOfBounds(to));
        }
        if from == to {
            return Ok(());
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(mut idx) = self.index {
            if idx == from {
                idx = to;
            } else {
                if from < idx {
                    idx -= 1;
                }
                if to <= idx {
                    idx += 1;
                }
            }
            self.index = Some(idx);
        }

        if !self.shuffled {
            self.original = self.items.clone();
        }
        Ok(())
    }

    /// Shuffle the upcoming slice (`index+1..end`)
    ///
    /// History and the current slot are untouched. With no cursor the whole
    /// queue counts as upcoming.
    pub fn shuffle_upcoming(&mut self) {
        let start = self.index.map_or(0, |i| i + 1);
        if start < self.items.len() {
            shuffle::shuffle_items(&mut self.items[start..]);
        }
        self.shuffled = true;
    }

    /// Arrange a freshly replaced queue for shuffled playback from `start`
    ///
    /// The chosen slot moves to the front and the remainder is shuffled;
    /// `original` keeps the caller's insertion order.
    pub fn shuffle_for_start(&mut self, start: usize) {
        if start < self.items.len() {
            self.items.swap(0, start);
        }
        shuffle::shuffle_keep_first(&mut self.items);
        self.shuffled = true;
    }

    /// Restore the pre-shuffle order
    ///
    /// The cursor is relocated by queue-id lookup of the given slot (the
    /// engine passes the currently playing slot), never by track equality.
    pub fn restore_original(&mut self, current: Option<QueueItemId>) {
        self.items = self.original.clone();
        self.shuffled = false;
        self.index = current.and_then(|id| self.position_of(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(n: usize) -> Vec<TrackDescriptor> {
        (0..n)
            .map(|i| TrackDescriptor::new(format!("t{i}"), format!("verse://t{i}")))
            .collect()
    }

    fn titles(queue: &Queue) -> Vec<&str> {
        queue.items().iter().map(|i| i.track.title.as_str()).collect()
    }

    #[test]
    fn replace_builds_fresh_slots() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(3));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.index(), None);
        assert!(!queue.is_shuffled());
        assert_eq!(titles(&queue), ["t0", "t1", "t2"]);
    }

    #[test]
    fn insert_next_lands_after_cursor() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(3));
        queue.set_index(Some(1));

        queue.insert_next(QueueItem::new(TrackDescriptor::new("x", "verse://x")));
        assert_eq!(titles(&queue), ["t0", "t1", "x", "t2"]);
        assert_eq!(queue.index(), Some(1));
    }

    #[test]
    fn insert_next_on_idle_queue_lands_first() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(2));

        queue.insert_next(QueueItem::new(TrackDescriptor::new("x", "verse://x")));
        assert_eq!(titles(&queue), ["x", "t0", "t1"]);
    }

    #[test]
    fn remove_before_cursor_shifts_it_left() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(3));
        queue.set_index(Some(2));

        let removed = queue.remove(0).unwrap();
        assert_eq!(removed.track.title, "t0");
        assert_eq!(queue.index(), Some(1));
        assert_eq!(queue.current().unwrap().track.title, "t2");
    }

    #[test]
    fn remove_after_cursor_leaves_it_alone() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(3));
        queue.set_index(Some(0));

        queue.remove(2).unwrap();
        assert_eq!(queue.index(), Some(0));
    }

    #[test]
    fn remove_at_cursor_moves_to_predecessor() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(3));
        queue.set_index(Some(1));

        queue.remove(1).unwrap();
        assert_eq!(queue.index(), Some(0));

        queue.set_index(Some(0));
        queue.remove(0).unwrap();
        assert_eq!(queue.index(), None);
    }

    #[test]
    fn remove_out_of_bounds_is_none() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(2));
        assert!(queue.remove(5).is_none());
    }

    #[test]
    fn reorder_moves_and_tracks_cursor() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(4));
        queue.set_index(Some(1));

        // Move the current slot itself
        queue.reorder(1, 3).unwrap();
        assert_eq!(queue.index(), Some(3));
        assert_eq!(queue.current().unwrap().track.title, "t1");

        // Move another slot across the cursor
        queue.reorder(0, 3).unwrap();
        assert_eq!(queue.current().unwrap().track.title, "t1");
    }

    #[test]
    fn reorder_rejects_out_of_bounds() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(2));
        assert!(queue.reorder(0, 5).is_err());
        assert!(queue.reorder(5, 0).is_err());
    }

    #[test]
    fn shuffle_upcoming_only_touches_the_tail() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(30));
        queue.set_index(Some(4));
        let head: Vec<_> = queue.items()[..5].iter().map(|i| i.queue_id).collect();

        queue.shuffle_upcoming();

        let head_after: Vec<_> = queue.items()[..5].iter().map(|i| i.queue_id).collect();
        assert_eq!(head, head_after);
        assert!(queue.is_shuffled());
    }

    #[test]
    fn unshuffle_restores_insertion_order_and_relocates_by_slot_id() {
        let mut queue = Queue::new();
        // Same track in two slots: relocation must use slot identity
        let track = TrackDescriptor::new("dup", "verse://dup");
        let mut all = tracks(10);
        all.insert(2, track.clone());
        all.insert(7, track);
        queue.replace_tracks(all);
        let insertion: Vec<_> = queue.items().iter().map(|i| i.queue_id).collect();

        // Play the *second* duplicate slot, then shuffle and unshuffle
        queue.set_index(Some(7));
        let playing = queue.current().unwrap().queue_id;
        queue.shuffle_upcoming();
        queue.restore_original(Some(playing));

        let restored: Vec<_> = queue.items().iter().map(|i| i.queue_id).collect();
        assert_eq!(insertion, restored);
        assert_eq!(queue.index(), Some(7));
        assert_eq!(queue.current().unwrap().queue_id, playing);
    }

    #[test]
    fn shuffle_for_start_pins_chosen_slot_first() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(10));
        let chosen = queue.get(6).unwrap().queue_id;

        queue.shuffle_for_start(6);

        assert_eq!(queue.items()[0].queue_id, chosen);
        assert_eq!(queue.len(), 10);
        // Insertion order survives for un-shuffling
        queue.restore_original(Some(chosen));
        assert_eq!(titles(&queue)[6], "t6");
    }

    #[test]
    fn additions_while_shuffled_unshuffle_to_the_end() {
        let mut queue = Queue::new();
        queue.replace_tracks(tracks(5));
        queue.set_index(Some(0));
        queue.shuffle_upcoming();

        let late = QueueItem::new(TrackDescriptor::new("late", "verse://late"));
        let late_id = late.queue_id;
        queue.insert_next(late);

        let playing = queue.get(0).map(|i| i.queue_id);
        queue.restore_original(playing);
        assert_eq!(queue.items().last().map(|i| i.queue_id), Some(late_id));
    }
}
