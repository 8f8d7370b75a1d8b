//! Queue store
//!
//! Ordered, duplicate-free list of tracks plus a cursor. Shuffle and repeat
//! are policies read on top of the canonical order:
//!
//! ```text
//! order:       [A, B, C, D]      (never reordered by navigation)
//! cursor:           ^ 1
//! play_order:  [1, 3, 0, 2]      (only while shuffled, cursor pinned first)
//! ```

use crate::shuffle::{pinned_permutation, shuffle_rng};
use crate::track::{TrackDescriptor, TrackPatch};
use crate::types::RepeatMode;
use rand::rngs::StdRng;

/// Queue of tracks with selection cursor and derived shuffle order
#[derive(Debug, Clone)]
pub struct Queue {
    /// Canonical order, unique by id
    order: Vec<TrackDescriptor>,

    /// Index into `order`; `Some` whenever `order` is non-empty
    cursor: Option<usize>,

    /// Shuffle permutation of indices into `order`
    play_order: Option<Vec<usize>>,

    /// Position of the cursor inside `play_order`
    shuffle_pos: usize,

    rng: StdRng,
}

impl Queue {
    /// Create new empty queue
    ///
    /// `shuffle_seed` makes permutations reproducible.
    pub fn new(shuffle_seed: Option<u64>) -> Self {
        Self {
            order: Vec::new(),
            cursor: None,
            play_order: None,
            shuffle_pos: 0,
            rng: shuffle_rng(shuffle_seed),
        }
    }

    /// Append `track` unless a track with the same id is queued
    ///
    /// Returns `false` for duplicates. The first track inserted into an empty
    /// queue becomes the cursor.
    pub fn insert_if_absent(&mut self, track: TrackDescriptor) -> bool {
        if self.contains(&track.id) {
            return false;
        }

        self.order.push(track);
        if self.cursor.is_none() {
            self.cursor = Some(self.order.len() - 1);
        }

        // Track set changed: a stale permutation would skip the new entry
        if self.play_order.is_some() {
            self.regenerate_permutation();
        }
        true
    }

    /// Remove every track and unset the cursor
    pub fn clear(&mut self) {
        self.order.clear();
        self.cursor = None;
        if self.play_order.is_some() {
            self.play_order = Some(Vec::new());
        }
        self.shuffle_pos = 0;
    }

    /// Move the cursor to the track with `id`
    ///
    /// No-op returning `false` when the id is not queued.
    pub fn set_cursor_to_track(&mut self, id: &str) -> bool {
        let Some(index) = self.position_of(id) else {
            return false;
        };

        self.cursor = Some(index);
        if let Some(play_order) = &self.play_order {
            if let Some(pos) = play_order.iter().position(|&i| i == index) {
                self.shuffle_pos = pos;
            }
        }
        true
    }

    /// Queue `track` if absent and move the cursor to it
    ///
    /// A queued copy with the same id is replaced by `track`. While shuffled
    /// the permutation is rebuilt with `track` at its head so every other
    /// track is still ahead of it. Returns `true` when `track` was inserted.
    pub fn select(&mut self, track: TrackDescriptor) -> bool {
        let inserted = match self.position_of(&track.id) {
            Some(index) => {
                self.order[index] = track;
                self.cursor = Some(index);
                false
            }
            None => {
                self.order.push(track);
                self.cursor = Some(self.order.len() - 1);
                true
            }
        };

        if self.play_order.is_some() {
            self.regenerate_permutation();
        }
        inserted
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&TrackDescriptor> {
        self.cursor.and_then(|i| self.order.get(i))
    }

    /// Turn the shuffle permutation on or off
    ///
    /// Turning it on pins the cursor's track at the head of a fresh
    /// permutation. Turning it off drops the permutation; `order` was never
    /// touched so the original sequence is back as-is.
    pub fn set_shuffled(&mut self, shuffled: bool) {
        if shuffled {
            self.regenerate_permutation();
        } else {
            self.play_order = None;
            self.shuffle_pos = 0;
        }
    }

    /// Whether a shuffle permutation is active
    pub fn is_shuffled(&self) -> bool {
        self.play_order.is_some()
    }

    /// Advance under the given policy
    ///
    /// - `RepeatMode::One`: the cursor's track, cursor unchanged
    /// - shuffled: next entry of the permutation
    /// - otherwise: next entry of `order`
    ///
    /// Past the end, `RepeatMode::All` wraps to the first entry; otherwise
    /// `None` and the cursor stays where it was.
    pub fn next(&mut self, repeat: RepeatMode, shuffled: bool) -> Option<&TrackDescriptor> {
        self.step(repeat, shuffled, Direction::Forward)
    }

    /// Step back under the given policy
    ///
    /// Mirror of [`Queue::next`]; `RepeatMode::All` wraps to the last entry
    /// and `RepeatMode::One` still returns the cursor's track.
    pub fn previous(&mut self, repeat: RepeatMode, shuffled: bool) -> Option<&TrackDescriptor> {
        self.step(repeat, shuffled, Direction::Backward)
    }

    fn step(
        &mut self,
        repeat: RepeatMode,
        shuffled: bool,
        direction: Direction,
    ) -> Option<&TrackDescriptor> {
        let cursor = self.cursor?;

        if repeat == RepeatMode::One {
            return self.order.get(cursor);
        }

        if shuffled && self.play_order.is_none() {
            self.regenerate_permutation();
        }

        let len = self.order.len();
        let wrap = repeat == RepeatMode::All;

        if shuffled {
            let pos = advance(self.shuffle_pos, len, direction, wrap)?;
            let index = self.play_order.as_ref().and_then(|p| p.get(pos).copied())?;
            self.shuffle_pos = pos;
            self.cursor = Some(index);
        } else {
            let index = advance(cursor, len, direction, wrap)?;
            self.cursor = Some(index);
        }

        self.current()
    }

    /// Tracks after the cursor in effective play order
    pub fn upcoming(&self, shuffled: bool) -> Vec<&TrackDescriptor> {
        match (&self.play_order, shuffled) {
            (Some(play_order), true) => play_order
                .iter()
                .skip(self.shuffle_pos + 1)
                .filter_map(|&i| self.order.get(i))
                .collect(),
            _ => match self.cursor {
                Some(cursor) => self.order.iter().skip(cursor + 1).collect(),
                None => Vec::new(),
            },
        }
    }

    /// Merge `patch` into the queued copy of its track
    pub fn update_track(&mut self, patch: &TrackPatch) -> bool {
        match self.order.iter_mut().find(|t| t.id == patch.id) {
            Some(track) => {
                track.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Whether a track with `id` is queued
    pub fn contains(&self, id: &str) -> bool {
        self.order.iter().any(|t| t.id == id)
    }

    /// Index of the track with `id` in canonical order
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|t| t.id == id)
    }

    /// Track at `index` in canonical order
    pub fn get(&self, index: usize) -> Option<&TrackDescriptor> {
        self.order.get(index)
    }

    /// All tracks in canonical order
    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.order
    }

    /// Track ids in canonical order
    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(|t| t.id.as_str()).collect()
    }

    /// Current cursor index
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of queued tracks
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn regenerate_permutation(&mut self) {
        let permutation = pinned_permutation(self.order.len(), self.cursor, &mut self.rng);
        self.play_order = Some(permutation);
        self.shuffle_pos = 0;
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Next position in a sequence of `len`, wrapping when allowed
fn advance(pos: usize, len: usize, direction: Direction, wrap: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match direction {
        Direction::Forward if pos + 1 < len => Some(pos + 1),
        Direction::Forward if wrap => Some(0),
        Direction::Backward if pos > 0 => Some(pos - 1),
        Direction::Backward if wrap => Some(len - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: &str) -> TrackDescriptor {
        TrackDescriptor::new(id, format!("Track {}", id), format!("https://cdn.test/{}.mp3", id))
    }

    fn queue_of(ids: &[&str]) -> Queue {
        let mut queue = Queue::new(Some(42));
        for id in ids {
            queue.insert_if_absent(create_test_track(id));
        }
        queue
    }

    #[test]
    fn create_empty_queue() {
        let queue = Queue::default();
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), None);
        assert!(queue.current().is_none());
    }

    #[test]
    fn first_insert_sets_cursor() {
        let queue = queue_of(&["a", "b"]);
        assert_eq!(queue.cursor(), Some(0));
        assert_eq!(queue.current().unwrap().id, "a");
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut queue = queue_of(&["a", "b"]);
        let mut dup = create_test_track("a");
        dup.title = "Different title".to_string();

        assert!(!queue.insert_if_absent(dup));
        assert_eq!(queue.ids(), vec!["a", "b"]);
        assert_eq!(queue.get(0).unwrap().title, "Track a");
    }

    #[test]
    fn set_cursor_to_missing_track_is_noop() {
        let mut queue = queue_of(&["a", "b"]);
        assert!(queue.set_cursor_to_track("b"));
        assert!(!queue.set_cursor_to_track("zzz"));
        assert_eq!(queue.current().unwrap().id, "b");
    }

    #[test]
    fn next_advances_and_stops_at_end() {
        let mut queue = queue_of(&["a", "b", "c"]);

        assert_eq!(queue.next(RepeatMode::Off, false).unwrap().id, "b");
        assert_eq!(queue.next(RepeatMode::Off, false).unwrap().id, "c");
        assert!(queue.next(RepeatMode::Off, false).is_none());
        // Cursor stays on the last track
        assert_eq!(queue.current().unwrap().id, "c");
    }

    #[test]
    fn next_wraps_with_repeat_all() {
        let mut queue = queue_of(&["a", "b", "c"]);

        let ids: Vec<String> = (0..3)
            .map(|_| queue.next(RepeatMode::All, false).unwrap().id.clone())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn repeat_one_holds_cursor() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_cursor_to_track("b");

        for _ in 0..3 {
            assert_eq!(queue.next(RepeatMode::One, false).unwrap().id, "b");
            assert_eq!(queue.previous(RepeatMode::One, true).unwrap().id, "b");
        }
        assert_eq!(queue.cursor(), Some(1));
    }

    #[test]
    fn previous_mirrors_next() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert!(queue.previous(RepeatMode::Off, false).is_none());
        assert_eq!(queue.previous(RepeatMode::All, false).unwrap().id, "c");
        assert_eq!(queue.previous(RepeatMode::Off, false).unwrap().id, "b");
    }

    #[test]
    fn shuffle_pins_current_track() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        queue.set_cursor_to_track("c");
        queue.set_shuffled(true);

        assert_eq!(queue.current().unwrap().id, "c");
        let upcoming = queue.upcoming(true);
        assert_eq!(upcoming.len(), 4);
        assert!(upcoming.iter().all(|t| t.id != "c"));
    }

    #[test]
    fn shuffled_walk_visits_every_track_once() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        queue.set_shuffled(true);

        let mut seen = vec![queue.current().unwrap().id.clone()];
        while let Some(track) = queue.next(RepeatMode::Off, true) {
            seen.push(track.id.clone());
        }
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn shuffle_off_restores_order() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        let before: Vec<String> = queue.ids().iter().map(|s| s.to_string()).collect();

        queue.set_shuffled(true);
        queue.next(RepeatMode::Off, true);
        queue.set_shuffled(false);

        let after: Vec<String> = queue.ids().iter().map(|s| s.to_string()).collect();
        assert_eq!(before, after);
        assert!(!queue.is_shuffled());
    }

    #[test]
    fn insert_while_shuffled_regenerates() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_shuffled(true);
        queue.next(RepeatMode::Off, true);
        let current = queue.current().unwrap().id.clone();

        queue.insert_if_absent(create_test_track("d"));

        assert_eq!(queue.current().unwrap().id, current);
        assert_eq!(queue.upcoming(true).len(), 3);
        assert!(queue.upcoming(true).iter().any(|t| t.id == "d"));
    }

    #[test]
    fn shuffled_wraps_to_head_of_permutation() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_shuffled(true);
        let head = queue.current().unwrap().id.clone();

        queue.next(RepeatMode::All, true);
        queue.next(RepeatMode::All, true);
        assert_eq!(queue.next(RepeatMode::All, true).unwrap().id, head);
    }

    #[test]
    fn select_new_track_while_shuffled_pins_it_first() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.set_shuffled(true);

        assert!(queue.select(create_test_track("e")));
        assert_eq!(queue.current().unwrap().id, "e");

        let mut upcoming: Vec<&str> = queue
            .upcoming(true)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        upcoming.sort();
        assert_eq!(upcoming, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn select_queued_track_replaces_copy() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let mut fresh = create_test_track("b");
        fresh.title = "Fresh title".to_string();

        assert!(!queue.select(fresh));
        assert_eq!(queue.ids(), vec!["a", "b", "c"]);
        assert_eq!(queue.cursor(), Some(1));
        assert_eq!(queue.get(1).unwrap().title, "Fresh title");
        assert_eq!(queue.upcoming(false)[0].id, "c");
    }

    #[test]
    fn clear_unsets_cursor() {
        let mut queue = queue_of(&["a", "b"]);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), None);
        assert!(queue.next(RepeatMode::All, false).is_none());
    }

    #[test]
    fn upcoming_in_canonical_order() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_cursor_to_track("b");
        let ids: Vec<&str> = queue.upcoming(false).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn update_track_merges_patch() {
        let mut queue = queue_of(&["a"]);
        assert!(queue.update_track(&TrackPatch::new("a").with_like_count(9)));
        assert!(!queue.update_track(&TrackPatch::new("zzz").with_like_count(1)));
        assert_eq!(queue.get(0).unwrap().like_count, Some(9));
    }
}
