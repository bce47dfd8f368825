//! LRU-K replacement policy.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::buffer::replacer::Replacer;
use crate::common::FrameId;

/// Access history of one tracked frame.
#[derive(Debug)]
struct LruKNode {
    /// Logical timestamps of the most recent accesses, oldest first, at most k.
    history: VecDeque<u64>,
    is_evictable: bool,
}

/// Evicts the frame whose backward k-distance is largest.
///
/// Backward k-distance is the time since a frame's k-th most recent access.
/// A frame seen fewer than k times has infinite distance; among those, the
/// one whose earliest recorded access is oldest goes first.
///
/// Time is a logical clock advanced by each `record_access`, so ranking is
/// deterministic.
#[derive(Debug)]
pub struct LruKReplacer {
    nodes: HashMap<FrameId, LruKNode>,
    current_timestamp: u64,
    /// Number of evictable frames.
    curr_size: usize,
    /// Frame ids must lie in `0..num_frames`.
    num_frames: usize,
    k: usize,
}

impl LruKReplacer {
    /// Create a replacer for frames `0..num_frames` with history depth `k`.
    ///
    /// # Panics
    /// Panics if `k` is 0.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "k must be > 0");
        debug!("LruKReplacer with {} frames, k = {}", num_frames, k);
        Self {
            nodes: HashMap::with_capacity(num_frames),
            current_timestamp: 0,
            curr_size: 0,
            num_frames,
            k,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn check_frame(&self, frame_id: FrameId) {
        assert!(
            frame_id.index() < self.num_frames,
            "{} out of range for replacer of {} frames",
            frame_id,
            self.num_frames
        );
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        self.check_frame(frame_id);
        let now = self.current_timestamp;
        self.current_timestamp += 1;

        let node = self.nodes.entry(frame_id).or_insert_with(|| LruKNode {
            history: VecDeque::with_capacity(self.k),
            is_evictable: false,
        });
        if node.history.len() == self.k {
            node.history.pop_front();
        }
        node.history.push_back(now);
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.check_frame(frame_id);
        let Some(node) = self.nodes.get_mut(&frame_id) else {
            return;
        };
        match (node.is_evictable, evictable) {
            (false, true) => self.curr_size += 1,
            (true, false) => self.curr_size -= 1,
            _ => {}
        }
        node.is_evictable = evictable;
    }

    fn evict(&mut self) -> Option<FrameId> {
        // Frames short of k accesses sort first; within each class the
        // smallest oldest-kept timestamp has the largest distance.
        let victim = self
            .nodes
            .iter()
            .filter(|(_, node)| node.is_evictable)
            .min_by_key(|(_, node)| (node.history.len() >= self.k, node.history.front().copied()))
            .map(|(&frame_id, _)| frame_id)?;

        self.nodes.remove(&victim);
        self.curr_size -= 1;
        debug!("LRU-K chose {} as victim", victim);
        Some(victim)
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(node) = self.nodes.remove(&frame_id) {
            if node.is_evictable {
                self.curr_size -= 1;
            }
        }
    }

    fn size(&self) -> usize {
        self.curr_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: usize) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn test_sample() {
        let mut replacer = LruKReplacer::new(7, 2);

        for i in 1..=6 {
            replacer.record_access(fid(i));
        }
        for i in 1..=5 {
            replacer.set_evictable(fid(i), true);
        }
        replacer.set_evictable(fid(6), false);
        assert_eq!(replacer.size(), 5);

        // Frame 1 now has two accesses; every other frame has +inf distance.
        replacer.record_access(fid(1));

        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.evict(), Some(fid(4)));
        assert_eq!(replacer.size(), 2);

        replacer.record_access(fid(3));
        replacer.record_access(fid(4));
        replacer.record_access(fid(5));
        replacer.record_access(fid(4));
        replacer.set_evictable(fid(3), true);
        replacer.set_evictable(fid(4), true);
        assert_eq!(replacer.size(), 4);

        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.size(), 3);

        replacer.set_evictable(fid(6), true);
        assert_eq!(replacer.size(), 4);
        assert_eq!(replacer.evict(), Some(fid(6)));
        assert_eq!(replacer.size(), 3);

        replacer.set_evictable(fid(1), false);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(fid(5)));
        assert_eq!(replacer.size(), 1);

        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(fid(4)));

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_set_evictable_is_idempotent() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(0));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(0), true);
        assert_eq!(replacer.size(), 1);
        replacer.set_evictable(fid(0), false);
        replacer.set_evictable(fid(0), false);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_remove_forgets_history() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.record_access(fid(0));
        replacer.record_access(fid(0));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        replacer.remove(fid(1));
        assert_eq!(replacer.size(), 1);

        // Re-tracked with a single access, frame 1 now outranks frame 0.
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    fn test_unknown_frame_is_ignored() {
        let mut replacer = LruKReplacer::new(4, 2);
        replacer.set_evictable(fid(3), true);
        replacer.remove(fid(2));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_frame_out_of_range_panics() {
        let mut replacer = LruKReplacer::new(2, 2);
        replacer.record_access(fid(2));
    }
}
