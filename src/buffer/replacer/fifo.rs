//! FIFO (First-In-First-Out) replacement policy.

use std::collections::{HashSet, VecDeque};

use crate::buffer::replacer::Replacer;
use crate::common::FrameId;

/// Evicts frames in the order they were first accessed.
///
/// Re-accessing a frame does not move it. Non-evictable frames keep their
/// place in the queue and are skipped during eviction.
#[derive(Debug, Default)]
pub struct FifoReplacer {
    /// Frame IDs in first-access order (front = oldest).
    queue: VecDeque<FrameId>,

    /// Frames that are currently evictable (pin_count == 0).
    evictable: HashSet<FrameId>,
}

impl FifoReplacer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Replacer for FifoReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        if !self.queue.contains(&frame_id) {
            self.queue.push_back(frame_id);
        }
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if evictable {
            if self.queue.contains(&frame_id) {
                self.evictable.insert(frame_id);
            }
        } else {
            self.evictable.remove(&frame_id);
        }
    }

    fn evict(&mut self) -> Option<FrameId> {
        let pos = self
            .queue
            .iter()
            .position(|frame_id| self.evictable.contains(frame_id))?;
        let frame_id = self.queue.remove(pos)?;
        self.evictable.remove(&frame_id);
        Some(frame_id)
    }

    fn remove(&mut self, frame_id: FrameId) {
        self.queue.retain(|&f| f != frame_id);
        self.evictable.remove(&frame_id);
    }

    fn size(&self) -> usize {
        self.evictable.len()
    }
}
