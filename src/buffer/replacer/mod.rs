//! Eviction policy implementations (replacers).
//!
//! The buffer pool talks to its policy only through [`Replacer`], so any
//! implementation can be plugged in at construction time:
//! - [`LruKReplacer`] - Backward k-distance ranking (the default)
//! - [`FifoReplacer`] - Evicts in order of first access

mod fifo;
mod lru_k;

pub use fifo::FifoReplacer;
pub use lru_k::LruKReplacer;

use crate::common::FrameId;

/// Picks which frame to reclaim when the pool has no free frame.
///
/// The pool marks a frame evictable only when its pin count is zero, so a
/// replacer never has to know about pins.
pub trait Replacer: Send {
    /// Note that `frame_id` was just accessed.
    fn record_access(&mut self, frame_id: FrameId);

    /// Mark whether `frame_id` may be chosen as a victim.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);

    /// Choose an evictable frame, forget it, and return it.
    ///
    /// Returns `None` if no frame is evictable.
    fn evict(&mut self) -> Option<FrameId>;

    /// Forget `frame_id` entirely, including its access history.
    fn remove(&mut self, frame_id: FrameId);

    /// Number of evictable frames.
    fn size(&self) -> usize;
}
