//! Buffer pool statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the buffer pool as it works.
///
/// Counters are bumped under the pool latch but read without it, so they
/// are plain relaxed atomics. Take a [`snapshot`](Self::snapshot) to read
/// them together.
///
/// # Example
/// ```
/// use pagecache::buffer::BufferPoolManager;
/// use pagecache::storage::MemoryDiskManager;
///
/// let bpm = BufferPoolManager::new(2, MemoryDiskManager::new());
/// let (page_id, _) = bpm.new_page().unwrap();
/// bpm.unpin_page(page_id, false).unwrap();
/// bpm.fetch_page(page_id).unwrap();
///
/// assert_eq!(bpm.stats().snapshot().cache_hits, 1);
/// ```
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    evictions: AtomicU64,
    pages_read: AtomicU64,
    pages_written: AtomicU64,
    pages_deleted: AtomicU64,
}

impl BufferPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_read(&self) {
        self.pages_read.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_write(&self) {
        self.pages_written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delete(&self) {
        self.pages_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
            pages_deleted: self.pages_deleted.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.evictions,
            &self.pages_read,
            &self.pages_written,
            &self.pages_deleted,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// A point-in-time copy of [`BufferPoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// `fetch_page` calls served from a resident frame.
    pub cache_hits: u64,
    /// `fetch_page` calls that had to go to disk.
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    /// Write-backs on eviction plus explicit flushes.
    pub pages_written: u64,
    pub pages_deleted: u64,
}

impl StatsSnapshot {
    /// Fraction of fetches served without I/O (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits: {}, misses: {}, evictions: {}, reads: {}, writes: {}, deletes: {}, hit_rate: {:.2}%",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.pages_deleted,
            self.hit_rate() * 100.0
        )
    }
}
