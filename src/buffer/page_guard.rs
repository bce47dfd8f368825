//! RAII guards for page access.
//!
//! - [`PageReadGuard`] - Shared read access (multiple allowed)
//! - [`PageWriteGuard`] - Exclusive write access (marks the page dirty)
//!
//! Both guards release the page's data lock first and then unpin the page
//! when dropped. Unpinning takes the pool latch, and the pool takes data
//! locks while holding that latch, so the data lock must go first.

use std::ops::{Deref, DerefMut};

use log::error;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::Page;

use super::buffer_pool_manager::BufferPoolManager;

fn release(bpm: &BufferPoolManager, page_id: PageId, is_dirty: bool) {
    // A guard owns exactly one pin, so this only fails if someone unpinned
    // on its behalf.
    let result = bpm.unpin_page(page_id, is_dirty);
    if let Err(err) = &result {
        error!("page guard for {} failed to unpin: {}", page_id, err);
    }
    debug_assert!(result.is_ok(), "page guard unpin failed");
}

/// Guard for read-only page access.
///
/// Multiple `PageReadGuard`s can exist for the same page simultaneously.
///
/// # Example
/// ```
/// use pagecache::buffer::BufferPoolManager;
/// use pagecache::storage::MemoryDiskManager;
///
/// let bpm = BufferPoolManager::new(2, MemoryDiskManager::new());
/// let page_id = bpm.allocate_page();
///
/// let guard = bpm.fetch_page_read(page_id).unwrap();
/// assert_eq!(guard.as_slice()[0], 0);
/// drop(guard);
/// assert_eq!(bpm.pin_count(page_id), Some(0));
/// ```
pub struct PageReadGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    /// `None` only during drop.
    lock: Option<RwLockReadGuard<'a, Page>>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        page_id: PageId,
        lock: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            page_id,
            lock: Some(lock),
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Release the page now instead of at end of scope.
    pub fn drop_guard(self) {}
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        self.lock.as_deref().expect("read guard used after release")
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.take();
        release(self.bpm, self.page_id, false);
    }
}

/// Guard for exclusive write access to a page.
///
/// Only one `PageWriteGuard` can exist for a page at a time. The page is
/// marked dirty when the guard is dropped, whether or not it was modified.
///
/// # Example
/// ```
/// use pagecache::buffer::BufferPoolManager;
/// use pagecache::storage::MemoryDiskManager;
///
/// let bpm = BufferPoolManager::new(2, MemoryDiskManager::new());
///
/// let mut guard = bpm.new_page_guarded().unwrap();
/// let page_id = guard.page_id();
/// guard.as_mut_slice()[0] = 0xFF;
/// guard.drop_guard();
///
/// assert_eq!(bpm.is_dirty(page_id), Some(true));
/// ```
pub struct PageWriteGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    /// `None` only during drop.
    lock: Option<RwLockWriteGuard<'a, Page>>,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        page_id: PageId,
        lock: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            page_id,
            lock: Some(lock),
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Release the page now instead of at end of scope.
    pub fn drop_guard(self) {}
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        self.lock.as_deref().expect("write guard used after release")
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        self.lock
            .as_deref_mut()
            .expect("write guard used after release")
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.take();
        release(self.bpm, self.page_id, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDiskManager;

    #[test]
    fn test_read_guard_unpins_on_drop() {
        let bpm = BufferPoolManager::new(2, MemoryDiskManager::new());
        let page_id = bpm.allocate_page();

        {
            let _a = bpm.fetch_page_read(page_id).unwrap();
            let _b = bpm.fetch_page_read(page_id).unwrap();
            assert_eq!(bpm.pin_count(page_id), Some(2));
        }

        assert_eq!(bpm.pin_count(page_id), Some(0));
        assert_eq!(bpm.is_dirty(page_id), Some(false));
    }

    #[test]
    fn test_write_guard_marks_dirty() {
        let bpm = BufferPoolManager::new(2, MemoryDiskManager::new());
        let page_id = bpm.allocate_page();

        let mut guard = bpm.fetch_page_write(page_id).unwrap();
        guard.as_mut_slice()[7] = 7;
        guard.drop_guard();

        assert_eq!(bpm.pin_count(page_id), Some(0));
        assert_eq!(bpm.is_dirty(page_id), Some(true));

        let guard = bpm.fetch_page_read(page_id).unwrap();
        assert_eq!(guard.as_slice()[7], 7);
    }

    #[test]
    fn test_guarded_page_survives_eviction() {
        let disk = MemoryDiskManager::new();
        let bpm = BufferPoolManager::new(1, disk.clone());

        let mut guard = bpm.new_page_guarded().unwrap();
        let page_id = guard.page_id();
        guard.as_mut_slice()[0] = 0x5A;
        drop(guard);

        // Evicts the first page, writing it back.
        bpm.new_page_guarded().unwrap().drop_guard();
        assert_eq!(disk.write_count(page_id), 1);

        let guard = bpm.fetch_page_read(page_id).unwrap();
        assert_eq!(guard.as_slice()[0], 0x5A);
    }
}
