//! Page-id allocation.

use crate::common::PageId;

/// Hands out page ids for new pages and takes back ids of deleted ones.
///
/// The buffer pool owns one allocator instance; nothing here is global, so
/// independent pools never share id sequences.
pub trait PageAllocator: Send {
    /// Return an id that has never been handed out before.
    fn allocate(&mut self) -> PageId;

    /// Release `page_id`. Implementations may reuse it but need not.
    fn deallocate(&mut self, page_id: PageId);
}

/// Counts upward from a starting id; released ids are never reused.
///
/// # Example
/// ```
/// use pagecache::storage::{MonotonicPageAllocator, PageAllocator};
/// use pagecache::PageId;
///
/// let mut alloc = MonotonicPageAllocator::new();
/// assert_eq!(alloc.allocate(), PageId::new(0));
/// alloc.deallocate(PageId::new(0));
/// assert_eq!(alloc.allocate(), PageId::new(1));
/// ```
#[derive(Debug, Default, Clone)]
pub struct MonotonicPageAllocator {
    next: u32,
}

impl MonotonicPageAllocator {
    /// Allocator whose first id is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `first`, e.g. to continue after the
    /// pages already present in a reopened file.
    pub fn starting_at(first: PageId) -> Self {
        Self { next: first.0 }
    }

    /// The id the next call to `allocate` will return.
    pub fn peek(&self) -> PageId {
        PageId(self.next)
    }
}

impl PageAllocator for MonotonicPageAllocator {
    fn allocate(&mut self) -> PageId {
        let page_id = PageId(self.next);
        assert!(page_id.is_valid(), "page id space exhausted");
        self.next += 1;
        page_id
    }

    fn deallocate(&mut self, _page_id: PageId) {}
}
