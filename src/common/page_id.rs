//! Page identifier type.

use std::fmt;

use crate::common::config::PAGE_SIZE;

/// Identifies a page on disk.
///
/// A `u32` addresses 2^32 - 1 pages; the top value is reserved for
/// [`PageId::INVALID`], the "no page" marker carried by empty frames.
///
/// # Example
/// ```
/// use pagecache::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.byte_offset(), 42 * 4096);
/// assert!(!PageId::default().is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel meaning "no page".
    pub const INVALID: PageId = PageId(u32::MAX);

    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is a real page (not the sentinel).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Byte offset of this page in a single-file database.
    #[inline]
    pub fn byte_offset(&self) -> u64 {
        self.0 as u64 * PAGE_SIZE as u64
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<u32> for PageId {
    fn from(id: u32) -> Self {
        PageId(id)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Page({})", self.0)
        } else {
            write!(f, "Page(INVALID)")
        }
    }
}
