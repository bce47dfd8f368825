//! Error types for the page cache.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the buffer pool and its collaborators.
///
/// Every failure is reported once, synchronously, to the immediate caller.
/// None of them leave the pool in a modified state.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the disk collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every frame is pinned, or the replacer has no evictable frame.
    ///
    /// Not fatal: the caller may retry once other pages are unpinned.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// The sentinel page ID was passed where a real page is required.
    #[error("Invalid page ID: {0}")]
    InvalidPageId(u32),

    /// The page is not currently held by any frame.
    #[error("Page {0} is not resident in the buffer pool")]
    PageNotResident(u32),

    /// Attempted to unpin a page whose pin count is already zero.
    ///
    /// This indicates a bug - unpinning should match pinning.
    #[error("Page {0} is not pinned")]
    PageNotPinned(u32),

    /// Attempted to delete a page that is still in use.
    #[error("Page {0} is pinned and cannot be deleted")]
    PagePinned(u32),
}
