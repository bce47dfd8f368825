//! Configuration constants and buffer pool settings.

/// Size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems, so a page maps onto a single
/// block-aligned disk write.
pub const PAGE_SIZE: usize = 4096;

/// Number of frames used when no explicit pool size is given.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// History depth for the LRU-K replacer.
pub const LRUK_REPLACER_K: usize = 10;

/// Bucket capacity of the page table's extendible hash index.
pub const DEFAULT_BUCKET_SIZE: usize = 4;

/// Tunables for a [`BufferPoolManager`](crate::buffer::BufferPoolManager).
///
/// # Example
/// ```
/// use pagecache::common::config::BufferPoolConfig;
///
/// let config = BufferPoolConfig::default().pool_size(16).replacer_k(2);
/// assert_eq!(config.pool_size, 16);
/// assert_eq!(config.replacer_k, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,
    /// `k` used by the default LRU-K replacer.
    pub replacer_k: usize,
    /// Bucket capacity of the page table.
    pub bucket_size: usize,
}

impl BufferPoolConfig {
    /// Set the number of frames.
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the LRU-K history depth.
    pub fn replacer_k(mut self, k: usize) -> Self {
        self.replacer_k = k;
        self
    }

    /// Set the page table's bucket capacity.
    pub fn bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            replacer_k: LRUK_REPLACER_K,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}
