//! Buffer pool management.
//!
//! The buffer pool caches a fixed number of disk pages in memory frames and
//! decides which page to give up when a new one is needed.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache itself
//! - [`Frame`] - A slot holding one page plus pin and dirty metadata
//! - [`PageReadGuard`] / [`PageWriteGuard`] - RAII guards that unpin on drop
//! - [`BufferPoolStats`] - Hit, miss, eviction and I/O counters
//! - [`replacer`] - Eviction policies behind the [`replacer::Replacer`] trait
//!
//! Lock order is frame data, then pool latch, then page table. The pool
//! only locks frame data under its latch for unpinned frames, so a thread
//! holding a guard may call back into the pool.

mod buffer_pool_manager;
mod frame;
mod page_guard;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use frame::Frame;
pub use page_guard::{PageReadGuard, PageWriteGuard};
pub use stats::{BufferPoolStats, StatsSnapshot};
