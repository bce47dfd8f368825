//! pagecache - a buffer pool manager backed by an extendible hash page table.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           pagecache                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Buffer Pool (buffer/)                       │   │
//! │  │   BufferPoolManager + Frame + PageGuards + Statistics    │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Eviction Policies: LRU-K | FIFO  (Replacer)    │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓                            ↓                  │
//! │  ┌───────────────────────────┐  ┌──────────────────────────┐   │
//! │  │   Containers (container/) │  │   Storage (storage/)     │   │
//! │  │   ExtendibleHashTable     │  │   DiskIo + DiskManager   │   │
//! │  │   (page table)            │  │   Page + PageAllocator   │   │
//! │  └───────────────────────────┘  └──────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config, logger)
//! - [`buffer`] - Buffer pool management and eviction policies
//! - [`container`] - The extendible hash table
//! - [`storage`] - Disk I/O, page buffers and page-id allocation
//!
//! # Quick Start
//! ```no_run
//! use pagecache::{BufferPoolManager, DiskManager};
//!
//! let disk = DiskManager::open_or_create("my_database.db").unwrap();
//! let bpm = BufferPoolManager::new(64, disk);
//!
//! let mut guard = bpm.new_page_guarded().unwrap();
//! guard.as_mut_slice()[..5].copy_from_slice(b"hello");
//! let page_id = guard.page_id();
//! drop(guard);
//!
//! bpm.flush_page(page_id).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod container;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BufferPoolConfig, PAGE_SIZE};
pub use common::{Error, FrameId, PageId, Result};

pub use buffer::{
    BufferPoolManager, BufferPoolStats, Frame, PageReadGuard, PageWriteGuard, StatsSnapshot,
};
pub use container::hash::ExtendibleHashTable;
pub use storage::{DiskIo, DiskManager, MemoryDiskManager, Page};
