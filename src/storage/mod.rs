//! Storage layer - disk I/O, page buffers and page-id allocation.
//!
//! - [`DiskIo`] - Page-granular storage contract used by the buffer pool
//! - [`DiskManager`] - File-backed [`DiskIo`]
//! - [`MemoryDiskManager`] - In-memory [`DiskIo`]
//! - [`Page`] - The raw 4KB data container
//! - [`PageAllocator`] / [`MonotonicPageAllocator`] - Page-id allocation

mod disk_manager;
mod memory_disk_manager;
mod page;
mod page_allocator;

pub use disk_manager::{DiskIo, DiskManager};
pub use memory_disk_manager::MemoryDiskManager;
pub use page::Page;
pub use page_allocator::{MonotonicPageAllocator, PageAllocator};
