//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting
//! - Write-back of dirty pages on eviction
//! - Pluggable eviction policies, disk backends and page-id allocators

use std::collections::VecDeque;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLockReadGuard};

use crate::buffer::replacer::{LruKReplacer, Replacer};
use crate::buffer::{BufferPoolStats, Frame, PageReadGuard, PageWriteGuard};
use crate::common::config::BufferPoolConfig;
use crate::common::{Error, FrameId, PageId, Result};
use crate::container::hash::{BuildIdentityHasher, ExtendibleHashTable};
use crate::storage::{DiskIo, MonotonicPageAllocator, Page, PageAllocator};

type PageTable = ExtendibleHashTable<PageId, FrameId, BuildIdentityHasher>;

/// Pool state that is only touched under the pool latch.
struct PoolState {
    /// Frames never assigned, or vacated by deletion. Popped from the front,
    /// pushed to the back.
    free_list: VecDeque<FrameId>,
    replacer: Box<dyn Replacer>,
    disk: Box<dyn DiskIo>,
    allocator: Box<dyn PageAllocator>,
}

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                     BufferPoolManager                        │
/// │  ┌────────────────┐   ┌───────────────────────────────────┐  │
/// │  │  page_table    │   │        frames: Vec<Frame>         │  │
/// │  │ PageId → Fid   │──▶│  [Frame0] [Frame1] [Frame2] ...   │  │
/// │  │ (extendible)   │   └───────────────────────────────────┘  │
/// │  └────────────────┘                                          │
/// │  latch: Mutex<PoolState>                                     │
/// │  ┌───────────┐ ┌──────────┐ ┌──────────┐ ┌───────────────┐   │
/// │  │ free_list │ │ replacer │ │   disk   │ │   allocator   │   │
/// │  └───────────┘ └──────────┘ └──────────┘ └───────────────┘   │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// Pool state changes only under `latch`, so pool operations are
/// serialized. The page table has its own latch, which is only taken while
/// `latch` is held. Disk I/O happens under `latch`.
///
/// Page contents are guarded per frame. Holding `latch`, the pool only takes
/// the data lock of an unpinned frame (a victim, a fresh frame, a deleted
/// page). Any wait on a pinned frame's data lock, such as a flush, happens
/// with `latch` released. Callers must therefore release a frame's data lock
/// before unpinning it. The guard API
/// ([`fetch_page_read`](Self::fetch_page_read) and friends) does this
/// automatically.
///
/// # Usage
/// ```
/// use pagecache::buffer::BufferPoolManager;
/// use pagecache::storage::MemoryDiskManager;
///
/// let bpm = BufferPoolManager::new(4, MemoryDiskManager::new());
///
/// let (page_id, frame) = bpm.new_page().unwrap();
/// frame.page_mut().as_mut_slice()[0] = 0xAB;
/// bpm.unpin_page(page_id, true).unwrap();
///
/// let frame = bpm.fetch_page(page_id).unwrap();
/// assert_eq!(frame.page().as_slice()[0], 0xAB);
/// bpm.unpin_page(page_id, false).unwrap();
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Maps resident page IDs to their frames.
    page_table: PageTable,

    latch: Mutex<PoolState>,

    stats: BufferPoolStats,

    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a pool of `pool_size` frames over `disk`, with the default
    /// LRU-K replacer and a page-id counter starting at 0.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new<D: DiskIo + 'static>(pool_size: usize, disk: D) -> Self {
        Self::with_config(BufferPoolConfig::default().pool_size(pool_size), disk)
    }

    /// Create a pool from `config` over `disk`.
    ///
    /// # Panics
    /// Panics if `config.pool_size`, `config.replacer_k` or
    /// `config.bucket_size` is 0.
    pub fn with_config<D: DiskIo + 'static>(config: BufferPoolConfig, disk: D) -> Self {
        let replacer = LruKReplacer::new(config.pool_size, config.replacer_k);
        Self::with_parts(
            config,
            Box::new(disk),
            Box::new(replacer),
            Box::new(MonotonicPageAllocator::new()),
        )
    }

    /// Create a pool with every collaborator supplied by the caller.
    ///
    /// `config.replacer_k` is ignored; the replacer is already built.
    ///
    /// # Panics
    /// Panics if `config.pool_size` or `config.bucket_size` is 0.
    pub fn with_parts(
        config: BufferPoolConfig,
        disk: Box<dyn DiskIo>,
        replacer: Box<dyn Replacer>,
        allocator: Box<dyn PageAllocator>,
    ) -> Self {
        let pool_size = config.pool_size;
        assert!(pool_size > 0, "pool_size must be > 0");

        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list: VecDeque<FrameId> = (0..pool_size).map(FrameId::new).collect();

        info!(
            "BufferPoolManager initialized with {} frames, page table bucket size {}",
            pool_size, config.bucket_size
        );

        Self {
            frames,
            page_table: ExtendibleHashTable::with_hasher(
                config.bucket_size,
                BuildIdentityHasher::default(),
            ),
            latch: Mutex::new(PoolState {
                free_list,
                replacer,
                disk,
                allocator,
            }),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Pin-based access
    // ========================================================================

    /// Pin `page_id` in memory and return its frame.
    ///
    /// A resident page is pinned again without I/O. Otherwise a frame is
    /// taken from the free list or reclaimed from the replacer (writing its
    /// old page back if dirty) and the page is read from disk.
    ///
    /// The caller must balance this with [`unpin_page`](Self::unpin_page).
    ///
    /// # Errors
    /// - `Error::InvalidPageId` for the sentinel id
    /// - `Error::NoFreeFrames` if every frame is pinned, even when `page_id`
    ///   itself is resident, or the replacer has no victim
    /// - `Error::Io` from write-back or read
    pub fn fetch_page(&self, page_id: PageId) -> Result<&Frame> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }

        let mut state = self.latch.lock();
        self.ensure_unpinned_frame()?;

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.index()];
            frame.pin();
            state.replacer.record_access(frame_id);
            state.replacer.set_evictable(frame_id, false);
            self.stats.record_hit();
            return Ok(frame);
        }

        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id.index()];
        self.stats.record_miss();

        // Bind the result so the frame's write lock is gone before `reset`.
        let read = state.disk.read_page(page_id, &mut frame.page_mut());
        if let Err(err) = read {
            warn!("failed to read {} into {}: {}", page_id, frame_id, err);
            frame.reset();
            state.free_list.push_front(frame_id);
            return Err(err);
        }
        self.stats.record_read();

        frame.set_page_id(page_id);
        frame.pin();
        state.replacer.record_access(frame_id);
        state.replacer.set_evictable(frame_id, false);
        self.page_table.insert(page_id, frame_id);

        debug!("loaded {} into {}", page_id, frame_id);
        Ok(frame)
    }

    /// Allocate a fresh page, pin it in a zeroed frame and return both.
    ///
    /// Nothing is read from disk. The id is only allocated once a frame is
    /// secured, so a failed call consumes no id.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if every frame is pinned
    /// - `Error::Io` from writing back an evicted dirty page
    pub fn new_page(&self) -> Result<(PageId, &Frame)> {
        let mut state = self.latch.lock();
        self.ensure_unpinned_frame()?;

        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = state.allocator.allocate();
        let frame = &self.frames[frame_id.index()];

        frame.page_mut().reset();
        frame.set_page_id(page_id);
        frame.pin();
        state.replacer.record_access(frame_id);
        state.replacer.set_evictable(frame_id, false);
        self.page_table.insert(page_id, frame_id);

        debug!("created {} in {}", page_id, frame_id);
        Ok((page_id, frame))
    }

    /// Drop one pin on `page_id`, marking it dirty if `is_dirty`.
    ///
    /// The dirty flag is sticky: passing `false` never clears it. When the
    /// pin count reaches zero the frame becomes evictable.
    ///
    /// # Errors
    /// - `Error::PageNotResident` if the page is not in the pool
    /// - `Error::PageNotPinned` if its pin count is already zero
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let mut state = self.latch.lock();

        let frame_id = self
            .page_table
            .find(&page_id)
            .ok_or(Error::PageNotResident(page_id.0))?;
        let frame = &self.frames[frame_id.index()];

        if !frame.is_pinned() {
            return Err(Error::PageNotPinned(page_id.0));
        }
        if is_dirty {
            frame.mark_dirty();
        }
        if frame.unpin() == 0 {
            state.replacer.set_evictable(frame_id, true);
        }
        Ok(())
    }

    // ========================================================================
    // Public API: Guarded access
    // ========================================================================

    /// Fetch a page for reading (shared access).
    ///
    /// The guard unpins the page when dropped.
    ///
    /// # Errors
    /// Same as [`fetch_page`](Self::fetch_page).
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageReadGuard::new(self, page_id, frame.page()))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// The guard marks the page dirty and unpins it when dropped.
    ///
    /// # Errors
    /// Same as [`fetch_page`](Self::fetch_page).
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageWriteGuard::new(self, page_id, frame.page_mut()))
    }

    /// Allocate a new page and return a write guard for it.
    ///
    /// # Errors
    /// Same as [`new_page`](Self::new_page).
    pub fn new_page_guarded(&self) -> Result<PageWriteGuard<'_>> {
        let (page_id, frame) = self.new_page()?;
        Ok(PageWriteGuard::new(self, page_id, frame.page_mut()))
    }

    // ========================================================================
    // Public API: Flush, delete, allocate
    // ========================================================================

    /// Write `page_id` to disk, whether or not it is dirty.
    ///
    /// The dirty flag is left as it is. The page is pinned for the duration,
    /// and the wait for its data lock happens without the pool latch, so a
    /// writer holding the page can keep using the pool meanwhile. Flushing a
    /// page whose write guard the calling thread itself holds never returns.
    ///
    /// # Errors
    /// - `Error::InvalidPageId` for the sentinel id
    /// - `Error::PageNotResident` if the page is not in the pool
    /// - `Error::Io` from the write
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }
        let frame_id = {
            let mut state = self.latch.lock();
            let frame_id = self
                .page_table
                .find(&page_id)
                .ok_or(Error::PageNotResident(page_id.0))?;
            self.pin_for_flush(&mut state, frame_id);
            frame_id
        };

        let page = self.frames[frame_id.index()].page();
        self.write_pinned(page_id, frame_id, page)
    }

    /// Write every resident page to disk.
    ///
    /// A page whose data lock is held for writing at that moment is skipped:
    /// its writer marks it dirty on release, so it reaches disk on eviction
    /// or on a later flush.
    ///
    /// # Errors
    /// Stops at and returns the first I/O error.
    pub fn flush_all_pages(&self) -> Result<()> {
        for (index, frame) in self.frames.iter().enumerate() {
            let frame_id = FrameId::new(index);
            let page_id = {
                let mut state = self.latch.lock();
                let page_id = frame.page_id();
                if !page_id.is_valid() {
                    continue;
                }
                self.pin_for_flush(&mut state, frame_id);
                page_id
            };

            match frame.try_page() {
                Some(page) => self.write_pinned(page_id, frame_id, page)?,
                None => {
                    debug!("skipping {}: held by a writer", page_id);
                    let mut state = self.latch.lock();
                    self.release_flush_pin(&mut state, frame_id);
                }
            }
        }
        Ok(())
    }

    /// Drop `page_id` from the pool and release its id to the allocator.
    ///
    /// Deleting a page that is not resident succeeds and does nothing. The
    /// page's contents are discarded, not written back.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the page is still in use
    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(());
        };
        let frame = &self.frames[frame_id.index()];

        if frame.is_pinned() {
            warn!("refusing to delete pinned {}", page_id);
            return Err(Error::PagePinned(page_id.0));
        }

        state.replacer.remove(frame_id);
        frame.reset();
        self.page_table.remove(&page_id);
        state.free_list.push_back(frame_id);
        state.allocator.deallocate(page_id);
        self.stats.record_delete();

        debug!("deleted {} from {}", page_id, frame_id);
        Ok(())
    }

    /// Reserve a new page id without bringing it into the pool.
    ///
    /// The page reads back as zeros until it is written.
    pub fn allocate_page(&self) -> PageId {
        self.latch.lock().allocator.allocate()
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of frames on the free list.
    pub fn free_frame_count(&self) -> usize {
        self.latch.lock().free_list.len()
    }

    /// Number of pages currently resident.
    pub fn page_count(&self) -> usize {
        let _state = self.latch.lock();
        self.frames.iter().filter(|f| !f.is_empty()).count()
    }

    /// Pin count of `page_id`, or `None` if it is not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let _state = self.latch.lock();
        self.page_table
            .find(&page_id)
            .map(|frame_id| self.frames[frame_id.index()].pin_count())
    }

    /// Dirty flag of `page_id`, or `None` if it is not resident.
    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        let _state = self.latch.lock();
        self.page_table
            .find(&page_id)
            .map(|frame_id| self.frames[frame_id.index()].is_dirty())
    }

    /// Frame currently holding `page_id`.
    pub fn frame_of(&self, page_id: PageId) -> Option<FrameId> {
        let _state = self.latch.lock();
        self.page_table.find(&page_id)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Fail fast when no frame could possibly be handed out.
    fn ensure_unpinned_frame(&self) -> Result<()> {
        if self.frames.iter().all(Frame::is_pinned) {
            warn!("all {} frames are pinned", self.pool_size);
            return Err(Error::NoFreeFrames);
        }
        Ok(())
    }

    /// Take a frame from the free list, or reclaim one from the replacer.
    ///
    /// A reclaimed frame's old page is written back if dirty and unmapped,
    /// and the frame memory is zeroed.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let Some(frame_id) = state.replacer.evict() else {
            warn!("replacer has no evictable frame");
            return Err(Error::NoFreeFrames);
        };
        let frame = &self.frames[frame_id.index()];
        debug_assert!(!frame.is_pinned(), "replacer chose pinned {}", frame_id);
        let old_page_id = frame.page_id();

        if frame.is_dirty() {
            debug!("writing back dirty {} from {}", old_page_id, frame_id);
            let written = state.disk.write_page(old_page_id, &frame.page());
            if let Err(err) = written {
                warn!("write-back of {} failed: {}", old_page_id, err);
                // The page stays resident; hand it back to the replacer.
                state.replacer.record_access(frame_id);
                state.replacer.set_evictable(frame_id, true);
                return Err(err);
            }
            frame.clear_dirty();
            self.stats.record_write();
        }

        self.page_table.remove(&old_page_id);
        frame.page_mut().reset();
        frame.set_page_id(PageId::INVALID);
        self.stats.record_eviction();

        debug!("evicted {} from {}", old_page_id, frame_id);
        Ok(frame_id)
    }

    /// Pin a resident frame so it cannot be evicted or deleted while a flush
    /// waits for its data lock outside the latch. Flushing is not an access,
    /// so the replacer history is left alone.
    fn pin_for_flush(&self, state: &mut PoolState, frame_id: FrameId) {
        self.frames[frame_id.index()].pin();
        state.replacer.set_evictable(frame_id, false);
    }

    fn release_flush_pin(&self, state: &mut PoolState, frame_id: FrameId) {
        if self.frames[frame_id.index()].unpin() == 0 {
            state.replacer.set_evictable(frame_id, true);
        }
    }

    /// Write a frame pinned by `pin_for_flush`, then drop that pin.
    ///
    /// The data lock is taken before the latch here, the same order page
    /// guards use, and released before the frame can become evictable.
    fn write_pinned(
        &self,
        page_id: PageId,
        frame_id: FrameId,
        page: RwLockReadGuard<'_, Page>,
    ) -> Result<()> {
        let mut state = self.latch.lock();
        let written = state.disk.write_page(page_id, &page);
        drop(page);

        if written.is_ok() {
            self.stats.record_write();
        }
        self.release_flush_pin(&mut state, frame_id);
        written
    }
}
