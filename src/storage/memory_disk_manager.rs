//! In-memory [`DiskIo`] backend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{Error, PageId, Result};
use crate::storage::disk_manager::DiskIo;
use crate::storage::page::Page;

#[derive(Default)]
struct MemoryDisk {
    pages: HashMap<PageId, Box<Page>>,
    write_counts: HashMap<PageId, u64>,
    num_reads: u64,
    num_writes: u64,
}

/// Page store kept entirely in memory.
///
/// Cloning yields another handle to the same store, so a test can hand one
/// handle to a buffer pool and inspect what reached "disk" through the other.
///
/// # Example
/// ```
/// use pagecache::storage::{DiskIo, MemoryDiskManager, Page};
/// use pagecache::PageId;
///
/// let disk = MemoryDiskManager::new();
/// let mut handle = disk.clone();
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 9;
/// handle.write_page(PageId::new(4), &page).unwrap();
///
/// assert_eq!(disk.write_count(PageId::new(4)), 1);
/// assert_eq!(disk.page_bytes(PageId::new(4)).unwrap()[0], 9);
/// ```
#[derive(Clone, Default)]
pub struct MemoryDiskManager {
    inner: Arc<Mutex<MemoryDisk>>,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `page_id` has been written.
    pub fn write_count(&self, page_id: PageId) -> u64 {
        self.inner
            .lock()
            .write_counts
            .get(&page_id)
            .copied()
            .unwrap_or(0)
    }

    /// Copy of the stored bytes for `page_id`, if it was ever written.
    pub fn page_bytes(&self, page_id: PageId) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .pages
            .get(&page_id)
            .map(|page| page.as_slice().to_vec())
    }

    /// Whether `page_id` has ever been written.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.inner.lock().pages.contains_key(&page_id)
    }

    pub fn num_reads(&self) -> u64 {
        self.inner.lock().num_reads
    }

    pub fn num_writes(&self) -> u64 {
        self.inner.lock().num_writes
    }
}

impl DiskIo for MemoryDiskManager {
    fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }
        let mut disk = self.inner.lock();
        disk.num_reads += 1;
        match disk.pages.get(&page_id) {
            Some(stored) => page.copy_from(stored),
            None => page.reset(),
        }
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }
        let mut disk = self.inner.lock();
        disk.num_writes += 1;
        *disk.write_counts.entry(page_id).or_insert(0) += 1;
        disk.pages
            .entry(page_id)
            .or_insert_with(|| Box::new(Page::new()))
            .copy_from(page);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_page_reads_zero() {
        let mut disk = MemoryDiskManager::new();
        let mut page = Page::new();
        page.as_mut_slice()[10] = 1;

        disk.read_page(PageId::new(0), &mut page).unwrap();

        assert!(page.as_slice().iter().all(|&b| b == 0));
        assert_eq!(disk.num_reads(), 1);
        assert!(!disk.contains(PageId::new(0)));
    }

    #[test]
    fn test_handles_share_state() {
        let observer = MemoryDiskManager::new();
        let mut writer = observer.clone();

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0x11;
        writer.write_page(PageId::new(2), &page).unwrap();
        page.as_mut_slice()[0] = 0x22;
        writer.write_page(PageId::new(2), &page).unwrap();

        assert_eq!(observer.write_count(PageId::new(2)), 2);
        assert_eq!(observer.num_writes(), 2);
        assert_eq!(observer.page_bytes(PageId::new(2)).unwrap()[0], 0x22);

        let mut reader = observer.clone();
        let mut read_back = Page::new();
        reader.read_page(PageId::new(2), &mut read_back).unwrap();
        assert_eq!(read_back.as_slice()[0], 0x22);
    }

    #[test]
    fn test_invalid_page_id_rejected() {
        let mut disk = MemoryDiskManager::new();
        assert!(disk.write_page(PageId::INVALID, &Page::new()).is_err());
        assert_eq!(disk.num_writes(), 0);
    }
}
