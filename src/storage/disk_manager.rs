//! Disk Manager - low-level file I/O for database pages.
//!
//! [`DiskIo`] is the contract the buffer pool depends on: read or write one
//! fixed-size page by id. [`DiskManager`] implements it over a single file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Synchronous page-granular storage.
///
/// Both calls block until the transfer is complete. The buffer pool invokes
/// them while holding its latch, so implementations must not call back into
/// the pool.
pub trait DiskIo: Send {
    /// Fill `page` with the stored contents of `page_id`.
    ///
    /// A page that was never written reads back as zeros.
    fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()>;

    /// Persist `page` as the contents of `page_id`.
    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()>;
}

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page ids are handed out by a separate allocator, so the file grows on
/// demand: writing past the end extends it, and reading a page beyond the
/// end yields a zeroed page.
///
/// # Durability
/// Every write is followed by `fsync()`.
pub struct DiskManager {
    file: File,
    /// Number of page slots covered by the file.
    page_count: u32,
    num_reads: u64,
    num_writes: u64,
}

impl DiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self::from_file(file, 0))
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        let page_count = file_size.div_ceil(PAGE_SIZE as u64) as u32;

        Ok(Self::from_file(file, page_count))
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn from_file(file: File, page_count: u32) -> Self {
        Self {
            file,
            page_count,
            num_reads: 0,
            num_writes: 0,
        }
    }

    /// Number of page slots the file currently covers.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Size of the database file in bytes, rounded to whole pages.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    /// Number of page reads served.
    #[inline]
    pub fn num_reads(&self) -> u64 {
        self.num_reads
    }

    /// Number of page writes performed.
    #[inline]
    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }
}

impl DiskIo for DiskManager {
    fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }
        self.num_reads += 1;

        if page_id.0 >= self.page_count {
            debug!("{} is beyond end of file, reading zeros", page_id);
            page.reset();
            return Ok(());
        }

        self.file.seek(SeekFrom::Start(page_id.byte_offset()))?;

        // The last page of a file written by another tool may be short.
        let buf = page.as_mut_slice();
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        if filled < buf.len() {
            debug!("short read of {} bytes for {}", filled, page_id);
            buf[filled..].fill(0);
        }

        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }

        self.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        self.num_writes += 1;
        self.page_count = self.page_count.max(page_id.0 + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let dm = DiskManager::create(&path).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert_eq!(dm.file_size(), 0);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskManager::create(&path).unwrap();
        assert!(DiskManager::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        assert!(DiskManager::open(dir.path().join("nonexistent.db")).is_err());
    }

    #[test]
    fn test_read_unwritten_page_is_zeroed() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.db")).unwrap();

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xEE;
        dm.read_page(PageId::new(7), &mut page).unwrap();

        assert!(page.as_slice().iter().all(|&b| b == 0));
        assert_eq!(dm.num_reads(), 1);
        assert_eq!(dm.page_count(), 0);
    }

    #[test]
    fn test_write_extends_file() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.db")).unwrap();

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[4095] = 0xEF;
        dm.write_page(PageId::new(3), &page).unwrap();

        assert_eq!(dm.page_count(), 4);
        assert_eq!(dm.file_size(), 4 * PAGE_SIZE as u64);
        assert_eq!(dm.num_writes(), 1);

        let mut read_back = Page::new();
        dm.read_page(PageId::new(3), &mut read_back).unwrap();
        assert_eq!(read_back.as_slice()[0], 0xAB);
        assert_eq!(read_back.as_slice()[4095], 0xEF);

        // The hole before page 3 reads as zeros.
        dm.read_page(PageId::new(1), &mut read_back).unwrap();
        assert!(read_back.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::create(&path).unwrap();
            let mut page = Page::new();
            page.as_mut_slice()[0] = 0x42;
            dm.write_page(PageId::new(0), &page).unwrap();
        }

        {
            let mut dm = DiskManager::open(&path).unwrap();
            assert_eq!(dm.page_count(), 1);

            let mut page = Page::new();
            dm.read_page(PageId::new(0), &mut page).unwrap();
            assert_eq!(page.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_invalid_page_id_rejected() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.db")).unwrap();

        let mut page = Page::new();
        assert!(matches!(
            dm.write_page(PageId::INVALID, &page),
            Err(Error::InvalidPageId(_))
        ));
        assert!(matches!(
            dm.read_page(PageId::INVALID, &mut page),
            Err(Error::InvalidPageId(_))
        ));
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 0);
            dm.write_page(PageId::new(0), &Page::new()).unwrap();
        }

        {
            let dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 1);
        }
    }
}
