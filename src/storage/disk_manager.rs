//! Disk Manager - low-level file I/O for pages.
//!
//! The [`DiskManager`] owns the heap file and handles all direct file
//! operations: allocating page ids, reading and writing page-aligned blocks.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{PageId, Result};

/// Manages page I/O on a single heap file.
///
/// # File Layout
/// The heap file is a flat array of fixed-size pages, no header:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096    ...    N×4096
/// ```
///
/// Allocation only hands out ids; the file grows when a page is first
/// written. Reading a page that was never written is an error, not a
/// zero-fill.
///
/// # Thread Safety
/// `DiskManager` is single-threaded. The [`BufferPoolManager`] serializes
/// access to it.
///
/// [`BufferPoolManager`]: crate::buffer::BufferPoolManager
pub struct DiskManager {
    heap_file: File,
    /// Next page id to hand out.
    next_page_id: u32,
}

impl DiskManager {
    /// Open the heap file at `path`, creating it if absent.
    ///
    /// Page numbering resumes from the file size, rounding a partially
    /// written trailing page up to a full one.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let heap_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Self::from_file(heap_file)
    }

    /// Wrap an already-open heap file.
    pub fn from_file(heap_file: File) -> Result<Self> {
        let file_size = heap_file.metadata()?.len();
        let next_page_id = file_size.div_ceil(PAGE_SIZE as u64) as u32;

        Ok(Self {
            heap_file,
            next_page_id,
        })
    }

    /// Allocate a new page id.
    ///
    /// Ids are monotonically increasing and never reused. The file is not
    /// extended here; that happens on first write.
    pub fn allocate_page(&mut self) -> PageId {
        let page_id = PageId::new(self.next_page_id);
        self.next_page_id += 1;
        page_id
    }

    /// Read a page into `data`, which must be `PAGE_SIZE` bytes.
    ///
    /// Fills only the prefix that exists on disk and leaves the rest of
    /// `data` untouched, so a short page written directly through
    /// [`write_page_data`](Self::write_page_data) reads back over whatever
    /// the caller had in the buffer. A page lying entirely beyond the end of
    /// the file is an `UnexpectedEof` error.
    pub fn read_page_data(&mut self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        debug_assert_eq!(data.len(), PAGE_SIZE);

        let offset = page_id.0 as u64 * PAGE_SIZE as u64;
        self.heap_file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < data.len() {
            match self.heap_file.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{page_id} lies beyond the end of the heap file"),
            )
            .into());
        }

        log::trace!("read {filled} bytes of {page_id} at offset {offset}");
        Ok(())
    }

    /// Write `data` at the page's offset, extending the file as needed.
    ///
    /// # Panics
    /// Panics if `data` is larger than `PAGE_SIZE`; spilling into the next
    /// page is a programming error, not a recoverable condition.
    pub fn write_page_data(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        assert!(data.len() <= PAGE_SIZE, "page write larger than PAGE_SIZE");

        let offset = page_id.0 as u64 * PAGE_SIZE as u64;
        self.heap_file.seek(SeekFrom::Start(offset))?;
        self.heap_file.write_all(data)?;

        log::trace!("wrote {} bytes of {page_id} at offset {offset}", data.len());
        Ok(())
    }

    /// Flush buffered writes and fsync the heap file.
    pub fn sync(&mut self) -> Result<()> {
        self.heap_file.flush()?;
        self.heap_file.sync_all()?;
        Ok(())
    }

    /// Number of pages allocated so far.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.next_page_id
    }
}
