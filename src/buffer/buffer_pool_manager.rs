//! Buffer Pool Manager - the page caching layer.
//!
//! The [`BufferPoolManager`] ties the pieces together:
//! - page-id to frame translation through the page table
//! - victim selection via the pool's clock sweep
//! - dirty write-back before a frame is reused
//! - lease-guarded handles into cached pages

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use parking_lot::{Mutex, RwLock};

use crate::buffer::{BufferPool, BufferPoolStats, BufferedPage, PageLease};
use crate::common::{BufferId, PageId, Result};
use crate::storage::DiskManager;

/// Caches disk pages in a bounded pool of frames.
///
/// ```text
/// ┌────────────────────────────────────────────────────────┐
/// │                  BufferPoolManager                     │
/// │  ┌──────────────┐   ┌─────────────────────────────┐    │
/// │  │ page_table   │   │   pool: BufferPool          │    │
/// │  │PageId → BId  │──▶│  [Frame0] [Frame1] ...      │    │
/// │  └──────────────┘   └─────────────────────────────┘    │
/// │  ┌──────────────┐   ┌──────────────┐                   │
/// │  │ disk: Mutex  │   │    stats     │                   │
/// │  └──────────────┘   └──────────────┘                   │
/// └────────────────────────────────────────────────────────┘
/// ```
///
/// A caller gets back a [`PageLease`]: an exclusive handle that pins its
/// frame until dropped. Holding a lease while asking for more frames than
/// the pool has spare ends in [`NoEvictableFrame`]; fetching a page whose
/// lease is still outstanding ends in [`LeaseConflict`]. Both are returned,
/// never retried internally.
///
/// [`NoEvictableFrame`]: crate::common::Error::NoEvictableFrame
/// [`LeaseConflict`]: crate::common::Error::LeaseConflict
///
/// # Usage
/// ```ignore
/// let disk = DiskManager::open("records.db")?;
/// let bpm = BufferPoolManager::new(disk, BufferPool::new(64));
///
/// let page_id = {
///     let mut lease = bpm.create_page()?;
///     lease.data_mut()[0] = 0xAB;
///     lease.page_id()
/// }; // lease drops: frame unpinned, page cached and dirty
///
/// let lease = bpm.fetch_page(page_id)?;
/// assert_eq!(lease.data()[0], 0xAB);
/// ```
pub struct BufferPoolManager {
    /// Handles all disk I/O.
    disk: Mutex<DiskManager>,

    /// Fixed pool of frames and the eviction scan.
    pool: BufferPool,

    /// Maps page ids to the frames caching them.
    page_table: RwLock<HashMap<PageId, BufferId>>,

    /// Performance counters.
    stats: BufferPoolStats,
}

impl BufferPoolManager {
    /// Create a manager over `disk` and `pool`.
    pub fn new(disk: DiskManager, pool: BufferPool) -> Self {
        Self {
            disk: Mutex::new(disk),
            pool,
            page_table: RwLock::new(HashMap::new()),
            stats: BufferPoolStats::new(),
        }
    }

    /// Fetch a page, loading it from disk if it is not resident.
    ///
    /// Bumps the frame's usage count and returns an exclusive lease. A miss
    /// claims a victim frame, writing its prior content back first if dirty.
    ///
    /// # Errors
    /// - [`NoEvictableFrame`] if a miss finds every frame pinned
    /// - [`LeaseConflict`] if the page's own lease is still outstanding
    /// - [`Io`] if the page was never written to disk, or on OS failure
    ///
    /// [`NoEvictableFrame`]: crate::common::Error::NoEvictableFrame
    /// [`LeaseConflict`]: crate::common::Error::LeaseConflict
    /// [`Io`]: crate::common::Error::Io
    pub fn fetch_page(&self, page_id: PageId) -> Result<PageLease<'_>> {
        let resident = { self.page_table.read().get(&page_id).copied() };

        if let Some(buffer_id) = resident {
            let frame = self.pool.frame(buffer_id);
            let lease = frame.buffer().write()?;
            debug_assert_eq!(lease.page_id, page_id);

            frame.bump_usage();
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("fetch {page_id}: hit in {buffer_id}");

            return Ok(PageLease::new(buffer_id, lease));
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let buffer_id = self.pool.evict()?;
        let frame = self.pool.frame(buffer_id);
        let mut buf = frame.buffer().write()?;

        self.write_back_if_dirty(&mut buf)?;

        // Only rebind the frame's identity once the read has succeeded; a
        // failed read leaves the old page resident and clean.
        {
            let mut disk = self.disk.lock();
            disk.read_page_data(page_id, buf.page.as_mut_slice())?;
        }
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        let evicted = std::mem::replace(&mut buf.page_id, page_id);
        buf.is_dirty = false;
        frame.bump_usage();
        self.rebind(evicted, page_id, buffer_id);

        log::trace!("fetch {page_id}: miss, loaded into {buffer_id}");
        Ok(PageLease::new(buffer_id, buf))
    }

    /// Allocate a brand-new page and claim a frame for it.
    ///
    /// The page starts all-zero and clean, with the frame's usage count set
    /// to 1 (a fresh claim, not an increment).
    ///
    /// # Errors
    /// - [`NoEvictableFrame`] if every frame is pinned
    /// - [`Io`] if writing back the victim's dirty content fails
    ///
    /// [`NoEvictableFrame`]: crate::common::Error::NoEvictableFrame
    /// [`Io`]: crate::common::Error::Io
    pub fn create_page(&self) -> Result<PageLease<'_>> {
        let buffer_id = self.pool.evict()?;
        let frame = self.pool.frame(buffer_id);
        let mut buf = frame.buffer().write()?;

        self.write_back_if_dirty(&mut buf)?;

        let page_id = self.disk.lock().allocate_page();
        let evicted = buf.page_id;
        *buf = BufferedPage::fresh(page_id);
        frame.set_usage(1);
        self.rebind(evicted, page_id, buffer_id);

        log::trace!("create {page_id} in {buffer_id}");
        Ok(PageLease::new(buffer_id, buf))
    }

    /// Write every resident page to disk and clear its dirty flag.
    ///
    /// All leases are taken before any I/O starts, so the operation fails
    /// whole with [`LeaseConflict`] if any frame is leased, with nothing
    /// half-written. Residency is preserved: pages stay cached and mapped.
    ///
    /// Clean pages are written too; this also materializes pages that were
    /// created but never stored, so they survive a later clean eviction.
    ///
    /// # Errors
    /// - [`LeaseConflict`] if any resident frame is leased
    /// - [`Io`] on write or fsync failure
    ///
    /// [`LeaseConflict`]: crate::common::Error::LeaseConflict
    /// [`Io`]: crate::common::Error::Io
    pub fn flush(&self) -> Result<()> {
        let entries: Vec<(PageId, BufferId)> = {
            let table = self.page_table.read();
            table.iter().map(|(&pid, &bid)| (pid, bid)).collect()
        };

        let mut leases = Vec::with_capacity(entries.len());
        for (page_id, buffer_id) in entries {
            let buf = self.pool.frame(buffer_id).buffer().write()?;
            debug_assert_eq!(buf.page_id, page_id);
            leases.push((page_id, buf));
        }

        let mut disk = self.disk.lock();
        for (page_id, buf) in &mut leases {
            disk.write_page_data(*page_id, buf.page.as_slice())?;
            buf.is_dirty = false;
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        }
        disk.sync()?;

        log::debug!("flushed {} resident pages", leases.len());
        Ok(())
    }

    /// Write one resident page to disk if it is dirty.
    ///
    /// A page that is not resident is a no-op.
    ///
    /// # Errors
    /// - [`LeaseConflict`] if the page's frame is leased
    /// - [`Io`] on write or fsync failure
    ///
    /// [`LeaseConflict`]: crate::common::Error::LeaseConflict
    /// [`Io`]: crate::common::Error::Io
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let buffer_id = {
            match self.page_table.read().get(&page_id) {
                Some(&bid) => bid,
                None => return Ok(()),
            }
        };

        let mut buf = self.pool.frame(buffer_id).buffer().write()?;
        if buf.is_dirty {
            let mut disk = self.disk.lock();
            disk.write_page_data(page_id, buf.page.as_slice())?;
            disk.sync()?;
            buf.is_dirty = false;
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            log::debug!("flushed {page_id}");
        }

        Ok(())
    }

    /// The frame pool.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Number of pages currently cached.
    pub fn resident_page_count(&self) -> usize {
        self.page_table.read().len()
    }

    /// Performance counters.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Write a victim frame's content to disk if dirty, before reuse.
    ///
    /// Must complete before the frame's bytes are overwritten, or the
    /// dirty page's writes would be lost.
    fn write_back_if_dirty(&self, buf: &mut BufferedPage) -> Result<()> {
        if buf.is_dirty {
            log::debug!("writing back dirty {} before reuse", buf.page_id);
            self.disk
                .lock()
                .write_page_data(buf.page_id, buf.page.as_slice())?;
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            buf.is_dirty = false;
        }
        Ok(())
    }

    /// Repoint the page table from a frame's old page to its new one.
    fn rebind(&self, evicted: PageId, page_id: PageId, buffer_id: BufferId) {
        let mut table = self.page_table.write();
        if evicted.is_valid() {
            table.remove(&evicted);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
        table.insert(page_id, buffer_id);
    }
}
