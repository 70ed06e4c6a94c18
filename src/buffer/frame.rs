//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] pairs a clock-style usage counter with a [`LeaseCell`]
//! holding the cached page state ([`BufferedPage`]). The cell's lease state
//! doubles as the pin state: a leased frame is pinned and ineligible for
//! eviction.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::cell::LeaseCell;
use crate::common::PageId;
use crate::storage::Page;

/// Cached state of one page: identity, bytes, and write-back flag.
///
/// Invariant: `page_id == PageId::INVALID` means the frame holds no live
/// page, and then `is_dirty` is false.
pub struct BufferedPage {
    pub(crate) page_id: PageId,
    pub(crate) page: Page,
    pub(crate) is_dirty: bool,
}

impl BufferedPage {
    /// State of a frame holding no page.
    pub(crate) fn empty() -> Self {
        Self {
            page_id: PageId::INVALID,
            page: Page::new(),
            is_dirty: false,
        }
    }

    /// A freshly allocated all-zero page, clean.
    pub(crate) fn fresh(page_id: PageId) -> Self {
        Self {
            page_id,
            page: Page::new(),
            is_dirty: false,
        }
    }

    /// Id of the cached page, or [`PageId::INVALID`] for an empty frame.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Whether the in-memory bytes have diverged from the on-disk copy.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Read-only view of the page bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.page.as_slice()
    }

    /// Mutable view of the page bytes. Marks the page dirty.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.is_dirty = true;
        self.page.as_mut_slice()
    }
}

impl Default for BufferedPage {
    fn default() -> Self {
        Self::empty()
    }
}

/// A frame in the buffer pool.
///
/// The usage counter is atomic so the pool can age frames in place while
/// the manager bumps them, without handing out `&mut Frame`.
pub struct Frame {
    usage_count: AtomicU64,
    buffer: LeaseCell<BufferedPage>,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            usage_count: AtomicU64::new(0),
            buffer: LeaseCell::new(BufferedPage::empty()),
        }
    }

    /// The cell guarding this frame's page state.
    #[inline]
    pub fn buffer(&self) -> &LeaseCell<BufferedPage> {
        &self.buffer
    }

    /// Current usage count.
    #[inline]
    pub fn usage_count(&self) -> u64 {
        self.usage_count.load(Ordering::Relaxed)
    }

    /// Increment the usage count. Returns the new value.
    #[inline]
    pub fn bump_usage(&self) -> u64 {
        self.usage_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Set the usage count outright (fresh frame claim).
    #[inline]
    pub fn set_usage(&self, count: u64) {
        self.usage_count.store(count, Ordering::Relaxed);
    }

    /// Decrement the usage count, saturating at zero. Returns the new value.
    ///
    /// Called by the eviction scan when sweeping past an unpinned frame.
    pub fn age(&self) -> u64 {
        self.usage_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| c.checked_sub(1))
            .map_or(0, |prev| prev - 1)
    }

    /// Whether the frame is pinned (its cell is leased).
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.buffer.is_leased()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
