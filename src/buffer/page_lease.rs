//! RAII lease for page access.
//!
//! A [`PageLease`] is the handle callers get back from
//! [`fetch_page`](super::BufferPoolManager::fetch_page) and
//! [`create_page`](super::BufferPoolManager::create_page). It wraps the
//! frame cell's exclusive lease: while it lives, the frame is pinned and no
//! other caller can touch the page; dropping it releases the frame.

use std::ops::{Deref, DerefMut};

use crate::buffer::BufferedPage;
use crate::cell::WriteLease;
use crate::common::BufferId;

/// Exclusive handle to one buffered page.
///
/// Derefs to [`BufferedPage`], so `data()`, `data_mut()`, `page_id()` and
/// `is_dirty()` are available directly. Writing through
/// [`data_mut`](BufferedPage::data_mut) marks the page dirty; the dirty page
/// is written back when the frame is next evicted or flushed.
///
/// # Example
/// ```ignore
/// let mut lease = bpm.create_page()?;
/// lease.data_mut()[..5].copy_from_slice(b"hello");
/// // lease drops: frame unpinned, page stays cached and dirty
/// ```
pub struct PageLease<'a> {
    buffer_id: BufferId,
    lease: WriteLease<'a, BufferedPage>,
}

impl<'a> PageLease<'a> {
    /// Called by `BufferPoolManager` once a frame is set up.
    pub(crate) fn new(buffer_id: BufferId, lease: WriteLease<'a, BufferedPage>) -> Self {
        Self { buffer_id, lease }
    }

    /// The frame slot holding this page.
    #[inline]
    pub fn buffer_id(&self) -> BufferId {
        self.buffer_id
    }
}

impl Deref for PageLease<'_> {
    type Target = BufferedPage;

    #[inline]
    fn deref(&self) -> &BufferedPage {
        &self.lease
    }
}

impl DerefMut for PageLease<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut BufferedPage {
        &mut self.lease
    }
}
