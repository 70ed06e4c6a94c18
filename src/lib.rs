//! clockcache - a clock-sweep page cache for disk-backed record stores.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      clockcache                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │        Buffer Pool Manager (buffer/)             │   │
//! │  │   page table + fetch/create/flush protocol       │   │
//! │  └─────────────────────────────────────────────────┘   │
//! │            ↓                          ↓                 │
//! │  ┌──────────────────────┐  ┌─────────────────────┐     │
//! │  │ Buffer Pool (buffer/)│  │  Lease Cell (cell)  │     │
//! │  │  frames + clock sweep│  │ single-borrower view │     │
//! │  └──────────────────────┘  └─────────────────────┘     │
//! │            ↓                                            │
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)               │   │
//! │  │          DiskManager + Page (4KB)                │   │
//! │  └─────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - shared primitives (PageId, BufferId, Error, config)
//! - [`cell`] - generic single-borrower lease cell
//! - [`buffer`] - buffer pool, manager, frames, leases, stats
//! - [`storage`] - heap file I/O and the page type
//!
//! # Quick Start
//! ```no_run
//! use clockcache::{BufferPool, BufferPoolManager, DiskManager};
//!
//! # fn main() -> clockcache::Result<()> {
//! let disk = DiskManager::open("records.db")?;
//! let bpm = BufferPoolManager::new(disk, BufferPool::new(64));
//!
//! let page_id = {
//!     let mut lease = bpm.create_page()?;
//!     lease.data_mut()[..5].copy_from_slice(b"hello");
//!     lease.page_id()
//! };
//!
//! let lease = bpm.fetch_page(page_id)?;
//! assert_eq!(&lease.data()[..5], b"hello");
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod cell;
pub mod common;
pub mod storage;

// Re-export commonly used items at the crate root.
pub use buffer::{
    BufferPool, BufferPoolManager, BufferPoolStats, BufferedPage, Frame, PageLease, StatsSnapshot,
};
pub use cell::{LeaseCell, LeaseError, ReadLease, WriteLease};
pub use common::config::PAGE_SIZE;
pub use common::{BufferId, Error, PageId, Result};
pub use storage::{DiskManager, Page};
