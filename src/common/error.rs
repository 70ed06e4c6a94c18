//! Error types for clockcache.

use thiserror::Error;

use crate::cell::LeaseError;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in clockcache.
///
/// Every failure is returned as a value from the operation that detected it;
/// nothing is retried internally. Retry policy belongs to the caller (e.g.
/// drop an outstanding lease and call `fetch_page` again).
#[derive(Debug, Error)]
pub enum Error {
    /// OS-level I/O failure, including reads past the end of the heap file.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Every frame in the pool is pinned; no victim is available.
    ///
    /// The caller must drop outstanding page leases and retry.
    #[error("no evictable frame: every frame in the pool is pinned")]
    NoEvictableFrame,

    /// A frame's cell was leased when it had to be free.
    ///
    /// Either a double-fetch of a page whose lease is still held, or a flush
    /// that ran into a leased frame. A logic error in the caller, never
    /// retried automatically.
    #[error("lease conflict: {0}")]
    LeaseConflict(#[from] LeaseError),
}
