//! Single-borrower lease cell.
//!
//! A [`LeaseCell`] wraps one value and arbitrates access to it at runtime:
//! at most one exclusive (mutable) lease exists at any instant, and shared
//! read leases never coexist with an exclusive one. The cell is how the
//! buffer pool hands out views into cache-internal storage while it is
//! reachable only through shared references.
//!
//! Every operation is non-blocking: a conflicting request fails immediately
//! with [`LeaseError`] instead of waiting. Releasing a lease is dropping the
//! guard, so a caller can only ever release a lease it actually holds.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// The cell's value was leased when an operation required it free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cell is already leased")]
pub struct LeaseError;

/// A value guarded by a runtime single-borrower discipline.
///
/// # Example
/// ```
/// use clockcache::cell::LeaseCell;
///
/// let cell = LeaseCell::new(1);
/// {
///     let mut lease = cell.write().unwrap();
///     *lease += 1;
///     assert!(cell.write().is_err()); // second lease fails fast
/// }
/// assert_eq!(*cell.read().unwrap(), 2); // drop released it
/// ```
pub struct LeaseCell<T> {
    inner: RwLock<T>,
}

impl<T> LeaseCell<T> {
    /// Create a new cell containing `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Take an exclusive mutable lease on the value.
    ///
    /// Fails if any lease, shared or exclusive, is outstanding. The lease is
    /// released when the returned guard drops.
    pub fn write(&self) -> Result<WriteLease<'_, T>, LeaseError> {
        self.inner.try_write().map(WriteLease).ok_or(LeaseError)
    }

    /// Take a shared read-only lease on the value.
    ///
    /// Fails only while an exclusive lease is outstanding; any number of
    /// read leases may coexist.
    pub fn read(&self) -> Result<ReadLease<'_, T>, LeaseError> {
        self.inner.try_read().map(ReadLease).ok_or(LeaseError)
    }

    /// Check whether any lease (shared or exclusive) is outstanding.
    #[inline]
    pub fn is_leased(&self) -> bool {
        self.inner.is_locked()
    }

    /// Replace the contained value, returning the old one.
    ///
    /// Fails while the cell is leased.
    pub fn replace(&self, value: T) -> Result<T, LeaseError> {
        let mut guard = self.inner.try_write().ok_or(LeaseError)?;
        Ok(std::mem::replace(&mut *guard, value))
    }

    /// Replace the contained value with one computed from it, returning the
    /// old value.
    ///
    /// Fails while the cell is leased.
    pub fn replace_with<F>(&self, f: F) -> Result<T, LeaseError>
    where
        F: FnOnce(&mut T) -> T,
    {
        let mut guard = self.inner.try_write().ok_or(LeaseError)?;
        let new = f(&mut *guard);
        Ok(std::mem::replace(&mut *guard, new))
    }

    /// Swap the values of two cells.
    ///
    /// Fails if either side is leased. Swapping a cell with itself is a
    /// no-op.
    pub fn swap(&self, other: &LeaseCell<T>) -> Result<(), LeaseError> {
        if std::ptr::eq(self, other) {
            return Ok(());
        }
        let mut a = self.inner.try_write().ok_or(LeaseError)?;
        let mut b = other.inner.try_write().ok_or(LeaseError)?;
        std::mem::swap(&mut *a, &mut *b);
        Ok(())
    }

    /// Return a copy of the contained value.
    ///
    /// Fails while an exclusive lease is outstanding.
    pub fn try_clone(&self) -> Result<T, LeaseError>
    where
        T: Clone,
    {
        let guard = self.inner.try_read().ok_or(LeaseError)?;
        Ok(guard.clone())
    }

    /// Get a mutable reference to the value.
    ///
    /// Needs `&mut self`, so exclusivity is enforced at compile time and no
    /// runtime check is involved.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Consume the cell, returning the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for LeaseCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for LeaseCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(guard) => f.debug_tuple("LeaseCell").field(&&*guard).finish(),
            None => f.write_str("LeaseCell(<leased>)"),
        }
    }
}

/// Shared read-only lease into a [`LeaseCell`].
pub struct ReadLease<'a, T>(RwLockReadGuard<'a, T>);

impl<T> Deref for ReadLease<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

/// Exclusive mutable lease into a [`LeaseCell`].
///
/// Dropping the lease releases the cell.
pub struct WriteLease<'a, T>(RwLockWriteGuard<'a, T>);

impl<T> Deref for WriteLease<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for WriteLease<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read() {
        let cell = LeaseCell::new(1);
        assert_eq!(*cell.read().unwrap(), 1);
    }

    #[test]
    fn test_shared_reads_coexist() {
        let cell = LeaseCell::new("shared");
        let a = cell.read().unwrap();
        let b = cell.read().unwrap();
        assert_eq!(*a, *b);
        assert!(cell.is_leased());
    }

    #[test]
    fn test_write_then_drop_releases() {
        let cell = LeaseCell::new(vec![1, 2, 3]);
        {
            let mut lease = cell.write().unwrap();
            lease.push(4);
            assert!(cell.is_leased());
        }
        assert!(!cell.is_leased());
        assert_eq!(*cell.read().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_double_write_fails() {
        let cell = LeaseCell::new(0);
        let _held = cell.write().unwrap();
        assert_eq!(cell.write().err(), Some(LeaseError));
    }

    #[test]
    fn test_read_during_write_fails() {
        let cell = LeaseCell::new(0);
        let _held = cell.write().unwrap();
        assert!(cell.read().is_err());
    }

    #[test]
    fn test_write_during_read_fails() {
        let cell = LeaseCell::new(0);
        let _held = cell.read().unwrap();
        assert!(cell.write().is_err());
    }

    #[test]
    fn test_replace() {
        let cell = LeaseCell::new(1);
        assert_eq!(cell.replace(5).unwrap(), 1);
        assert_eq!(*cell.read().unwrap(), 5);
    }

    #[test]
    fn test_replace_fails_while_leased() {
        let cell = LeaseCell::new(1);
        let _held = cell.read().unwrap();
        assert_eq!(cell.replace(5).err(), Some(LeaseError));
    }

    #[test]
    fn test_replace_with() {
        let cell = LeaseCell::new(1);
        assert_eq!(cell.replace_with(|x| 5 * *x).unwrap(), 1);
        assert_eq!(*cell.read().unwrap(), 5);
    }

    #[test]
    fn test_swap() {
        let a = LeaseCell::new("A");
        let b = LeaseCell::new("B");
        a.swap(&b).unwrap();
        assert_eq!(*a.read().unwrap(), "B");
        assert_eq!(*b.read().unwrap(), "A");
    }

    #[test]
    fn test_swap_fails_if_either_leased() {
        let a = LeaseCell::new(1);
        let b = LeaseCell::new(2);
        let _held = b.write().unwrap();
        assert_eq!(a.swap(&b).err(), Some(LeaseError));
    }

    #[test]
    fn test_swap_with_self() {
        let a = LeaseCell::new(7);
        a.swap(&a).unwrap();
        assert_eq!(*a.read().unwrap(), 7);
    }

    #[test]
    fn test_try_clone_is_deep() {
        let cell = LeaseCell::new(vec![1, 2]);
        let mut cloned = cell.try_clone().unwrap();
        cloned.push(3);
        assert_eq!(*cell.read().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_try_clone_fails_while_written() {
        let cell = LeaseCell::new(0);
        let _held = cell.write().unwrap();
        assert!(cell.try_clone().is_err());
    }

    #[test]
    fn test_get_mut_and_into_inner() {
        let mut cell = LeaseCell::new(1);
        *cell.get_mut() = 9;
        assert_eq!(cell.into_inner(), 9);
    }

    #[test]
    fn test_debug_while_leased() {
        let cell = LeaseCell::new(1);
        let _held = cell.write().unwrap();
        assert_eq!(format!("{:?}", cell), "LeaseCell(<leased>)");
    }
}
