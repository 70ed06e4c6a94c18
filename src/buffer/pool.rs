//! Buffer pool - fixed frame table and clock-sweep victim selection.

use parking_lot::Mutex;

use crate::buffer::Frame;
use crate::common::{BufferId, Error, Result};

/// A fixed-capacity table of frames with a clock-sweep eviction scan.
///
/// The sweep approximates LRU in O(pool_size) per scan: every fetch bumps a
/// frame's usage count, and the sweep hand ages counts back down as it
/// passes unpinned frames. A frame whose count reaches zero is the next
/// victim. Pinned (leased) frames are skipped; if the hand sees nothing but
/// pinned frames for a full revolution, the pool is exhausted and the scan
/// reports backpressure instead of spinning.
pub struct BufferPool {
    frames: Vec<Frame>,
    /// Clock hand: where the next eviction scan starts.
    next_victim: Mutex<usize>,
}

impl BufferPool {
    /// Create a pool of `pool_size` empty frames.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        Self {
            frames: (0..pool_size).map(|_| Frame::new()).collect(),
            next_victim: Mutex::new(0),
        }
    }

    /// Number of frames in the pool.
    #[inline]
    pub fn size(&self) -> usize {
        self.frames.len()
    }

    /// Direct access to a frame.
    ///
    /// # Panics
    /// Panics if `buffer_id` is out of range; the pool never hands out ids
    /// outside `[0, size())`, so that is a programming error.
    #[inline]
    pub fn frame(&self, buffer_id: BufferId) -> &Frame {
        &self.frames[buffer_id.0]
    }

    /// Select a victim frame for reuse.
    ///
    /// Clock sweep: starting at the hand, a frame with usage count zero is
    /// the victim (the hand stays on it; the caller claims it by bumping the
    /// count). Pinned frames are passed over; unpinned frames with a
    /// positive count are aged by one. Fails with
    /// [`Error::NoEvictableFrame`] once a full revolution has seen only
    /// pinned frames, leaving usage counts and the hand as they were.
    ///
    /// The caller must write the victim's prior content back to disk (if
    /// dirty) before reusing the frame.
    pub fn evict(&self) -> Result<BufferId> {
        let mut hand = self.next_victim.lock();
        let start = *hand;
        let mut consecutive_pinned = 0;

        loop {
            let frame = &self.frames[*hand];

            if frame.usage_count() == 0 {
                log::trace!("evict: selected victim Buffer({})", *hand);
                return Ok(BufferId::new(*hand));
            }

            if frame.is_pinned() {
                consecutive_pinned += 1;
                if consecutive_pinned >= self.frames.len() {
                    *hand = start;
                    log::debug!("evict: all {} frames pinned", self.frames.len());
                    return Err(Error::NoEvictableFrame);
                }
            } else {
                frame.age();
                consecutive_pinned = 0;
            }

            *hand = (*hand + 1) % self.frames.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pool_is_empty() {
        let pool = BufferPool::new(4);
        assert_eq!(pool.size(), 4);
        for i in 0..4 {
            let frame = pool.frame(BufferId::new(i));
            assert_eq!(frame.usage_count(), 0);
            assert!(!frame.is_pinned());
        }
    }

    #[test]
    #[should_panic(expected = "pool_size must be > 0")]
    fn test_zero_size_pool_panics() {
        BufferPool::new(0);
    }

    #[test]
    fn test_evict_picks_zero_usage_frame() {
        let pool = BufferPool::new(3);
        pool.frame(BufferId::new(0)).set_usage(1);

        // Frame 0 has usage 1, frames 1 and 2 have 0; hand starts at 0, ages
        // frame 0 and lands on frame 1.
        assert_eq!(pool.evict().unwrap(), BufferId::new(1));
        assert_eq!(pool.frame(BufferId::new(0)).usage_count(), 0);
    }

    #[test]
    fn test_evict_ages_until_zero() {
        let pool = BufferPool::new(2);
        pool.frame(BufferId::new(0)).set_usage(2);
        pool.frame(BufferId::new(1)).set_usage(3);

        // Repeated sweeps age both frames down; frame 0 reaches zero first.
        assert_eq!(pool.evict().unwrap(), BufferId::new(0));
        assert_eq!(pool.frame(BufferId::new(1)).usage_count(), 1);
    }

    #[test]
    fn test_evict_skips_pinned_frames() {
        let pool = BufferPool::new(2);
        pool.frame(BufferId::new(0)).set_usage(1);
        pool.frame(BufferId::new(1)).set_usage(1);

        let _pin = pool.frame(BufferId::new(0)).buffer().write().unwrap();

        // Frame 0 is pinned and keeps its count; frame 1 ages to zero.
        assert_eq!(pool.evict().unwrap(), BufferId::new(1));
        assert_eq!(pool.frame(BufferId::new(0)).usage_count(), 1);
    }

    #[test]
    fn test_evict_fails_when_all_pinned() {
        let pool = BufferPool::new(3);
        let mut pins = Vec::new();
        for i in 0..3 {
            let frame = pool.frame(BufferId::new(i));
            frame.set_usage(1);
            pins.push(frame.buffer().write().unwrap());
        }

        assert!(matches!(pool.evict(), Err(Error::NoEvictableFrame)));

        // A failed scan leaves the pool untouched.
        for i in 0..3 {
            assert_eq!(pool.frame(BufferId::new(i)).usage_count(), 1);
        }
        drop(pins);
        assert_eq!(pool.evict().unwrap(), BufferId::new(0));
    }

    #[test]
    fn test_evict_single_frame_pool() {
        let pool = BufferPool::new(1);
        let frame = pool.frame(BufferId::new(0));
        frame.set_usage(1);

        {
            let _pin = frame.buffer().write().unwrap();
            assert!(pool.evict().is_err());
        }
        assert_eq!(pool.evict().unwrap(), BufferId::new(0));
    }
}
