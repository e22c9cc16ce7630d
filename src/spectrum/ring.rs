//! # Mirror-Mapped Ring Buffers
//!
//! The front-end's input ring and the narrowband downconverter's baseband
//! ring are both *mirror-mapped*: logically, the backing storage is laid
//! out twice back-to-back, so any window of up to `capacity` samples
//! ending at an arbitrary offset can be read as one contiguous slice, even
//! across the wrap point. The real front end would achieve this with a
//! double virtual-memory mapping of one physical allocation (§5, §9); here
//! the mirror is just kept as an explicit second copy, which gives the
//! same read contract without `unsafe`.
//!
//! One producer (`write`), many readers that only look backward from the
//! current write position — no lock is needed beyond ordinary `&mut`
//! exclusivity on the writer side, matching the single-writer assumption
//! in the concurrency model.

use num_complex::Complex32;

/// A fixed-capacity ring over `T`, mirrored so backward-looking reads are
/// always contiguous.
#[derive(Debug, Clone)]
pub struct MirrorRing<T> {
    capacity: usize,
    buf: Vec<T>,
    write_pos: usize,
    filled: usize,
}

impl<T: Copy + Default> MirrorRing<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        MirrorRing {
            capacity,
            buf: vec![T::default(); capacity * 2],
            write_pos: 0,
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples written so far, capped at `capacity`.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Appends `samples`, keeping both mirror halves in sync. Samples
    /// beyond `capacity` in one call simply wrap multiple times.
    pub fn write(&mut self, samples: &[T]) {
        for &s in samples {
            self.buf[self.write_pos] = s;
            self.buf[self.write_pos + self.capacity] = s;
            self.write_pos = (self.write_pos + 1) % self.capacity;
            self.filled = (self.filled + 1).min(self.capacity);
        }
    }

    /// Returns `len` contiguous samples ending `back_offset` samples
    /// behind the current write pointer (`back_offset == 0` means the
    /// window ends at the most recently written sample). Panics if the
    /// request would read samples never written or `len > capacity`.
    pub fn read_window(&self, len: usize, back_offset: usize) -> &[T] {
        assert!(len <= self.capacity, "window longer than ring capacity");
        assert!(
            len + back_offset <= self.filled,
            "window reaches before the oldest written sample"
        );
        // end index (exclusive) in the *logical* (unwrapped) timeline,
        // relative to write_pos, is `write_pos - back_offset`; taking it
        // modulo capacity and adding capacity keeps it in the mirror's
        // valid upper half so the slice of `len` never wraps.
        let end = (self.write_pos + self.capacity - back_offset) % self.capacity + self.capacity;
        let start = end - len;
        &self.buf[start..end]
    }
}

pub type FrontEndRing = MirrorRing<Complex32>;
pub type RealFrontEndRing = MirrorRing<f32>;
pub type BasebandRing = MirrorRing<Complex32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_window_is_contiguous_across_wrap() {
        let mut ring: MirrorRing<i32> = MirrorRing::new(8);
        ring.write(&[1, 2, 3, 4, 5, 6, 7, 8]);
        // write pointer wrapped back to 0; write a few more to force the
        // read window to straddle the physical wrap point.
        ring.write(&[9, 10]);
        let w = ring.read_window(4, 0);
        assert_eq!(w, &[7, 8, 9, 10]);
    }

    #[test]
    fn back_offset_selects_older_window() {
        let mut ring: MirrorRing<i32> = MirrorRing::new(8);
        ring.write(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let w = ring.read_window(4, 4);
        assert_eq!(w, &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic]
    fn reading_before_oldest_sample_panics() {
        let mut ring: MirrorRing<i32> = MirrorRing::new(8);
        ring.write(&[1, 2, 3]);
        let _ = ring.read_window(4, 0);
    }

    #[test]
    fn filled_caps_at_capacity() {
        let mut ring: MirrorRing<i32> = MirrorRing::new(4);
        ring.write(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(ring.filled(), 4);
    }
}
