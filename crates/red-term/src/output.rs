// SPDX-License-Identifier: MIT
//
// Output buffering.
//
// Every escape sequence the editor emits goes through `OutputBuffer`, which
// holds bytes until the frame is done and hands them to the device in a
// single `write()` call. The buffer is sized once from screen geometry and
// never grows: an append that would overflow it flushes what is already
// there first, so the buffered length never exceeds capacity and bytes reach
// the device in exactly the order they were appended.
//
// A flush issues one write and then forgets the buffered bytes, however many
// the device accepted. Short writes are logged, not retried.

use std::io::Write;

use tracing::{trace, warn};

use crate::ansi;
use crate::config::Geometry;
use crate::error::{Result, TermError};

/// Fixed-capacity byte accumulator for terminal output.
#[derive(Debug)]
pub struct OutputBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl OutputBuffer {
    /// Allocate a buffer holding up to `capacity` bytes.
    ///
    /// Capacity is raised to [`ansi::SEQUENCE_MAX`] if smaller, so any
    /// single escape sequence fits without being split.
    ///
    /// # Errors
    ///
    /// [`TermError::AllocationFailed`] if the memory can't be reserved.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(ansi::SEQUENCE_MAX);
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| TermError::AllocationFailed { capacity })?;
        Ok(Self { buf, capacity })
    }

    /// Allocate a buffer sized for one frame of `geometry`.
    ///
    /// # Errors
    ///
    /// [`TermError::AllocationFailed`] if the memory can't be reserved, or
    /// if the frame size overflows `usize` (reported as `usize::MAX`).
    pub fn for_geometry(geometry: Geometry) -> Result<Self> {
        let capacity = geometry
            .buffer_capacity()
            .ok_or(TermError::AllocationFailed {
                capacity: usize::MAX,
            })?;
        Self::with_capacity(capacity)
    }

    /// Maximum number of bytes held before a flush.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes waiting to be flushed.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The pending bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append `bytes`, flushing to `out` first if they wouldn't fit.
    ///
    /// Input longer than the whole capacity is taken in capacity-sized
    /// pieces, each flushed before the next goes in.
    ///
    /// # Errors
    ///
    /// [`TermError::WriteFailed`] if a flush triggered by the append fails.
    pub fn append(&mut self, out: &mut impl Write, bytes: &[u8]) -> Result<()> {
        for chunk in bytes.chunks(self.capacity) {
            if self.buf.len() + chunk.len() > self.capacity {
                self.flush(out)?;
            }
            self.buf.extend_from_slice(chunk);
        }
        Ok(())
    }

    /// Write the pending bytes to `out` in one call and empty the buffer.
    ///
    /// Returns the number of bytes the writer accepted. The buffer is emptied
    /// even when that is fewer than were pending, or when the write fails.
    ///
    /// # Errors
    ///
    /// [`TermError::WriteFailed`] if the write itself fails.
    pub fn flush(&mut self, out: &mut impl Write) -> Result<usize> {
        if self.buf.is_empty() {
            return Ok(0);
        }

        let pending = self.buf.len().min(self.capacity);
        let result = out.write(&self.buf[..pending]);
        self.buf.clear();

        let written = result.map_err(TermError::WriteFailed)?;
        if written < pending {
            warn!(written, pending, "short write to terminal, remainder dropped");
        } else {
            trace!(written, "flushed output");
        }
        Ok(written)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDevice;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_buffer_is_empty() {
        let buf = OutputBuffer::with_capacity(64).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn default_geometry_capacity() {
        let buf = OutputBuffer::for_geometry(Geometry::DEFAULT).unwrap();
        assert_eq!(buf.capacity(), 24 * 80 * 2);
    }

    #[test]
    fn env_geometry_capacity() {
        let g = Geometry::from_vars(Some("40"), Some("120"));
        let buf = OutputBuffer::for_geometry(g).unwrap();
        assert_eq!(buf.capacity(), 40 * 120 * 2);
    }

    #[test]
    fn tiny_capacity_is_raised_to_one_sequence() {
        let buf = OutputBuffer::with_capacity(0).unwrap();
        assert_eq!(buf.capacity(), ansi::SEQUENCE_MAX);
    }

    #[test]
    fn impossible_allocation_fails() {
        let err = OutputBuffer::with_capacity(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            TermError::AllocationFailed { capacity: usize::MAX }
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "32")]
    fn overflowing_geometry_fails_allocation() {
        let g = Geometry { rows: u16::MAX, cols: u16::MAX };
        let err = OutputBuffer::for_geometry(g).unwrap_err();
        assert!(matches!(
            err,
            TermError::AllocationFailed { capacity: usize::MAX }
        ));
    }

    #[test]
    fn append_within_capacity_does_not_write() {
        let mut dev = FakeDevice::new();
        let mut buf = OutputBuffer::with_capacity(32).unwrap();

        buf.append(&mut dev, b"\x1b[2J").unwrap();
        buf.append(&mut dev, b"\x1b[1;1H").unwrap();

        assert_eq!(buf.as_bytes(), b"\x1b[2J\x1b[1;1H");
        assert!(dev.journal().writes().is_empty());
    }

    #[test]
    fn append_that_would_overflow_flushes_first() {
        let mut dev = FakeDevice::new();
        let mut buf = OutputBuffer::with_capacity(16).unwrap();

        buf.append(&mut dev, b"0123456789").unwrap();
        buf.append(&mut dev, b"abcdefghij").unwrap();

        assert_eq!(dev.journal().writes(), vec![b"0123456789".as_slice()]);
        assert_eq!(buf.as_bytes(), b"abcdefghij");
    }

    #[test]
    fn append_filling_exactly_does_not_flush() {
        let mut dev = FakeDevice::new();
        let mut buf = OutputBuffer::with_capacity(16).unwrap();

        buf.append(&mut dev, b"01234567").unwrap();
        buf.append(&mut dev, b"89abcdef").unwrap();

        assert_eq!(buf.len(), 16);
        assert!(dev.journal().writes().is_empty());
    }

    #[test]
    fn oversized_append_is_chunked() {
        let mut dev = FakeDevice::new();
        let mut buf = OutputBuffer::with_capacity(16).unwrap();
        let big: Vec<u8> = (0..40u8).collect();

        buf.append(&mut dev, b"xy").unwrap();
        buf.append(&mut dev, &big).unwrap();
        buf.flush(&mut dev).unwrap();

        let journal = dev.journal();
        assert!(journal.writes().iter().all(|w| w.len() <= 16));
        let mut expected = b"xy".to_vec();
        expected.extend_from_slice(&big);
        assert_eq!(journal.written(), expected);
    }

    #[test]
    fn many_appends_preserve_order_and_never_exceed_capacity() {
        let mut dev = FakeDevice::new();
        let mut buf = OutputBuffer::with_capacity(37).unwrap();
        let mut expected = Vec::new();

        for i in 0..200u16 {
            let seq = ansi::cursor_position(i % 50, i).unwrap();
            buf.append(&mut dev, seq.as_bytes()).unwrap();
            expected.extend_from_slice(seq.as_bytes());
            assert!(buf.len() <= buf.capacity());
        }
        buf.flush(&mut dev).unwrap();

        let journal = dev.journal();
        assert!(journal.writes().len() > 1, "should have flushed mid-way");
        assert!(journal.writes().iter().all(|w| w.len() <= 37));
        assert_eq!(journal.written(), expected);
    }

    #[test]
    fn flush_writes_once_and_resets() {
        let mut dev = FakeDevice::new();
        let mut buf = OutputBuffer::with_capacity(32).unwrap();
        buf.append(&mut dev, b"frame").unwrap();

        let n = buf.flush(&mut dev).unwrap();

        assert_eq!(n, 5);
        assert!(buf.is_empty());
        assert_eq!(dev.journal().writes(), vec![b"frame".as_slice()]);
    }

    #[test]
    fn flush_empty_is_noop() {
        let mut dev = FakeDevice::new();
        let mut buf = OutputBuffer::with_capacity(32).unwrap();
        assert_eq!(buf.flush(&mut dev).unwrap(), 0);
        assert!(dev.journal().entries.is_empty());
    }

    #[test]
    fn short_write_drops_remainder() {
        let mut dev = FakeDevice::new().short_writes(3);
        let mut buf = OutputBuffer::with_capacity(32).unwrap();
        buf.append(&mut dev, b"abcdef").unwrap();

        let n = buf.flush(&mut dev).unwrap();

        assert_eq!(n, 3);
        assert!(buf.is_empty());
        assert_eq!(dev.journal().written(), b"abc");
    }

    #[test]
    fn failed_write_still_resets() {
        let mut dev = FakeDevice::new().fail_writes();
        let mut buf = OutputBuffer::with_capacity(32).unwrap();
        buf.append(&mut dev, b"abc").unwrap();

        let err = buf.flush(&mut dev).unwrap_err();

        assert!(matches!(err, TermError::WriteFailed(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn overflow_flush_failure_propagates() {
        let mut dev = FakeDevice::new().fail_writes();
        let mut buf = OutputBuffer::with_capacity(16).unwrap();
        buf.append(&mut dev, b"0123456789").unwrap();

        let err = buf.append(&mut dev, b"0123456789").unwrap_err();
        assert!(matches!(err, TermError::WriteFailed(_)));
    }
}
