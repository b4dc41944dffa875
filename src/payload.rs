//! The buffer set a client sends each round.
//!
//! A payload is `buffer_count` segments of `buffer_size` bytes stored
//! contiguously, so the same memory can be handed to one large write, to
//! one write per segment, or to a single scatter write.

use bytes::{BufMut, Bytes, BytesMut};
use std::io::IoSlice;

/// Fixed payload of equally sized segments.
#[derive(Debug, Clone)]
pub struct Payload {
    data: Bytes,
    segment_size: usize,
}

impl Payload {
    /// Build a payload filled with a repeating byte pattern.
    ///
    /// # Arguments
    /// * `segment_count` - Number of buffers
    /// * `segment_size` - Size of each buffer in bytes
    pub fn new(segment_count: usize, segment_size: usize) -> Self {
        let len = segment_count * segment_size;
        let mut data = BytesMut::with_capacity(len);
        // 251 is prime, so the pattern does not line up with segment boundaries
        for i in 0..len {
            data.put_u8((i % 251) as u8);
        }

        Self {
            data: data.freeze(),
            segment_size,
        }
    }

    /// Total bytes in one round.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        if self.segment_size == 0 {
            0
        } else {
            self.data.len() / self.segment_size
        }
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// The whole round as one contiguous slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over the individual segments.
    pub fn segments(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks(self.segment_size.max(1))
    }

    /// Create IoSlice views for scatter-gather I/O.
    ///
    /// Returns slices starting from the given byte offset (for resuming
    /// partial writes). The first slice may be a tail of a segment.
    pub fn io_slices(&self, start_offset: usize) -> Vec<IoSlice<'_>> {
        if start_offset >= self.data.len() {
            return Vec::new();
        }

        let mut slices = Vec::with_capacity(self.segment_count());
        let mut skip = start_offset;

        for segment in self.segments() {
            if skip >= segment.len() {
                skip -= segment.len();
                continue;
            }
            slices.push(IoSlice::new(&segment[skip..]));
            skip = 0;
        }

        slices
    }
}
