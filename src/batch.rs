//! Concatenation buffer rendered as a bracketed, comma-separated list.

use bytes::Bytes;

const COMMA: u8 = b',';

/// A mutable buffer that accumulates records and renders them as
/// `[r1,r2,...,rk]` for bulk transmission.
pub struct Batch {
    buf: Vec<u8>,
}

impl Batch {
    /// Create an empty batch with `capacity` bytes pre-reserved.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append a record, inserting a separating comma if this is not the
    /// first record in the batch.
    pub fn append(&mut self, data: &[u8]) {
        if !self.buf.is_empty() {
            self.append_comma();
        }
        self.buf.extend_from_slice(data);
    }

    /// Render the batch as `[<contents>]`.
    ///
    /// Returns a cheaply-cloneable [`Bytes`]: the same rendered batch is
    /// typically handed to both a transport send attempt and, on failure, to
    /// storage, without re-copying the payload for the second consumer.
    pub fn bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.buf.len() + 2);
        out.push(b'[');
        out.extend_from_slice(&self.buf);
        out.push(b']');
        Bytes::from(out)
    }

    /// Length of the rendered batch: the contents plus the two brackets.
    pub fn len(&self) -> usize {
        self.buf.len() + 2
    }

    /// A batch with no appended records still renders as `[]`, so it is
    /// never empty in the rendered sense. This reports whether any record
    /// has been appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Restore empty contents, retaining the underlying allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    fn append_comma(&mut self) {
        if self.buf.last() != Some(&COMMA) {
            self.buf.push(COMMA);
        }
    }
}
