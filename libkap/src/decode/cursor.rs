//! Positioned access to the bytes received so far
//!
//! Lookups return `None` when the buffered bytes are not enough to answer and
//! the source is still open; the decoder then suspends until the next chunk.
//! Once [`ByteCursor::finish`] is called, a partial match is a definite miss.

use super::token::CONTINUATION_BIT;

#[derive(Debug, Default)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
    // bytes dropped from the front of `buf` by `compact`
    discarded: usize,
    end_of_source: bool,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next chunk of the source
    pub fn extend(&mut self, chunk: &[u8]) {
        debug_assert!(!self.end_of_source, "chunk pushed after end of source");
        self.buf.extend_from_slice(chunk);
    }

    /// Marks the source as exhausted: no more chunks will follow
    pub fn finish(&mut self) {
        self.end_of_source = true;
    }

    /// Absolute offset of the next unread byte
    pub const fn position(&self) -> usize {
        self.discarded + self.pos
    }

    fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Zero-advance check for a literal token
    pub fn is_next(&self, token: &[u8]) -> Option<bool> {
        let remaining = self.remaining();
        if remaining.len() >= token.len() {
            return Some(remaining.starts_with(token));
        }
        if token.starts_with(remaining) && !self.end_of_source {
            return None;
        }
        Some(false)
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.remaining().first().copied()
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        Some(b)
    }

    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.buf.len());
        self.pos += n;
    }

    pub fn rewind(&mut self, n: usize) {
        debug_assert!(n <= self.pos);
        self.pos -= n;
    }

    /// Reads everything up to `delimiter`, consuming the delimiter too
    ///
    /// Leaves the cursor untouched when the delimiter is not buffered yet.
    pub fn read_until(&mut self, delimiter: &[u8]) -> Option<&[u8]> {
        let start = self.pos;
        let found = self
            .remaining()
            .windows(delimiter.len())
            .position(|w| w == delimiter)?;
        self.pos = start + found + delimiter.len();
        Some(&self.buf[start..start + found])
    }

    /// Reads one continuation-bit token
    ///
    /// A token cut off by the end of the buffer is rewound so it can be read
    /// again whole once more bytes arrive.
    pub fn read_token(&mut self) -> Option<&[u8]> {
        let start = self.pos;
        loop {
            let Some(b) = self.read_byte() else {
                self.rewind(self.pos - start);
                return None;
            };
            if b & CONTINUATION_BIT == 0 {
                break;
            }
        }
        Some(&self.buf[start..self.pos])
    }

    /// Drops the bytes already consumed
    pub fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.discarded += self.pos;
            self.pos = 0;
        }
    }
}
