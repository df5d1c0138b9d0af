//! Streaming decoder for BSB/KAP image files
//!
//! The file is read as a sequence of segments:
//!
//! 1. text lines terminated by `\r\n`, until `0x1A 0x00`
//! 2. one bit depth byte
//! 3. rows of `<row number token> <run token>* 0x00`
//! 4. the raster end token (see [`RasterEnd`])
//!
//! [`ChartDecoder`] can be fed arbitrary chunks of the file: whenever a
//! segment is cut by a chunk boundary, the decoder keeps what it has read and
//! continues with the next chunk. The free functions [`decode`],
//! [`decode_with`] and [`decode_cancellable`] drive it from any [`Read`].
//!
//! ```rust
//! let mut kap = b"VER/3.0\r\nBSB/NA=TEST,RA=3,1\r\nRGB/1,255,0,0\r\n".to_vec();
//! // header end, 4 bit depth, row 1: one run of color 1, three pixels long
//! kap.extend([0x1A, 0x00, 4, 0x01, (1 << 3) | 2, 0x00, 0x00]);
//!
//! let chart = libkap::decode(kap.as_slice())?;
//! assert_eq!(chart.bit_depth(), Some(4));
//! assert_eq!(chart.raster_segment()[&1][0].length(), 3);
//! # Ok::<(), libkap::Error>(())
//! ```

pub(crate) mod cursor;
mod options;
mod state;
pub mod token;

use std::{
    collections::btree_map,
    io::{self, Read},
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::{debug, info, instrument, trace, warn};

use crate::{
    chart::{Chart, RasterSegment, TextEntry},
    Error,
};
use cursor::ByteCursor;
pub use options::{DecodeOptions, DuplicateRows, RasterEnd, DEFAULT_CHUNK_SIZE};
use state::{Context, Emitted, State, Transition};

/// Incremental BSB/KAP decoder
///
/// Feed it chunks with [`ChartDecoder::feed`] and call
/// [`ChartDecoder::finish`] once the source is exhausted. Both consume the
/// decoder, so a failed decode leaves nothing behind.
#[derive(Debug)]
pub struct ChartDecoder {
    state: State,
    cursor: ByteCursor,
    options: DecodeOptions,
    text_segment: Vec<TextEntry>,
    bit_depth: Option<u8>,
    raster_segment: RasterSegment,
}

impl Default for ChartDecoder {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

impl ChartDecoder {
    /// Creates a new [`ChartDecoder`]
    #[must_use]
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            state: State::initial(),
            cursor: ByteCursor::new(),
            options,
            text_segment: Vec::new(),
            bit_depth: None,
            raster_segment: RasterSegment::new(),
        }
    }

    /// Decodes as much as possible of `chunk`, keeping incomplete lines or
    /// tokens for the next call
    ///
    /// Chunks fed after the raster end token are dropped.
    ///
    /// # Errors
    ///
    /// Returns the first format error met in the data received so far
    pub fn feed(mut self, chunk: &[u8]) -> Result<Self, Error> {
        if self.is_done() {
            trace!("ignoring {} bytes after the raster end", chunk.len());
            return Ok(self);
        }
        trace!("feeding {} bytes", chunk.len());
        self.cursor.extend(chunk);
        self.run()?;
        Ok(self)
    }

    /// Returns `true` once the raster end token was read
    ///
    /// Bytes after it (the row index table) are not needed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Number of bytes consumed so far
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Marks the end of the source and returns the decoded [`Chart`]
    ///
    /// # Errors
    ///
    /// Fails if the source ended before the raster end token, with the error
    /// matching the segment that was being read
    pub fn finish(mut self) -> Result<Chart, Error> {
        self.cursor.finish();
        self.run()?;
        if !self.is_done() {
            debug!("source ended at byte {} in {:?}", self.position(), self.state);
            return Err(self.state.exhausted());
        }
        info!(
            "decoded {} text entries and {} rows",
            self.text_segment.len(),
            self.raster_segment.len()
        );
        Ok(Chart::new(
            self.text_segment,
            self.bit_depth,
            self.raster_segment,
        ))
    }

    fn run(&mut self) -> Result<(), Error> {
        while !self.is_done() {
            let ctx = Context {
                bit_depth: self.bit_depth,
                raster_end: self.options.raster_end(),
            };
            let state = std::mem::replace(&mut self.state, State::Done);
            match state.step(&mut self.cursor, ctx)? {
                Transition::Next(next, emitted) => {
                    self.state = next;
                    if let Some(emitted) = emitted {
                        self.accept(emitted)?;
                    }
                }
                Transition::Suspend(state) => {
                    self.state = state;
                    break;
                }
            }
        }
        self.cursor.compact();
        Ok(())
    }

    fn accept(&mut self, emitted: Emitted) -> Result<(), Error> {
        match emitted {
            Emitted::Entry(entry) => self.text_segment.push(entry),
            Emitted::BitDepth(depth) => self.bit_depth = Some(depth),
            Emitted::Row(row, runs) => match self.raster_segment.entry(row) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(runs);
                }
                btree_map::Entry::Occupied(mut slot) => match self.options.duplicate_rows() {
                    DuplicateRows::Overwrite => {
                        warn!("raster row {row} appears more than once, keeping the last one");
                        slot.insert(runs);
                    }
                    DuplicateRows::Reject => return Err(Error::DuplicateRow(row)),
                },
            },
        }
        Ok(())
    }
}

/// Decodes a [`Chart`] from a reader with the default [`DecodeOptions`]
///
/// # Errors
///
/// See [`crate::Error`]
pub fn decode(r: impl Read) -> Result<Chart, Error> {
    decode_with(r, &DecodeOptions::default())
}

/// Decodes a [`Chart`] from a reader
///
/// # Errors
///
/// See [`crate::Error`]
#[instrument(skip(r), level = "debug")]
pub fn decode_with(r: impl Read, options: &DecodeOptions) -> Result<Chart, Error> {
    drive(r, options, || false)
}

/// Decodes a [`Chart`] from a reader, checking `cancel` before every read
///
/// # Errors
///
/// Returns [`Error::Cancelled`] when `cancel` is set before the chart is
/// complete. See [`crate::Error`] for the other errors
#[instrument(skip(r, cancel), level = "debug")]
pub fn decode_cancellable(
    r: impl Read,
    options: &DecodeOptions,
    cancel: &AtomicBool,
) -> Result<Chart, Error> {
    drive(r, options, || cancel.load(Ordering::Relaxed))
}

fn drive(
    mut r: impl Read,
    options: &DecodeOptions,
    is_cancelled: impl Fn() -> bool,
) -> Result<Chart, Error> {
    let mut decoder = ChartDecoder::new(*options);
    let mut chunk = vec![0; options.chunk_size().max(1)];
    while !decoder.is_done() {
        if is_cancelled() {
            debug!("decode cancelled at byte {}", decoder.position());
            return Err(Error::Cancelled);
        }
        let read = match r.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        decoder = decoder.feed(&chunk[..read])?;
    }
    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: [u8; 7] = [crate::CTRL_Z, 0x00, 4, 0x01, 0x0A, 0x00, 0x00];

    #[test]
    fn bytes_after_raster_end_are_not_buffered() -> Result<(), Error> {
        let mut decoder = ChartDecoder::default().feed(&CHART)?;
        assert!(decoder.is_done());
        assert_eq!(decoder.cursor.peek_byte(), None);

        for _ in 0..4 {
            decoder = decoder.feed(&[0x00, 0x00, 0x00, 0x07])?;
        }
        assert_eq!(decoder.cursor.peek_byte(), None);
        assert_eq!(decoder.position(), CHART.len());
        assert_eq!(decoder.finish()?.raster_segment().len(), 1);
        Ok(())
    }

    #[test]
    fn trailing_bytes_in_the_last_chunk_are_left_unread() -> Result<(), Error> {
        let mut kap = CHART.to_vec();
        kap.extend([0x00, 0x00, 0x00, 0x03]);
        let decoder = ChartDecoder::default().feed(&kap)?;
        assert!(decoder.is_done());
        assert_eq!(decoder.position(), CHART.len());
        let decoder = decoder.feed(&[0x01; 64])?;
        assert_eq!(decoder.cursor.peek_byte(), Some(0x00));
        assert_eq!(decoder.position(), CHART.len());
        Ok(())
    }
}
