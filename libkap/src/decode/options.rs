use bon::Builder;

/// Size of the chunks pulled from a reader by [`super::decode_with`]
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Default, Debug, Eq, PartialEq, Copy, Clone)]
/// How the end of the raster segment is marked
///
/// Files written by different BSB revisions disagree here. Version 3.07 files
/// go straight from the last row to the row index table, whose first offset
/// starts with a null byte; other writers emit four null bytes first.
pub enum RasterEnd {
    /// A single `0x00` where a row number is expected
    #[default]
    Null,
    /// Four `0x00` bytes where a row number is expected
    QuadNull,
    /// Four null bytes when present, otherwise a single one
    Detect,
}

#[derive(Default, Debug, Eq, PartialEq, Copy, Clone)]
/// What to do when a row number appears twice in the raster segment
pub enum DuplicateRows {
    /// Keep the last row read (a warning is logged)
    #[default]
    Overwrite,
    /// Fail the decode with [`crate::Error::DuplicateRow`]
    Reject,
}

/// Options controlling a decode
///
/// ```rust
/// use libkap::{DecodeOptions, RasterEnd};
///
/// let options = DecodeOptions::builder()
///     .raster_end(RasterEnd::Detect)
///     .chunk_size(64 * 1024)
///     .build();
/// assert_eq!(options.raster_end(), RasterEnd::Detect);
/// ```
#[derive(Debug, Eq, PartialEq, Copy, Clone, Builder)]
pub struct DecodeOptions {
    #[builder(default)]
    raster_end: RasterEnd,
    #[builder(default)]
    duplicate_rows: DuplicateRows,
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DecodeOptions {
    /// Returns the raster end token policy
    #[must_use]
    pub const fn raster_end(&self) -> RasterEnd {
        self.raster_end
    }

    /// Returns the duplicate row policy
    #[must_use]
    pub const fn duplicate_rows(&self) -> DuplicateRows {
        self.duplicate_rows
    }

    /// Returns the number of bytes requested from a reader at a time
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
