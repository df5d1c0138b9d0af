use std::{collections::BTreeMap, fs::File, io::BufReader, io::Read, path::Path};

use crate::{
    decode::{decode_with, DecodeOptions},
    metadata::{extract_metadata, Metadata},
    palette::Palette,
    render::render_row_rgba,
    Error,
};

/// Rows of the raster segment, keyed by their 1-based row number
pub type RasterSegment = BTreeMap<u32, Vec<RasterRun>>;

/// A group of header lines sharing one record type
///
/// `entry_type` is the text before the first `/` of the record's first line
/// (e.g. `BSB`, `RGB`, `K01`), `!` for comment lines and `?` for lines without
/// a type delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextEntry {
    entry_type: String,
    lines: Vec<String>,
}

impl TextEntry {
    /// Creates a new [`TextEntry`]
    pub fn new<T, L, S>(entry_type: T, lines: L) -> Self
    where
        T: Into<String>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entry_type: entry_type.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the record type code
    #[must_use]
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    /// Returns the lines of the record, continuation lines included
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }
}

/// A horizontal run of pixels sharing one palette index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterRun {
    color_index: u8,
    length: u32,
}

impl RasterRun {
    /// Creates a new [`RasterRun`]
    #[must_use]
    pub const fn new(color_index: u8, length: u32) -> Self {
        Self {
            color_index,
            length,
        }
    }

    /// Palette index of the run (0..=127)
    #[must_use]
    pub const fn color_index(&self) -> u8 {
        self.color_index
    }

    /// Number of pixels covered by the run
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }
}

/// A decoded BSB/KAP image file
///
/// Holds the header entries in file order, the declared bit depth and the
/// run-length encoded rows. Use [`Chart::metadata`] to get typed header
/// values and [`Chart::render_row_rgba`] to turn rows into pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chart {
    text_segment: Vec<TextEntry>,
    bit_depth: Option<u8>,
    raster_segment: RasterSegment,
}

impl Chart {
    pub(crate) const fn new(
        text_segment: Vec<TextEntry>,
        bit_depth: Option<u8>,
        raster_segment: RasterSegment,
    ) -> Self {
        Self {
            text_segment,
            bit_depth,
            raster_segment,
        }
    }

    /// Tries to decode a [`Chart`] from a reader with the default [`DecodeOptions`]
    ///
    /// # Errors
    ///
    /// See [`crate::Error`]
    pub fn from_reader(r: impl Read) -> Result<Self, Error> {
        decode_with(r, &DecodeOptions::default())
    }

    /// Tries to decode a [`Chart`] from the provided file path
    ///
    /// # Errors
    ///
    /// This function will error if the file cannot be opened or if it contains invalid data.
    /// See [`Self::from_reader`] for potential errors
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self, Error> {
        let file = File::open(filename)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Returns the header entries in file order
    #[must_use]
    pub fn text_segment(&self) -> &[TextEntry] {
        &self.text_segment
    }

    /// Returns the bit depth byte that followed the header
    #[must_use]
    pub const fn bit_depth(&self) -> Option<u8> {
        self.bit_depth
    }

    /// Returns the decoded rows
    #[must_use]
    pub const fn raster_segment(&self) -> &RasterSegment {
        &self.raster_segment
    }

    /// Runs the built-in metadata extractors over the header entries
    #[must_use]
    pub fn metadata(&self) -> Metadata {
        extract_metadata(&self.text_segment)
    }

    /// Renders the 0-based output row `row` into `buffer` as RGBA pixels
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is shorter than the total run length of the row.
    /// See [`crate::render_row`]
    pub fn render_row_rgba(&self, palette: &Palette, row: u32, buffer: &mut [[u8; 4]]) {
        render_row_rgba(&self.raster_segment, palette, row, buffer);
    }
}
