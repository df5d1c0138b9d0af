//! # libkap
//!
//! This library decodes the `MapTech` BSB/KAP file format, an older format used for naval raster
//! navigational charts (RNC), into its header entries and run-length encoded rows.
//!
//! A KAP file is made of an ASCII header (record lines such as `BSB/NA=...` or `RGB/1,0,0,0`,
//! terminated by `0x1A 0x00`), a bit depth byte, and a raster segment where every row is a list
//! of palette index runs. This crate keeps those three parts as they are in the file
//! ([`Chart`]), derives typed values out of the header on request ([`Metadata`]) and turns rows
//! into pixels ([`render_row`]).
//!
//! ### History
//!
//! It is frustratingly hard to find a formal specification for the `MapTech` BSB/KAP file format. Since the early
//! 2000s, multiple projects have implemented libraries for read operations on the KAP format; examples
//! include [libbsb](https://libbsb.sourceforge.net/) ([also mirrored on github](https://github.com/nohal/libbsb)), [imgkap](https://github.com/nohal/imgkap),
//! and the [bsb module of GDAL](https://github.com/OSGeo/gdal/tree/master/frmts/bsb). Where they
//! disagree (the raster end marker, in particular), [`DecodeOptions`] lets the caller choose.
//!
//! ### Usage
//!
//! #### Converting a BSB/KAP image file to an image
//!
//! ```rust
//! use libkap::{Chart, ColorPalette};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut kap = b"BSB/NA=TEST,RA=2,2\r\nRGB/1,255,255,255\r\nRGB/2,0,0,255\r\n".to_vec();
//!     // bit depth 2, two rows of two pixels
//!     kap.extend([0x1A, 0x00, 2, 0x01, 0x21, 0x00, 0x02, 0x20, 0x40, 0x00, 0x00]);
//!     let chart = Chart::from_reader(kap.as_slice())?;
//!
//!     let metadata = chart.metadata();
//!     let size = metadata.size.expect("RA= is set");
//!     let palette = metadata
//!         .palette_for(ColorPalette::Rgb)
//!         .cloned()
//!         .unwrap_or_default();
//!
//!     let mut rgba = vec![[0; 4]; (size.width * size.height) as usize];
//!     for (row, pixels) in rgba.chunks_mut(size.width as usize).enumerate() {
//!         chart.render_row_rgba(&palette, row as u32, pixels);
//!     }
//!     assert_eq!(rgba[0], [255, 255, 255, 255]);
//!     assert_eq!(rgba[3], [0, 0, 255, 255]);
//!     Ok(())
//! }
//! ```
//!
//! #### Decoding in chunks
//!
//! [`ChartDecoder`] accepts the file in pieces of any size, for sources that are not a
//! [`std::io::Read`]. See the [`decode` module](mod@decode).
//!
//! #### Unstable API
//!
//! This crate is still very much a work-in-progress. Expect breaking changes between minor
//! releases until`v1.0`. The metadata types carry the `#[non_exhaustive]` attribute and
//! implement the builder pattern.
//!
//!

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

mod chart;
pub mod decode;
mod error;
/// Typed header values and the extractors producing them
pub mod metadata;
mod palette;
mod render;

pub use chart::{Chart, RasterRun, RasterSegment, TextEntry};
pub use decode::{
    decode, decode_cancellable, decode_with, ChartDecoder, DecodeOptions, DuplicateRows,
    RasterEnd,
};
pub use error::Error;
pub use metadata::{extract_metadata, Metadata};
pub use palette::{ColorPalette, Palette, Rgb};
pub use render::{render_row, render_row_rgba};

const CTRL_Z: u8 = 0x1a;
// Carriage return and line feed (BSB/KAP files use windows-style linebreaks)
const CRLF: &[u8] = b"\r\n";
