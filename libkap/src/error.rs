use crate::decode::token::TokenError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Possible `libkap` errors
///
/// Every variant is terminal for the decode that produced it: the accumulated
/// chart is dropped and never handed out partially.
pub enum Error {
    /// The source ended before the text segment terminator (`0x1A 0x00`)
    #[error("source ended inside the text segment (missing 0x1A 0x00 terminator)")]
    MalformedTextSegment,
    /// The source ended right after the text segment, before the bit depth byte
    #[error("source ended before the bit depth byte")]
    MissingBitDepth,
    /// A run token was decoded with a bit depth outside of `1..=7`
    #[error("bit depth {0} cannot be used to decode raster runs (expected 1..=7)")]
    InvalidBitDepth(u8),
    /// A raster row held no token before its end-of-row byte, or one of its
    /// tokens could not be decoded
    #[error("malformed raster row at byte {position}")]
    MalformedRow {
        /// Absolute offset of the offending token in the source
        position: usize,
    },
    /// The source ended inside the raster segment
    #[error("unexpected end of source inside the raster segment")]
    UnexpectedEndOfSource,
    /// A row number appeared twice while [`crate::DuplicateRows::Reject`] was set
    #[error("raster row {0} appears more than once")]
    DuplicateRow(u32),
    /// The decode was cancelled before the chart was complete
    #[error("decoding was cancelled")]
    Cancelled,
    /// Error returned by the underlying reader
    #[error("failed to read from source")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) const fn from_token(err: TokenError, position: usize) -> Self {
        match err {
            TokenError::InvalidBitDepth(depth) => Self::InvalidBitDepth(depth),
            TokenError::Empty | TokenError::Unterminated | TokenError::Overflow => {
                Self::MalformedRow { position }
            }
        }
    }
}
