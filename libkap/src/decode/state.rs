use tracing::{debug, trace, warn};

use super::{
    cursor::ByteCursor,
    options::RasterEnd,
    token::{decode_row_number, decode_run, MAX_BIT_DEPTH},
};
use crate::{
    chart::{RasterRun, TextEntry},
    Error, CRLF, CTRL_Z,
};

const TEXT_SEGMENT_END: [u8; 2] = [CTRL_Z, 0x00];
const ROW_END: u8 = 0x00;
const CONTINUATION_INDENT: &str = "    ";
const COMMENT_PREFIX: char = '!';
const TYPE_DELIMITER: char = '/';

pub const COMMENT_TYPE: &str = "!";
pub const UNKNOWN_TYPE: &str = "?";

/// Parser states, each carrying its in-progress accumulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    TextSegment { entry: Option<TextEntry> },
    BitDepth,
    RasterSegment,
    RasterRow { row: Option<u32>, runs: Vec<RasterRun> },
    Done,
}

/// Values handed to the decoder when a state completes one of them
#[derive(Debug, PartialEq, Eq)]
pub enum Emitted {
    Entry(TextEntry),
    BitDepth(u8),
    Row(u32, Vec<RasterRun>),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    Next(State, Option<Emitted>),
    /// Not enough bytes buffered, the state is handed back untouched
    Suspend(State),
}

#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub bit_depth: Option<u8>,
    pub raster_end: RasterEnd,
}

impl State {
    pub const fn initial() -> Self {
        Self::TextSegment { entry: None }
    }

    pub fn step(self, cursor: &mut ByteCursor, ctx: Context) -> Result<Transition, Error> {
        match self {
            Self::TextSegment { entry } => Ok(text_segment(entry, cursor)),
            Self::BitDepth => Ok(bit_depth(cursor)),
            Self::RasterSegment => Ok(raster_segment(cursor, ctx.raster_end)),
            Self::RasterRow { row: None, runs } => row_number(runs, cursor),
            Self::RasterRow {
                row: Some(row),
                runs,
            } => raster_run(row, runs, cursor, ctx),
            Self::Done => Ok(Transition::Suspend(Self::Done)),
        }
    }

    /// The error reported when the source ends while in this state
    pub const fn exhausted(&self) -> Error {
        match self {
            Self::TextSegment { .. } => Error::MalformedTextSegment,
            Self::BitDepth => Error::MissingBitDepth,
            Self::RasterSegment | Self::RasterRow { .. } | Self::Done => {
                Error::UnexpectedEndOfSource
            }
        }
    }
}

/// A header line, classified by its prefix
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Empty,
    Continuation(&'a str),
    Record { entry_type: &'a str, line: &'a str },
}

pub fn classify(line: &str) -> Line<'_> {
    if line.is_empty() {
        Line::Empty
    } else if let Some(rest) = line.strip_prefix(CONTINUATION_INDENT) {
        Line::Continuation(rest)
    } else if let Some(rest) = line.strip_prefix(COMMENT_PREFIX) {
        Line::Record {
            entry_type: COMMENT_TYPE,
            line: rest,
        }
    } else if let Some((entry_type, rest)) = line.split_once(TYPE_DELIMITER) {
        Line::Record {
            entry_type,
            line: rest,
        }
    } else {
        Line::Record {
            entry_type: UNKNOWN_TYPE,
            line,
        }
    }
}

fn text_segment(entry: Option<TextEntry>, cursor: &mut ByteCursor) -> Transition {
    match cursor.is_next(&TEXT_SEGMENT_END) {
        None => return Transition::Suspend(State::TextSegment { entry }),
        Some(true) => {
            cursor.advance(TEXT_SEGMENT_END.len());
            debug!("end of text segment at byte {}", cursor.position());
            return Transition::Next(State::BitDepth, entry.map(Emitted::Entry));
        }
        Some(false) => {}
    }

    let Some(line) = cursor.read_until(CRLF) else {
        return Transition::Suspend(State::TextSegment { entry });
    };
    let line = String::from_utf8_lossy(line);

    match classify(&line) {
        Line::Empty => Transition::Next(State::TextSegment { entry }, None),
        Line::Continuation(rest) => {
            let entry = match entry {
                Some(mut entry) => {
                    entry.push_line(rest.to_owned());
                    entry
                }
                None => {
                    warn!("continuation line without a record: {line:?}");
                    TextEntry::new(UNKNOWN_TYPE, [&*line])
                }
            };
            Transition::Next(State::TextSegment { entry: Some(entry) }, None)
        }
        Line::Record { entry_type, line } => {
            trace!("record {entry_type}");
            let next = TextEntry::new(entry_type, [line]);
            Transition::Next(
                State::TextSegment { entry: Some(next) },
                entry.map(Emitted::Entry),
            )
        }
    }
}

fn bit_depth(cursor: &mut ByteCursor) -> Transition {
    let Some(depth) = cursor.read_byte() else {
        return Transition::Suspend(State::BitDepth);
    };
    if (1..=MAX_BIT_DEPTH).contains(&depth) {
        debug!("bit depth: {depth}");
    } else {
        warn!("bit depth {depth} is outside of 1..=7, raster runs will not decode");
    }
    Transition::Next(State::RasterSegment, Some(Emitted::BitDepth(depth)))
}

/// Length of the raster end token at the cursor, `Some(0)` when absent
fn raster_end_len(cursor: &ByteCursor, raster_end: RasterEnd) -> Option<usize> {
    let single = |cursor: &ByteCursor| cursor.is_next(&[ROW_END]).map(usize::from);
    let quad = |cursor: &ByteCursor| cursor.is_next(&[ROW_END; 4]).map(|hit| 4 * usize::from(hit));
    match raster_end {
        RasterEnd::Null => single(cursor),
        RasterEnd::QuadNull => quad(cursor),
        RasterEnd::Detect => match quad(cursor)? {
            0 => single(cursor),
            n => Some(n),
        },
    }
}

fn raster_segment(cursor: &mut ByteCursor, raster_end: RasterEnd) -> Transition {
    match raster_end_len(cursor, raster_end) {
        None => Transition::Suspend(State::RasterSegment),
        Some(0) => Transition::Next(
            State::RasterRow {
                row: None,
                runs: Vec::new(),
            },
            None,
        ),
        Some(n) => {
            cursor.advance(n);
            debug!("end of raster segment at byte {}", cursor.position());
            Transition::Next(State::Done, None)
        }
    }
}

fn row_number(runs: Vec<RasterRun>, cursor: &mut ByteCursor) -> Result<Transition, Error> {
    let position = cursor.position();
    match cursor.peek_byte() {
        None => return Ok(Transition::Suspend(State::RasterRow { row: None, runs })),
        Some(ROW_END) => return Err(Error::MalformedRow { position }),
        Some(_) => {}
    }
    let Some(token) = cursor.read_token() else {
        return Ok(Transition::Suspend(State::RasterRow { row: None, runs }));
    };
    let row = decode_row_number(token).map_err(|e| Error::from_token(e, position))?;
    trace!("row {row} starts at byte {position}");
    Ok(Transition::Next(
        State::RasterRow {
            row: Some(row),
            runs,
        },
        None,
    ))
}

const fn suspended_row(row: u32, runs: Vec<RasterRun>) -> Transition {
    Transition::Suspend(State::RasterRow {
        row: Some(row),
        runs,
    })
}

fn raster_run(
    row: u32,
    mut runs: Vec<RasterRun>,
    cursor: &mut ByteCursor,
    ctx: Context,
) -> Result<Transition, Error> {
    match cursor.is_next(&[ROW_END]) {
        None => return Ok(suspended_row(row, runs)),
        Some(true) => {
            cursor.advance(1);
            return Ok(Transition::Next(
                State::RasterSegment,
                Some(Emitted::Row(row, runs)),
            ));
        }
        Some(false) => {}
    }

    let position = cursor.position();
    let Some(token) = cursor.read_token() else {
        return Ok(suspended_row(row, runs));
    };
    let depth = ctx.bit_depth.unwrap_or_default();
    let run = decode_run(token, depth).map_err(|e| Error::from_token(e, position))?;
    runs.push(run);
    Ok(Transition::Next(
        State::RasterRow {
            row: Some(row),
            runs,
        },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: Context = Context {
        bit_depth: Some(4),
        raster_end: RasterEnd::Null,
    };

    #[test]
    fn classifies_header_lines() {
        assert_eq!(classify(""), Line::Empty);
        assert_eq!(
            classify("    TA=90.000000,UN=METRES"),
            Line::Continuation("TA=90.000000,UN=METRES")
        );
        assert_eq!(
            classify("! An example BSB text header"),
            Line::Record {
                entry_type: "!",
                line: " An example BSB text header"
            }
        );
        assert_eq!(
            classify("KNP/SC=40000,GD=WGS84"),
            Line::Record {
                entry_type: "KNP",
                line: "SC=40000,GD=WGS84"
            }
        );
        assert_eq!(
            classify("CED/SE=70,RE=01,ED=11/01/2005"),
            Line::Record {
                entry_type: "CED",
                line: "SE=70,RE=01,ED=11/01/2005"
            }
        );
        assert_eq!(
            classify("NO DELIMITER HERE"),
            Line::Record {
                entry_type: "?",
                line: "NO DELIMITER HERE"
            }
        );
    }

    #[test]
    fn text_segment_suspends_mid_line() {
        let mut cursor = ByteCursor::new();
        cursor.extend(b"VER/3.0\r\nBSB/NA=");

        let state = State::initial();
        let Transition::Next(state, emitted) = state.step(&mut cursor, CTX).unwrap() else {
            panic!("first line is complete");
        };
        assert_eq!(emitted, None);

        let Transition::Suspend(state) = state.step(&mut cursor, CTX).unwrap() else {
            panic!("second line is incomplete");
        };
        assert_eq!(
            state,
            State::TextSegment {
                entry: Some(TextEntry::new("VER", ["3.0"]))
            }
        );

        cursor.extend(b"TEST\r\n");
        let Transition::Next(_, Some(Emitted::Entry(entry))) = state.step(&mut cursor, CTX).unwrap()
        else {
            panic!("a new record flushes the previous one");
        };
        assert_eq!(entry, TextEntry::new("VER", ["3.0"]));
    }

    #[test]
    fn end_token_flushes_entry() {
        let mut cursor = ByteCursor::new();
        cursor.extend(&[CTRL_Z, 0x00, 0x04]);
        let state = State::TextSegment {
            entry: Some(TextEntry::new("BSB", ["RA=1,1"])),
        };
        assert_eq!(
            state.step(&mut cursor, CTX).unwrap(),
            Transition::Next(
                State::BitDepth,
                Some(Emitted::Entry(TextEntry::new("BSB", ["RA=1,1"])))
            )
        );
        assert_eq!(
            State::BitDepth.step(&mut cursor, CTX).unwrap(),
            Transition::Next(State::RasterSegment, Some(Emitted::BitDepth(4)))
        );
    }

    #[test]
    fn row_without_tokens_is_malformed() {
        let mut cursor = ByteCursor::new();
        cursor.extend(&[0x00]);
        let state = State::RasterRow {
            row: None,
            runs: Vec::new(),
        };
        assert!(matches!(
            state.step(&mut cursor, CTX),
            Err(Error::MalformedRow { position: 0 })
        ));
    }

    #[test]
    fn raster_end_variants() {
        let mut cursor = ByteCursor::new();
        cursor.extend(&[0x00, 0x00]);
        assert_eq!(raster_end_len(&cursor, RasterEnd::Null), Some(1));
        assert_eq!(raster_end_len(&cursor, RasterEnd::QuadNull), None);
        assert_eq!(raster_end_len(&cursor, RasterEnd::Detect), None);

        cursor.extend(&[0x12, 0x34]);
        assert_eq!(raster_end_len(&cursor, RasterEnd::QuadNull), Some(0));
        assert_eq!(raster_end_len(&cursor, RasterEnd::Detect), Some(1));

        let mut cursor = ByteCursor::new();
        cursor.extend(&[0x00; 4]);
        assert_eq!(raster_end_len(&cursor, RasterEnd::QuadNull), Some(4));
        assert_eq!(raster_end_len(&cursor, RasterEnd::Detect), Some(4));
    }
}
