#![allow(dead_code)]

use itertools::Itertools;
use libkap::{RasterEnd, RasterRun};

pub const CTRL_Z: u8 = 0x1a;

/// Row number token: 7 bits per byte, most significant first
pub fn encode_number(value: u32) -> Vec<u8> {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    groups.reverse();
    groups
}

/// Run token for `depth`, storing `length - 1`
pub fn encode_run(color: u8, length: u32, depth: u8) -> Vec<u8> {
    assert!(length > 0 && (1..=7).contains(&depth));
    let free_bits = 7 - u32::from(depth);
    let mask = (1u32 << free_bits) - 1;
    let stored = length - 1;

    let mut continuations = 0;
    while stored.checked_shr(7 * continuations).unwrap_or(0) > mask {
        continuations += 1;
    }
    let head = (u32::from(color) << free_bits) | (stored >> (7 * continuations));
    let mut out = vec![head as u8];
    // a lone 0x00 would read as the end of the row
    if continuations == 0 && head == 0 {
        return vec![0x80, 0x00];
    }
    for i in (0..continuations).rev() {
        out.push(((stored >> (7 * i)) & 0x7F) as u8);
    }
    let last = out.len() - 1;
    for byte in &mut out[..last] {
        *byte |= 0x80;
    }
    out
}

/// Groups a row of palette indexes into runs
pub fn runs_of(indexes: &[u8]) -> Vec<RasterRun> {
    indexes
        .iter()
        .dedup_with_count()
        .map(|(count, &color)| RasterRun::new(color, count as u32))
        .collect()
}

/// Writes a complete KAP file: header lines, bit depth, rows, raster end
/// token and a dummy row index table
pub fn kap_file(
    header: &[&str],
    depth: u8,
    rows: &[(u32, Vec<RasterRun>)],
    raster_end: RasterEnd,
) -> Vec<u8> {
    let mut out = Vec::new();
    for line in header {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend([CTRL_Z, 0x00, depth]);

    let mut offsets = Vec::with_capacity(rows.len());
    for (number, runs) in rows {
        offsets.push(out.len() as u32);
        out.extend(encode_number(*number));
        for run in runs {
            out.extend(encode_run(run.color_index(), run.length(), depth));
        }
        out.push(0x00);
    }

    match raster_end {
        RasterEnd::QuadNull => out.extend([0x00; 4]),
        RasterEnd::Null | RasterEnd::Detect => out.push(0x00),
    }
    for offset in offsets {
        out.extend(offset.to_be_bytes());
    }
    out
}

/// A small two-color chart:
///
/// ```"not rust"
/// row 1: 1 1 2
/// row 2: 2 2 2
/// ```
pub fn small_chart(raster_end: RasterEnd) -> Vec<u8> {
    kap_file(
        &[
            "! small test chart",
            "VER/3.0",
            "BSB/NA=SMALL,NU=1,RA=3,2,DU=254",
            "RGB/1,255,255,255",
            "RGB/2,0,0,255",
        ],
        2,
        &[
            (1, vec![RasterRun::new(1, 2), RasterRun::new(2, 1)]),
            (2, vec![RasterRun::new(2, 3)]),
        ],
        raster_end,
    )
}

/// Palette index of pixel `(x, y)` in the synthetic charts
pub fn pattern(x: u32, y: u32, colors: u8) -> u8 {
    let band = ((x / 37) + (y / 19) + (x * y / 1009)) % u32::from(colors);
    band as u8 + 1
}

/// Palette lines for `colors` distinct colors, starting at index 1
pub fn palette_lines(colors: u8) -> Vec<String> {
    (1..=colors)
        .map(|i| {
            let c = u32::from(i);
            format!("RGB/{i},{},{},{}", (c * 53) % 256, (c * 97) % 256, (c * 11) % 256)
        })
        .collect()
}

/// Color of palette index `i` as written by [`palette_lines`]
pub fn palette_rgba(i: u8) -> [u8; 4] {
    let c = u32::from(i);
    [
        ((c * 53) % 256) as u8,
        ((c * 97) % 256) as u8,
        ((c * 11) % 256) as u8,
        0xFF,
    ]
}

#[test]
fn encoders_match_known_bytes() {
    assert_eq!(encode_number(1), [0x01]);
    assert_eq!(encode_number(128), [0x81, 0x00]);
    assert_eq!(encode_number(16384), [0x81, 0x80, 0x00]);
    // depth 4: color in bits 6..3, length - 1 in bits 2..0
    assert_eq!(encode_run(1, 3, 4), [0x0A]);
    assert_eq!(encode_run(1, 9, 4), [0x88, 0x08]);
    assert_eq!(encode_run(0, 1, 1), [0x80, 0x00]);
}
