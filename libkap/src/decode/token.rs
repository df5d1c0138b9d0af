//! Variable-length tokens of the raster segment
//!
//! Each byte carries 7 bits of payload; bit 7 set means another byte follows.
//! Tokens are most-significant byte first. Row numbers use the whole payload,
//! run tokens split the first byte's payload into a color index (the top
//! `depth` bits) and the top of the run length (the remaining `7 - depth`
//! bits). Run lengths are stored minus one.

use thiserror::Error;

use crate::chart::RasterRun;

/// Bit set on every byte of a token except the last one
pub const CONTINUATION_BIT: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Highest bit depth a run token can carry: one bit is always the continuation flag
pub const MAX_BIT_DEPTH: u8 = 7;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// Errors raised while decoding a single token
pub enum TokenError {
    /// The token holds no bytes
    #[error("token is empty")]
    Empty,
    /// A continuation bit is missing before the last byte, or set on the last byte
    #[error("token continuation bits are inconsistent")]
    Unterminated,
    /// The decoded value does not fit in 32 bits
    #[error("token value overflows 32 bits")]
    Overflow,
    /// Runs cannot be split with this bit depth
    #[error("bit depth {0} is outside of 1..=7")]
    InvalidBitDepth(u8),
}

fn check_framing(token: &[u8]) -> Result<(), TokenError> {
    let Some((last, rest)) = token.split_last() else {
        return Err(TokenError::Empty);
    };
    if last & CONTINUATION_BIT != 0 || rest.iter().any(|b| b & CONTINUATION_BIT == 0) {
        return Err(TokenError::Unterminated);
    }
    Ok(())
}

fn accumulate(start: u32, bytes: &[u8]) -> Result<u32, TokenError> {
    bytes.iter().try_fold(start, |value, b| {
        value
            .checked_mul(128)
            .and_then(|v| v.checked_add(u32::from(b & PAYLOAD_MASK)))
            .ok_or(TokenError::Overflow)
    })
}

/// Decodes a row number token (1-based in well formed files)
///
/// # Errors
///
/// Fails on empty tokens, inconsistent continuation bits and values that
/// overflow a `u32`.
pub fn decode_row_number(token: &[u8]) -> Result<u32, TokenError> {
    check_framing(token)?;
    accumulate(0, token)
}

/// Decodes a `(color index, run length)` token for the given bit depth
///
/// # Errors
///
/// Fails when `depth` is outside of `1..=7`, and for the same framing errors
/// as [`decode_row_number`].
pub fn decode_run(token: &[u8], depth: u8) -> Result<RasterRun, TokenError> {
    if !(1..=MAX_BIT_DEPTH).contains(&depth) {
        return Err(TokenError::InvalidBitDepth(depth));
    }
    check_framing(token)?;
    let (first, rest) = token.split_first().ok_or(TokenError::Empty)?;

    let length_bits = MAX_BIT_DEPTH - depth;
    let payload = first & PAYLOAD_MASK;
    let color_index = payload >> length_bits;
    let partial_length = u32::from(payload & ((1 << length_bits) - 1));

    let length = accumulate(partial_length, rest)?
        .checked_add(1)
        .ok_or(TokenError::Overflow)?;
    Ok(RasterRun::new(color_index, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_row_number(mut n: u32) -> Vec<u8> {
        let mut out = vec![(n & 0x7F) as u8];
        n >>= 7;
        while n > 0 {
            out.push((n & 0x7F) as u8 | CONTINUATION_BIT);
            n >>= 7;
        }
        out.reverse();
        out
    }

    #[test]
    fn row_numbers_round_trip() {
        for n in [1, 127, 128, 16383, 16384] {
            let token = encode_row_number(n);
            assert_eq!(decode_row_number(&token), Ok(n), "token {token:02x?}");
        }
        assert_eq!(encode_row_number(127), [0x7F]);
        assert_eq!(encode_row_number(128), [0x81, 0x00]);
        assert_eq!(encode_row_number(16384), [0x81, 0x80, 0x00]);
    }

    #[test]
    fn depth_one_splits_top_bit() {
        let run = decode_run(&[0b0100_0000], 1).unwrap();
        assert_eq!(run.color_index(), 1);
        assert_eq!(run.length(), 1);

        let run = decode_run(&[0b0011_1111], 1).unwrap();
        assert_eq!(run.color_index(), 0);
        assert_eq!(run.length(), 64);
    }

    #[test]
    fn depth_seven_has_no_length_bits() {
        let run = decode_run(&[0x55], 7).unwrap();
        assert_eq!(run.color_index(), 0x55);
        assert_eq!(run.length(), 1);

        // length only comes from continuation bytes
        let run = decode_run(&[0x80 | 0x12, 0x05], 7).unwrap();
        assert_eq!(run.color_index(), 0x12);
        assert_eq!(run.length(), 6);
    }

    #[test]
    fn continuation_bytes_extend_length() {
        // depth 4: color 3, partial length 0b101, then 2
        let run = decode_run(&[0x80 | (3 << 3) | 0b101, 0x02], 4).unwrap();
        assert_eq!(run.color_index(), 3);
        assert_eq!(run.length(), 5 * 128 + 2 + 1);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert_eq!(decode_row_number(&[]), Err(TokenError::Empty));
        assert_eq!(decode_run(&[], 4), Err(TokenError::Empty));
        assert_eq!(decode_row_number(&[0x81]), Err(TokenError::Unterminated));
        assert_eq!(decode_row_number(&[0x01, 0x01]), Err(TokenError::Unterminated));
        assert_eq!(
            decode_row_number(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]),
            Err(TokenError::Overflow)
        );
    }

    #[test]
    fn run_depth_must_be_one_to_seven() {
        assert_eq!(decode_run(&[0x01], 0), Err(TokenError::InvalidBitDepth(0)));
        assert_eq!(decode_run(&[0x01], 8), Err(TokenError::InvalidBitDepth(8)));
        // row numbers do not care about depth
        assert_eq!(decode_row_number(&[0x01]), Ok(1));
    }
}
