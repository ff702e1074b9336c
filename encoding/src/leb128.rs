//! The ULEB128 and SLEB128 sub-codecs.
//!
//! Values are encoded as 7-bit groups in little-endian order, with the
//! high bit of every non-terminal byte set. Both decoders operate on a
//! byte slice and report the number of bytes consumed, so that the
//! caller can advance its own cursor. Sequences longer than
//! [`MAX_LEB128_LEN`] bytes and encodings that overflow 64 bits of
//! value are rejected.

use snafu::{ensure, Backtrace, OptionExt, Snafu};

/// The maximum byte length of a 64-bit LEB128 sequence (`ceil(64 / 7)`).
pub const MAX_LEB128_LEN: usize = 10;

/// Module-level error type:
/// for errors which may occur while decoding LEB128 sequences.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The encoding carries value bits at or above bit 64.
    #[snafu(display("LEB128 value overflows 64 bits"))]
    Overflow { backtrace: Backtrace },
    /// No terminal byte within the first [`MAX_LEB128_LEN`] bytes.
    #[snafu(display(
        "unterminated LEB128 sequence (more than {} bytes)",
        MAX_LEB128_LEN
    ))]
    Unterminated { backtrace: Backtrace },
    /// The input slice ends before the terminal byte.
    #[snafu(display("LEB128 sequence ends before its terminal byte"))]
    PrematureEnd { backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Decode a ULEB128 value from the start of `bytes`,
/// returning the value and the number of bytes consumed.
pub fn decode_uleb128(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    for i in 0..MAX_LEB128_LEN {
        let byte = *bytes.get(i).context(PrematureEndSnafu)?;
        // the tenth byte may only contribute bit 63
        ensure!(shift < 63 || byte & 0x7E == 0, OverflowSnafu);
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    UnterminatedSnafu.fail()
}

/// Decode an SLEB128 value from the start of `bytes`,
/// returning the value and the number of bytes consumed.
pub fn decode_sleb128(bytes: &[u8]) -> Result<(i64, usize)> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    for i in 0..MAX_LEB128_LEN {
        let byte = *bytes.get(i).context(PrematureEndSnafu)?;
        result |= i64::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                // sign-extend from the terminal byte
                result |= -(1i64 << shift);
            }
            return Ok((result, i + 1));
        }
        ensure!(shift < 64, OverflowSnafu);
    }
    UnterminatedSnafu.fail()
}

/// The encoded byte length of `value` as ULEB128.
pub fn uleb128_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// The encoded byte length of `value` as SLEB128.
pub fn sleb128_len(mut value: i64) -> usize {
    let mut len = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        let sign = byte & 0x40 != 0;
        value >>= 7;
        len += 1;
        if (value == 0 && !sign) || (value == -1 && sign) {
            return len;
        }
    }
}

/// Encode `value` as ULEB128 into the start of `buf`,
/// returning the number of bytes written.
///
/// `buf` must hold at least [`uleb128_len`]`(value)` bytes.
pub fn encode_uleb128(buf: &mut [u8], mut value: u64) -> usize {
    debug_assert!(buf.len() >= uleb128_len(value));
    let mut i = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf[i] = byte;
        i += 1;
        if value == 0 {
            return i;
        }
    }
}

/// Encode `value` as SLEB128 into the start of `buf`,
/// returning the number of bytes written.
///
/// `buf` must hold at least [`sleb128_len`]`(value)` bytes.
pub fn encode_sleb128(buf: &mut [u8], mut value: i64) -> usize {
    debug_assert!(buf.len() >= sleb128_len(value));
    let mut i = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        let sign = byte & 0x40 != 0;
        value >>= 7;
        let done = (value == 0 && !sign) || (value == -1 && sign);
        buf[i] = if done { byte } else { byte | 0x80 };
        i += 1;
        if done {
            return i;
        }
    }
}
