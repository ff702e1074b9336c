//! Stateless decoding and validation of CTE field headers.
//!
//! The functions in this module operate on bare header bytes and byte
//! slices; position tracking and payload extraction are the stateful
//! decoder's job (see the `cte-parser` crate). Every reserved bit
//! pattern is rejected here with its own diagnostic, so that the
//! stateful layer only ever dispatches on well-formed headers.

use cte_core::header::{
    detail_code, subtype_code, PeekType, ENTRY_SIZE_CODE_MASK, EXTENDED_VECTOR_DATA_MAX_LEN,
    EXTENDED_VECTOR_DATA_MIN_LEN, IXDATA_SUBTYPE_FIXED, IXDATA_SUBTYPE_VARINT, MAX_VECTOR_COUNT,
    TAG_MASK, TAG_VECTOR_DATA, VECTOR_DATA_FORMAT_MASK, VECTOR_DATA_PADDING_MASK,
};
use snafu::{ensure, Backtrace, OptionExt, Snafu};

/// Module-level error type:
/// for errors which may occur while validating CTE field headers.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Varint detail codes 3-15 are reserved.
    #[snafu(display("reserved varint encoding code {} in IxData header", code))]
    ReservedVarintEncoding { code: u8, backtrace: Backtrace },

    /// Fixed-width type codes 10-15 are reserved.
    #[snafu(display("reserved fixed type code {} in IxData header", code))]
    ReservedFixedType { code: u8, backtrace: Backtrace },

    /// Constant value codes 2-15 are reserved.
    #[snafu(display("reserved constant value code {} in IxData header", code))]
    ReservedConstCode { code: u8, backtrace: Backtrace },

    /// Key and signature vectors carry between 1 and 15 items.
    #[snafu(display(
        "vector item count {} out of range (1-{})",
        count,
        MAX_VECTOR_COUNT
    ))]
    InvalidCount { count: u8, backtrace: Backtrace },

    /// Bits 1-0 of an extended vector data first header byte must be zero.
    #[snafu(display("non-zero reserved bits in extended vector data header"))]
    NonZeroReservedBits { backtrace: Backtrace },

    /// The buffer ends inside a two-byte extended vector data header.
    #[snafu(display(
        "vector data header requires {} bytes, but only {} remain",
        needed,
        available
    ))]
    PrematureEnd {
        needed: usize,
        available: usize,
        backtrace: Backtrace,
    },

    /// Extended vector data lengths live in a fixed window.
    #[snafu(display(
        "extended vector data length {} out of range ({}-{})",
        length,
        EXTENDED_VECTOR_DATA_MIN_LEN,
        EXTENDED_VECTOR_DATA_MAX_LEN
    ))]
    InvalidVectorDataLength { length: usize, backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Classify a field header byte into its unique [`PeekType`] enumerant,
/// rejecting reserved IxData detail codes with a distinct error each.
pub fn classify_header(header: u8) -> Result<PeekType> {
    match PeekType::from_header(header) {
        Some(kind) => Ok(kind),
        // classification only fails on IxData detail codes
        None => {
            let code = detail_code(header);
            match subtype_code(header) {
                IXDATA_SUBTYPE_VARINT => ReservedVarintEncodingSnafu { code }.fail(),
                IXDATA_SUBTYPE_FIXED => ReservedFixedTypeSnafu { code }.fail(),
                _ => ReservedConstCodeSnafu { code }.fail(),
            }
        }
    }
}

/// Extract the item count and entry size code from a key or signature
/// vector header byte, validating the count window.
pub fn parse_vector_header(header: u8) -> Result<(u8, u8)> {
    let count = (header >> 2) & 0x0F;
    // the upper bound holds by construction of the 4-bit field
    ensure!(count >= 1, InvalidCountSnafu { count });
    Ok((count, header & ENTRY_SIZE_CODE_MASK))
}

/// A parsed vector data header: how many bytes the header spans and how
/// many payload bytes follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDataHeader {
    /// Header span in bytes: 1 for the short format, 2 for the extended.
    pub header_len: usize,
    /// Payload length in bytes.
    pub payload_len: usize,
}

/// Parse a vector data header from the start of `bytes`.
///
/// The short format encodes the payload length in bits 4-0 of the
/// single header byte. The extended format carries the high 3 bits of
/// the length in bits 4-2 of the first byte (bits 1-0 must be zero) and
/// the low 8 bits in the second byte; the decoded length must lie in
/// the extended window.
pub fn parse_vector_data_header(bytes: &[u8]) -> Result<VectorDataHeader> {
    let header1 = *bytes.first().context(PrematureEndSnafu {
        needed: 1usize,
        available: bytes.len(),
    })?;
    debug_assert_eq!(header1 & TAG_MASK, TAG_VECTOR_DATA);

    if header1 & VECTOR_DATA_FORMAT_MASK == 0 {
        return Ok(VectorDataHeader {
            header_len: 1,
            payload_len: usize::from(header1 & 0x1F),
        });
    }

    ensure!(
        header1 & VECTOR_DATA_PADDING_MASK == 0,
        NonZeroReservedBitsSnafu
    );
    let header2 = *bytes.get(1).context(PrematureEndSnafu {
        needed: 2usize,
        available: bytes.len(),
    })?;
    let length = usize::from((header1 >> 2) & 0x07) << 8 | usize::from(header2);
    ensure!(
        (EXTENDED_VECTOR_DATA_MIN_LEN..=EXTENDED_VECTOR_DATA_MAX_LEN).contains(&length),
        InvalidVectorDataLengthSnafu { length }
    );
    Ok(VectorDataHeader {
        header_len: 2,
        payload_len: length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cte_core::header::{IXDATA_SUBTYPE_CONSTANT, TAG_IXDATA};

    #[test]
    fn classification_errors_are_distinct() {
        // varint detail code 3
        let header = TAG_IXDATA | (3 << 2) | IXDATA_SUBTYPE_VARINT;
        assert!(matches!(
            classify_header(header),
            Err(Error::ReservedVarintEncoding { code: 3, .. })
        ));
        // fixed type code 10
        let header = TAG_IXDATA | (10 << 2) | IXDATA_SUBTYPE_FIXED;
        assert!(matches!(
            classify_header(header),
            Err(Error::ReservedFixedType { code: 10, .. })
        ));
        // constant value code 2
        let header = TAG_IXDATA | (2 << 2) | IXDATA_SUBTYPE_CONSTANT;
        assert!(matches!(
            classify_header(header),
            Err(Error::ReservedConstCode { code: 2, .. })
        ));
    }

    #[test]
    fn vector_header_count_window() {
        // count 0 is invalid
        assert!(matches!(
            parse_vector_header(0x00),
            Err(Error::InvalidCount { count: 0, .. })
        ));
        // count 2, size code 0
        assert_eq!(parse_vector_header(0x08).unwrap(), (2, 0));
        // count 15, size code 3
        assert_eq!(parse_vector_header(0x3F).unwrap(), (15, 3));
    }

    #[test]
    fn short_vector_data_header() {
        let parsed = parse_vector_data_header(&[0xCD]).unwrap();
        assert_eq!(parsed.header_len, 1);
        assert_eq!(parsed.payload_len, 13);

        // zero-length short payload
        let parsed = parse_vector_data_header(&[0xC0]).unwrap();
        assert_eq!(parsed.payload_len, 0);
    }

    #[test]
    fn extended_vector_data_header() {
        // length 150: high bits 0, low byte 0x96
        let parsed = parse_vector_data_header(&[0xE0, 0x96]).unwrap();
        assert_eq!(parsed.header_len, 2);
        assert_eq!(parsed.payload_len, 150);

        // length 1197 = 0b100_10101101
        let parsed = parse_vector_data_header(&[0xE0 | (0x04 << 2), 0xAD]).unwrap();
        assert_eq!(parsed.payload_len, 1197);
    }

    #[test]
    fn extended_vector_data_length_window() {
        // 31 is below the extended minimum
        assert!(matches!(
            parse_vector_data_header(&[0xE0, 31]),
            Err(Error::InvalidVectorDataLength { length: 31, .. })
        ));
        // 1198 = 0b100_10101110 is above the maximum
        assert!(matches!(
            parse_vector_data_header(&[0xE0 | (0x04 << 2), 0xAE]),
            Err(Error::InvalidVectorDataLength { length: 1198, .. })
        ));
    }

    #[test]
    fn extended_vector_data_reserved_bits() {
        assert!(matches!(
            parse_vector_data_header(&[0xE1, 0x96]),
            Err(Error::NonZeroReservedBits { .. })
        ));
        assert!(matches!(
            parse_vector_data_header(&[0xE2, 0x96]),
            Err(Error::NonZeroReservedBits { .. })
        ));
    }

    #[test]
    fn extended_vector_data_premature_end() {
        assert!(matches!(
            parse_vector_data_header(&[0xE0]),
            Err(Error::PrematureEnd { needed: 2, .. })
        ));
        assert!(matches!(
            parse_vector_data_header(&[]),
            Err(Error::PrematureEnd { needed: 1, .. })
        ));
    }
}
