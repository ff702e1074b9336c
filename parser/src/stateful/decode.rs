//! Module holding a stateful CTE transaction decoding abstraction.
//!
//! The decoder is a cursor over one loaded transaction buffer. The
//! first inspection of the buffer validates the version byte; every
//! subsequent peek classifies the upcoming field without consuming it,
//! and every typed read validates the full header shape, bounds-checks
//! the payload against the remaining buffer, and only then advances.
//! Vector payloads are handed out as borrows into the decoder's buffer.
//!
//! All failures are fatal to the transaction: a decoder that returned
//! an error should be discarded.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use cte_core::header::{
    detail_code, FixedType, PeekType, Tag, MAX_TRANSACTION_SIZE, VERSION_BYTE,
};
use cte_core::sizing::{CryptoScheme, EntrySizing};
use cte_encoding::{decode, leb128};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};

/// Module-level error type:
/// for errors which may occur while reading a CTE transaction.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The first byte of the buffer is not the CTE version byte.
    #[snafu(display(
        "invalid version byte 0x{:02X} (expected 0x{:02X})",
        found,
        VERSION_BYTE
    ))]
    VersionMismatch { found: u8, backtrace: Backtrace },

    /// A transaction buffer holds between 1 and 1232 bytes.
    #[snafu(display(
        "decoder buffer size {} out of range (1-{})",
        size,
        MAX_TRANSACTION_SIZE
    ))]
    InvalidBufferSize { size: usize, backtrace: Backtrace },

    /// The field's declared length does not fit the remaining buffer.
    #[snafu(display(
        "read of {} bytes at position {} past end of buffer ({} bytes)",
        needed,
        position,
        size
    ))]
    BufferUnderflow {
        position: usize,
        needed: usize,
        size: usize,
        backtrace: Backtrace,
    },

    /// A typed read was issued while a field of another family is next.
    #[snafu(display(
        "unexpected {} field at position {} (expected {})",
        found,
        position,
        expected
    ))]
    UnexpectedTag {
        position: usize,
        expected: Tag,
        found: Tag,
        backtrace: Backtrace,
    },

    /// A typed read was issued while a different field kind of the same
    /// family is next.
    #[snafu(display(
        "field at position {} is {}, expected {}",
        position,
        found,
        expected
    ))]
    UnexpectedFieldType {
        position: usize,
        expected: PeekType,
        found: PeekType,
        backtrace: Backtrace,
    },

    /// The entry size code is not defined by the active sizing dialect.
    #[snafu(display("unknown entry size code {} for {} at position {}", code, kind, position))]
    InvalidSizeCode {
        position: usize,
        code: u8,
        kind: Tag,
        backtrace: Backtrace,
    },

    /// The upcoming header byte carries a reserved bit pattern.
    #[snafu(display("could not classify field header at position {}", position))]
    ClassifyHeader {
        position: usize,
        #[snafu(backtrace)]
        source: decode::Error,
    },

    /// The upcoming vector header is ill-formed.
    #[snafu(display("invalid vector header at position {}", position))]
    ReadVectorHeader {
        position: usize,
        #[snafu(backtrace)]
        source: decode::Error,
    },

    /// The upcoming vector data header is ill-formed.
    #[snafu(display("invalid vector data header at position {}", position))]
    ReadVectorDataHeader {
        position: usize,
        #[snafu(backtrace)]
        source: decode::Error,
    },

    /// The varint trailing bytes are ill-formed.
    #[snafu(display("invalid LEB128 sequence at position {}", position))]
    DecodeLeb128 {
        position: usize,
        #[snafu(backtrace)]
        source: leb128::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A stateful reader of one CTE transaction buffer, generic over the
/// entry sizing dialect used for key and signature vectors.
///
/// The buffer is allocated at construction and meant to be filled
/// through [`buffer_mut`](Decoder::buffer_mut) (or copied in with
/// [`from_bytes`](Decoder::from_bytes)) before the first read.
#[derive(Debug)]
pub struct Decoder<S = CryptoScheme> {
    buffer: Vec<u8>,
    position: usize,
    last_vector_count: usize,
    last_vector_payload_len: usize,
    sizing: S,
}

impl Decoder<CryptoScheme> {
    /// Create a decoder with a zeroed buffer of exactly `size` bytes,
    /// using the default crypto scheme sizing dialect.
    pub fn with_size(size: usize) -> Result<Self> {
        Decoder::with_size_and_sizing(size, CryptoScheme)
    }

    /// Create a decoder over a copy of the given encoded transaction,
    /// using the default crypto scheme sizing dialect.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Decoder::from_bytes_and_sizing(bytes, CryptoScheme)
    }
}

impl<S> Decoder<S>
where
    S: EntrySizing,
{
    /// Create a decoder with a zeroed buffer of exactly `size` bytes,
    /// resolving vector entry sizes through `sizing`.
    pub fn with_size_and_sizing(size: usize, sizing: S) -> Result<Self> {
        ensure!(
            (1..=MAX_TRANSACTION_SIZE).contains(&size),
            InvalidBufferSizeSnafu { size }
        );
        Ok(Decoder {
            buffer: vec![0; size],
            position: 0,
            last_vector_count: 0,
            last_vector_payload_len: 0,
            sizing,
        })
    }

    /// Create a decoder over a copy of the given encoded transaction,
    /// resolving vector entry sizes through `sizing`.
    pub fn from_bytes_and_sizing(bytes: &[u8], sizing: S) -> Result<Self> {
        let mut decoder = Decoder::with_size_and_sizing(bytes.len(), sizing)?;
        decoder.buffer.copy_from_slice(bytes);
        Ok(decoder)
    }

    /// Writable access to the internal buffer, for loading the encoded
    /// transaction between construction and the first read.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// The total buffer size given at construction.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// The current read position within the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Rewind the read position to the first field, for parsing the
    /// loaded data again. The version byte is not re-validated.
    pub fn reset(&mut self) {
        self.position = 1;
    }

    /// The item count of the most recently read key or signature vector.
    pub fn last_vector_count(&self) -> usize {
        self.last_vector_count
    }

    /// The payload length in bytes of the most recently read vector
    /// field (key, signature, or vector data).
    pub fn last_vector_payload_len(&self) -> usize {
        self.last_vector_payload_len
    }

    /// Classify the next field into its unique [`PeekType`] enumerant
    /// without consuming it.
    ///
    /// The first call validates the version byte and advances past it;
    /// after that the operation is idempotent. Returns
    /// [`PeekType::Eof`] once every field has been consumed. A header
    /// carrying a reserved bit pattern fails here, before any typed
    /// read is attempted.
    pub fn peek_type(&mut self) -> Result<PeekType> {
        if self.position == 0 {
            let found = self.buffer[0];
            ensure!(found == VERSION_BYTE, VersionMismatchSnafu { found });
            self.position = 1;
        }
        if self.position == self.buffer.len() {
            return Ok(PeekType::Eof);
        }
        decode::classify_header(self.buffer[self.position]).context(ClassifyHeaderSnafu {
            position: self.position,
        })
    }

    /// The item count of the next field, which must be a key or
    /// signature vector. Does not advance the position.
    pub fn peek_vector_count(&mut self) -> Result<u8> {
        let found = self.peek_type()?;
        match found.tag() {
            Some(Tag::PublicKeyVector) | Some(Tag::SignatureVector) => {
                let position = self.position;
                let (count, _) = decode::parse_vector_header(self.buffer[position])
                    .context(ReadVectorHeaderSnafu { position })?;
                Ok(count)
            }
            _ => Err(self.mismatch_tag(Tag::PublicKeyVector, found)),
        }
    }

    /// The entry size code of the next field, which must be a key or
    /// signature vector. Does not advance the position.
    pub fn peek_vector_size_code(&mut self) -> Result<u8> {
        let found = self.peek_type()?;
        match found.tag() {
            Some(Tag::PublicKeyVector) | Some(Tag::SignatureVector) => {
                let position = self.position;
                let (_, code) = decode::parse_vector_header(self.buffer[position])
                    .context(ReadVectorHeaderSnafu { position })?;
                Ok(code)
            }
            _ => Err(self.mismatch_tag(Tag::PublicKeyVector, found)),
        }
    }

    /// The payload length of the next field, which must be vector data.
    /// Does not advance the position.
    pub fn peek_vector_data_len(&mut self) -> Result<usize> {
        let found = self.peek_type()?;
        match found.tag() {
            Some(Tag::VectorData) => {
                let position = self.position;
                let parsed = decode::parse_vector_data_header(&self.buffer[position..])
                    .context(ReadVectorDataHeaderSnafu { position })?;
                Ok(parsed.payload_len)
            }
            _ => Err(self.mismatch_tag(Tag::VectorData, found)),
        }
    }

    // ---------------- private helpers ---------------------

    fn check_remaining(&self, needed: usize) -> Result<()> {
        ensure!(
            needed <= self.buffer.len() - self.position,
            BufferUnderflowSnafu {
                position: self.position,
                needed,
                size: self.buffer.len(),
            }
        );
        Ok(())
    }

    fn mismatch(&self, expected: PeekType, found: PeekType) -> Error {
        let position = self.position;
        match (expected.tag(), found.tag()) {
            (Some(exp), Some(fnd)) if exp != fnd => UnexpectedTagSnafu {
                position,
                expected: exp,
                found: fnd,
            }
            .build(),
            (_, None) => BufferUnderflowSnafu {
                position,
                needed: 1usize,
                size: self.buffer.len(),
            }
            .build(),
            _ => UnexpectedFieldTypeSnafu {
                position,
                expected,
                found,
            }
            .build(),
        }
    }

    fn mismatch_tag(&self, expected: Tag, found: PeekType) -> Error {
        let position = self.position;
        match found.tag() {
            Some(fnd) => UnexpectedTagSnafu {
                position,
                expected,
                found: fnd,
            }
            .build(),
            None => BufferUnderflowSnafu {
                position,
                needed: 1usize,
                size: self.buffer.len(),
            }
            .build(),
        }
    }

    /// Classify the next field and require the exact given kind,
    /// returning its header byte without consuming it.
    fn expect(&mut self, wanted: PeekType) -> Result<u8> {
        let found = self.peek_type()?;
        if found == wanted {
            Ok(self.buffer[self.position])
        } else {
            Err(self.mismatch(wanted, found))
        }
    }

    /// Classify the next field and require the given family,
    /// returning its header byte without consuming it.
    fn expect_tag(&mut self, wanted: Tag) -> Result<u8> {
        let found = self.peek_type()?;
        if found.tag() == Some(wanted) {
            Ok(self.buffer[self.position])
        } else {
            Err(self.mismatch_tag(wanted, found))
        }
    }

    fn read_vector(&mut self, tag: Tag) -> Result<&[u8]> {
        let header = self.expect_tag(tag)?;
        let position = self.position;
        let (count, code) = decode::parse_vector_header(header)
            .context(ReadVectorHeaderSnafu { position })?;
        let item_size = match tag {
            Tag::PublicKeyVector => self.sizing.public_key_size(code),
            _ => self.sizing.signature_size(code),
        }
        .context(InvalidSizeCodeSnafu {
            position,
            code,
            kind: tag,
        })?;
        let payload_len = usize::from(count) * item_size;
        self.check_remaining(1 + payload_len)?;
        let start = position + 1;
        self.position = start + payload_len;
        self.last_vector_count = usize::from(count);
        self.last_vector_payload_len = payload_len;
        Ok(&self.buffer[start..start + payload_len])
    }

    fn read_fixed(&mut self, ty: FixedType) -> Result<&[u8]> {
        self.expect(PeekType::of_fixed(ty))?;
        self.check_remaining(1 + ty.width())?;
        let start = self.position + 1;
        self.position = start + ty.width();
        Ok(&self.buffer[start..start + ty.width()])
    }

    // ---------------- typed reads ---------------------

    /// Read a public key vector, returning its raw payload. The item
    /// count and payload length are remembered for the `last_*`
    /// accessors.
    pub fn read_public_key_vector(&mut self) -> Result<&[u8]> {
        self.read_vector(Tag::PublicKeyVector)
    }

    /// Read a signature vector, returning its raw payload. The item
    /// count and payload length are remembered for the `last_*`
    /// accessors.
    pub fn read_signature_vector(&mut self) -> Result<&[u8]> {
        self.read_vector(Tag::SignatureVector)
    }

    /// Read a vector data field, returning its payload. The payload
    /// length is remembered for
    /// [`last_vector_payload_len`](Decoder::last_vector_payload_len).
    pub fn read_vector_data(&mut self) -> Result<&[u8]> {
        self.expect_tag(Tag::VectorData)?;
        let position = self.position;
        let parsed = decode::parse_vector_data_header(&self.buffer[position..])
            .context(ReadVectorDataHeaderSnafu { position })?;
        self.check_remaining(parsed.header_len + parsed.payload_len)?;
        let start = position + parsed.header_len;
        self.position = start + parsed.payload_len;
        self.last_vector_payload_len = parsed.payload_len;
        Ok(&self.buffer[start..start + parsed.payload_len])
    }

    /// Read an index reference field, returning its 4-bit value.
    pub fn read_index(&mut self) -> Result<u8> {
        let header = self.expect(PeekType::IxIndex)?;
        self.position += 1;
        Ok(detail_code(header))
    }

    /// Consume a varint field holding the value zero in its header.
    pub fn read_varint_zero(&mut self) -> Result<u64> {
        self.expect(PeekType::IxVarintZero)?;
        self.position += 1;
        Ok(0)
    }

    /// Read a varint field carrying ULEB128 trailing bytes.
    pub fn read_uleb128(&mut self) -> Result<u64> {
        self.expect(PeekType::IxUleb128)?;
        let start = self.position + 1;
        let (value, consumed) = leb128::decode_uleb128(&self.buffer[start..])
            .context(DecodeLeb128Snafu { position: start })?;
        self.position = start + consumed;
        Ok(value)
    }

    /// Read a varint field carrying SLEB128 trailing bytes.
    pub fn read_sleb128(&mut self) -> Result<i64> {
        self.expect(PeekType::IxSleb128)?;
        let start = self.position + 1;
        let (value, consumed) = leb128::decode_sleb128(&self.buffer[start..])
            .context(DecodeLeb128Snafu { position: start })?;
        self.position = start + consumed;
        Ok(value)
    }

    /// Read a fixed-width signed 8-bit integer field.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_fixed(FixedType::I8)?[0] as i8)
    }

    /// Read a fixed-width signed 16-bit integer field.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_fixed(FixedType::I16)?))
    }

    /// Read a fixed-width signed 32-bit integer field.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_fixed(FixedType::I32)?))
    }

    /// Read a fixed-width signed 64-bit integer field.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.read_fixed(FixedType::I64)?))
    }

    /// Read a fixed-width unsigned 8-bit integer field.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_fixed(FixedType::U8)?[0])
    }

    /// Read a fixed-width unsigned 16-bit integer field.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_fixed(FixedType::U16)?))
    }

    /// Read a fixed-width unsigned 32-bit integer field.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_fixed(FixedType::U32)?))
    }

    /// Read a fixed-width unsigned 64-bit integer field.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_fixed(FixedType::U64)?))
    }

    /// Read a fixed-width single precision float field.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_fixed(FixedType::F32)?))
    }

    /// Read a fixed-width double precision float field.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.read_fixed(FixedType::F64)?))
    }

    /// Read a boolean constant field.
    pub fn read_boolean(&mut self) -> Result<bool> {
        let found = self.peek_type()?;
        let value = match found {
            PeekType::IxConstFalse => false,
            PeekType::IxConstTrue => true,
            _ => return Err(self.mismatch(PeekType::IxConstFalse, found)),
        };
        self.position += 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cte_core::sizing::SizeClass;
    use cte_encoding::Encoder;

    #[test]
    fn version_byte_is_validated_once() {
        let mut dec = Decoder::from_bytes(&[0xF0, 0x85, 0x00]).unwrap();
        assert!(matches!(
            dec.peek_type(),
            Err(Error::VersionMismatch { found: 0xF0, .. })
        ));
    }

    #[test]
    fn empty_transaction_is_eof() {
        let mut dec = Decoder::from_bytes(&[0xF1]).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
        assert_eq!(dec.position(), 1);
        // peeking again is stable
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
    }

    #[test]
    fn buffer_size_window() {
        assert!(matches!(
            Decoder::with_size(0),
            Err(Error::InvalidBufferSize { size: 0, .. })
        ));
        assert!(matches!(
            Decoder::with_size(1233),
            Err(Error::InvalidBufferSize { size: 1233, .. })
        ));
        assert!(Decoder::with_size(1232).is_ok());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut dec = Decoder::from_bytes(&[0xF1, 0x85, 0xC0, 0xC4, 0x07]).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::IxUleb128);
        assert_eq!(dec.position(), 1);
        assert_eq!(dec.peek_type().unwrap(), PeekType::IxUleb128);
        assert_eq!(dec.read_uleb128().unwrap(), 123_456);
        assert_eq!(dec.position(), 5);
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
    }

    #[test]
    fn sleb128_field_roundtrip() {
        let mut dec = Decoder::from_bytes(&[0xF1, 0x89, 0xC2, 0x97, 0x7B]).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::IxSleb128);
        assert_eq!(dec.read_sleb128().unwrap(), -78_910);
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
    }

    #[test]
    fn both_zero_encodings_decode_to_zero() {
        // canonical one-byte form
        let mut dec = Decoder::from_bytes(&[0xF1, 0x81]).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::IxVarintZero);
        assert_eq!(dec.read_varint_zero().unwrap(), 0);

        // two-byte ULEB form
        let mut dec = Decoder::from_bytes(&[0xF1, 0x85, 0x00]).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::IxUleb128);
        assert_eq!(dec.read_uleb128().unwrap(), 0);
    }

    #[test]
    fn public_key_vector_and_metadata() {
        let keys: Vec<u8> = (0..64).map(|i| 0xAA_u8.wrapping_add(i)).collect();
        let mut enc = Encoder::with_capacity(128).unwrap();
        enc.put_public_key_vector(2, 0, &keys).unwrap();
        enc.write_index(1).unwrap();

        let mut dec = Decoder::from_bytes(enc.data()).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::PkVector0);
        assert_eq!(dec.peek_vector_count().unwrap(), 2);
        assert_eq!(dec.peek_vector_size_code().unwrap(), 0);
        assert_eq!(dec.read_public_key_vector().unwrap(), &keys[..]);
        assert_eq!(dec.last_vector_count(), 2);
        assert_eq!(dec.last_vector_payload_len(), 64);
        assert_eq!(dec.read_index().unwrap(), 1);
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
    }

    #[test]
    fn signature_vector_uses_signature_sizes() {
        // crypto scheme code 1 signatures are 32-byte hash items
        let sig = [0xBB_u8; 32];
        let mut enc = Encoder::with_capacity(64).unwrap();
        enc.put_signature_vector(1, 1, &sig).unwrap();

        let mut dec = Decoder::from_bytes(enc.data()).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::SigVector1);
        assert_eq!(dec.read_signature_vector().unwrap(), &sig[..]);
        assert_eq!(dec.last_vector_count(), 1);
        assert_eq!(dec.last_vector_payload_len(), 32);
    }

    #[test]
    fn size_class_dialect_changes_payload_widths() {
        // size class code 1 keys are 64 bytes wide
        let keys = [0x11_u8; 64];
        let mut enc = Encoder::with_capacity_and_sizing(128, SizeClass).unwrap();
        enc.put_public_key_vector(1, 1, &keys).unwrap();

        let mut dec = Decoder::from_bytes_and_sizing(enc.data(), SizeClass).unwrap();
        assert_eq!(dec.read_public_key_vector().unwrap(), &keys[..]);
        assert_eq!(dec.last_vector_payload_len(), 64);

        // public key size code 3 is reserved in this dialect
        let mut dec = Decoder::from_bytes_and_sizing(&[0xF1, 0x07], SizeClass).unwrap();
        assert!(matches!(
            dec.read_public_key_vector(),
            Err(Error::InvalidSizeCode { code: 3, .. })
        ));
    }

    #[test]
    fn vector_data_short_and_extended() {
        let mut enc = Encoder::with_capacity(256).unwrap();
        enc.put_vector_data(b"Short payload").unwrap();
        enc.put_vector_data(&[b'L'; 150]).unwrap();

        let mut dec = Decoder::from_bytes(enc.data()).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::VectorShort);
        assert_eq!(dec.peek_vector_data_len().unwrap(), 13);
        assert_eq!(dec.read_vector_data().unwrap(), b"Short payload");
        assert_eq!(dec.last_vector_payload_len(), 13);

        assert_eq!(dec.peek_type().unwrap(), PeekType::VectorExtended);
        assert_eq!(dec.peek_vector_data_len().unwrap(), 150);
        assert_eq!(dec.read_vector_data().unwrap(), &[b'L'; 150][..]);
        assert_eq!(dec.last_vector_payload_len(), 150);
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
    }

    #[test]
    fn fixed_scalars_roundtrip() {
        let mut enc = Encoder::with_capacity(128).unwrap();
        enc.write_i8(-5).unwrap();
        enc.write_i16(-3_000).unwrap();
        enc.write_i32(-1_000).unwrap();
        enc.write_i64(-5_000_000_000).unwrap();
        enc.write_u8(250).unwrap();
        enc.write_u16(65_000).unwrap();
        enc.write_u32(4_000_000_000).unwrap();
        enc.write_u64(9_876_543_210).unwrap();
        enc.write_f32(3.14159).unwrap();
        enc.write_f64(-2.718281828459045).unwrap();

        let mut dec = Decoder::from_bytes(enc.data()).unwrap();
        assert_eq!(dec.read_i8().unwrap(), -5);
        assert_eq!(dec.read_i16().unwrap(), -3_000);
        assert_eq!(dec.read_i32().unwrap(), -1_000);
        assert_eq!(dec.read_i64().unwrap(), -5_000_000_000);
        assert_eq!(dec.read_u8().unwrap(), 250);
        assert_eq!(dec.read_u16().unwrap(), 65_000);
        assert_eq!(dec.read_u32().unwrap(), 4_000_000_000);
        assert_eq!(dec.read_u64().unwrap(), 9_876_543_210);
        assert_eq!(dec.read_f32().unwrap(), 3.14159);
        assert_eq!(dec.read_f64().unwrap(), -2.718281828459045);
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
    }

    #[test]
    fn boolean_constants_roundtrip() {
        let mut dec = Decoder::from_bytes(&[0xF1, 0x87, 0x83]).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::IxConstTrue);
        assert_eq!(dec.read_boolean().unwrap(), true);
        assert_eq!(dec.peek_type().unwrap(), PeekType::IxConstFalse);
        assert_eq!(dec.read_boolean().unwrap(), false);
    }

    #[test]
    fn mismatched_reads_are_rejected() {
        // next field is an index reference
        let mut dec = Decoder::from_bytes(&[0xF1, 0x94]).unwrap();
        assert!(matches!(
            dec.read_public_key_vector(),
            Err(Error::UnexpectedTag {
                expected: Tag::PublicKeyVector,
                found: Tag::IxData,
                ..
            })
        ));
        // a wrong kind within the same family
        assert!(matches!(
            dec.read_uleb128(),
            Err(Error::UnexpectedFieldType {
                expected: PeekType::IxUleb128,
                found: PeekType::IxIndex,
                ..
            })
        ));
        // the field is still readable afterwards
        assert_eq!(dec.read_index().unwrap(), 5);
    }

    #[test]
    fn wrong_varint_encoding_is_rejected() {
        let mut dec = Decoder::from_bytes(&[0xF1, 0x89, 0xC2, 0x97, 0x7B]).unwrap();
        assert!(matches!(
            dec.read_uleb128(),
            Err(Error::UnexpectedFieldType {
                expected: PeekType::IxUleb128,
                found: PeekType::IxSleb128,
                ..
            })
        ));
    }

    #[test]
    fn reserved_headers_fail_on_peek() {
        // varint encoding code 3: `10 0011 01`
        let mut dec = Decoder::from_bytes(&[0xF1, 0x8D]).unwrap();
        assert!(matches!(
            dec.peek_type(),
            Err(Error::ClassifyHeader { position: 1, .. })
        ));
        // fixed type code 10: `10 1010 10`
        let mut dec = Decoder::from_bytes(&[0xF1, 0xAA]).unwrap();
        assert!(dec.peek_type().is_err());
        // constant code 2: `10 0010 11`
        let mut dec = Decoder::from_bytes(&[0xF1, 0x8B]).unwrap();
        assert!(dec.peek_type().is_err());
    }

    #[test]
    fn invalid_count_is_rejected_on_read() {
        // PK vector with N = 0
        let mut dec = Decoder::from_bytes(&[0xF1, 0x00]).unwrap();
        assert_eq!(dec.peek_type().unwrap(), PeekType::PkVector0);
        assert!(matches!(
            dec.read_public_key_vector(),
            Err(Error::ReadVectorHeader { position: 1, .. })
        ));
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        // PK vector announcing one 32-byte key with no payload
        let mut dec = Decoder::from_bytes(&[0xF1, 0x04]).unwrap();
        assert!(matches!(
            dec.read_public_key_vector(),
            Err(Error::BufferUnderflow { needed: 33, .. })
        ));

        // fixed u32 with only two payload bytes
        let mut dec = Decoder::from_bytes(&[0xF1, 0x9A, 0x01, 0x02]).unwrap();
        assert!(matches!(
            dec.read_u32(),
            Err(Error::BufferUnderflow { needed: 5, .. })
        ));

        // ULEB128 cut off mid-sequence
        let mut dec = Decoder::from_bytes(&[0xF1, 0x85, 0x80]).unwrap();
        assert!(matches!(
            dec.read_uleb128(),
            Err(Error::DecodeLeb128 { position: 2, .. })
        ));
    }

    #[test]
    fn extended_vector_data_validation() {
        // non-zero padding bits in the first extended header byte
        let mut dec = Decoder::from_bytes(&[0xF1, 0xE1, 0x96]).unwrap();
        assert!(matches!(
            dec.read_vector_data(),
            Err(Error::ReadVectorDataHeader { position: 1, .. })
        ));

        // declared length 150 with a short buffer
        let mut dec = Decoder::from_bytes(&[0xF1, 0xE0, 0x96, 0x00]).unwrap();
        assert!(matches!(
            dec.read_vector_data(),
            Err(Error::BufferUnderflow { needed: 152, .. })
        ));
    }

    #[test]
    fn reset_rewinds_to_first_field() {
        let mut dec = Decoder::from_bytes(&[0xF1, 0x94, 0x87]).unwrap();
        assert_eq!(dec.read_index().unwrap(), 5);
        assert_eq!(dec.read_boolean().unwrap(), true);
        assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
        dec.reset();
        assert_eq!(dec.position(), 1);
        assert_eq!(dec.read_index().unwrap(), 5);
    }

    #[test]
    fn reads_at_eof_underflow() {
        let mut dec = Decoder::from_bytes(&[0xF1]).unwrap();
        assert!(matches!(
            dec.read_boolean(),
            Err(Error::BufferUnderflow { needed: 1, .. })
        ));
    }
}
