//! The CTE encoder: an append-only builder of transaction buffers.
//!
//! An [`Encoder`] owns a buffer of fixed capacity, writes the version
//! byte eagerly, and appends one field at a time. Vector fields are
//! written through reserve-and-fill operations which return a writable
//! slice over the reserved payload region; every other field kind has a
//! typed write operation. A failed write returns an error without
//! committing the field; the encoder should be discarded afterwards.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use cte_core::header::{
    FixedType, Tag, CONST_FALSE, CONST_TRUE, ENTRY_SIZE_CODE_MASK, EXTENDED_VECTOR_DATA_MAX_LEN,
    IXDATA_SUBTYPE_CONSTANT, IXDATA_SUBTYPE_FIXED, IXDATA_SUBTYPE_INDEX, IXDATA_SUBTYPE_VARINT,
    MAX_INDEX_VALUE, MAX_VECTOR_COUNT, SHORT_VECTOR_DATA_MAX_LEN, TAG_IXDATA, TAG_VECTOR_DATA,
    VARINT_ENC_SLEB128, VARINT_ENC_ULEB128, VARINT_ENC_ZERO, VECTOR_DATA_FORMAT_MASK, VERSION_BYTE,
};
use cte_core::sizing::{CryptoScheme, EntrySizing};
use snafu::{ensure, Backtrace, OptionExt, Snafu};

use crate::leb128;

/// Module-level error type:
/// for errors which may occur while encoding CTE fields.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The buffer must at least hold the version byte.
    #[snafu(display("encoder capacity must be at least 1 for the version byte"))]
    InvalidCapacity { backtrace: Backtrace },

    /// The field does not fit in the remaining buffer capacity.
    #[snafu(display(
        "write of {} bytes at position {} past buffer capacity ({} bytes)",
        needed,
        position,
        capacity
    ))]
    BufferOverflow {
        needed: usize,
        position: usize,
        capacity: usize,
        backtrace: Backtrace,
    },

    /// Key and signature vectors carry between 1 and 15 items.
    #[snafu(display(
        "vector item count {} out of range (1-{})",
        count,
        MAX_VECTOR_COUNT
    ))]
    InvalidCount { count: u8, backtrace: Backtrace },

    /// The entry size code is not defined by the active sizing dialect.
    #[snafu(display("unknown entry size code {} for {}", code, kind))]
    InvalidSizeCode {
        code: u8,
        kind: Tag,
        backtrace: Backtrace,
    },

    /// A vector payload must match `count × item size` exactly.
    #[snafu(display(
        "vector payload of {} bytes does not match {} items of {} bytes",
        actual,
        count,
        item_size
    ))]
    InvalidPayloadLength {
        actual: usize,
        count: u8,
        item_size: usize,
        backtrace: Backtrace,
    },

    /// Index references hold 4 bits of value.
    #[snafu(display("index value {} out of range (0-{})", value, MAX_INDEX_VALUE))]
    InvalidIndexValue { value: u8, backtrace: Backtrace },

    /// Vector data payloads are bounded by the extended format maximum.
    #[snafu(display(
        "vector data payload length {} out of range (0-{})",
        length,
        EXTENDED_VECTOR_DATA_MAX_LEN
    ))]
    InvalidVectorDataLength { length: usize, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An append-only builder of CTE transaction buffers, generic over the
/// entry sizing dialect used for key and signature vectors.
#[derive(Debug)]
pub struct Encoder<S = CryptoScheme> {
    buffer: Vec<u8>,
    position: usize,
    sizing: S,
}

impl Encoder<CryptoScheme> {
    /// Create an encoder over a fresh buffer of exactly `capacity`
    /// bytes, using the default crypto scheme sizing dialect. The
    /// version byte is written immediately.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Encoder::with_capacity_and_sizing(capacity, CryptoScheme)
    }
}

impl<S> Encoder<S>
where
    S: EntrySizing,
{
    /// Create an encoder over a fresh buffer of exactly `capacity`
    /// bytes, resolving vector entry sizes through `sizing`.
    pub fn with_capacity_and_sizing(capacity: usize, sizing: S) -> Result<Self> {
        ensure!(capacity >= 1, InvalidCapacitySnafu);
        let mut buffer = vec![0; capacity];
        buffer[0] = VERSION_BYTE;
        Ok(Encoder {
            buffer,
            position: 1,
            sizing,
        })
    }

    /// Truncate the encoder back to a fresh transaction:
    /// the version byte is rewritten and the position returns to 1.
    pub fn reset(&mut self) {
        self.buffer[0] = VERSION_BYTE;
        self.position = 1;
    }

    /// The encoded transaction produced so far.
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// The number of bytes written so far, version byte included.
    pub fn size(&self) -> usize {
        self.position
    }

    /// The total buffer capacity given at construction.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn check_capacity(&self, needed: usize) -> Result<()> {
        ensure!(
            needed <= self.buffer.len() - self.position,
            BufferOverflowSnafu {
                needed,
                position: self.position,
                capacity: self.buffer.len(),
            }
        );
        Ok(())
    }

    fn begin_vector(
        &mut self,
        tag: Tag,
        count: u8,
        size_code: u8,
        item_size: usize,
    ) -> Result<&mut [u8]> {
        ensure!(
            (1..=MAX_VECTOR_COUNT).contains(&count),
            InvalidCountSnafu { count }
        );
        let payload_len = usize::from(count) * item_size;
        self.check_capacity(1 + payload_len)?;
        self.buffer[self.position] = tag.bits() | (count << 2) | (size_code & ENTRY_SIZE_CODE_MASK);
        let start = self.position + 1;
        self.position = start + payload_len;
        Ok(&mut self.buffer[start..start + payload_len])
    }

    /// Write a public key vector header and reserve its payload region,
    /// returning the writable payload slice for the caller to fill.
    pub fn begin_public_key_vector(&mut self, count: u8, size_code: u8) -> Result<&mut [u8]> {
        let item_size = self
            .sizing
            .public_key_size(size_code)
            .context(InvalidSizeCodeSnafu {
                code: size_code,
                kind: Tag::PublicKeyVector,
            })?;
        self.begin_vector(Tag::PublicKeyVector, count, size_code, item_size)
    }

    /// Write a signature vector header and reserve its payload region,
    /// returning the writable payload slice for the caller to fill.
    pub fn begin_signature_vector(&mut self, count: u8, size_code: u8) -> Result<&mut [u8]> {
        let item_size = self
            .sizing
            .signature_size(size_code)
            .context(InvalidSizeCodeSnafu {
                code: size_code,
                kind: Tag::SignatureVector,
            })?;
        self.begin_vector(Tag::SignatureVector, count, size_code, item_size)
    }

    /// Write a complete public key vector field from the given payload
    /// bytes, which must span exactly `count` items of the size named
    /// by `size_code`.
    pub fn put_public_key_vector(
        &mut self,
        count: u8,
        size_code: u8,
        payload: &[u8],
    ) -> Result<()> {
        let item_size = self
            .sizing
            .public_key_size(size_code)
            .context(InvalidSizeCodeSnafu {
                code: size_code,
                kind: Tag::PublicKeyVector,
            })?;
        ensure!(
            (1..=MAX_VECTOR_COUNT).contains(&count),
            InvalidCountSnafu { count }
        );
        ensure!(
            payload.len() == usize::from(count) * item_size,
            InvalidPayloadLengthSnafu {
                actual: payload.len(),
                count,
                item_size,
            }
        );
        self.begin_vector(Tag::PublicKeyVector, count, size_code, item_size)?
            .copy_from_slice(payload);
        Ok(())
    }

    /// Write a complete signature vector field from the given payload
    /// bytes, which must span exactly `count` items of the size named
    /// by `size_code`.
    pub fn put_signature_vector(&mut self, count: u8, size_code: u8, payload: &[u8]) -> Result<()> {
        let item_size = self
            .sizing
            .signature_size(size_code)
            .context(InvalidSizeCodeSnafu {
                code: size_code,
                kind: Tag::SignatureVector,
            })?;
        ensure!(
            (1..=MAX_VECTOR_COUNT).contains(&count),
            InvalidCountSnafu { count }
        );
        ensure!(
            payload.len() == usize::from(count) * item_size,
            InvalidPayloadLengthSnafu {
                actual: payload.len(),
                count,
                item_size,
            }
        );
        self.begin_vector(Tag::SignatureVector, count, size_code, item_size)?
            .copy_from_slice(payload);
        Ok(())
    }

    /// Write a vector data header for a payload of `length` bytes and
    /// reserve the payload region, returning the writable payload
    /// slice. The short format is chosen for lengths up to 31 and the
    /// extended format beyond, up to the extended maximum.
    pub fn begin_vector_data(&mut self, length: usize) -> Result<&mut [u8]> {
        let header_len = if length <= SHORT_VECTOR_DATA_MAX_LEN {
            self.check_capacity(1 + length)?;
            self.buffer[self.position] = TAG_VECTOR_DATA | (length as u8);
            1
        } else if length <= EXTENDED_VECTOR_DATA_MAX_LEN {
            self.check_capacity(2 + length)?;
            let high = ((length >> 8) & 0x07) as u8;
            self.buffer[self.position] = TAG_VECTOR_DATA | VECTOR_DATA_FORMAT_MASK | (high << 2);
            self.buffer[self.position + 1] = (length & 0xFF) as u8;
            2
        } else {
            return InvalidVectorDataLengthSnafu { length }.fail();
        };
        let start = self.position + header_len;
        self.position = start + length;
        Ok(&mut self.buffer[start..start + length])
    }

    /// Write a complete vector data field from the given payload bytes.
    pub fn put_vector_data(&mut self, payload: &[u8]) -> Result<()> {
        self.begin_vector_data(payload.len())?
            .copy_from_slice(payload);
        Ok(())
    }

    /// Write an index reference field (a single header byte).
    pub fn write_index(&mut self, value: u8) -> Result<()> {
        ensure!(value <= MAX_INDEX_VALUE, InvalidIndexValueSnafu { value });
        self.check_capacity(1)?;
        self.buffer[self.position] = TAG_IXDATA | (value << 2) | IXDATA_SUBTYPE_INDEX;
        self.position += 1;
        Ok(())
    }

    /// Write the canonical one-byte varint encoding of the value zero.
    pub fn write_varint_zero(&mut self) -> Result<()> {
        self.check_capacity(1)?;
        self.buffer[self.position] =
            TAG_IXDATA | (VARINT_ENC_ZERO << 2) | IXDATA_SUBTYPE_VARINT;
        self.position += 1;
        Ok(())
    }

    /// Write a varint field carrying `value` as ULEB128 trailing bytes.
    pub fn write_uleb128(&mut self, value: u64) -> Result<()> {
        let len = leb128::uleb128_len(value);
        self.check_capacity(1 + len)?;
        self.buffer[self.position] =
            TAG_IXDATA | (VARINT_ENC_ULEB128 << 2) | IXDATA_SUBTYPE_VARINT;
        let written = leb128::encode_uleb128(&mut self.buffer[self.position + 1..], value);
        debug_assert_eq!(written, len);
        self.position += 1 + written;
        Ok(())
    }

    /// Write a varint field carrying `value` as SLEB128 trailing bytes.
    pub fn write_sleb128(&mut self, value: i64) -> Result<()> {
        let len = leb128::sleb128_len(value);
        self.check_capacity(1 + len)?;
        self.buffer[self.position] =
            TAG_IXDATA | (VARINT_ENC_SLEB128 << 2) | IXDATA_SUBTYPE_VARINT;
        let written = leb128::encode_sleb128(&mut self.buffer[self.position + 1..], value);
        debug_assert_eq!(written, len);
        self.position += 1 + written;
        Ok(())
    }

    fn write_fixed(&mut self, ty: FixedType, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len(), ty.width());
        self.check_capacity(1 + data.len())?;
        self.buffer[self.position] = TAG_IXDATA | (ty.code() << 2) | IXDATA_SUBTYPE_FIXED;
        self.buffer[self.position + 1..self.position + 1 + data.len()].copy_from_slice(data);
        self.position += 1 + data.len();
        Ok(())
    }

    /// Write a fixed-width signed 8-bit integer field.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_fixed(FixedType::I8, &[value as u8])
    }

    /// Write a fixed-width signed 16-bit integer field.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        let mut data = [0; 2];
        LittleEndian::write_i16(&mut data, value);
        self.write_fixed(FixedType::I16, &data)
    }

    /// Write a fixed-width signed 32-bit integer field.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        let mut data = [0; 4];
        LittleEndian::write_i32(&mut data, value);
        self.write_fixed(FixedType::I32, &data)
    }

    /// Write a fixed-width signed 64-bit integer field.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        let mut data = [0; 8];
        LittleEndian::write_i64(&mut data, value);
        self.write_fixed(FixedType::I64, &data)
    }

    /// Write a fixed-width unsigned 8-bit integer field.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_fixed(FixedType::U8, &[value])
    }

    /// Write a fixed-width unsigned 16-bit integer field.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        let mut data = [0; 2];
        LittleEndian::write_u16(&mut data, value);
        self.write_fixed(FixedType::U16, &data)
    }

    /// Write a fixed-width unsigned 32-bit integer field.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let mut data = [0; 4];
        LittleEndian::write_u32(&mut data, value);
        self.write_fixed(FixedType::U32, &data)
    }

    /// Write a fixed-width unsigned 64-bit integer field.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let mut data = [0; 8];
        LittleEndian::write_u64(&mut data, value);
        self.write_fixed(FixedType::U64, &data)
    }

    /// Write a fixed-width single precision float field.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        let mut data = [0; 4];
        LittleEndian::write_f32(&mut data, value);
        self.write_fixed(FixedType::F32, &data)
    }

    /// Write a fixed-width double precision float field.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        let mut data = [0; 8];
        LittleEndian::write_f64(&mut data, value);
        self.write_fixed(FixedType::F64, &data)
    }

    /// Write a boolean constant field (a single header byte).
    pub fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.check_capacity(1)?;
        let code = if value { CONST_TRUE } else { CONST_FALSE };
        self.buffer[self.position] = TAG_IXDATA | (code << 2) | IXDATA_SUBTYPE_CONSTANT;
        self.position += 1;
        Ok(())
    }
}
