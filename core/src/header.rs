//! This module contains the byte-level vocabulary of the CTE wire format:
//! the version byte, the field tag space, the IxData subtype and detail
//! code spaces, the vector data format limits, and the [`PeekType`]
//! classification of a field header byte.
//!
//! A CTE transaction is the version byte followed by a concatenation of
//! self-delimiting fields. The first byte of every field (the *header*)
//! carries a 2-bit tag in bits 7-6 selecting one of four field families,
//! plus further classifier bits whose meaning depends on the family.

use std::fmt;

/// The CTE version byte: `0xF` marker nibble, format version 1.
pub const VERSION_BYTE: u8 = 0xF1;

/// Maximum total length of an encoded transaction, in bytes.
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// Mask extracting the 2-bit field tag from a header byte.
pub const TAG_MASK: u8 = 0xC0;

/// Tag bits of a public key vector field (`00xxxxxx`).
pub const TAG_PUBLIC_KEY_VECTOR: u8 = 0x00;
/// Tag bits of a signature vector field (`01xxxxxx`).
pub const TAG_SIGNATURE_VECTOR: u8 = 0x40;
/// Tag bits of an IxData field (`10xxxxxx`).
pub const TAG_IXDATA: u8 = 0x80;
/// Tag bits of a generic vector data field (`11xxxxxx`).
pub const TAG_VECTOR_DATA: u8 = 0xC0;

/// Maximum item count of a key or signature vector (bits 5-2, `N` >= 1).
pub const MAX_VECTOR_COUNT: u8 = 15;

/// Mask extracting the entry size code of a key or signature vector
/// (bits 1-0); interpreted through an [`EntrySizing`] dialect.
///
/// [`EntrySizing`]: crate::sizing::EntrySizing
pub const ENTRY_SIZE_CODE_MASK: u8 = 0x03;

/// Mask extracting the IxData subtype (bits 1-0).
pub const IXDATA_SUBTYPE_MASK: u8 = 0x03;

/// IxData subtype: index reference, value in bits 5-2.
pub const IXDATA_SUBTYPE_INDEX: u8 = 0x00;
/// IxData subtype: variable-length integer, encoding scheme in bits 5-2.
pub const IXDATA_SUBTYPE_VARINT: u8 = 0x01;
/// IxData subtype: fixed-width scalar, type code in bits 5-2.
pub const IXDATA_SUBTYPE_FIXED: u8 = 0x02;
/// IxData subtype: constant, value code in bits 5-2.
pub const IXDATA_SUBTYPE_CONSTANT: u8 = 0x03;

/// Varint encoding code: the value zero, no trailing bytes.
pub const VARINT_ENC_ZERO: u8 = 0x00;
/// Varint encoding code: ULEB128 bytes follow.
pub const VARINT_ENC_ULEB128: u8 = 0x01;
/// Varint encoding code: SLEB128 bytes follow.
pub const VARINT_ENC_SLEB128: u8 = 0x02;

/// Constant value code for boolean `false`.
pub const CONST_FALSE: u8 = 0x00;
/// Constant value code for boolean `true`.
pub const CONST_TRUE: u8 = 0x01;

/// Maximum value of an index reference field.
pub const MAX_INDEX_VALUE: u8 = 15;

/// Mask of the vector data format flag (bit 5): extended when set.
pub const VECTOR_DATA_FORMAT_MASK: u8 = 0x20;
/// Mask of the reserved bits of an extended vector data first header
/// byte; these must be zero.
pub const VECTOR_DATA_PADDING_MASK: u8 = 0x03;

/// Maximum payload length of a short-format vector data field.
pub const SHORT_VECTOR_DATA_MAX_LEN: usize = 31;
/// Minimum payload length of an extended-format vector data field.
pub const EXTENDED_VECTOR_DATA_MIN_LEN: usize = 32;
/// Maximum payload length of an extended-format vector data field
/// (11 bits of length: 3 in the first header byte, 8 in the second).
pub const EXTENDED_VECTOR_DATA_MAX_LEN: usize = 1197;

/// Extract the 4-bit detail code (bits 5-2) from an IxData header byte.
#[inline]
pub fn detail_code(header: u8) -> u8 {
    (header >> 2) & 0x0F
}

/// Extract the IxData subtype code (bits 1-0) from a header byte.
#[inline]
pub fn subtype_code(header: u8) -> u8 {
    header & IXDATA_SUBTYPE_MASK
}

/// The four field families of the CTE format, selected by the top two
/// bits of a field header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Tag `00`: a vector of raw public keys.
    PublicKeyVector,
    /// Tag `01`: a vector of raw signatures (or signature hashes).
    SignatureVector,
    /// Tag `10`: an inline/extended scalar field.
    IxData,
    /// Tag `11`: an opaque byte payload.
    VectorData,
}

impl Tag {
    /// Classify a header byte by its top two bits.
    /// The 2-bit tag space is closed, so this is total.
    pub fn from_header(header: u8) -> Tag {
        match header & TAG_MASK {
            TAG_PUBLIC_KEY_VECTOR => Tag::PublicKeyVector,
            TAG_SIGNATURE_VECTOR => Tag::SignatureVector,
            TAG_IXDATA => Tag::IxData,
            _ => Tag::VectorData,
        }
    }

    /// The tag's bit pattern, positioned at bits 7-6.
    pub fn bits(self) -> u8 {
        match self {
            Tag::PublicKeyVector => TAG_PUBLIC_KEY_VECTOR,
            Tag::SignatureVector => TAG_SIGNATURE_VECTOR,
            Tag::IxData => TAG_IXDATA,
            Tag::VectorData => TAG_VECTOR_DATA,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Tag::PublicKeyVector => "public key vector",
            Tag::SignatureVector => "signature vector",
            Tag::IxData => "IxData",
            Tag::VectorData => "vector data",
        };
        f.write_str(name)
    }
}

/// The closed set of fixed-width scalar types of the IxData fixed
/// subtype, identified by the 4-bit detail code. Codes 10-15 are
/// reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedType {
    /// Code 0: signed 8-bit integer, 1 trailing byte.
    I8,
    /// Code 1: signed 16-bit integer, 2 trailing bytes, little endian.
    I16,
    /// Code 2: signed 32-bit integer, 4 trailing bytes, little endian.
    I32,
    /// Code 3: signed 64-bit integer, 8 trailing bytes, little endian.
    I64,
    /// Code 4: unsigned 8-bit integer, 1 trailing byte.
    U8,
    /// Code 5: unsigned 16-bit integer, 2 trailing bytes, little endian.
    U16,
    /// Code 6: unsigned 32-bit integer, 4 trailing bytes, little endian.
    U32,
    /// Code 7: unsigned 64-bit integer, 8 trailing bytes, little endian.
    U64,
    /// Code 8: IEEE-754 single precision float, 4 trailing bytes,
    /// little endian.
    F32,
    /// Code 9: IEEE-754 double precision float, 8 trailing bytes,
    /// little endian.
    F64,
}

impl FixedType {
    /// Obtain the scalar type for the given detail code,
    /// or `None` for the reserved codes 10-15.
    pub fn from_code(code: u8) -> Option<FixedType> {
        match code {
            0 => Some(FixedType::I8),
            1 => Some(FixedType::I16),
            2 => Some(FixedType::I32),
            3 => Some(FixedType::I64),
            4 => Some(FixedType::U8),
            5 => Some(FixedType::U16),
            6 => Some(FixedType::U32),
            7 => Some(FixedType::U64),
            8 => Some(FixedType::F32),
            9 => Some(FixedType::F64),
            _ => None,
        }
    }

    /// The type's 4-bit detail code.
    pub fn code(self) -> u8 {
        match self {
            FixedType::I8 => 0,
            FixedType::I16 => 1,
            FixedType::I32 => 2,
            FixedType::I64 => 3,
            FixedType::U8 => 4,
            FixedType::U16 => 5,
            FixedType::U32 => 6,
            FixedType::U64 => 7,
            FixedType::F32 => 8,
            FixedType::F64 => 9,
        }
    }

    /// The number of trailing bytes carrying the scalar value.
    pub fn width(self) -> usize {
        match self {
            FixedType::I8 | FixedType::U8 => 1,
            FixedType::I16 | FixedType::U16 => 2,
            FixedType::I32 | FixedType::U32 | FixedType::F32 => 4,
            FixedType::I64 | FixedType::U64 | FixedType::F64 => 8,
        }
    }
}

impl fmt::Display for FixedType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FixedType::I8 => "i8",
            FixedType::I16 => "i16",
            FixedType::I32 => "i32",
            FixedType::I64 => "i64",
            FixedType::U8 => "u8",
            FixedType::U16 => "u16",
            FixedType::U32 => "u32",
            FixedType::U64 => "u64",
            FixedType::F32 => "f32",
            FixedType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// The varint encoding schemes of the IxData varint subtype.
/// Detail codes 3-15 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarintEncoding {
    /// Code 0: the value zero, encoded in the header alone.
    Zero,
    /// Code 1: ULEB128 bytes follow the header.
    Uleb128,
    /// Code 2: SLEB128 bytes follow the header.
    Sleb128,
}

impl VarintEncoding {
    /// Obtain the encoding scheme for the given detail code,
    /// or `None` for the reserved codes 3-15.
    pub fn from_code(code: u8) -> Option<VarintEncoding> {
        match code {
            VARINT_ENC_ZERO => Some(VarintEncoding::Zero),
            VARINT_ENC_ULEB128 => Some(VarintEncoding::Uleb128),
            VARINT_ENC_SLEB128 => Some(VarintEncoding::Sleb128),
            _ => None,
        }
    }

    /// The scheme's 4-bit detail code.
    pub fn code(self) -> u8 {
        match self {
            VarintEncoding::Zero => VARINT_ENC_ZERO,
            VarintEncoding::Uleb128 => VARINT_ENC_ULEB128,
            VarintEncoding::Sleb128 => VARINT_ENC_SLEB128,
        }
    }
}

/// The unique classification of the next field in a transaction, as
/// reported by the decoder's peek operation. Every well-formed header
/// byte maps to exactly one enumerant; `Eof` stands for the end of the
/// buffer, where no header byte remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeekType {
    /// Public key vector, entry size code 0.
    PkVector0,
    /// Public key vector, entry size code 1.
    PkVector1,
    /// Public key vector, entry size code 2.
    PkVector2,
    /// Public key vector, entry size code 3.
    PkVector3,
    /// Signature vector, entry size code 0.
    SigVector0,
    /// Signature vector, entry size code 1.
    SigVector1,
    /// Signature vector, entry size code 2.
    SigVector2,
    /// Signature vector, entry size code 3.
    SigVector3,
    /// IxData index reference (value 0-15 in the header).
    IxIndex,
    /// IxData varint holding the value zero in the header alone.
    IxVarintZero,
    /// IxData varint with ULEB128 trailing bytes.
    IxUleb128,
    /// IxData varint with SLEB128 trailing bytes.
    IxSleb128,
    /// IxData fixed-width signed 8-bit integer.
    IxInt8,
    /// IxData fixed-width signed 16-bit integer.
    IxInt16,
    /// IxData fixed-width signed 32-bit integer.
    IxInt32,
    /// IxData fixed-width signed 64-bit integer.
    IxInt64,
    /// IxData fixed-width unsigned 8-bit integer.
    IxUint8,
    /// IxData fixed-width unsigned 16-bit integer.
    IxUint16,
    /// IxData fixed-width unsigned 32-bit integer.
    IxUint32,
    /// IxData fixed-width unsigned 64-bit integer.
    IxUint64,
    /// IxData fixed-width single precision float.
    IxFloat32,
    /// IxData fixed-width double precision float.
    IxFloat64,
    /// IxData boolean constant `false`.
    IxConstFalse,
    /// IxData boolean constant `true`.
    IxConstTrue,
    /// Vector data in the 1-byte short header format (0-31 bytes).
    VectorShort,
    /// Vector data in the 2-byte extended header format (32-1197 bytes).
    VectorExtended,
    /// End of the transaction buffer; no field follows.
    Eof,
}

impl PeekType {
    /// Classify a field header byte into its unique enumerant.
    ///
    /// Returns `None` when the header carries a reserved IxData detail
    /// code (varint encodings 3-15, fixed type codes 10-15, constant
    /// value codes 2-15). Key/signature vector counts and entry size
    /// codes are not validated here; that is the reading operation's
    /// job.
    pub fn from_header(header: u8) -> Option<PeekType> {
        match header & TAG_MASK {
            TAG_PUBLIC_KEY_VECTOR => Some(match header & ENTRY_SIZE_CODE_MASK {
                0 => PeekType::PkVector0,
                1 => PeekType::PkVector1,
                2 => PeekType::PkVector2,
                _ => PeekType::PkVector3,
            }),
            TAG_SIGNATURE_VECTOR => Some(match header & ENTRY_SIZE_CODE_MASK {
                0 => PeekType::SigVector0,
                1 => PeekType::SigVector1,
                2 => PeekType::SigVector2,
                _ => PeekType::SigVector3,
            }),
            TAG_IXDATA => {
                let detail = detail_code(header);
                match subtype_code(header) {
                    IXDATA_SUBTYPE_INDEX => Some(PeekType::IxIndex),
                    IXDATA_SUBTYPE_VARINT => VarintEncoding::from_code(detail).map(|enc| match enc {
                        VarintEncoding::Zero => PeekType::IxVarintZero,
                        VarintEncoding::Uleb128 => PeekType::IxUleb128,
                        VarintEncoding::Sleb128 => PeekType::IxSleb128,
                    }),
                    IXDATA_SUBTYPE_FIXED => FixedType::from_code(detail).map(PeekType::of_fixed),
                    _ => match detail {
                        CONST_FALSE => Some(PeekType::IxConstFalse),
                        CONST_TRUE => Some(PeekType::IxConstTrue),
                        _ => None,
                    },
                }
            }
            _ => Some(if header & VECTOR_DATA_FORMAT_MASK == 0 {
                PeekType::VectorShort
            } else {
                PeekType::VectorExtended
            }),
        }
    }

    /// The enumerant of a fixed-width scalar field of the given type.
    pub fn of_fixed(ty: FixedType) -> PeekType {
        match ty {
            FixedType::I8 => PeekType::IxInt8,
            FixedType::I16 => PeekType::IxInt16,
            FixedType::I32 => PeekType::IxInt32,
            FixedType::I64 => PeekType::IxInt64,
            FixedType::U8 => PeekType::IxUint8,
            FixedType::U16 => PeekType::IxUint16,
            FixedType::U32 => PeekType::IxUint32,
            FixedType::U64 => PeekType::IxUint64,
            FixedType::F32 => PeekType::IxFloat32,
            FixedType::F64 => PeekType::IxFloat64,
        }
    }

    /// The field family this enumerant belongs to,
    /// or `None` for `Eof`.
    pub fn tag(self) -> Option<Tag> {
        match self {
            PeekType::PkVector0
            | PeekType::PkVector1
            | PeekType::PkVector2
            | PeekType::PkVector3 => Some(Tag::PublicKeyVector),
            PeekType::SigVector0
            | PeekType::SigVector1
            | PeekType::SigVector2
            | PeekType::SigVector3 => Some(Tag::SignatureVector),
            PeekType::VectorShort | PeekType::VectorExtended => Some(Tag::VectorData),
            PeekType::Eof => None,
            _ => Some(Tag::IxData),
        }
    }

    /// The entry size code of a key or signature vector enumerant,
    /// or `None` for any other kind.
    pub fn entry_size_code(self) -> Option<u8> {
        match self {
            PeekType::PkVector0 | PeekType::SigVector0 => Some(0),
            PeekType::PkVector1 | PeekType::SigVector1 => Some(1),
            PeekType::PkVector2 | PeekType::SigVector2 => Some(2),
            PeekType::PkVector3 | PeekType::SigVector3 => Some(3),
            _ => None,
        }
    }

    /// The scalar type of a fixed-width IxData enumerant,
    /// or `None` for any other kind.
    pub fn fixed_type(self) -> Option<FixedType> {
        match self {
            PeekType::IxInt8 => Some(FixedType::I8),
            PeekType::IxInt16 => Some(FixedType::I16),
            PeekType::IxInt32 => Some(FixedType::I32),
            PeekType::IxInt64 => Some(FixedType::I64),
            PeekType::IxUint8 => Some(FixedType::U8),
            PeekType::IxUint16 => Some(FixedType::U16),
            PeekType::IxUint32 => Some(FixedType::U32),
            PeekType::IxUint64 => Some(FixedType::U64),
            PeekType::IxFloat32 => Some(FixedType::F32),
            PeekType::IxFloat64 => Some(FixedType::F64),
            _ => None,
        }
    }
}

impl fmt::Display for PeekType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PeekType::PkVector0 => "pk-vector-0",
            PeekType::PkVector1 => "pk-vector-1",
            PeekType::PkVector2 => "pk-vector-2",
            PeekType::PkVector3 => "pk-vector-3",
            PeekType::SigVector0 => "sig-vector-0",
            PeekType::SigVector1 => "sig-vector-1",
            PeekType::SigVector2 => "sig-vector-2",
            PeekType::SigVector3 => "sig-vector-3",
            PeekType::IxIndex => "ixdata-index",
            PeekType::IxVarintZero => "ixdata-varint-zero",
            PeekType::IxUleb128 => "ixdata-uleb128",
            PeekType::IxSleb128 => "ixdata-sleb128",
            PeekType::IxInt8 => "ixdata-i8",
            PeekType::IxInt16 => "ixdata-i16",
            PeekType::IxInt32 => "ixdata-i32",
            PeekType::IxInt64 => "ixdata-i64",
            PeekType::IxUint8 => "ixdata-u8",
            PeekType::IxUint16 => "ixdata-u16",
            PeekType::IxUint32 => "ixdata-u32",
            PeekType::IxUint64 => "ixdata-u64",
            PeekType::IxFloat32 => "ixdata-f32",
            PeekType::IxFloat64 => "ixdata-f64",
            PeekType::IxConstFalse => "ixdata-const-false",
            PeekType::IxConstTrue => "ixdata-const-true",
            PeekType::VectorShort => "vector-short",
            PeekType::VectorExtended => "vector-extended",
            PeekType::Eof => "eof",
        };
        f.write_str(name)
    }
}
