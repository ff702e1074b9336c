#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
//! CTE encoding and decoding primitives.
//!
//! This crate provides the byte-level grammar of the Compact Transaction
//! Encoding and the append-only [`Encoder`]. The [`decode`] module holds
//! the stateless header validation shared with the stateful decoder in
//! `cte-parser`; the [`leb128`] module holds the ULEB128/SLEB128
//! sub-codecs used by the varint field kinds.

pub mod decode;
pub mod encode;
pub mod leb128;

pub use encode::Encoder;
