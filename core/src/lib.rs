#![crate_type = "lib"]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features
)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core CTE library, containing the vocabulary of the Compact
//! Transaction Encoding: the wire-format constants, the field tag and
//! subtype code spaces, the peek classification of header bytes, and the
//! entry-sizing dialects for key and signature vectors.
//!
//! This crate performs no I/O and holds no codec state; the encoder lives
//! in `cte-encoding` and the stateful decoder in `cte-parser`.

pub mod header;
pub mod sizing;

pub use header::{
    FixedType, PeekType, Tag, VarintEncoding, MAX_TRANSACTION_SIZE, VERSION_BYTE,
};
pub use sizing::{CryptoScheme, EntrySizing, SizeClass};
