#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
//! This crate provides a stateful reader of CTE transaction buffers.
//!
//! The [`Decoder`] is a cursor over a loaded transaction: it validates
//! the version byte on first use, classifies the upcoming field without
//! consuming it ([`Decoder::peek_type`]), and consumes fields through
//! typed read operations which validate every header bit before
//! advancing. The [`stream`] module adds a push-style driver which
//! walks a whole transaction and dispatches each field to a
//! [`DataHandler`] callback.

pub mod stateful;
pub mod stream;

pub use stateful::decode::Decoder;
pub use stream::DataHandler;
