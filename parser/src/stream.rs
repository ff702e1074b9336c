//! This module contains a push-style driver for reading CTE content
//! sequentially.
//!
//! The rest of the crate is used to peek at and consume individual
//! fields. At this level, a whole transaction is walked in one call:
//! every field is read in stream order and dispatched to a
//! [`DataHandler`] callback together with its classification and
//! payload bytes.

use cte_core::header::PeekType;
use cte_core::sizing::EntrySizing;

use crate::stateful::decode::{Decoder, Result};

/// A callback receiving every field of a transaction, in stream order.
///
/// For key vectors, signature vectors, and vector data fields, the
/// payload is a borrow into the decoder's buffer spanning the field's
/// raw payload bytes. For scalar IxData fields it is a stack-local
/// copy of the decoded value in native byte order: eight bytes for the
/// varint kinds, the scalar's own width for the fixed kinds, and a
/// single `0`/`1` byte for index references and boolean constants.
/// The payload must not be retained past the call.
pub trait DataHandler {
    /// Handle one decoded field.
    fn handle_field(&mut self, kind: PeekType, payload: &[u8]);
}

impl<F> DataHandler for F
where
    F: FnMut(PeekType, &[u8]),
{
    fn handle_field(&mut self, kind: PeekType, payload: &[u8]) {
        self(kind, payload)
    }
}

impl<S> Decoder<S>
where
    S: EntrySizing,
{
    /// Drive the whole transaction through the given handler.
    ///
    /// Fields are peeked, read, and dispatched one at a time until the
    /// end of the buffer. Any decoding failure aborts the run with the
    /// field left unconsumed.
    pub fn run<H>(&mut self, handler: &mut H) -> Result<()>
    where
        H: DataHandler,
    {
        loop {
            let kind = self.peek_type()?;
            tracing::trace!(position = self.position(), %kind, "dispatching field");
            match kind {
                PeekType::Eof => return Ok(()),
                PeekType::PkVector0
                | PeekType::PkVector1
                | PeekType::PkVector2
                | PeekType::PkVector3 => {
                    let payload = self.read_public_key_vector()?;
                    handler.handle_field(kind, payload);
                }
                PeekType::SigVector0
                | PeekType::SigVector1
                | PeekType::SigVector2
                | PeekType::SigVector3 => {
                    let payload = self.read_signature_vector()?;
                    handler.handle_field(kind, payload);
                }
                PeekType::VectorShort | PeekType::VectorExtended => {
                    let payload = self.read_vector_data()?;
                    handler.handle_field(kind, payload);
                }
                PeekType::IxIndex => {
                    let value = self.read_index()?;
                    handler.handle_field(kind, &[value]);
                }
                PeekType::IxVarintZero => {
                    let value = self.read_varint_zero()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxUleb128 => {
                    let value = self.read_uleb128()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxSleb128 => {
                    let value = self.read_sleb128()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxInt8 => {
                    let value = self.read_i8()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxInt16 => {
                    let value = self.read_i16()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxInt32 => {
                    let value = self.read_i32()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxInt64 => {
                    let value = self.read_i64()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxUint8 => {
                    let value = self.read_u8()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxUint16 => {
                    let value = self.read_u16()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxUint32 => {
                    let value = self.read_u32()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxUint64 => {
                    let value = self.read_u64()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxFloat32 => {
                    let value = self.read_f32()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxFloat64 => {
                    let value = self.read_f64()?;
                    handler.handle_field(kind, &value.to_ne_bytes());
                }
                PeekType::IxConstFalse | PeekType::IxConstTrue => {
                    let value = self.read_boolean()?;
                    handler.handle_field(kind, &[u8::from(value)]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cte_encoding::Encoder;

    #[derive(Debug, Default)]
    struct Recorder {
        fields: Vec<(PeekType, Vec<u8>)>,
    }

    impl DataHandler for Recorder {
        fn handle_field(&mut self, kind: PeekType, payload: &[u8]) {
            self.fields.push((kind, payload.to_vec()));
        }
    }

    #[test]
    fn empty_transaction_dispatches_nothing() {
        let mut dec = Decoder::from_bytes(&[0xF1]).unwrap();
        let mut recorder = Recorder::default();
        dec.run(&mut recorder).unwrap();
        assert!(recorder.fields.is_empty());
    }

    #[test]
    fn fields_are_dispatched_in_stream_order() {
        let keys: Vec<u8> = (0..64).map(|i| 0xAA_u8.wrapping_add(i)).collect();
        let mut enc = Encoder::with_capacity(128).unwrap();
        enc.put_public_key_vector(2, 0, &keys).unwrap();
        enc.write_index(1).unwrap();

        let mut dec = Decoder::from_bytes(enc.data()).unwrap();
        let mut recorder = Recorder::default();
        dec.run(&mut recorder).unwrap();

        assert_eq!(recorder.fields.len(), 2);
        assert_eq!(recorder.fields[0].0, PeekType::PkVector0);
        assert_eq!(recorder.fields[0].1, keys);
        assert_eq!(recorder.fields[1].0, PeekType::IxIndex);
        assert_eq!(recorder.fields[1].1, vec![1]);
        assert_eq!(dec.position(), dec.size());
    }

    #[test]
    fn scalar_payloads_are_native_copies() {
        let mut enc = Encoder::with_capacity(64).unwrap();
        enc.write_uleb128(123_456).unwrap();
        enc.write_i16(-2).unwrap();
        enc.write_boolean(true).unwrap();

        let mut dec = Decoder::from_bytes(enc.data()).unwrap();
        let mut recorder = Recorder::default();
        dec.run(&mut recorder).unwrap();

        assert_eq!(
            recorder.fields,
            vec![
                (PeekType::IxUleb128, 123_456_u64.to_ne_bytes().to_vec()),
                (PeekType::IxInt16, (-2_i16).to_ne_bytes().to_vec()),
                (PeekType::IxConstTrue, vec![1]),
            ]
        );
    }

    #[test]
    fn closures_are_handlers() {
        let mut enc = Encoder::with_capacity(64).unwrap();
        enc.write_u8(7).unwrap();
        let mut count = 0;
        let mut handler = |kind: PeekType, payload: &[u8]| {
            assert_eq!(kind, PeekType::IxUint8);
            assert_eq!(payload, &[7]);
            count += 1;
        };
        let mut dec = Decoder::from_bytes(enc.data()).unwrap();
        dec.run(&mut handler).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn a_bad_field_aborts_the_run() {
        // index, then a reserved varint encoding code
        let mut dec = Decoder::from_bytes(&[0xF1, 0x94, 0x8D]).unwrap();
        let mut recorder = Recorder::default();
        assert!(dec.run(&mut recorder).is_err());
        assert_eq!(recorder.fields.len(), 1);
    }
}
