//! End-to-end tests: transactions built by the encoder are parsed back
//! field by field, with byte-exact buffers checked along the way.

use cte_core::header::PeekType;
use cte_encoding::Encoder;
use cte_parser::{DataHandler, Decoder};

#[test]
fn empty_transaction() {
    let enc = Encoder::with_capacity(16).unwrap();
    assert_eq!(enc.data(), &[0xF1]);
    assert_eq!(enc.size(), 1);

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
}

#[test]
fn single_uleb128_field() {
    let mut enc = Encoder::with_capacity(16).unwrap();
    enc.write_uleb128(123_456).unwrap();
    assert_eq!(enc.data(), &[0xF1, 0x85, 0xC0, 0xC4, 0x07]);

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    assert_eq!(dec.peek_type().unwrap(), PeekType::IxUleb128);
    assert_eq!(dec.read_uleb128().unwrap(), 123_456);
    assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
}

#[test]
fn single_sleb128_field() {
    let mut enc = Encoder::with_capacity(16).unwrap();
    enc.write_sleb128(-78_910).unwrap();
    assert_eq!(&enc.data()[..2], &[0xF1, 0x89]);

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    assert_eq!(dec.peek_type().unwrap(), PeekType::IxSleb128);
    assert_eq!(dec.read_sleb128().unwrap(), -78_910);
    assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
}

#[test]
fn public_key_vector_then_index() {
    let keys: Vec<u8> = (0..64).map(|i| 0xAA_u8.wrapping_add(i)).collect();
    let mut enc = Encoder::with_capacity(128).unwrap();
    let slot = enc.begin_public_key_vector(2, 0).unwrap();
    slot.copy_from_slice(&keys);
    enc.write_index(1).unwrap();
    // version + vector header + 2×32 keys + index header
    assert_eq!(enc.size(), 1 + 1 + 64 + 1);

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    assert_eq!(dec.peek_type().unwrap(), PeekType::PkVector0);
    assert_eq!(dec.read_public_key_vector().unwrap(), &keys[..]);
    assert_eq!(dec.last_vector_count(), 2);
    assert_eq!(dec.read_index().unwrap(), 1);
    assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
}

#[test]
fn short_vector_data_buffer_is_byte_exact() {
    let mut enc = Encoder::with_capacity(32).unwrap();
    enc.put_vector_data(b"Short payload").unwrap();

    let mut expected = vec![0xF1, 0xCD];
    expected.extend_from_slice(b"Short payload");
    assert_eq!(enc.data(), &expected[..]);

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    assert_eq!(dec.peek_type().unwrap(), PeekType::VectorShort);
    assert_eq!(dec.read_vector_data().unwrap(), b"Short payload");
}

#[test]
fn extended_vector_data_metadata() {
    let payload = [b'L'; 150];
    let mut enc = Encoder::with_capacity(256).unwrap();
    enc.put_vector_data(&payload).unwrap();
    assert_eq!(&enc.data()[1..3], &[0xE0, 0x96]);

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    assert_eq!(dec.peek_type().unwrap(), PeekType::VectorExtended);
    assert_eq!(dec.read_vector_data().unwrap(), &payload[..]);
    assert_eq!(dec.last_vector_payload_len(), 150);
}

#[test]
fn per_field_sizes_are_deterministic() {
    let mut enc = Encoder::with_capacity(1024).unwrap();
    let mut expected = 1;
    assert_eq!(enc.size(), expected);

    enc.write_index(3).unwrap();
    expected += 1;
    assert_eq!(enc.size(), expected);

    enc.write_boolean(false).unwrap();
    expected += 1;
    assert_eq!(enc.size(), expected);

    enc.write_varint_zero().unwrap();
    expected += 1;
    assert_eq!(enc.size(), expected);

    enc.write_uleb128(123_456).unwrap();
    expected += 1 + 3;
    assert_eq!(enc.size(), expected);

    enc.write_f64(1.0).unwrap();
    expected += 1 + 8;
    assert_eq!(enc.size(), expected);

    enc.put_signature_vector(1, 0, &[0u8; 64]).unwrap();
    expected += 1 + 64;
    assert_eq!(enc.size(), expected);

    enc.put_vector_data(&[0u8; 31]).unwrap();
    expected += 1 + 31;
    assert_eq!(enc.size(), expected);

    enc.put_vector_data(&[0u8; 32]).unwrap();
    expected += 2 + 32;
    assert_eq!(enc.size(), expected);
}

#[test]
fn full_transaction_roundtrip() {
    let keys: Vec<u8> = (0..64).map(|i| 0xAA_u8.wrapping_add(i)).collect();
    let sig_hash: Vec<u8> = (0..32).map(|i| 0xBB_u8.wrapping_add(i)).collect();
    let long_payload = [b'L'; 150];

    let mut enc = Encoder::with_capacity(1024).unwrap();
    enc.put_public_key_vector(2, 0, &keys).unwrap();
    enc.write_index(1).unwrap();
    enc.put_signature_vector(1, 1, &sig_hash).unwrap();
    enc.write_index(0).unwrap();
    enc.write_uleb128(123_456).unwrap();
    enc.write_sleb128(-78_910).unwrap();
    enc.write_i32(-1_000).unwrap();
    enc.write_u64(9_876_543_210).unwrap();
    enc.write_f32(3.14159).unwrap();
    enc.write_boolean(true).unwrap();
    enc.write_boolean(false).unwrap();
    enc.put_vector_data(b"Short payload").unwrap();
    enc.put_vector_data(&long_payload).unwrap();

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    assert_eq!(dec.peek_type().unwrap(), PeekType::PkVector0);
    assert_eq!(dec.read_public_key_vector().unwrap(), &keys[..]);
    assert_eq!(dec.read_index().unwrap(), 1);
    assert_eq!(dec.peek_type().unwrap(), PeekType::SigVector1);
    assert_eq!(dec.read_signature_vector().unwrap(), &sig_hash[..]);
    assert_eq!(dec.read_index().unwrap(), 0);
    assert_eq!(dec.read_uleb128().unwrap(), 123_456);
    assert_eq!(dec.read_sleb128().unwrap(), -78_910);
    assert_eq!(dec.read_i32().unwrap(), -1_000);
    assert_eq!(dec.read_u64().unwrap(), 9_876_543_210);
    assert_eq!(dec.read_f32().unwrap(), 3.14159);
    assert_eq!(dec.read_boolean().unwrap(), true);
    assert_eq!(dec.read_boolean().unwrap(), false);
    assert_eq!(dec.read_vector_data().unwrap(), b"Short payload");
    assert_eq!(dec.read_vector_data().unwrap(), &long_payload[..]);
    assert_eq!(dec.peek_type().unwrap(), PeekType::Eof);
    assert_eq!(dec.position(), dec.size());
}

#[test]
fn streaming_driver_dispatches_in_order() {
    let keys: Vec<u8> = (0..64).map(|i| 0xAA_u8.wrapping_add(i)).collect();
    let mut enc = Encoder::with_capacity(128).unwrap();
    let slot = enc.begin_public_key_vector(2, 0).unwrap();
    slot.copy_from_slice(&keys);
    enc.write_index(1).unwrap();

    struct Recorder(Vec<(PeekType, usize)>);
    impl DataHandler for Recorder {
        fn handle_field(&mut self, kind: PeekType, payload: &[u8]) {
            self.0.push((kind, payload.len()));
        }
    }

    let mut dec = Decoder::from_bytes(enc.data()).unwrap();
    let mut recorder = Recorder(Vec::new());
    dec.run(&mut recorder).unwrap();
    assert_eq!(
        recorder.0,
        vec![(PeekType::PkVector0, 64), (PeekType::IxIndex, 1)]
    );
}

#[test]
fn malformed_buffers_are_rejected() {
    // wrong version byte
    let mut dec = Decoder::from_bytes(&[0xF0]).unwrap();
    assert!(dec.peek_type().is_err());

    // PK vector with N = 0
    let mut dec = Decoder::from_bytes(&[0xF1, 0x00]).unwrap();
    assert!(dec.read_public_key_vector().is_err());

    // extended vector data declaring length 31
    let mut buf = vec![0xF1, 0xE0, 0x1F];
    buf.extend_from_slice(&[0u8; 31]);
    let mut dec = Decoder::from_bytes(&buf).unwrap();
    assert!(dec.read_vector_data().is_err());

    // extended vector data declaring length 1198
    let mut buf = vec![0xF1, 0xF0, 0xAE];
    buf.extend_from_slice(&[0u8; 1198]);
    let mut dec = Decoder::from_bytes(&buf).unwrap();
    assert!(dec.read_vector_data().is_err());

    // eleven ULEB128 continuation bytes
    let mut buf = vec![0xF1, 0x85];
    buf.extend_from_slice(&[0x80; 11]);
    let mut dec = Decoder::from_bytes(&buf).unwrap();
    assert!(dec.read_uleb128().is_err());
}
