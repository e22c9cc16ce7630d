//! Round-trip and wire-format laws for the TLV codec.

use bytes::BytesMut;
use proptest::prelude::*;
use radiod_core::tlv::codec;

#[test]
fn zero_value_is_exactly_two_bytes() {
    let mut buf = BytesMut::new();
    let n = codec::encode_uint(&mut buf, 0x2a, 0);
    assert_eq!(n, 2);
    assert_eq!(&buf[..], &[0x2a, 0]);
}

#[test]
fn long_length_prefix_boundaries() {
    let mut buf = BytesMut::new();
    codec::encode_string(&mut buf, 4, &vec![0u8; 128]);
    assert_eq!(&buf[..3], &[4, 0x81, 0x80]);

    let mut buf = BytesMut::new();
    codec::encode_string(&mut buf, 4, &vec![0u8; 65536]);
    assert_eq!(&buf[..5], &[4, 0x83, 0x01, 0x00, 0x00]);
}

#[test]
fn nan_float_writes_nothing_and_cursor_does_not_advance() {
    let mut buf = BytesMut::new();
    let before = buf.len();
    let written = codec::encode_float(&mut buf, 9, f32::NAN);
    assert_eq!(written, 0);
    assert_eq!(buf.len(), before);
}

proptest! {
    #[test]
    fn uint_roundtrips_for_any_u64(x: u64) {
        let mut buf = BytesMut::new();
        codec::encode_uint(&mut buf, 0x11, x);
        let (field, _) = codec::decode_next(&buf, 0).unwrap().unwrap();
        prop_assert_eq!(field.type_byte, 0x11);
        prop_assert_eq!(field.decode_u64(), x);
    }

    #[test]
    fn finite_f32_roundtrips_bit_exact(bits: u32) {
        let f = f32::from_bits(bits);
        prop_assume!(f.is_finite());
        let mut buf = BytesMut::new();
        codec::encode_float(&mut buf, 0x22, f);
        let (field, _) = codec::decode_next(&buf, 0).unwrap().unwrap();
        prop_assert_eq!(field.decode_f32().to_bits(), (f as f64).to_bits());
    }

    #[test]
    fn finite_f64_roundtrips_bit_exact(bits: u64) {
        let d = f64::from_bits(bits);
        prop_assume!(d.is_finite());
        let mut buf = BytesMut::new();
        codec::encode_double(&mut buf, 0x33, d);
        let (field, _) = codec::decode_next(&buf, 0).unwrap().unwrap();
        prop_assert_eq!(field.decode_f64().to_bits(), d.to_bits());
    }

    #[test]
    fn string_roundtrips_with_trailing_nul(bytes: Vec<u8>) {
        prop_assume!(bytes.len() < 70_000);
        let mut buf = BytesMut::new();
        codec::encode_string(&mut buf, 0x44, &bytes);
        let (field, _) = codec::decode_next(&buf, 0).unwrap().unwrap();
        let decoded = field.decode_string();
        prop_assert_eq!(&decoded[..decoded.len() - 1], &bytes[..]);
        prop_assert_eq!(decoded.last(), Some(&0u8));
    }
}
