//! `for_us` addressing correctness and preset-loader invariants.

use bytes::BytesMut;

use radiod_core::channel::{demod::DemodState, ChannelState, Environment};
use radiod_core::channel::preset::{self, load_preset};
use radiod_core::config::ConfigDict;
use radiod_core::constants::SSRC_ALL_CHANNELS;
use radiod_core::tlv::{self, codec, TlvType};

fn env() -> Environment {
    Environment {
        blocktime_s: 0.02,
        overlap: 5.0,
        front_end_samprate: 24_000_000.0,
        front_end_is_real: false,
    }
}

#[test]
fn for_us_true_iff_ssrc_matches() {
    let mut buf = BytesMut::new();
    codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), 0x2a);
    let fields = tlv::decode_fields(&buf);
    let target = tlv::target_ssrc(&fields);

    assert!(tlv::for_us(target, 0x2a));
    assert!(!tlv::for_us(target, 0x2b));
}

#[test]
fn for_us_does_not_match_broadcast_unless_ssrc_equals_it() {
    // Broadcast fan-out is a routing decision made by the caller (reach
    // every channel regardless of its own SSRC), not part of this
    // exact-match predicate.
    let mut buf = BytesMut::new();
    codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), SSRC_ALL_CHANNELS);
    let fields = tlv::decode_fields(&buf);
    let target = tlv::target_ssrc(&fields);

    assert!(!tlv::for_us(target, 1));
    assert!(!tlv::for_us(target, 0xdead_beef));
    assert!(tlv::for_us(target, SSRC_ALL_CHANNELS));
}

#[test]
fn for_us_false_when_ssrc_field_absent() {
    let buf = BytesMut::new();
    let fields = tlv::decode_fields(&buf);
    let target = tlv::target_ssrc(&fields);
    assert!(!tlv::for_us(target, 7));
}

#[test]
fn preset_invariants_hold_after_any_valid_preset() {
    let mut dict = ConfigDict::new();
    dict.set("global", "samprate", "8000");
    dict.set("nbfm", "demod", "fm");
    dict.set("nbfm", "samprate", "24000");
    dict.set("nbfm", "square", "true");
    dict.set("nbfm", "low", "5000");
    dict.set("nbfm", "high", "-5000");
    dict.set("nbfm", "opus-bitrate", "64");

    let mut channel = ChannelState::new_for(DemodState::Fm(Default::default()));
    load_preset(&dict, "nbfm", &mut channel, &env()).unwrap();

    assert!(channel.filter.low_edge_hz <= channel.filter.high_edge_hz);
    assert!(channel.output.samprate >= 400.0);
    let quantum = env().samprate_quantum();
    assert!((channel.output.samprate / quantum).fract().abs() < 1e-9);
    assert!(channel.output.opus_bitrate > 0 && channel.output.opus_bitrate <= 510_000);
}

#[test]
fn unrecognized_key_fails_validation_before_any_apply() {
    let mut dict = ConfigDict::new();
    dict.set("weird", "not-a-real-key", "1");
    assert!(preset::validate_section(&dict, "weird").is_err());
}
