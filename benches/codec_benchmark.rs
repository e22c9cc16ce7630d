use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use radiod_core::tlv::codec;
use radiod_core::tlv::{self, MessageKind, TlvType};

fn benchmark_uint_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("uint_roundtrip");

    for &value in &[0u64, 255, 65536, u32::MAX as u64, u64::MAX] {
        group.bench_function(format!("encode_{value}"), |b| {
            b.iter(|| {
                let mut buf = BytesMut::new();
                codec::encode_uint(&mut buf, 9, black_box(value));
                buf
            })
        });
    }

    let mut buf = BytesMut::new();
    codec::encode_uint(&mut buf, 9, u64::MAX);
    group.bench_function("decode_u64_max", |b| {
        b.iter(|| codec::decode_next(black_box(&buf), 0).unwrap())
    });

    group.finish();
}

fn benchmark_status_packet_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_packet");

    let mut buf = BytesMut::new();
    tlv::start_packet(&mut buf, MessageKind::Status);
    codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), 0x1234);
    codec::encode_double(&mut buf, TlvType::RadioFrequency.to_u8(), 147_435_000.0);
    codec::encode_double(&mut buf, TlvType::LowEdge.to_u8(), -5_000.0);
    codec::encode_double(&mut buf, TlvType::HighEdge.to_u8(), 5_000.0);
    codec::encode_double(&mut buf, TlvType::KaiserBeta.to_u8(), 11.0);
    codec::encode_double(&mut buf, TlvType::OutputSamprate.to_u8(), 24_000.0);
    codec::encode_u8(&mut buf, TlvType::OutputChannels.to_u8(), 1);
    codec::encode_u32(&mut buf, TlvType::OpusBitRate.to_u8(), 64_000);
    tlv::finish_packet(&mut buf);

    group.bench_function("encode_typical_status", |b| {
        b.iter(|| {
            let mut out = BytesMut::new();
            tlv::start_packet(&mut out, MessageKind::Status);
            codec::encode_u32(&mut out, TlvType::OutputSsrc.to_u8(), black_box(0x1234));
            codec::encode_double(&mut out, TlvType::RadioFrequency.to_u8(), black_box(147_435_000.0));
            codec::encode_double(&mut out, TlvType::LowEdge.to_u8(), black_box(-5_000.0));
            codec::encode_double(&mut out, TlvType::HighEdge.to_u8(), black_box(5_000.0));
            tlv::finish_packet(&mut out);
            out
        })
    });

    group.bench_function("decode_typical_status", |b| {
        b.iter(|| {
            let (_, rest) = tlv::decode_header(black_box(&buf)).unwrap();
            tlv::decode_fields(rest)
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_uint_roundtrip, benchmark_status_packet_roundtrip);
criterion_main!(benches);
