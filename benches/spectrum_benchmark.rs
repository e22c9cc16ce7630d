use criterion::{black_box, criterion_group, criterion_main, Criterion};
use num_complex::Complex32;

use radiod_core::channel::Environment;
use radiod_core::spectrum::ring::FrontEndRing;
use radiod_core::spectrum::{SpectrumConfig, SpectrumEngine, WindowType};

fn env() -> Environment {
    Environment {
        blocktime_s: 0.02,
        overlap: 5.0,
        front_end_samprate: 24_000_000.0,
        front_end_is_real: false,
    }
}

fn benchmark_window_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_generation");
    for kind in [
        WindowType::Rectangular,
        WindowType::Hann,
        WindowType::Kaiser,
        WindowType::BlackmanHarris,
    ] {
        group.bench_function(format!("{kind:?}_4096"), |b| {
            b.iter(|| radiod_core::spectrum::window::generate(black_box(kind), 4096, 11.0))
        });
    }
    group.finish();
}

fn benchmark_wideband_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("wideband_cycle");

    let mut engine = SpectrumEngine::new(SpectrumConfig {
        bin_count: 1024,
        rbw_hz: 5_000.0,
        crossover_hz: 200.0,
        fft_avg: 1,
        ..SpectrumConfig::default()
    });
    engine.ensure_configured(&env()).unwrap();
    let fft_size = engine.fft_size();

    let mut ring = FrontEndRing::new(fft_size);
    let block: Vec<Complex32> = (0..fft_size)
        .map(|n| Complex32::new((n as f32).sin(), (n as f32).cos()))
        .collect();
    ring.write(&block);

    group.bench_function("1024_bins_4800pt_fft", |b| {
        b.iter(|| engine.run_wideband_cycle_complex(black_box(&ring), 0).unwrap())
    });

    group.finish();
}

fn benchmark_narrowband_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("narrowband_cycle");

    let mut engine = SpectrumEngine::new(SpectrumConfig {
        bin_count: 256,
        rbw_hz: 100.0,
        crossover_hz: 200.0,
        fft_avg: 4,
        ..SpectrumConfig::default()
    });
    engine.ensure_configured(&env()).unwrap();
    let fft_size = engine.fft_size();
    let block: Vec<Complex32> = (0..fft_size * 4)
        .map(|n| Complex32::new((n as f32 * 0.01).sin(), 0.0))
        .collect();
    engine.accumulate_baseband(&block);

    group.bench_function("256_bins_avg4", |b| {
        b.iter(|| engine.run_narrowband_cycle().unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_window_generation,
    benchmark_wideband_cycle,
    benchmark_narrowband_cycle
);
criterion_main!(benches);
