//! # Spectrum Demodulator Engine
//!
//! Produces `bin_count` power values around the channel's tuned frequency
//! at a requested resolution bandwidth, switching between a *wideband*
//! path (FFT directly over the front-end ring) and a *narrowband* path
//! (accumulate downconverted baseband, then FFT) depending on how the
//! requested RBW compares to `crossover`.

use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::channel::Environment;
use crate::error::RadioError;

use super::ring::{BasebandRing, FrontEndRing, RealFrontEndRing};
use super::window::{self, WindowType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Initial,
    Configured,
    Running,
    Reconfiguring,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Wideband,
    Narrowband,
}

/// The parameters a client can change, any of which (other than
/// `compact_base_db`/`compact_step_db`) forces a [`EngineState::Reconfiguring`]
/// transition if it differs from the currently configured plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumConfig {
    pub bin_count: usize,
    pub rbw_hz: f64,
    pub crossover_hz: f64,
    pub window_type: WindowType,
    pub shape: f64,
    pub fft_avg: usize,
    pub compact_base_db: f32,
    pub compact_step_db: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        SpectrumConfig {
            bin_count: 1024,
            rbw_hz: crate::constants::DEFAULT_CROSSOVER_HZ,
            crossover_hz: crate::constants::DEFAULT_CROSSOVER_HZ,
            window_type: WindowType::Kaiser,
            shape: 11.0,
            fft_avg: 1,
            compact_base_db: crate::constants::DEFAULT_COMPACT_BASE_DB,
            compact_step_db: crate::constants::DEFAULT_COMPACT_STEP_DB,
        }
    }
}

impl SpectrumConfig {
    /// Parameters that force a replan when they change; compact encoding
    /// scale factors do not.
    fn plan_key(&self) -> (usize, u64, u64, WindowType, u64, usize) {
        (
            self.bin_count,
            self.rbw_hz.to_bits(),
            self.crossover_hz.to_bits(),
            self.window_type,
            self.shape.to_bits(),
            self.fft_avg,
        )
    }
}

pub struct SpectrumEngine {
    config: SpectrumConfig,
    pending_config: Option<SpectrumConfig>,
    state: EngineState,
    mode: Option<Mode>,
    fft_size: usize,
    fft: Option<Arc<dyn Fft<f32>>>,
    window: Vec<f64>,
    noise_bw_hz: f64,
    bin_data: Vec<f32>,
    baseband_ring: Option<BasebandRing>,
}

impl std::fmt::Debug for SpectrumEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("fft_size", &self.fft_size)
            .finish()
    }
}

impl SpectrumEngine {
    pub fn new(config: SpectrumConfig) -> Self {
        SpectrumEngine {
            config,
            pending_config: None,
            state: EngineState::Initial,
            mode: None,
            fft_size: 0,
            fft: None,
            window: Vec::new(),
            noise_bw_hz: 0.0,
            bin_data: vec![0.0; config.bin_count],
            baseband_ring: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn bin_data(&self) -> &[f32] {
        &self.bin_data
    }

    pub fn noise_bw_hz(&self) -> f64 {
        self.noise_bw_hz
    }

    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    /// The FFT length chosen by the last [`Self::ensure_configured`] call.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Requests a parameter change. If it alters anything in the FFT
    /// plan, the engine transitions to `Reconfiguring`; it re-enters
    /// `Initial` at the top of the next cycle (see [`Self::ensure_configured`]).
    pub fn request_change(&mut self, new_config: SpectrumConfig) {
        let replan = new_config.plan_key() != self.config.plan_key();
        self.config = new_config;
        if replan && self.state != EngineState::Initial {
            self.state = EngineState::Reconfiguring;
        }
    }

    /// Frees the plan/window/ring and drops back to `Initial`. Called at
    /// the top of a cycle when in `Reconfiguring`, and on teardown.
    fn free_plan(&mut self) {
        self.fft = None;
        self.window.clear();
        self.baseband_ring = None;
        self.mode = None;
        self.fft_size = 0;
    }

    pub fn shutdown(&mut self) {
        self.free_plan();
        self.bin_data.clear();
        self.state = EngineState::Terminal;
    }

    /// Chooses the wideband/narrowband path, sizes the FFT, builds the
    /// window, and (narrowband only) allocates the baseband ring. No-op
    /// if already `Configured`/`Running`.
    pub fn ensure_configured(&mut self, env: &Environment) -> Result<(), RadioError> {
        if self.state == EngineState::Reconfiguring {
            self.free_plan();
            self.state = EngineState::Initial;
        }
        if self.state != EngineState::Initial {
            return Ok(());
        }

        let mode = if self.config.rbw_hz > self.config.crossover_hz {
            Mode::Wideband
        } else {
            Mode::Narrowband
        };

        let fft_size = match mode {
            Mode::Wideband => wideband_fft_size(env.front_end_samprate, self.config.rbw_hz),
            Mode::Narrowband => {
                narrowband_fft_size(self.config.bin_count, self.config.rbw_hz, env.blocktime_s)
            }
        };

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = window::generate(self.config.window_type, fft_size, self.config.shape)?;
        self.noise_bw_hz =
            window::equivalent_noise_bandwidth(&window) * self.config.rbw_hz;

        if mode == Mode::Narrowband {
            let capacity = fft_size * self.config.fft_avg.max(1);
            self.baseband_ring = Some(BasebandRing::new(capacity));
        }

        self.fft = Some(fft);
        self.window = window;
        self.fft_size = fft_size;
        self.mode = Some(mode);
        self.bin_data = vec![0.0; self.config.bin_count];
        self.state = EngineState::Configured;
        Ok(())
    }

    /// Narrowband only: appends one block of downconverted baseband
    /// samples into the ring. Called every DSP cycle regardless of
    /// whether a response is due this cycle.
    pub fn accumulate_baseband(&mut self, block: &[Complex32]) {
        if let Some(ring) = self.baseband_ring.as_mut() {
            ring.write(block);
            if self.state == EngineState::Configured {
                self.state = EngineState::Running;
            }
        }
    }

    /// Runs the narrowband response path: `fft_avg` non-overlapping
    /// `fft_size`-length windows spanning the full ring, averaged into
    /// `bin_data` with gain `1/(fft_size^2 * fft_avg)`.
    pub fn run_narrowband_cycle(&mut self) -> Result<(), RadioError> {
        let ring = self.baseband_ring.as_ref().ok_or_else(|| {
            RadioError::Other("narrowband cycle run without a baseband ring".to_string())
        })?;
        if ring.filled() < self.fft_size * self.config.fft_avg {
            return Ok(()); // not enough history yet; keep previous bins
        }

        let fft = self.fft.as_ref().unwrap();
        let fft_size = self.fft_size;
        let avg = self.config.fft_avg.max(1);
        let gain = 1.0 / (fft_size as f32 * fft_size as f32 * avg as f32);

        let mut accum = vec![0.0f32; fft_size];
        for i in 0..avg {
            let back_offset = (avg - 1 - i) * fft_size;
            let window_samples = ring.read_window(fft_size, back_offset);
            let mut buf: Vec<Complex32> = window_samples
                .iter()
                .zip(self.window.iter())
                .map(|(s, &w)| s * (w as f32))
                .collect();
            fft.process(&mut buf);
            for (acc, bin) in accum.iter_mut().zip(buf.iter()) {
                let power = bin.norm_sqr() * gain;
                if power.is_finite() {
                    *acc += power;
                }
                // NaN/Inf from a pathological window is dropped; accum
                // simply doesn't advance for that bin this pass.
            }
        }

        select_bins_from_natural_order(&accum, &mut self.bin_data);
        self.state = EngineState::Running;
        Ok(())
    }

    /// Runs the wideband response path directly over a complex front-end
    /// ring. `bin_shift` is the integer bin offset derived from the tune
    /// frequency.
    pub fn run_wideband_cycle_complex(
        &mut self,
        ring: &FrontEndRing,
        bin_shift: i32,
    ) -> Result<(), RadioError> {
        let gain = 1.0 / (self.fft_size as f32 * self.fft_size as f32 * self.config.fft_avg.max(1) as f32);
        self.run_wideband_generic(bin_shift, gain, |back_offset, n| {
            ring.read_window(n, back_offset).to_vec()
        })
    }

    /// Wideband path over a real-valued front end. `2x` gain accounts for
    /// the discarded conjugate half-spectrum. If `bin_shift < 0`, every
    /// other input sample is negated before windowing, flipping the
    /// spectrum (real front end has no separate negative-frequency
    /// storage to select from directly).
    pub fn run_wideband_cycle_real(
        &mut self,
        ring: &RealFrontEndRing,
        bin_shift: i32,
    ) -> Result<(), RadioError> {
        let gain = 2.0 / (self.fft_size as f32 * self.fft_size as f32 * self.config.fft_avg.max(1) as f32);
        let flip = bin_shift < 0;
        self.run_wideband_generic(bin_shift, gain, |back_offset, n| {
            ring.read_window(n, back_offset)
                .iter()
                .enumerate()
                .map(|(i, &s)| {
                    let sign = if flip && i % 2 == 1 { -1.0 } else { 1.0 };
                    Complex32::new(s * sign, 0.0)
                })
                .collect()
        })
    }

    fn run_wideband_generic(
        &mut self,
        bin_shift: i32,
        gain: f32,
        mut read: impl FnMut(usize, usize) -> Vec<Complex32>,
    ) -> Result<(), RadioError> {
        let fft = self.fft.as_ref().unwrap();
        let fft_size = self.fft_size;
        let avg = self.config.fft_avg.max(1);
        // Successive averages step back by one full FFT length; the ring
        // reader clamps at its oldest sample.
        let step = fft_size;

        let mut accum = vec![0.0f32; fft_size];
        for i in 0..avg {
            let back_offset = i * step;
            let samples = read(back_offset, fft_size);
            let mut buf: Vec<Complex32> = samples
                .iter()
                .zip(self.window.iter())
                .map(|(s, &w)| s * (w as f32))
                .collect();
            fft.process(&mut buf);
            for (acc, bin) in accum.iter_mut().zip(buf.iter()) {
                let power = bin.norm_sqr() * gain;
                if power.is_finite() {
                    *acc += power;
                }
            }
        }

        copy_requested_bins(&accum, bin_shift, &mut self.bin_data);
        self.state = EngineState::Running;
        Ok(())
    }

    /// Quantizes `bin_data` (already in shifted negative-to-positive
    /// order via [`Self::compact_bytes`]'s own rotation) into one byte per
    /// bin: `clamp(round((10*log10(p) - base) / step), 0, 255)`.
    pub fn compact_bytes(&self) -> Vec<u8> {
        let n = self.bin_data.len();
        if n == 0 {
            return Vec::new();
        }
        let half = n / 2;
        let mut rotated = Vec::with_capacity(n);
        rotated.extend_from_slice(&self.bin_data[half..]);
        rotated.extend_from_slice(&self.bin_data[..half]);

        rotated
            .iter()
            .map(|&p| {
                let db = 10.0 * (p.max(f32::MIN_POSITIVE)).log10();
                let q = ((db - self.config.compact_base_db) / self.config.compact_step_db).round();
                q.clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

/// `Nw = round(front_end_samprate / rbw)`.
fn wideband_fft_size(front_end_samprate: f64, rbw_hz: f64) -> usize {
    (front_end_samprate / rbw_hz).round().max(1.0) as usize
}

/// Smallest FFT size `Nn >= bin_count + margin/rbw` that is both a "good"
/// size (5-smooth) and makes `Nn * rbw` an integer multiple of the block
/// rate — the narrowband downconverter's internal filter-chain lengths
/// (`L`, `M`, `N` in the original design) aren't modeled here since the
/// downconverter is an external collaborator; the block rate alone is
/// used as the fixed base rate, which is the coarsest rate any of those
/// internal lengths could reduce to.
fn narrowband_fft_size(bin_count: usize, rbw_hz: f64, blocktime_s: f64) -> usize {
    let margin_bins = (crate::constants::DEFAULT_NARROWBAND_MARGIN_HZ / rbw_hz).ceil() as usize;
    let min_size = bin_count + margin_bins;
    let base_rate = 1.0 / blocktime_s;

    let cap = min_size.saturating_mul(8).max(min_size + 64);
    for candidate in min_size..=cap {
        if !is_good_fft_size(candidate) {
            continue;
        }
        let samprate = candidate as f64 * rbw_hz;
        let ratio = samprate / base_rate;
        if (ratio - ratio.round()).abs() < 1e-6 {
            return candidate;
        }
    }
    // No exact multiple found within the search cap; fall back to the
    // smallest good size at or above the minimum.
    (min_size..=cap)
        .find(|&c| is_good_fft_size(c))
        .unwrap_or(min_size)
}

/// True if `n`'s prime factorization uses only 2, 3, 5, 7 — sizes
/// `rustfft` (and FFT libraries generally) plan efficiently.
fn is_good_fft_size(mut n: usize) -> bool {
    if n == 0 {
        return false;
    }
    for p in [2, 3, 5, 7] {
        while n % p == 0 {
            n /= p;
        }
    }
    n == 1
}

/// Selects the `bin_data.len()` bins nearest DC from a full-length
/// natural-order FFT output: the first half from the start (DC and
/// ascending positive frequencies) and the second half from the end
/// (descending toward DC from the most negative frequency), preserving
/// natural FFT order end to end.
fn select_bins_from_natural_order(full: &[f32], out: &mut [f32]) {
    let bin_count = out.len();
    let half = bin_count / 2;
    if full.len() <= bin_count {
        out[..full.len()].copy_from_slice(full);
        return;
    }
    out[..half].copy_from_slice(&full[..half]);
    out[half..].copy_from_slice(&full[full.len() - (bin_count - half)..]);
}

/// Wideband bin copy: same natural-order selection as the narrowband
/// path, but additionally rotated by `bin_shift` bins (the tune
/// frequency's offset from the front end's own DC) before truncation.
/// Bins that would fall outside `[-Nyquist, +Nyquist)` are left at their
/// previous (zeroed) value.
fn copy_requested_bins(full: &[f32], bin_shift: i32, out: &mut [f32]) {
    let n = full.len() as i32;
    let bin_count = out.len();
    let half = (bin_count / 2) as i32;
    for i in 0..bin_count as i32 {
        // logical frequency-domain index, DC-centered, negative before
        // positive: i < half => positive side, else negative side.
        let logical = if i < half { i } else { i - bin_count as i32 };
        let source = logical + bin_shift;
        if source < -n / 2 || source >= n / 2 {
            continue; // outside Nyquist range; leave previous value
        }
        let src_index = source.rem_euclid(n) as usize;
        out[i as usize] = full[src_index];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment {
            blocktime_s: 0.02,
            overlap: 5.0,
            front_end_samprate: 24_000_000.0,
            front_end_is_real: false,
        }
    }

    #[test]
    fn initial_state_has_no_plan() {
        let engine = SpectrumEngine::new(SpectrumConfig::default());
        assert_eq!(engine.state(), EngineState::Initial);
        assert!(engine.mode().is_none());
    }

    #[test]
    fn mode_selection_follows_crossover() {
        let mut wide = SpectrumEngine::new(SpectrumConfig {
            rbw_hz: 5_000.0,
            crossover_hz: 200.0,
            ..SpectrumConfig::default()
        });
        wide.ensure_configured(&env()).unwrap();
        assert_eq!(wide.mode(), Some(Mode::Wideband));

        let mut narrow = SpectrumEngine::new(SpectrumConfig {
            rbw_hz: 100.0,
            crossover_hz: 200.0,
            bin_count: 64,
            ..SpectrumConfig::default()
        });
        narrow.ensure_configured(&env()).unwrap();
        assert_eq!(narrow.mode(), Some(Mode::Narrowband));
    }

    #[test]
    fn good_fft_sizes_are_five_smooth() {
        for n in [64, 128, 240, 4800, 1000] {
            assert!(is_good_fft_size(n));
        }
        assert!(!is_good_fft_size(127)); // prime
        assert!(!is_good_fft_size(2 * 11));
    }

    #[test]
    fn wideband_fft_size_matches_formula() {
        assert_eq!(wideband_fft_size(24_000_000.0, 5_000.0), 4800);
    }

    #[test]
    fn reconfigure_on_param_change_returns_to_initial_then_configured() {
        let mut engine = SpectrumEngine::new(SpectrumConfig {
            rbw_hz: 100.0,
            bin_count: 64,
            ..SpectrumConfig::default()
        });
        engine.ensure_configured(&env()).unwrap();
        assert_eq!(engine.state(), EngineState::Configured);

        let mut changed = engine.config().clone();
        changed.bin_count = 128;
        engine.request_change(changed);
        assert_eq!(engine.state(), EngineState::Reconfiguring);

        engine.ensure_configured(&env()).unwrap();
        assert_eq!(engine.state(), EngineState::Configured);
        assert_eq!(engine.bin_data().len(), 128);
    }

    #[test]
    fn narrowband_gain_law_single_bin_tone() {
        let bin_count = 64;
        let mut engine = SpectrumEngine::new(SpectrumConfig {
            rbw_hz: 100.0,
            crossover_hz: 200.0,
            bin_count,
            fft_avg: 1,
            window_type: WindowType::Rectangular,
            ..SpectrumConfig::default()
        });
        engine.ensure_configured(&env()).unwrap();
        let fft_size = engine.fft_size;

        // A pure tone at exactly bin k=3 of an Nn-point complex FFT has
        // k cycles over Nn samples.
        let k = 3usize;
        let amplitude = 2.0f32;
        let block: Vec<Complex32> = (0..fft_size)
            .map(|n| {
                let phase = 2.0 * std::f32::consts::PI * k as f32 * n as f32 / fft_size as f32;
                Complex32::new(amplitude * phase.cos(), amplitude * phase.sin())
            })
            .collect();
        engine.accumulate_baseband(&block);
        engine.run_narrowband_cycle().unwrap();

        // bin k=3 lands in the "positive, ascending" first half of
        // natural order, at output index 3.
        let target = engine.bin_data()[3];
        assert!(
            (target - amplitude * amplitude).abs() < 0.05 * amplitude * amplitude,
            "target bin = {target}, expected ~{}",
            amplitude * amplitude
        );

        for (i, &p) in engine.bin_data().iter().enumerate() {
            if i == 3 {
                continue;
            }
            assert!(p < 1e-3, "bin {i} unexpectedly hot: {p}");
        }
    }

    #[test]
    fn compact_bytes_are_monotonic_frequency_order_length() {
        let mut engine = SpectrumEngine::new(SpectrumConfig {
            rbw_hz: 100.0,
            bin_count: 16,
            ..SpectrumConfig::default()
        });
        engine.ensure_configured(&env()).unwrap();
        let bytes = engine.compact_bytes();
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn nan_power_does_not_poison_accumulation() {
        // Synthetic check that a NaN contribution is simply skipped: feed
        // a NaN sample into the ring and confirm bins stay finite rather
        // than latching NaN forever.
        let mut engine = SpectrumEngine::new(SpectrumConfig {
            rbw_hz: 100.0,
            bin_count: 32,
            ..SpectrumConfig::default()
        });
        engine.ensure_configured(&env()).unwrap();
        let fft_size = engine.fft_size;
        let mut block = vec![Complex32::new(1.0, 0.0); fft_size];
        block[0] = Complex32::new(f32::NAN, 0.0);
        engine.accumulate_baseband(&block);
        engine.run_narrowband_cycle().unwrap();
        assert!(engine.bin_data().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn gaussian_window_with_nonpositive_shape_is_rejected_at_configure() {
        let mut engine = SpectrumEngine::new(SpectrumConfig {
            rbw_hz: 100.0,
            bin_count: 32,
            window_type: WindowType::Gaussian,
            shape: 0.0,
            ..SpectrumConfig::default()
        });
        assert!(engine.ensure_configured(&env()).is_err());
    }
}
