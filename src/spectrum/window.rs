//! # Analysis Windows
//!
//! Eight window families, each computed on `n+1` samples and truncated to
//! `n` (the periodic, not symmetric, form used for spectral analysis),
//! then normalized so the values sum to `n` (unit DC gain). Formulas
//! follow the reference window generator this engine was modeled on.

use std::f64::consts::PI;

use crate::error::RadioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowType {
    Kaiser,
    Rectangular,
    Blackman,
    ExactBlackman,
    BlackmanHarris,
    Hft95,
    Gaussian,
    Hann,
    Hamming,
}

impl WindowType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "kaiser" => WindowType::Kaiser,
            "rectangular" | "rect" | "none" => WindowType::Rectangular,
            "blackman" => WindowType::Blackman,
            "exact-blackman" | "exact_blackman" => WindowType::ExactBlackman,
            "blackman-harris" | "blackman_harris" => WindowType::BlackmanHarris,
            "hft95" => WindowType::Hft95,
            "gaussian" => WindowType::Gaussian,
            "hann" | "hanning" => WindowType::Hann,
            "hamming" => WindowType::Hamming,
            _ => return None,
        })
    }
}

/// Generates a length-`n` window of the requested family, periodic and
/// normalized to sum to `n`. `shape` is the Kaiser beta or Gaussian alpha
/// parameter; ignored by families that don't take one.
///
/// Fails only for [`WindowType::Gaussian`] with a non-positive `shape`:
/// there's no windowed-impulse special case to fall back to, so a bad
/// alpha is rejected rather than silently producing a rectangular window.
pub fn generate(kind: WindowType, n: usize, shape: f64) -> Result<Vec<f64>, RadioError> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let full = n + 1;
    let raw: Vec<f64> = match kind {
        WindowType::Rectangular => vec![1.0; full],
        WindowType::Hann => (0..full).map(|i| hann(i, full)).collect(),
        WindowType::Hamming => (0..full).map(|i| hamming(i, full)).collect(),
        WindowType::Blackman => (0..full).map(|i| blackman(i, full)).collect(),
        WindowType::ExactBlackman => (0..full).map(|i| exact_blackman(i, full)).collect(),
        WindowType::BlackmanHarris => (0..full).map(|i| blackman_harris(i, full)).collect(),
        WindowType::Hft95 => (0..full).map(|i| hft95(i, full)).collect(),
        WindowType::Kaiser => kaiser(full, shape),
        WindowType::Gaussian => gaussian(full, shape)?,
    };
    let truncated = &raw[..n];
    Ok(normalize_sum_to_n(truncated))
}

fn normalize_sum_to_n(w: &[f64]) -> Vec<f64> {
    let n = w.len() as f64;
    let sum: f64 = w.iter().sum();
    w.iter().map(|&x| x * n / sum).collect()
}

fn hann(i: usize, full: usize) -> f64 {
    0.5 - 0.5 * (2.0 * PI * i as f64 / full as f64).cos()
}

fn hamming(i: usize, full: usize) -> f64 {
    0.54 - 0.46 * (2.0 * PI * i as f64 / full as f64).cos()
}

fn blackman(i: usize, full: usize) -> f64 {
    let x = 2.0 * PI * i as f64 / full as f64;
    0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
}

/// The "exact" Blackman coefficients that null the third and fourth side
/// lobes, rather than the common rounded 0.42/0.5/0.08 approximation.
fn exact_blackman(i: usize, full: usize) -> f64 {
    let x = 2.0 * PI * i as f64 / full as f64;
    let a0 = 7938.0 / 18608.0;
    let a1 = 9240.0 / 18608.0;
    let a2 = 1430.0 / 18608.0;
    a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
}

fn blackman_harris(i: usize, full: usize) -> f64 {
    let x = 2.0 * PI * i as f64 / full as f64;
    0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos() - 0.01168 * (3.0 * x).cos()
}

/// Harris 5-term flat-top window ("HFT95"), low passband droop, used for
/// amplitude-accurate spectrum display.
fn hft95(i: usize, full: usize) -> f64 {
    let x = 2.0 * PI * i as f64 / full as f64;
    1.0 - 1.9383379 * x.cos() + 1.3045202 * (2.0 * x).cos() - 0.4028270 * (3.0 * x).cos()
        + 0.0350665 * (4.0 * x).cos()
}

/// Modified zeroth-order Bessel function of the first kind, used by the
/// Kaiser window.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let half_x_sq = (x / 2.0) * (x / 2.0);
    for k in 1..50 {
        term *= half_x_sq / (k as f64 * k as f64);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}

fn kaiser(full: usize, beta: f64) -> Vec<f64> {
    let denom = bessel_i0(beta);
    let m = (full - 1) as f64;
    (0..full)
        .map(|i| {
            let r = (2.0 * i as f64 / m) - 1.0;
            let arg = beta * (1.0 - r * r).max(0.0).sqrt();
            bessel_i0(arg) / denom
        })
        .collect()
}

/// `alpha` parameterization: `c = (full-1)/2`, `t = (n-c)/c` so the
/// endpoints sit at `t = ±1`, and `w[n] = exp(-0.5 * (alpha*t)^2)`. Requires
/// `alpha > 0`; there's no zero-alpha special case to fall back to, so a
/// non-positive alpha is rejected outright.
fn gaussian(full: usize, alpha: f64) -> Result<Vec<f64>, RadioError> {
    if !(alpha > 0.0) {
        return Err(RadioError::OutOfRange {
            field: "gaussian window alpha",
            value: alpha.to_string(),
            valid: "> 0.0",
        });
    }
    if full == 1 {
        return Ok(vec![1.0]);
    }
    let c = (full - 1) as f64 / 2.0;
    Ok((0..full)
        .map(|i| {
            let t = (i as f64 - c) / c;
            let x = alpha * t;
            (-0.5 * x * x).exp()
        })
        .collect())
}

/// Equivalent noise bandwidth, in bins, of a normalized window: `sum(w^2)
/// / n` for a sum-to-n window (the ratio used to convert to Hz is
/// `enbw_bins * rbw`).
pub fn equivalent_noise_bandwidth(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len() as f64;
    let sum_sq: f64 = window.iter().map(|w| w * w).sum();
    sum_sq / n
}
