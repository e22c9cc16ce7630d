//! # Demodulator Dispatch
//!
//! `{Linear, FM, WFM, Spect, Spect2}` each own a private state block and
//! expose the same capability surface (§9: "tagged variant with a
//! dispatch table, not inheritance"). FM/linear DSP internals are out of
//! scope; only their parameter surface — the fields a remote command can
//! read or write — lives here. The spectrum variants delegate almost
//! everything to [`crate::spectrum::SpectrumEngine`].

use bytes::BytesMut;

use crate::error::RadioError;
use crate::spectrum::{SpectrumConfig, SpectrumEngine, WindowType};
use crate::tlv::{codec, DemodTypeTag, TlvField, TlvType};

use super::{field_bool, field_f64, field_u32};

#[derive(Debug, Clone)]
pub struct LinearState {
    pub agc_enable: bool,
    pub agc_threshold_db: f64,
    pub agc_recovery_rate_db_per_s: f64,
    pub agc_hangtime_s: f64,
    pub envelope: bool,
    pub pll_enable: bool,
    pub pll_square: bool,
    pub pll_bw_hz: f64,
    pub pll_phase: f64,
    pub pll_locked: bool,
    pub conj: bool,
    /// DC-blocking single-pole rate, derived from a `dc-cut` corner
    /// frequency against the channel's own output sample rate.
    pub dc_cut_rate: f64,
}

impl Default for LinearState {
    fn default() -> Self {
        LinearState {
            agc_enable: true,
            agc_threshold_db: -15.0,
            agc_recovery_rate_db_per_s: 20.0,
            agc_hangtime_s: 1.1,
            envelope: false,
            pll_enable: false,
            pll_square: false,
            pll_bw_hz: 10.0,
            pll_phase: 0.0,
            pll_locked: false,
            conj: false,
            dc_cut_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FmState {
    pub squelch_open_db: f64,
    pub squelch_close_db: f64,
    pub deviation_hz: f64,
    pub deemph_tc_rate: f64,
    pub deemph_gain: f64,
    pub tone_hz: Option<f64>,
}

impl Default for FmState {
    fn default() -> Self {
        FmState {
            squelch_open_db: 6.0,
            squelch_close_db: 3.0,
            deviation_hz: 5_000.0,
            deemph_tc_rate: 0.0,
            deemph_gain: 1.0,
            tone_hz: None,
        }
    }
}

#[derive(Debug)]
pub enum DemodState {
    Linear(LinearState),
    Fm(FmState),
    Wfm(FmState),
    Spect(SpectrumEngine),
    Spect2(SpectrumEngine),
}

impl DemodState {
    pub fn new(tag: DemodTypeTag) -> Self {
        match tag {
            DemodTypeTag::Linear => DemodState::Linear(LinearState::default()),
            DemodTypeTag::Fm => DemodState::Fm(FmState::default()),
            DemodTypeTag::Wfm => DemodState::Wfm(FmState::default()),
            DemodTypeTag::Spect => DemodState::Spect(SpectrumEngine::new(SpectrumConfig::default())),
            DemodTypeTag::Spect2 => DemodState::Spect2(SpectrumEngine::new(SpectrumConfig::default())),
        }
    }

    pub fn kind_tag(&self) -> DemodTypeTag {
        match self {
            DemodState::Linear(_) => DemodTypeTag::Linear,
            DemodState::Fm(_) => DemodTypeTag::Fm,
            DemodState::Wfm(_) => DemodTypeTag::Wfm,
            DemodState::Spect(_) => DemodTypeTag::Spect,
            DemodState::Spect2(_) => DemodTypeTag::Spect2,
        }
    }

    /// Applies every field in `fields` recognized by the active kind.
    /// Returns whether a structural parameter changed (the caller sets
    /// `restart_needed` accordingly).
    pub fn apply_command(&mut self, fields: &[TlvField<'_>]) -> Result<bool, RadioError> {
        match self {
            DemodState::Linear(state) => apply_linear(state, fields),
            DemodState::Fm(state) | DemodState::Wfm(state) => apply_fm(state, fields),
            DemodState::Spect(engine) | DemodState::Spect2(engine) => apply_spectrum(engine, fields),
        }
    }

    pub fn emit_status(&self, buf: &mut BytesMut) {
        codec::encode_u8(buf, TlvType::DemodType.to_u8(), self.kind_tag() as u8);
        match self {
            DemodState::Linear(state) => emit_linear(state, buf),
            DemodState::Fm(state) | DemodState::Wfm(state) => emit_fm(state, buf),
            DemodState::Spect(engine) | DemodState::Spect2(engine) => emit_spectrum(engine, buf),
        }
    }
}

fn apply_linear(state: &mut LinearState, fields: &[TlvField<'_>]) -> Result<bool, RadioError> {
    if let Some(v) = field_bool(fields, TlvType::AgcEnable) {
        state.agc_enable = v;
    }
    if let Some(v) = field_f64(fields, TlvType::AgcThreshold) {
        state.agc_threshold_db = v;
    }
    if let Some(v) = field_f64(fields, TlvType::AgcRecoveryRate) {
        state.agc_recovery_rate_db_per_s = v;
    }
    if let Some(v) = field_f64(fields, TlvType::AgcHangtime) {
        state.agc_hangtime_s = v;
    }
    if let Some(v) = field_bool(fields, TlvType::Envelope) {
        state.envelope = v;
    }
    if let Some(v) = field_bool(fields, TlvType::Conj) {
        state.conj = v;
    }
    if let Some(v) = field_bool(fields, TlvType::PllSquare) {
        state.pll_square = v;
        if v {
            state.pll_enable = true;
        }
    }
    if let Some(v) = field_bool(fields, TlvType::PllEnable) {
        state.pll_enable = v || state.pll_square;
    }
    if let Some(v) = field_f64(fields, TlvType::PllBw) {
        state.pll_bw_hz = v;
    }
    Ok(false)
}

fn apply_fm(state: &mut FmState, fields: &[TlvField<'_>]) -> Result<bool, RadioError> {
    if let Some(v) = field_f64(fields, TlvType::SquelchOpen) {
        state.squelch_open_db = v;
    }
    if let Some(v) = field_f64(fields, TlvType::SquelchClose) {
        state.squelch_close_db = v;
    }
    if let Some(v) = field_f64(fields, TlvType::FmDeviation) {
        state.deviation_hz = v;
    }
    if let Some(v) = field_f64(fields, TlvType::DeemphTc) {
        state.deemph_tc_rate = v;
    }
    if let Some(v) = field_f64(fields, TlvType::DeemphGain) {
        state.deemph_gain = v;
    }
    if let Some(v) = field_f64(fields, TlvType::Tone) {
        if v > crate::constants::TONE_MAX_HZ {
            return Err(RadioError::OutOfRange {
                field: "tone",
                value: v.to_string(),
                valid: "0..=3000 Hz",
            });
        }
        state.tone_hz = Some(v);
    }
    Ok(false)
}

/// Returns `true` (structural change) when any field that forces an FFT
/// replan was present; [`SpectrumEngine::request_change`] itself decides
/// whether the concrete values actually differ from the live plan.
fn apply_spectrum(engine: &mut SpectrumEngine, fields: &[TlvField<'_>]) -> Result<bool, RadioError> {
    let mut next = *engine.config();
    let mut touched = false;

    if let Some(v) = field_u32(fields, TlvType::BinCount) {
        next.bin_count = v as usize;
        touched = true;
    }
    if let Some(v) = field_f64(fields, TlvType::ResolutionBw) {
        next.rbw_hz = v;
        touched = true;
    }
    if let Some(v) = field_f64(fields, TlvType::Crossover) {
        next.crossover_hz = v;
        touched = true;
    }
    if let Some(v) = field_u32(fields, TlvType::WindowType) {
        next.window_type = WindowType::from_name(window_name(v)).ok_or(RadioError::OutOfRange {
            field: "window_type",
            value: v.to_string(),
            valid: "0..=8",
        })?;
        touched = true;
    }
    if let Some(v) = field_f64(fields, TlvType::SpectrumShape) {
        next.shape = v;
        touched = true;
    }
    if let Some(v) = field_u32(fields, TlvType::SpectrumAvg) {
        next.fft_avg = v.max(1) as usize;
        touched = true;
    }
    if let Some(field) = crate::tlv::find(fields, TlvType::CompactBase) {
        next.compact_base_db = field.decode_f32() as f32;
    }
    if let Some(field) = crate::tlv::find(fields, TlvType::CompactStep) {
        next.compact_step_db = field.decode_f32() as f32;
    }

    engine.request_change(next);
    Ok(touched)
}

fn window_name(code: u32) -> &'static str {
    match code {
        0 => "kaiser",
        1 => "rectangular",
        2 => "blackman",
        3 => "exact-blackman",
        4 => "blackman-harris",
        5 => "hft95",
        6 => "gaussian",
        7 => "hann",
        8 => "hamming",
        _ => "",
    }
}

fn emit_linear(state: &LinearState, buf: &mut BytesMut) {
    codec::encode_bool(buf, TlvType::AgcEnable.to_u8(), state.agc_enable);
    codec::encode_double(buf, TlvType::AgcThreshold.to_u8(), state.agc_threshold_db);
    codec::encode_double(buf, TlvType::AgcRecoveryRate.to_u8(), state.agc_recovery_rate_db_per_s);
    codec::encode_double(buf, TlvType::AgcHangtime.to_u8(), state.agc_hangtime_s);
    codec::encode_bool(buf, TlvType::Envelope.to_u8(), state.envelope);
    codec::encode_bool(buf, TlvType::Conj.to_u8(), state.conj);
    codec::encode_bool(buf, TlvType::PllEnable.to_u8(), state.pll_enable);
    codec::encode_bool(buf, TlvType::PllSquare.to_u8(), state.pll_square);
    codec::encode_bool(buf, TlvType::PllLock.to_u8(), state.pll_locked);
    codec::encode_double(buf, TlvType::PllBw.to_u8(), state.pll_bw_hz);
    codec::encode_double(buf, TlvType::PllPhase.to_u8(), state.pll_phase);
}

fn emit_fm(state: &FmState, buf: &mut BytesMut) {
    codec::encode_double(buf, TlvType::SquelchOpen.to_u8(), state.squelch_open_db);
    codec::encode_double(buf, TlvType::SquelchClose.to_u8(), state.squelch_close_db);
    codec::encode_double(buf, TlvType::FmDeviation.to_u8(), state.deviation_hz);
    codec::encode_double(buf, TlvType::DeemphTc.to_u8(), state.deemph_tc_rate);
    codec::encode_double(buf, TlvType::DeemphGain.to_u8(), state.deemph_gain);
    if let Some(tone) = state.tone_hz {
        codec::encode_double(buf, TlvType::Tone.to_u8(), tone);
    }
}

fn emit_spectrum(engine: &SpectrumEngine, buf: &mut BytesMut) {
    let cfg = engine.config();
    codec::encode_u32(buf, TlvType::BinCount.to_u8(), cfg.bin_count as u32);
    codec::encode_double(buf, TlvType::ResolutionBw.to_u8(), cfg.rbw_hz);
    codec::encode_double(buf, TlvType::Crossover.to_u8(), cfg.crossover_hz);
    codec::encode_double(buf, TlvType::NoiseBw.to_u8(), engine.noise_bw_hz());
    codec::encode_float(buf, TlvType::CompactBase.to_u8(), cfg.compact_base_db);
    codec::encode_float(buf, TlvType::CompactStep.to_u8(), cfg.compact_step_db);
    // OUTPUT_SAMPRATE is conventionally zero for the wideband path (no
    // fixed downconverted rate); narrowband reports Nn * RBW. Emitted by
    // the caller assembling the full status, which knows the mode.
    codec::encode_vector(buf, TlvType::BinData.to_u8(), engine.bin_data());
}
