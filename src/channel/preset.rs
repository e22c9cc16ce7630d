//! # Preset Loader
//!
//! Walks a closed, enumerated set of recognized configuration keys,
//! applying the unit conversion for each key present in a section onto a
//! channel's state. Missing keys leave the current value untouched,
//! making the loader idempotent and composable: load `"global"` first,
//! then overlay a named preset section on top.
//!
//! Keys are validated against the *full* recognized set (including keys
//! that name external collaborators this core doesn't own — antenna
//! beamforming, raster scan scheduling, mDNS advertisement — see
//! [`RECOGNIZED_KEYS`]) so a typo in a config file is still caught; only
//! the subset with a defined channel-field mapping is actually applied.

use crate::channel::{ChannelState, Environment};
use crate::config::ConfigDict;
use crate::constants::{
    FILTER2_MAX, MINPACKET_MAX, OPUS_BITRATE_MAX, OPUS_FEC_MAX, OUTPUT_SAMPRATE_FLOOR, TONE_MAX_HZ,
};
use crate::error::RadioError;
use crate::freq::parse_frequency;
use crate::tlv::DemodTypeTag;

use super::demod::DemodState;

/// The closed set of keys a preset section may name, per the glossary.
/// Keys outside this list fail table validation.
pub const RECOGNIZED_KEYS: &[&str] = &[
    "advertise", "dns", "disable", "data", "dc-cut", "demod", "beam", "a-amp", "a-phase",
    "b-amp", "b-phase", "mode", "preset", "samprate", "mono", "stereo", "low", "high",
    "squelch-open", "squelch-close", "squelchtail", "squelch-tail", "headroom", "shift",
    "recovery-rate", "hang-time", "threshold", "gain", "envelope", "pll", "square", "conj",
    "pll-bw", "agc", "extend", "threshold-extend", "deemph-tc", "deemph-gain", "tone", "tone0",
    "tone1", "tone2", "tone3", "tone4", "tone5", "tone6", "tone7", "tone8", "tone9", "pl",
    "ctcss", "pacing", "encoding", "bitrate", "opus-bitrate", "opus-dtx", "opus-application",
    "opus-fec", "opus-signal", "update", "buffer", "freq", "freq0", "freq1", "freq2", "freq3",
    "freq4", "freq5", "freq6", "freq7", "freq8", "freq9", "raster", "raster0", "raster1",
    "raster2", "raster3", "raster4", "raster5", "raster6", "raster7", "raster8", "raster9",
    "except", "except0", "except1", "except2", "except3", "except4", "except5", "except6",
    "except7", "except8", "except9", "ttl", "snr-squelch", "filter2",
];

/// Rejects any key in `section` outside [`RECOGNIZED_KEYS`]. Call once
/// per section at config-load time, before any [`apply_section`] calls.
pub fn validate_section(dict: &ConfigDict, section: &str) -> Result<(), RadioError> {
    for key in dict.keys(section) {
        if !RECOGNIZED_KEYS.contains(&key) {
            return Err(RadioError::UnrecognizedKey(format!("[{section}].{key}")));
        }
    }
    Ok(())
}

/// Loads `"global"` (if present), then `preset_name`, onto `channel`.
/// Each section is validated before it's applied.
pub fn load_preset(
    dict: &ConfigDict,
    preset_name: &str,
    channel: &mut ChannelState,
    env: &Environment,
) -> Result<(), RadioError> {
    if dict.has_section("global") {
        validate_section(dict, "global")?;
        apply_section(dict, "global", channel, env)?;
    }
    if dict.has_section(preset_name) {
        validate_section(dict, preset_name)?;
        apply_section(dict, preset_name, channel, env)?;
    }
    Ok(())
}

/// Applies every recognized-and-mapped key present in `section`. Keys
/// with no channel-field mapping (beamforming, raster scheduling, mDNS
/// advertisement, ...) are accepted by validation but silently skipped
/// here — they belong to external collaborators out of this core's
/// scope. Order matters for a few keys that read back another key's
/// freshly-applied value (`deemph-tc`, `dc-cut` read the output sample
/// rate), so `samprate` is always processed first.
pub fn apply_section(
    dict: &ConfigDict,
    section: &str,
    channel: &mut ChannelState,
    env: &Environment,
) -> Result<(), RadioError> {
    if let Some(v) = dict.get(section, "demod") {
        if let Some(tag) = parse_demod_name(v) {
            if channel.demod.kind_tag() != tag {
                channel.demod = DemodState::new(tag);
                channel.restart_needed = true;
            }
        }
    }

    if let Some(v) = dict.get(section, "samprate") {
        let hz = parse_frequency(v)?;
        channel.output.samprate = quantize_samprate(hz, env);
        channel.restart_needed = true;
    }

    if let Some(v) = dict.get(section, "freq") {
        channel.tuning.radio_frequency_hz = parse_frequency(v)?;
    }
    if let Some(v) = dict.get(section, "shift") {
        channel.tuning.shift_hz = parse_frequency(v)?;
    }
    if let Some(v) = dict.get(section, "low") {
        let hz = parse_frequency(v)?;
        channel.filter.set_edges(hz, channel.filter.high_edge_hz);
    }
    if let Some(v) = dict.get(section, "high") {
        let hz = parse_frequency(v)?;
        channel.filter.set_edges(channel.filter.low_edge_hz, hz);
    }

    if let Some(v) = dict.get(section, "mono") {
        if parse_bool(v)? {
            channel.output.channels = 1;
        }
    }
    if let Some(v) = dict.get(section, "stereo") {
        if parse_bool(v)? {
            channel.output.channels = 2;
        }
    }

    if let Some(v) = dict.get(section, "headroom") {
        let db: f64 = v.parse().map_err(|_| bad("headroom", v))?;
        channel.output.headroom = db_to_ratio(db);
    }
    if let Some(v) = dict.get(section, "gain") {
        channel.output.gain = db_to_ratio(v.parse().map_err(|_| bad("gain", v))?);
    }
    if let Some(v) = dict.get(section, "ttl") {
        channel.output.ttl = v.parse().map_err(|_| bad("ttl", v))?;
    }
    if let Some(v) = dict.get(section, "buffer") {
        let n: u32 = v.parse().map_err(|_| bad("buffer", v))?;
        if n > MINPACKET_MAX {
            return Err(RadioError::OutOfRange {
                field: "buffer",
                value: n.to_string(),
                valid: "0..=4",
            });
        }
        channel.output.minpacket = n;
    }
    if let Some(v) = dict.get(section, "filter2") {
        let n: u32 = v.parse().map_err(|_| bad("filter2", v))?;
        if n > FILTER2_MAX {
            return Err(RadioError::OutOfRange {
                field: "filter2",
                value: n.to_string(),
                valid: "0..=10",
            });
        }
        channel.filter.filter2_blocking = n;
    }
    if let Some(v) = dict.get(section, "encoding") {
        channel.output.encoding = v.to_string();
    }

    apply_bitrate(dict, section, channel)?;
    if let Some(v) = dict.get(section, "opus-fec") {
        let n: u32 = v.parse().map_err(|_| bad("opus-fec", v))?;
        if n > OPUS_FEC_MAX {
            return Err(RadioError::OutOfRange {
                field: "opus-fec",
                value: n.to_string(),
                valid: "0..=100",
            });
        }
        channel.output.opus_fec = n;
    }
    if let Some(v) = dict.get(section, "opus-dtx") {
        channel.output.opus_dtx = parse_bool(v)?;
    }

    apply_squelch_fields(dict, section, channel)?;
    apply_linear_fields(dict, section, channel)?;
    apply_fm_fields(dict, section, channel)?;

    Ok(())
}

/// `squelch-open`/`squelch-close` are channel-level settings, independent
/// of demod type, applied to whichever demod's squelch fields exist (today
/// that's FM/WFM; Linear and the spectrum demods have none). Unlike
/// `threshold` (a Linear-only AGC field), these convert through the power
/// law, not the voltage law.
fn apply_squelch_fields(dict: &ConfigDict, section: &str, channel: &mut ChannelState) -> Result<(), RadioError> {
    if let Some(v) = dict.get(section, "squelch-open") {
        let db: f64 = v.parse().map_err(|_| bad("squelch-open", v))?;
        let ratio = db_to_power(db);
        set_fm(channel, |fm| fm.squelch_open_db = ratio);
    }
    if let Some(v) = dict.get(section, "squelch-close") {
        let db: f64 = v.parse().map_err(|_| bad("squelch-close", v))?;
        let ratio = db_to_power(db);
        set_fm(channel, |fm| fm.squelch_close_db = ratio);
    }
    Ok(())
}

fn apply_bitrate(dict: &ConfigDict, section: &str, channel: &mut ChannelState) -> Result<(), RadioError> {
    let raw = dict
        .get(section, "opus-bitrate")
        .or_else(|| dict.get(section, "bitrate"));
    let Some(raw) = raw else { return Ok(()) };
    let mut value: f64 = raw.parse().map_err(|_| bad("opus-bitrate", raw))?;
    // A client passing a small number almost certainly meant kbit/s.
    if value > 0.0 && value < 510.0 {
        value *= 1000.0;
    }
    if value < 0.0 || value > OPUS_BITRATE_MAX as f64 {
        return Err(RadioError::OutOfRange {
            field: "opus-bitrate",
            value: value.to_string(),
            valid: "0..=510000",
        });
    }
    channel.output.opus_bitrate = value as u32;
    Ok(())
}

fn apply_linear_fields(dict: &ConfigDict, section: &str, channel: &mut ChannelState) -> Result<(), RadioError> {
    let output_samprate = channel.output.samprate;
    let DemodState::Linear(state) = &mut channel.demod else {
        return Ok(());
    };
    if let Some(v) = dict.get(section, "threshold") {
        let db: f64 = v.parse().map_err(|_| bad("threshold", v))?;
        // Always <= unity: the threshold is a one-sided voltage ratio.
        state.agc_threshold_db = db_to_ratio(-db.abs());
    }
    if let Some(v) = dict.get(section, "dc-cut") {
        let corner_hz: f64 = v.parse().map_err(|_| bad("dc-cut", v))?;
        state.dc_cut_rate = -(-2.0 * std::f64::consts::PI * corner_hz / output_samprate).exp_m1();
    }
    if let Some(v) = dict.get(section, "recovery-rate") {
        let rate: f64 = v.parse().map_err(|_| bad("recovery-rate", v))?;
        state.agc_recovery_rate_db_per_s = rate.abs();
    }
    if let Some(v) = dict.get(section, "hang-time") {
        let t: f64 = v.parse().map_err(|_| bad("hang-time", v))?;
        state.agc_hangtime_s = t.abs();
    }
    if let Some(v) = dict.get(section, "agc") {
        state.agc_enable = parse_bool(v)?;
    }
    if let Some(v) = dict.get(section, "envelope") {
        state.envelope = parse_bool(v)?;
    }
    if let Some(v) = dict.get(section, "conj") {
        state.conj = parse_bool(v)?;
    }
    if let Some(v) = dict.get(section, "pll-bw") {
        state.pll_bw_hz = parse_frequency(v)?;
    }
    if let Some(v) = dict.get(section, "pll") {
        state.pll_enable = parse_bool(v)?;
    }
    // square=true implies pll=true regardless of the order these two keys
    // appear in the section.
    if let Some(v) = dict.get(section, "square") {
        state.pll_square = parse_bool(v)?;
        if state.pll_square {
            state.pll_enable = true;
        }
    }
    Ok(())
}

fn apply_fm_fields(
    dict: &ConfigDict,
    section: &str,
    channel: &mut ChannelState,
) -> Result<(), RadioError> {
    let demod_is_fm = matches!(channel.demod, DemodState::Fm(_) | DemodState::Wfm(_));
    if !demod_is_fm {
        return Ok(());
    }

    if let Some(v) = dict.get(section, "deemph-tc") {
        let tau_us: f64 = v.parse().map_err(|_| bad("deemph-tc", v))?;
        let fs = channel.output.samprate;
        let rate = -(-1.0 / ((tau_us * 1e-6) * fs)).exp_m1();
        set_fm(channel, |fm| fm.deemph_tc_rate = rate);
    }
    if let Some(v) = dict.get(section, "deemph-gain") {
        let g: f64 = v.parse().map_err(|_| bad("deemph-gain", v))?;
        set_fm(channel, |fm| fm.deemph_gain = g);
    }
    for (key, synonym_group) in [("tone", ()), ("pl", ()), ("ctcss", ())] {
        let _ = synonym_group;
        if let Some(v) = dict.get(section, key) {
            let hz = parse_frequency(v)?;
            if hz > TONE_MAX_HZ {
                return Err(RadioError::OutOfRange {
                    field: "tone",
                    value: hz.to_string(),
                    valid: "0..=3000 Hz",
                });
            }
            set_fm(channel, |fm| fm.tone_hz = Some(hz));
        }
    }
    Ok(())
}

fn set_fm(channel: &mut ChannelState, f: impl FnOnce(&mut super::demod::FmState)) {
    match &mut channel.demod {
        DemodState::Fm(state) | DemodState::Wfm(state) => f(state),
        _ => {}
    }
}

fn parse_demod_name(s: &str) -> Option<DemodTypeTag> {
    match s.to_ascii_lowercase().as_str() {
        "linear" | "usb" | "lsb" | "cw" | "am" => Some(DemodTypeTag::Linear),
        "fm" | "nfm" => Some(DemodTypeTag::Fm),
        "wfm" => Some(DemodTypeTag::Wfm),
        "spectrum" | "spect" => Some(DemodTypeTag::Spect),
        "spect2" => Some(DemodTypeTag::Spect2),
        _ => None,
    }
}

fn parse_bool(s: &str) -> Result<bool, RadioError> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(bad("boolean", s)),
    }
}

fn db_to_ratio(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// dB-to-power-ratio conversion (as opposed to [`db_to_ratio`]'s
/// dB-to-voltage-ratio law), for fields compared against signal power
/// rather than amplitude.
fn db_to_power(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

fn bad(field: &'static str, value: &str) -> RadioError {
    RadioError::OutOfRange {
        field,
        value: value.to_string(),
        valid: "a well-formed value for this key",
    }
}

/// Rounds `requested` up to the nearest positive multiple of the
/// environment's sample-rate quantum, with a floor of
/// [`OUTPUT_SAMPRATE_FLOOR`].
pub fn quantize_samprate(requested: f64, env: &Environment) -> f64 {
    let quantum = env.samprate_quantum();
    let floored = requested.max(OUTPUT_SAMPRATE_FLOOR);
    (floored / quantum).ceil() * quantum
}
