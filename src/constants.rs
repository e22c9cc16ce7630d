//! Protocol-wide constants.
//!
//! Numeric limits enforced on receipt per the external-interfaces and
//! error-handling sections: Opus bitrate, jitter buffer depth, `filter2`
//! block count, and tone-squelch frequency.

/// Reserved SSRC meaning "all channels" for broadcast polls.
pub const SSRC_ALL_CHANNELS: u32 = 0xFFFF_FFFF;

/// SSRC meaning "enumerate" in contexts that accept it.
pub const SSRC_ENUMERATE: u32 = 0;

/// Maximum length-prefix continuation bytes (supports lengths up to ~4 GiB).
pub const MAX_LENGTH_BYTES: usize = 4;

/// Opus bitrate ceiling, bit/s. 0 means "auto".
pub const OPUS_BITRATE_MAX: u32 = 510_000;

/// Jitter buffer depth ceiling, in packets.
pub const MINPACKET_MAX: u32 = 4;

/// `filter2` block-count ceiling.
pub const FILTER2_MAX: u32 = 10;

/// Tone-squelch (CTCSS/PL) frequency ceiling, Hz.
pub const TONE_MAX_HZ: f64 = 3_000.0;

/// Kaiser beta range accepted from the wire, matching the client-side
/// bound in the original remote-control entry point.
pub const KAISER_BETA_MIN: f64 = 0.0;
pub const KAISER_BETA_MAX: f64 = 100.0;

/// Opus FEC percentage ceiling.
pub const OPUS_FEC_MAX: u32 = 100;

/// Floor enforced on output sample rate by the preset loader's
/// sample-rate rounding rule.
pub const OUTPUT_SAMPRATE_FLOOR: f64 = 400.0;

/// Default spectrum crossover RBW (Hz) separating wideband from
/// narrowband mode.
pub const DEFAULT_CROSSOVER_HZ: f64 = 200.0;

/// Default narrowband margin (Hz) added to `bin_count * RBW` when
/// picking a candidate FFT size.
pub const DEFAULT_NARROWBAND_MARGIN_HZ: f64 = 400.0;

/// Default compact-encoding base level, dB.
pub const DEFAULT_COMPACT_BASE_DB: f32 = -150.0;

/// Default compact-encoding step, dB/LSB.
pub const DEFAULT_COMPACT_STEP_DB: f32 = 0.5;

/// Status socket recv timeout (§5 Suspension and blocking points).
pub const STATUS_RECV_TIMEOUT_MS: u64 = 100;

/// Poll response collection window: silence before declaring discovery
/// complete.
pub const DISCOVERY_SILENCE_MS: u64 = 100;

/// Poll response collection window: absolute cap.
pub const DISCOVERY_CAP_MS: u64 = 1_000;
