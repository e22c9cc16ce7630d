//! # Error Handling
//!
//! `RadioError` covers every failure kind enumerated in the error-handling
//! design: malformed TLV framing, out-of-range parameters, allocation
//! failure during spectrum reconfiguration, socket errors, and the
//! catch-all cases a channel or the transport layer can hit. Most of these
//! are recoverable by the caller (log and continue); only
//! `SpectrumAllocation` and `ChannelUnhealthy` are meant to tear a channel
//! down, and only `Setup` is meant to abort the process.

use thiserror::Error;

/// Errors produced by the wire codec, transport, channel control plane,
/// and spectrum demodulator.
#[derive(Debug, Error)]
pub enum RadioError {
    /// TLV length prefix overruns the end of the buffer. Parsing stops;
    /// fields already decoded remain valid.
    #[error("truncated TLV field: type {type_byte:#04x} claims {claimed_len} bytes, {available} available")]
    TruncatedTlv {
        type_byte: u8,
        claimed_len: usize,
        available: usize,
    },

    /// A field value fell outside its enforced numeric range (Opus bitrate,
    /// buffer depth, filter2 blocks, tone frequency, ...). The field is
    /// rejected and the previous value retained; this is not fatal.
    #[error("field {field} out of range: {value} (valid: {valid})")]
    OutOfRange {
        field: &'static str,
        value: String,
        valid: &'static str,
    },

    /// A preset or config section named a key outside the closed recognized
    /// set.
    #[error("unrecognized configuration key: {0}")]
    UnrecognizedKey(String),

    /// A frequency string could not be parsed in any recognized form
    /// (decimal, SI suffix, or the ham `147m435` convention).
    #[error("unparseable frequency: {0:?}")]
    BadFrequency(String),

    /// Allocation failure while reconfiguring the spectrum demodulator's
    /// FFT plan, window, or ring buffer. Fatal to the affected channel.
    #[error("allocation failed while reconfiguring channel {ssrc:#010x}: {reason}")]
    SpectrumAllocation { ssrc: u32, reason: String },

    /// The channel was marked unhealthy after a fatal internal error and
    /// no longer emits responses.
    #[error("channel {0:#010x} is unhealthy")]
    ChannelUnhealthy(u32),

    /// No channel with the requested SSRC is live.
    #[error("no such channel: {0:#010x}")]
    NoSuchChannel(u32),

    /// The downconverter (external collaborator) signaled a nonzero exit;
    /// the owning demodulator loop tears the channel down cleanly.
    #[error("downconverter exited for channel {0:#010x}")]
    DownconverterExited(u32),

    /// Socket send/recv failure. Logged once; status delivery is
    /// best-effort, so this is never propagated as fatal.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// Fatal process-wide setup failure (bind, missing preset file).
    #[error("fatal setup error: {0}")]
    Setup(String),

    /// Catch-all for conditions that don't fit a more specific variant.
    #[error("{0}")]
    Other(String),
}

impl RadioError {
    /// True for the subset of errors that are meant to abort the whole
    /// process rather than just a channel or a single field.
    pub fn is_fatal_to_process(&self) -> bool {
        matches!(self, RadioError::Setup(_))
    }
}
