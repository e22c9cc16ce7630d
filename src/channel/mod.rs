//! # Channel Control Plane
//!
//! A [`Channel`] is the addressable unit of tuning and demodulation: one
//! SSRC, one parameter struct, one demodulator. [`preset`] implements the
//! configuration-dictionary loader, [`demod`] the tagged dispatch across
//! demodulator kinds, [`registry`] the live-channel table used for
//! discovery and routing.

pub mod demod;
pub mod preset;
pub mod registry;
pub mod snapshot;

use tokio::sync::Mutex;

use crate::error::RadioError;
use crate::tlv::TlvField;

use demod::DemodState;

/// Process-wide, read-only values established at startup and shared by
/// every channel (§9: "process-wide immutable environment object").
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    /// Duration of one DSP block/cycle, seconds. Typically 20 ms.
    pub blocktime_s: f64,
    /// Overlap-save factor; typical value 5.
    pub overlap: f64,
    /// Front end's native sample rate, Hz.
    pub front_end_samprate: f64,
    /// True if the front end produces real-valued samples rather than I/Q.
    pub front_end_is_real: bool,
}

impl Environment {
    /// `(1/blocktime) * (overlap - 1)`, the sample-rate quantum every
    /// channel's output rate must be a multiple of.
    pub fn samprate_quantum(&self) -> f64 {
        (1.0 / self.blocktime_s) * (self.overlap - 1.0)
    }
}

/// Optional frequency tracking offset and linear rate, added to the tuned
/// carrier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Doppler {
    pub offset_hz: f64,
    pub rate_hz_per_s: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    pub radio_frequency_hz: f64,
    pub first_lo_hz: f64,
    pub second_lo_hz: f64,
    pub shift_hz: f64,
    pub doppler: Option<Doppler>,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            radio_frequency_hz: 0.0,
            first_lo_hz: 0.0,
            second_lo_hz: 0.0,
            shift_hz: 0.0,
            doppler: None,
        }
    }
}

/// Pre-detection (input) filter. `low_edge_hz <= high_edge_hz` is
/// maintained by [`Self::set_edges`], never by direct field assignment.
#[derive(Debug, Clone, Copy)]
pub struct PreDetectionFilter {
    pub low_edge_hz: f64,
    pub high_edge_hz: f64,
    pub kaiser_beta: f64,
    pub bin_shift: i32,
    pub remainder: f64,
    /// Second-stage (post-downconversion) overlap-save block count, 0..=10.
    /// Off (0) by default; `0` means the second filter stage isn't used.
    pub filter2_blocking: u32,
}

impl Default for PreDetectionFilter {
    fn default() -> Self {
        PreDetectionFilter {
            low_edge_hz: -5_000.0,
            high_edge_hz: 5_000.0,
            kaiser_beta: 11.0,
            bin_shift: 0,
            remainder: 0.0,
            filter2_blocking: 0,
        }
    }
}

impl PreDetectionFilter {
    /// Re-orders swapped edges so `low <= high` always holds.
    pub fn set_edges(&mut self, a: f64, b: f64) {
        if a <= b {
            self.low_edge_hz = a;
            self.high_edge_hz = b;
        } else {
            self.low_edge_hz = b;
            self.high_edge_hz = a;
        }
    }
}

/// RTP/output-stream parameters, encoding selection, and the live
/// byte/block counters used for output pacing.
#[derive(Debug, Clone)]
pub struct OutputParams {
    pub samprate: f64,
    pub channels: u8,
    pub encoding: String,
    pub seq: u32,
    pub timestamp: u32,
    pub dest_socket: Option<std::net::SocketAddr>,
    pub packets_out: u64,
    pub gain: f64,
    pub headroom: f64,
    pub ttl: u8,
    pub minpacket: u32,
    pub opus_bitrate: u32,
    pub opus_bandwidth: u32,
    pub opus_application: u32,
    pub opus_fec: u32,
    pub opus_dtx: bool,
}

impl Default for OutputParams {
    fn default() -> Self {
        OutputParams {
            samprate: 24_000.0,
            channels: 1,
            encoding: "opus".to_string(),
            seq: 0,
            timestamp: 0,
            dest_socket: None,
            packets_out: 0,
            gain: 1.0,
            headroom: 0.1,
            ttl: 1,
            minpacket: 0,
            opus_bitrate: 0,
            opus_bandwidth: 0,
            opus_application: 0,
            opus_fec: 0,
            opus_dtx: false,
        }
    }
}

/// Status-cycle bookkeeping: input/output packet counts, the
/// blocks-until-next-unsolicited-response counter, and the single-slot
/// pending-command queue ("latest wins" — see [`Self::queue_command`]).
#[derive(Debug, Default)]
pub struct StatusIo {
    pub packets_in: u64,
    pub blocks_since_poll: u32,
    pub output_interval_blocks: u32,
    pending_command: Option<Vec<u8>>,
}

impl StatusIo {
    /// Replaces any unexecuted pending command with `fields`.
    pub fn queue_command(&mut self, fields: Vec<u8>) {
        self.pending_command = Some(fields);
    }

    /// Atomically takes the pending command, leaving the slot empty.
    pub fn take_command(&mut self) -> Option<Vec<u8>> {
        self.pending_command.take()
    }
}

/// Everything about a channel that can change at runtime, held behind one
/// mutex per §5 ("each channel's mutable state is protected by a single
/// per-channel mutex").
#[derive(Debug)]
pub struct ChannelState {
    pub tuning: Tuning,
    pub filter: PreDetectionFilter,
    pub demod: DemodState,
    pub output: OutputParams,
    pub io: StatusIo,
    /// Set when a command changes a structural parameter; consumed by the
    /// channel's cycle at the top of the next iteration.
    pub restart_needed: bool,
    pub healthy: bool,
}

impl ChannelState {
    /// Builds a zero-initialized state around the given demodulator kind.
    /// Used directly by the preset loader's tests and by [`Channel::new`].
    pub fn new_for(demod: DemodState) -> Self {
        ChannelState {
            tuning: Tuning::default(),
            filter: PreDetectionFilter::default(),
            demod,
            output: OutputParams::default(),
            io: StatusIo::default(),
            restart_needed: false,
            healthy: true,
        }
    }
}

/// A tuned, demodulating channel. `ssrc` is immutable for the channel's
/// lifetime; everything else lives behind [`ChannelState`]'s mutex.
#[derive(Debug)]
pub struct Channel {
    ssrc: u32,
    state: Mutex<ChannelState>,
}

impl Channel {
    pub fn new(ssrc: u32, demod: DemodState) -> Self {
        Channel {
            ssrc,
            state: Mutex::new(ChannelState::new_for(demod)),
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, ChannelState> {
        self.state.lock().await
    }

    /// Appends a raw command TLV payload to the pending-command slot,
    /// overwriting any command not yet executed.
    pub async fn queue_command(&self, raw_fields: Vec<u8>) {
        self.state.lock().await.io.queue_command(raw_fields);
    }
}

/// Fields every demod kind accepts regardless of its specific state, used
/// by [`demod::DemodState::apply_command`] before dispatching to the
/// kind-specific handler.
pub fn common_field_names() -> &'static [&'static str] {
    &["radio_frequency", "low_edge", "high_edge", "kaiser_beta", "gain"]
}

/// Lightweight view used by command handlers that only need to read
/// fields already decoded from a TLV stream, without re-parsing.
pub fn field_u32(fields: &[TlvField<'_>], ty: crate::tlv::TlvType) -> Option<u32> {
    crate::tlv::find(fields, ty).map(|f| f.decode_u32())
}

pub fn field_f64(fields: &[TlvField<'_>], ty: crate::tlv::TlvType) -> Option<f64> {
    crate::tlv::find(fields, ty).map(|f| f.decode_f64())
}

pub fn field_bool(fields: &[TlvField<'_>], ty: crate::tlv::TlvType) -> Option<bool> {
    crate::tlv::find(fields, ty).map(|f| f.decode_bool())
}

pub type ApplyResult = Result<(), RadioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_edges_reorder_when_swapped() {
        let mut f = PreDetectionFilter::default();
        f.set_edges(5_000.0, -5_000.0);
        assert!(f.low_edge_hz <= f.high_edge_hz);
        assert_eq!(f.low_edge_hz, -5_000.0);
        assert_eq!(f.high_edge_hz, 5_000.0);
    }

    #[test]
    fn samprate_quantum_matches_typical_values() {
        let env = Environment {
            blocktime_s: 0.02,
            overlap: 5.0,
            front_end_samprate: 24_000_000.0,
            front_end_is_real: false,
        };
        assert_eq!(env.samprate_quantum(), 200.0);
    }

    #[tokio::test]
    async fn pending_command_latest_wins() {
        let channel = Channel::new(1, DemodState::Linear(demod::LinearState::default()));
        channel.queue_command(vec![1, 2, 3]).await;
        channel.queue_command(vec![4, 5]).await;
        let mut guard = channel.lock().await;
        assert_eq!(guard.io.take_command(), Some(vec![4, 5]));
        assert_eq!(guard.io.take_command(), None);
    }
}
