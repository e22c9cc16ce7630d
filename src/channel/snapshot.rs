//! # Observable-State Snapshot
//!
//! A serde-serializable view of a [`super::ChannelState`], independent of
//! the wire TLV format. Exists purely for debugging and tests: `radioctl
//! poll --json` prints one of these, and integration tests assert against
//! it instead of re-decoding a status packet by hand.

use serde::Serialize;

use super::ChannelState;

#[derive(Debug, Clone, Serialize)]
pub struct TuningSnapshot {
    pub radio_frequency_hz: f64,
    pub shift_hz: f64,
    pub doppler_offset_hz: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterSnapshot {
    pub low_edge_hz: f64,
    pub high_edge_hz: f64,
    pub kaiser_beta: f64,
    pub filter2_blocking: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSnapshot {
    pub samprate: f64,
    pub channels: u8,
    pub encoding: String,
    pub opus_bitrate: u32,
    pub packets_out: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSnapshot {
    pub ssrc: u32,
    pub demod_kind: String,
    pub healthy: bool,
    pub restart_needed: bool,
    pub packets_in: u64,
    pub tuning: TuningSnapshot,
    pub filter: FilterSnapshot,
    pub output: OutputSnapshot,
}

impl ChannelSnapshot {
    /// Builds a snapshot from a locked channel state. Pure read; never
    /// mutates `state`, so it's safe to take under a held mutex guard.
    pub fn from_state(ssrc: u32, state: &ChannelState) -> Self {
        ChannelSnapshot {
            ssrc,
            demod_kind: format!("{:?}", state.demod.kind_tag()),
            healthy: state.healthy,
            restart_needed: state.restart_needed,
            packets_in: state.io.packets_in,
            tuning: TuningSnapshot {
                radio_frequency_hz: state.tuning.radio_frequency_hz,
                shift_hz: state.tuning.shift_hz,
                doppler_offset_hz: state.tuning.doppler.map(|d| d.offset_hz),
            },
            filter: FilterSnapshot {
                low_edge_hz: state.filter.low_edge_hz,
                high_edge_hz: state.filter.high_edge_hz,
                kaiser_beta: state.filter.kaiser_beta,
                filter2_blocking: state.filter.filter2_blocking,
            },
            output: OutputSnapshot {
                samprate: state.output.samprate,
                channels: state.output.channels,
                encoding: state.output.encoding.clone(),
                opus_bitrate: state.output.opus_bitrate,
                packets_out: state.output.packets_out,
            },
        }
    }

    /// Pretty-printed JSON, for CLI/log output.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::demod::DemodState;
    use crate::tlv::DemodTypeTag;

    #[test]
    fn snapshot_reflects_state_and_round_trips_through_json() {
        let mut state = ChannelState::new_for(DemodState::new(DemodTypeTag::Fm));
        state.tuning.radio_frequency_hz = 147_435_000.0;
        state.filter.set_edges(-5_000.0, 5_000.0);
        state.healthy = true;

        let snapshot = ChannelSnapshot::from_state(0x1234, &state);
        assert_eq!(snapshot.ssrc, 0x1234);
        assert_eq!(snapshot.demod_kind, "Fm");
        assert_eq!(snapshot.tuning.radio_frequency_hz, 147_435_000.0);

        let json = snapshot.to_json_pretty().unwrap();
        assert!(json.contains("\"radio_frequency_hz\": 147435000.0"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["ssrc"], 0x1234);
        assert_eq!(parsed["demod_kind"], "Fm");
    }

    #[test]
    fn snapshot_carries_doppler_when_present() {
        use crate::channel::Doppler;

        let mut state = ChannelState::new_for(DemodState::new(DemodTypeTag::Linear));
        state.tuning.doppler = Some(Doppler { offset_hz: 12.5, rate_hz_per_s: 0.1 });

        let snapshot = ChannelSnapshot::from_state(1, &state);
        assert_eq!(snapshot.tuning.doppler_offset_hz, Some(12.5));
    }
}
