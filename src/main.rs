use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use clap::Parser;

use radiod_core::channel::demod::DemodState;
use radiod_core::channel::preset;
use radiod_core::channel::registry::Registry;
use radiod_core::channel::snapshot::ChannelSnapshot;
use radiod_core::channel::{Channel, Environment};
use radiod_core::config::ConfigDict;
use radiod_core::error::RadioError;
use radiod_core::tlv::{self, DemodTypeTag, MessageKind, TlvType};
use radiod_core::transport::StatusSocket;
use radiod_core::{init_logger, log_debug, log_info, log_warn};

/// Multichannel SDR control-plane and spectrum-analysis engine.
#[derive(Parser, Debug)]
#[command(name = "radiod")]
#[command(about = "Status/command engine for a bank of demodulating channels")]
struct Cli {
    /// Local address the status/command socket binds to.
    #[arg(long, default_value = "0.0.0.0:5006")]
    bind: SocketAddr,

    /// Multicast group the status/command socket joins.
    #[arg(long, default_value = "239.1.2.3")]
    group: Ipv4Addr,

    /// Destination for status responses (usually the same multicast group
    /// on a fixed port).
    #[arg(long, default_value = "239.1.2.3:5006")]
    status_dest: SocketAddr,

    /// TOML preset file (see [`radiod_core::config::load_toml`]).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Front end's native sample rate, Hz.
    #[arg(long, default_value_t = 24_000_000.0)]
    front_end_samprate: f64,

    /// DSP block duration, seconds.
    #[arg(long, default_value_t = 0.02)]
    blocktime: f64,

    /// Overlap-save factor.
    #[arg(long, default_value_t = 5.0)]
    overlap: f64,

    /// One or more `ssrc=preset` pairs, each spawning a channel at
    /// startup (e.g. `--channel 42=nbfm`).
    #[arg(long = "channel", value_parser = parse_channel_spec)]
    channels: Vec<(u32, String)>,
}

fn parse_channel_spec(s: &str) -> Result<(u32, String), String> {
    let (ssrc_str, preset_name) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ssrc=preset, got {s:?}"))?;
    let ssrc: u32 = ssrc_str
        .parse()
        .map_err(|_| format!("invalid ssrc {ssrc_str:?}"))?;
    Ok((ssrc, preset_name.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), RadioError> {
    init_logger();

    let cli = Cli::parse();
    let env = Environment {
        blocktime_s: cli.blocktime,
        overlap: cli.overlap,
        front_end_samprate: cli.front_end_samprate,
        front_end_is_real: false,
    };

    let dict = match &cli.config {
        Some(path) => radiod_core::config::load_toml(path)?,
        None => ConfigDict::new(),
    };

    let registry = Arc::new(Registry::new());
    for (ssrc, preset_name) in &cli.channels {
        let channel = Arc::new(Channel::new(*ssrc, DemodState::new(DemodTypeTag::Fm)));
        {
            let mut state = channel.lock().await;
            if let Err(e) = preset::load_preset(&dict, preset_name, &mut state, &env) {
                log_warn(&format!("preset {preset_name:?} for channel {ssrc:#x}: {e}"));
            }
        }
        registry.insert(channel).await;
        log_info(&format!("channel {ssrc:#010x} created with preset {preset_name:?}"));
    }

    let status_socket = Arc::new(StatusSocket::bind_multicast(cli.bind, cli.group)?);
    log_info(&format!(
        "status socket bound to {} (group {})",
        status_socket.local_addr()?,
        cli.group
    ));

    let status_task = tokio::spawn(run_status_loop(
        status_socket.clone(),
        registry.clone(),
        cli.status_dest,
    ));

    let mut channel_tasks = Vec::new();
    for channel in registry.enumerate_sorted().await {
        channel_tasks.push(tokio::spawn(run_channel_cycle(
            channel,
            env,
            status_socket.clone(),
            cli.status_dest,
        )));
    }

    let _ = status_task.await;
    for task in channel_tasks {
        let _ = task.await;
    }
    Ok(())
}

/// One demodulator cycle: `receive_block -> drain_pending_command ->
/// apply -> step_dsp -> maybe_respond` (§9 Design Notes). The external
/// downconverter that would yield `receive_block` is out of scope; this
/// loop paces itself on `blocktime` instead.
async fn run_channel_cycle(
    channel: Arc<Channel>,
    env: Environment,
    status_socket: Arc<StatusSocket>,
    dest: SocketAddr,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(env.blocktime_s));
    let mut last_command_tag: Option<u32> = None;
    let mut just_changed = false;

    loop {
        ticker.tick().await;

        let raw_command = {
            let mut state = channel.lock().await;
            state.io.take_command()
        };

        if let Some(raw) = raw_command {
            let fields = tlv::decode_fields(&raw);
            last_command_tag = tlv::command_tag(&fields).or(last_command_tag);
            let mut state = channel.lock().await;
            match state.demod.apply_command(&fields) {
                Ok(structural) => {
                    state.restart_needed |= structural;
                    just_changed = true;
                }
                Err(e) => log_warn(&format!("channel {:#010x}: {e}", channel.ssrc())),
            }
        }

        let should_respond = {
            let mut state = channel.lock().await;
            if state.restart_needed {
                state.restart_needed = false;
                // A structural change tears down and re-enters setup;
                // the spectrum engine's own state machine (see
                // SpectrumEngine::ensure_configured) handles this for
                // SPECT/SPECT2, FM/linear channels have no plan to free.
            }
            state.io.blocks_since_poll += 1;
            let due = state.io.output_interval_blocks > 0
                && state.io.blocks_since_poll >= state.io.output_interval_blocks;
            if due {
                state.io.blocks_since_poll = 0;
            }
            due || just_changed
        };
        just_changed = false;

        if should_respond {
            let mut buf = BytesMut::new();
            {
                let state = channel.lock().await;
                build_status_packet(&mut buf, channel.ssrc(), &state, last_command_tag);
                let snapshot = ChannelSnapshot::from_state(channel.ssrc(), &state);
                if let Ok(json) = snapshot.to_json_pretty() {
                    log_debug(&format!("channel {:#010x} state: {json}", channel.ssrc()));
                }
            }
            status_socket.send_to(&buf, dest).await;
        }

        if !channel_is_healthy(&channel).await {
            log_warn(&format!("channel {:#010x} unhealthy; cycle exiting", channel.ssrc()));
            break;
        }
    }
}

async fn channel_is_healthy(channel: &Channel) -> bool {
    channel.lock().await.healthy
}

fn build_status_packet(
    buf: &mut BytesMut,
    ssrc: u32,
    state: &radiod_core::ChannelState,
    command_tag: Option<u32>,
) {
    use radiod_core::tlv::codec;

    tlv::start_packet(buf, MessageKind::Status);
    codec::encode_u32(buf, TlvType::OutputSsrc.to_u8(), ssrc);
    if let Some(tag) = command_tag {
        tlv::encode_command_tag(buf, tag);
    }
    codec::encode_double(buf, TlvType::RadioFrequency.to_u8(), state.tuning.radio_frequency_hz);
    codec::encode_double(buf, TlvType::ShiftFrequency.to_u8(), state.tuning.shift_hz);
    codec::encode_double(buf, TlvType::LowEdge.to_u8(), state.filter.low_edge_hz);
    codec::encode_double(buf, TlvType::HighEdge.to_u8(), state.filter.high_edge_hz);
    codec::encode_double(buf, TlvType::KaiserBeta.to_u8(), state.filter.kaiser_beta);
    codec::encode_u32(buf, TlvType::Filter2.to_u8(), state.filter.filter2_blocking);
    codec::encode_double(buf, TlvType::OutputSamprate.to_u8(), state.output.samprate);
    codec::encode_u8(buf, TlvType::OutputChannels.to_u8(), state.output.channels);
    codec::encode_u32(buf, TlvType::OpusBitRate.to_u8(), state.output.opus_bitrate);
    state.demod.emit_status(buf);
    tlv::finish_packet(buf);
}

/// Services the multicast status/command socket: decodes each datagram,
/// checks `for_us`/broadcast addressing, and routes commands to the
/// targeted channel(s). Blocks on [`StatusSocket::recv`] with its own
/// internal timeout, which is this thread's pacing point (§5).
async fn run_status_loop(socket: Arc<StatusSocket>, registry: Arc<Registry>, dest: SocketAddr) {
    let mut buf = vec![0u8; 65536];
    loop {
        let (n, from) = match socket.recv(&mut buf).await {
            Ok(Some(hit)) => hit,
            Ok(None) => continue,
            Err(e) => {
                log_warn(&format!("status recv error: {e}"));
                continue;
            }
        };

        let Some((kind, rest)) = tlv::decode_header(&buf[..n]) else {
            log_warn(&format!("unrecognized message kind from {from}"));
            continue;
        };
        if kind != MessageKind::Cmd {
            continue; // we don't expect clients to send us STATUS packets
        }

        let fields = tlv::decode_fields(rest);
        let target = tlv::target_ssrc(&fields);

        match target {
            Some(ssrc) if ssrc == radiod_core::constants::SSRC_ALL_CHANNELS => {
                for channel in registry.enumerate_sorted().await {
                    channel.queue_command(rest.to_vec()).await;
                }
            }
            Some(ssrc) => {
                if let Some(channel) = registry.get(ssrc).await {
                    if tlv::for_us(Some(ssrc), channel.ssrc()) {
                        channel.queue_command(rest.to_vec()).await;
                    }
                } else {
                    log_warn(&format!("command addressed unknown channel {ssrc:#010x}"));
                }
            }
            None => log_warn(&format!("command from {from} lacks OUTPUT_SSRC; dropped")),
        }
        let _ = dest; // status responses are sent by each channel's own cycle
    }
}
