//! Thin remote-control client for the status/command protocol: sends one
//! command datagram and, for `poll`/`list`, collects responses within the
//! discovery window.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use bytes::BytesMut;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use radiod_core::constants::SSRC_ALL_CHANNELS;
use radiod_core::tlv::{self, codec, MessageKind, TlvField, TlvType};
use radiod_core::transport::DiscoveryCollector;
use radiod_core::{init_logger, log_info};

#[derive(Parser)]
#[command(name = "radioctl")]
#[command(about = "Remote-control client for the status/command protocol")]
struct Cli {
    /// Multicast group:port the engine's status socket listens on.
    #[arg(long, default_value = "239.1.2.3:5006")]
    target: SocketAddr,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Broadcast a poll and list every channel that responds.
    List,
    /// Poll a single channel's status and print its observable fields.
    Poll {
        ssrc: u32,
        /// Print the decoded status fields as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Tune a channel's carrier frequency.
    Tune {
        ssrc: u32,
        #[arg(value_parser = radiod_core::freq::parse_frequency)]
        frequency_hz: f64,
    },
    /// Overlay a named preset section onto a channel.
    Preset { ssrc: u32, name: String },
    /// Request a spectrum scan at a given resolution bandwidth.
    Spectrum {
        ssrc: u32,
        bin_count: u32,
        #[arg(value_parser = radiod_core::freq::parse_frequency)]
        rbw_hz: f64,
    },
}

fn main() -> std::io::Result<()> {
    init_logger();
    let cli = Cli::parse();

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(Duration::from_millis(200)))?;

    match cli.command {
        Command::List => {
            let mut buf = BytesMut::new();
            tlv::start_packet(&mut buf, MessageKind::Cmd);
            codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), SSRC_ALL_CHANNELS);
            codec::encode_u32(&mut buf, TlvType::CommandTag.to_u8(), 1);
            tlv::finish_packet(&mut buf);
            socket.send_to(&buf, cli.target)?;

            let mut collector = DiscoveryCollector::new();
            let mut recv_buf = vec![0u8; 65536];
            while collector.still_collecting() {
                match socket.recv_from(&mut recv_buf) {
                    Ok((n, _from)) => {
                        if let Some((MessageKind::Status, rest)) = tlv::decode_header(&recv_buf[..n]) {
                            let fields = tlv::decode_fields(rest);
                            if let Some(ssrc) = tlv::target_ssrc(&fields) {
                                collector.record(ssrc);
                            }
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(e),
                }
            }
            for ssrc in collector.into_sorted_ssrcs() {
                log_info(&format!("channel {ssrc:#010x}"));
            }
        }
        Command::Poll { ssrc, json: want_json } => {
            let mut buf = BytesMut::new();
            tlv::start_packet(&mut buf, MessageKind::Cmd);
            codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), ssrc);
            codec::encode_u32(&mut buf, TlvType::CommandTag.to_u8(), 1);
            tlv::finish_packet(&mut buf);
            socket.send_to(&buf, cli.target)?;

            let mut recv_buf = vec![0u8; 65536];
            loop {
                match socket.recv_from(&mut recv_buf) {
                    Ok((n, _from)) => {
                        if let Some((MessageKind::Status, rest)) = tlv::decode_header(&recv_buf[..n]) {
                            let fields = tlv::decode_fields(rest);
                            if tlv::target_ssrc(&fields) == Some(ssrc) {
                                let snapshot = status_fields_to_json(ssrc, &fields);
                                if want_json {
                                    println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
                                } else {
                                    log_info(&format!("{snapshot}"));
                                }
                                break;
                            }
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(e),
                }
            }
        }
        Command::Tune { ssrc, frequency_hz } => {
            let mut buf = BytesMut::new();
            tlv::start_packet(&mut buf, MessageKind::Cmd);
            codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), ssrc);
            codec::encode_double(&mut buf, TlvType::RadioFrequency.to_u8(), frequency_hz);
            tlv::finish_packet(&mut buf);
            socket.send_to(&buf, cli.target)?;
            log_info(&format!("tune {ssrc:#010x} -> {frequency_hz} Hz sent"));
        }
        Command::Preset { ssrc, name } => {
            let mut buf = BytesMut::new();
            tlv::start_packet(&mut buf, MessageKind::Cmd);
            codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), ssrc);
            codec::encode_string(&mut buf, TlvType::Preset.to_u8(), name.as_bytes());
            tlv::finish_packet(&mut buf);
            socket.send_to(&buf, cli.target)?;
            log_info(&format!("preset {name:?} -> {ssrc:#010x} sent"));
        }
        Command::Spectrum { ssrc, bin_count, rbw_hz } => {
            let mut buf = BytesMut::new();
            tlv::start_packet(&mut buf, MessageKind::Cmd);
            codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), ssrc);
            codec::encode_u32(&mut buf, TlvType::BinCount.to_u8(), bin_count);
            codec::encode_double(&mut buf, TlvType::ResolutionBw.to_u8(), rbw_hz);
            tlv::finish_packet(&mut buf);
            socket.send_to(&buf, cli.target)?;
            log_info(&format!(
                "spectrum request {ssrc:#010x}: {bin_count} bins @ {rbw_hz} Hz RBW sent"
            ));
        }
    }

    Ok(())
}

/// Builds a debug/human JSON object from whatever status fields a reply
/// carried, independent of the wire's TLV type-byte layout. Fields absent
/// from the reply (e.g. suppressed NaNs, §4.3) are simply absent here too.
fn status_fields_to_json(ssrc: u32, fields: &[TlvField<'_>]) -> Value {
    let mut obj = json!({ "ssrc": ssrc });
    let map = obj.as_object_mut().unwrap();

    if let Some(f) = tlv::find(fields, TlvType::RadioFrequency) {
        map.insert("radio_frequency_hz".into(), json!(f.decode_f64()));
    }
    if let Some(f) = tlv::find(fields, TlvType::LowEdge) {
        map.insert("low_edge_hz".into(), json!(f.decode_f64()));
    }
    if let Some(f) = tlv::find(fields, TlvType::HighEdge) {
        map.insert("high_edge_hz".into(), json!(f.decode_f64()));
    }
    if let Some(f) = tlv::find(fields, TlvType::KaiserBeta) {
        map.insert("kaiser_beta".into(), json!(f.decode_f64()));
    }
    if let Some(f) = tlv::find(fields, TlvType::Filter2) {
        map.insert("filter2_blocking".into(), json!(f.decode_u32()));
    }
    if let Some(f) = tlv::find(fields, TlvType::OutputSamprate) {
        map.insert("output_samprate".into(), json!(f.decode_f64()));
    }
    if let Some(f) = tlv::find(fields, TlvType::OutputChannels) {
        map.insert("output_channels".into(), json!(f.decode_u8()));
    }
    if let Some(f) = tlv::find(fields, TlvType::OpusBitRate) {
        map.insert("opus_bit_rate".into(), json!(f.decode_u32()));
    }

    obj
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_fields_to_json_includes_only_present_fields() {
        let mut buf = BytesMut::new();
        tlv::start_packet(&mut buf, MessageKind::Status);
        codec::encode_u32(&mut buf, TlvType::OutputSsrc.to_u8(), 0x99);
        codec::encode_double(&mut buf, TlvType::RadioFrequency.to_u8(), 147_435_000.0);
        tlv::finish_packet(&mut buf);

        let (_, rest) = tlv::decode_header(&buf).unwrap();
        let fields = tlv::decode_fields(rest);
        let value = status_fields_to_json(0x99, &fields);

        assert_eq!(value["ssrc"], 0x99);
        assert_eq!(value["radio_frequency_hz"], 147_435_000.0);
        assert!(value.get("kaiser_beta").is_none());
    }
}
