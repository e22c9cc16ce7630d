//! # TLV Status/Command Protocol
//!
//! Wire-level encode/decode for the status and command messages exchanged
//! over the multicast control plane. [`types`] defines the closed tag
//! sets, [`codec`] the per-field primitives, [`message`] the outer packet
//! framing and the `for_us`/command-tag helpers built on top of them.

pub mod codec;
pub mod message;
pub mod types;

pub use codec::TlvField;
pub use message::{
    command_tag, decode_fields, decode_header, encode_command_tag, find, finish_packet,
    for_us, start_packet, target_ssrc,
};
pub use types::{DemodTypeTag, MessageKind, TlvType};
