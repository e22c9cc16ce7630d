//! # radiod-core — SDR control-plane and spectrum DSP core
//!
//! The engine behind a multichannel software-defined radio back-end:
//!
//! - [`tlv`]: the status/command wire protocol (type-length-value fields
//!   over UDP multicast).
//! - [`transport`]: the multicast socket, discovery collection, and poll
//!   jitter built on top of the wire codec.
//! - [`channel`]: each channel's tuning/filter/demodulator parameter
//!   model, the preset loader, and the live-channel registry.
//! - [`spectrum`]: the adaptive FFT-based power-spectrum demodulator.
//! - [`frontend`]: the read-only handle a channel holds on the shared
//!   front-end sample ring.
//!
//! [`config`] and [`freq`] are small supporting utilities (a TOML-backed
//! configuration dictionary, and frequency-string parsing); [`error`] and
//! [`logging`] are the crate's ambient error and logging conventions.

pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod freq;
pub mod frontend;
pub mod logging;
pub mod spectrum;
pub mod tlv;
pub mod transport;

pub use channel::{Channel, ChannelState, Environment};
pub use error::RadioError;
pub use logging::{init_logger, log_debug, log_error, log_info, log_warn};
