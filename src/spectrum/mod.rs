//! # Spectrum Analysis
//!
//! The adaptive power-spectrum demodulator: [`engine`] owns the state
//! machine and FFT plan, [`window`] the analysis-window families, and
//! [`ring`] the mirror-mapped buffers both paths read from.

pub mod engine;
pub mod ring;
pub mod window;

pub use engine::{EngineState, Mode, SpectrumConfig, SpectrumEngine};
pub use window::WindowType;
