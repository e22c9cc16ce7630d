//! # Front-End Handle
//!
//! The actual I/Q acquisition from hardware is an external collaborator
//! (§1 Non-goals). What belongs to this core is the *read-only handle* a
//! channel holds to reach the front end's mirror-mapped ring (§9: "model
//! this as a non-owning handle... the front-end never dereferences
//! channels").

use std::sync::Arc;

use crate::spectrum::ring::{FrontEndRing, RealFrontEndRing};

/// Either representation a front end can produce. A channel reads
/// whichever variant is live; it never owns or writes to it.
pub enum FrontEndSamples {
    Complex(FrontEndRing),
    Real(RealFrontEndRing),
}

/// Shared, read-only front-end state. Wrapped in `Arc` and handed to
/// every channel at creation time; constructed once before any channel
/// threads are spawned (§9: "process-wide immutable environment").
pub struct FrontEnd {
    pub samprate_hz: f64,
    samples: FrontEndSamples,
}

impl FrontEnd {
    pub fn new(samprate_hz: f64, samples: FrontEndSamples) -> Arc<Self> {
        Arc::new(FrontEnd { samprate_hz, samples })
    }

    pub fn is_real(&self) -> bool {
        matches!(self.samples, FrontEndSamples::Real(_))
    }

    pub fn complex_ring(&self) -> Option<&FrontEndRing> {
        match &self.samples {
            FrontEndSamples::Complex(ring) => Some(ring),
            FrontEndSamples::Real(_) => None,
        }
    }

    pub fn real_ring(&self) -> Option<&RealFrontEndRing> {
        match &self.samples {
            FrontEndSamples::Real(ring) => Some(ring),
            FrontEndSamples::Complex(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::ring::MirrorRing;

    #[test]
    fn reports_its_own_kind() {
        let complex = FrontEnd::new(24_000_000.0, FrontEndSamples::Complex(MirrorRing::new(1024)));
        assert!(!complex.is_real());
        assert!(complex.complex_ring().is_some());
        assert!(complex.real_ring().is_none());

        let real = FrontEnd::new(24_000_000.0, FrontEndSamples::Real(MirrorRing::new(1024)));
        assert!(real.is_real());
        assert!(real.real_ring().is_some());
    }
}
