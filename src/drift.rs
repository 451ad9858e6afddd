use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Tilt reading (degrees) to horizontal drift (dots per tick)
const GAMMA_TO_DRIFT: f32 = 0.1;

#[derive(Debug, Default)]
struct TiltState {
    enabled: AtomicBool,
    /// f32 bits of the current ratio
    ratio: AtomicU32,
}

/// Horizontal bias shared by every flake, driven by device tilt.
///
/// Cloning shares the same value. Writers are fire-and-forget and readers take
/// one snapshot per tick, so a change lands on the next tick at the latest.
#[derive(Debug, Clone, Default)]
pub struct TiltDrift {
    state: Arc<TiltState>,
}

impl TiltDrift {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn drift on with no reading yet
    pub fn enable(&self) {
        self.state.ratio.store(0f32.to_bits(), Ordering::Relaxed);
        self.state.enabled.store(true, Ordering::Relaxed);
    }

    /// Turn drift off and forget the last reading
    pub fn disable(&self) {
        self.state.enabled.store(false, Ordering::Relaxed);
        self.state.ratio.store(0f32.to_bits(), Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::Relaxed)
    }

    /// Feed a tilt reading (left/right gamma, degrees). Ignored while disabled.
    pub fn set_gamma(&self, gamma: f32) {
        if gamma.is_finite() && self.is_enabled() {
            self.state
                .ratio
                .store((gamma * GAMMA_TO_DRIFT).to_bits(), Ordering::Relaxed);
        }
    }

    pub fn gamma(&self) -> f32 {
        self.ratio() / GAMMA_TO_DRIFT
    }

    fn ratio(&self) -> f32 {
        f32::from_bits(self.state.ratio.load(Ordering::Relaxed))
    }

    /// Ratio to apply this tick, `None` when disabled
    pub fn snapshot(&self) -> Option<f32> {
        self.is_enabled().then(|| self.ratio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let drift = TiltDrift::new();
        drift.set_gamma(30.0);
        assert_eq!(drift.snapshot(), None);
    }

    #[test]
    fn test_reading_while_disabled_is_dropped() {
        let drift = TiltDrift::new();
        drift.set_gamma(30.0);
        drift.enable();
        assert_eq!(drift.snapshot(), Some(0.0));

        drift.set_gamma(30.0);
        assert_eq!(drift.snapshot(), Some(3.0));
        // Re-enabling starts over without a reading
        drift.enable();
        assert_eq!(drift.snapshot(), Some(0.0));
    }

    #[test]
    fn test_gamma_scales_to_ratio() {
        let drift = TiltDrift::new();
        drift.enable();
        drift.set_gamma(-20.0);
        assert_eq!(drift.snapshot(), Some(-2.0));
        assert!((drift.gamma() + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_clones_share_state() {
        let drift = TiltDrift::new();
        let signal = drift.clone();
        drift.enable();
        signal.set_gamma(10.0);
        assert_eq!(drift.snapshot(), Some(1.0));
    }

    #[test]
    fn test_disable_clears_and_ignores_nan() {
        let drift = TiltDrift::new();
        drift.enable();
        drift.set_gamma(10.0);
        drift.set_gamma(f32::NAN);
        assert_eq!(drift.snapshot(), Some(1.0));
        drift.disable();
        assert_eq!(drift.snapshot(), None);
        drift.enable();
        assert_eq!(drift.snapshot(), Some(0.0));
    }
}
