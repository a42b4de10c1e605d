//! Smooth gain control for the microphone's contribution to the mix.
//!
//! The value approaches its target exponentially, sample by sample, so the
//! mic fades in and out instead of clicking. Equivalent to riding a Web
//! Audio gain param with `setTargetAtTime`.

/// Default ramp time constant: about 63% of the way to the target in 50 ms.
pub const DEFAULT_TIME_CONSTANT_SECS: f32 = 0.05;

#[derive(Debug)]
pub struct GainRamp {
    value: f32,
    target: f32,
    alpha: f32,
}

impl GainRamp {
    /// New ramp at gain 0: the mic starts silent in the mix until voice is
    /// detected, regardless of the manual toggle.
    pub fn new(sample_rate: u32, time_constant_secs: f32) -> Self {
        let tau = time_constant_secs.max(1e-4);
        let alpha = 1.0 - (-1.0 / (tau * sample_rate as f32)).exp();
        Self {
            value: 0.0,
            target: 0.0,
            alpha,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Scale a block in place, advancing the ramp once per sample.
    pub fn apply(&mut self, block: &mut [f32]) {
        for sample in block {
            self.value += (self.target - self.value) * self.alpha;
            *sample *= self.value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_silent() {
        let ramp = GainRamp::new(16_000, DEFAULT_TIME_CONSTANT_SECS);
        assert_eq!(ramp.value(), 0.0);
        assert_eq!(ramp.target(), 0.0);
    }

    #[test]
    fn test_holds_zero_while_target_zero() {
        let mut ramp = GainRamp::new(16_000, DEFAULT_TIME_CONSTANT_SECS);
        let mut block = vec![1.0; 1024];
        ramp.apply(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_converges_toward_target() {
        let mut ramp = GainRamp::new(16_000, DEFAULT_TIME_CONSTANT_SECS);
        ramp.set_target(1.0);
        // 200 ms of samples: four time constants, ~98% of the way there
        let mut block = vec![1.0; 3200];
        ramp.apply(&mut block);
        assert!(ramp.value() > 0.95);
        assert!(block[3199] > 0.95);
        // Monotonic fade-in, no discontinuity
        assert!(block[0] < 0.01);
        assert!(block.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_retargeting_reverses_direction() {
        let mut ramp = GainRamp::new(16_000, DEFAULT_TIME_CONSTANT_SECS);
        ramp.set_target(1.0);
        let mut up = vec![1.0; 1600];
        ramp.apply(&mut up);
        let risen = ramp.value();
        assert!(risen > 0.5);

        ramp.set_target(0.0);
        let mut down = vec![1.0; 3200];
        ramp.apply(&mut down);
        assert!(ramp.value() < 0.05);
        assert!(ramp.value() < risen);
    }
}
