//! FFFB inhibition parameter blocks

use super::ParamUpdate;

/// Feedforward + feedback pool-level inhibition parameters (`spec.md` §4.2)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FFFBParams {
    /// Overall inhibition gain multiplier
    pub gi: f32,
    /// Feedforward gain
    pub ff: f32,
    /// Feedback gain
    pub fb: f32,
    /// Feedback time constant, in cycles
    pub fb_tau: f32,
    /// Feedforward threshold subtracted from `GeAvg`
    pub ff0: f32,
    /// Blend between max and avg `Ge` used as the feedforward drive (0 = pure avg)
    pub max_vs_avg: f32,

    /// `1 / fb_tau`, cached by `update()`
    pub fb_dt: f32,
}

impl Default for FFFBParams {
    fn default() -> Self {
        let fb_tau = 1.4;
        Self { gi: 1.8, ff: 1.0, fb: 1.0, fb_tau, ff0: 0.1, max_vs_avg: 0.0, fb_dt: 1.0 / fb_tau }
    }
}

impl ParamUpdate for FFFBParams {
    fn update(&mut self) {
        self.fb_dt = 1.0 / self.fb_tau;
    }
}

impl FFFBParams {
    /// Feedforward term: `FF · max(GeAvg - FF0, 0)`
    pub fn ff_inhib(&self, ge_avg: f32) -> f32 {
        self.ff * (ge_avg - self.ff0).max(0.0)
    }

    /// One feedback-term integration step: `FBi += fb_dt · (FB·ActAvg - FBi)`
    pub fn fb_step(&self, fb_i: f32, act_avg: f32) -> f32 {
        fb_i + self.fb_dt * (self.fb * act_avg - fb_i)
    }

    /// Blend of max and average `Ge` used as the feedforward drive
    pub fn ge_drive(&self, ge_avg: f32, ge_max: f32) -> f32 {
        ge_avg + self.max_vs_avg * (ge_max - ge_avg)
    }

    /// Final pool inhibition `Gi = gi · (FFi + FBi)`
    pub fn pool_gi(&self, ff_i: f32, fb_i: f32) -> f32 {
        self.gi * (ff_i + fb_i)
    }
}

/// Optional per-neuron self-inhibition
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfInhibParams {
    /// Enable self-inhibition
    pub on: bool,
    /// Self-inhibition gain
    pub gi: f32,
    /// Self-inhibition time constant, in cycles
    pub tau: f32,
    /// `1 / tau`, cached by `update()`
    pub dt: f32,
}

impl Default for SelfInhibParams {
    fn default() -> Self {
        let tau = 1.4;
        Self { on: false, gi: 0.4, tau, dt: 1.0 / tau }
    }
}

impl ParamUpdate for SelfInhibParams {
    fn update(&mut self) {
        self.dt = 1.0 / self.tau;
    }
}

impl SelfInhibParams {
    /// One self-inhibition integration step: `GiSelf += dt · (gi·Act - GiSelf)`
    pub fn step(&self, gi_self: f32, act: f32) -> f32 {
        if !self.on {
            return 0.0;
        }
        gi_self + self.dt * (self.gi * act - gi_self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ff_inhib_clamps_at_zero() {
        let p = FFFBParams::default();
        assert_eq!(p.ff_inhib(0.05), 0.0); // below FF0
        assert!(p.ff_inhib(0.5) > 0.0);
    }

    #[test]
    fn test_fb_converges_to_target() {
        let p = FFFBParams::default();
        let mut fb = 0.0f32;
        for _ in 0..2000 {
            fb = p.fb_step(fb, 0.5);
        }
        assert!((fb - p.fb * 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_self_inhib_off_is_zero() {
        let p = SelfInhibParams::default();
        assert_eq!(p.step(0.1, 0.8), 0.0);
    }
}
