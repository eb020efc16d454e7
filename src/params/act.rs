//! Activation parameter block: NXX1, conductances, clamping, noise

use std::sync::Arc;

use super::ParamUpdate;
use crate::nxx1::NXX1Table;

/// Conductance gain per channel
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBarParams {
    /// Excitatory
    pub e: f32,
    /// Leak
    pub l: f32,
    /// Inhibitory
    pub i: f32,
    /// Potassium
    pub k: f32,
}

impl Default for GBarParams {
    fn default() -> Self {
        Self { e: 1.0, l: 0.1, i: 1.0, k: 1.0 }
    }
}

/// Reversal potential per channel
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErevParams {
    /// Excitatory
    pub e: f32,
    /// Leak
    pub l: f32,
    /// Inhibitory
    pub i: f32,
    /// Potassium
    pub k: f32,
}

impl Default for ErevParams {
    fn default() -> Self {
        Self { e: 1.0, l: 0.3, i: 0.25, k: 0.1 }
    }
}

/// Membrane potential clip range
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VmRange {
    /// Minimum
    pub min: f32,
    /// Maximum
    pub max: f32,
}

impl Default for VmRange {
    fn default() -> Self {
        Self { min: 0.0, max: 2.0 }
    }
}

impl VmRange {
    /// Clip `v` into `[min, max]`
    pub fn clip(&self, v: f32) -> f32 {
        v.clamp(self.min, self.max)
    }
}

/// Clamping behavior for units with external input
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampParams {
    /// Hard-clamp `Act` directly to `Ext` (vs. soft bias into `Ge`)
    pub hard: bool,
    /// Output range `Act` is clipped to under hard clamp
    pub range: VmRange,
    /// Soft-clamp averaging vs. additive (see `spec.md` §4.4 step 2)
    pub avg: bool,
    /// Soft-clamp blend weight when `avg` is true
    pub avg_gain: f32,
}

impl Default for ClampParams {
    fn default() -> Self {
        Self { hard: true, range: VmRange { min: 0.0, max: 0.95 }, avg: false, avg_gain: 0.2 }
    }
}

/// Per-cycle noise source type
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseType {
    /// No noise
    None,
    /// Fresh Gaussian sample each cycle
    Gaussian,
    /// One sample drawn at trial start, held fixed for the whole trial
    Fixed,
}

/// Per-cycle noise parameters
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    /// Noise source kind
    pub ty: NoiseType,
    /// Standard deviation of the noise distribution
    pub var: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self { ty: NoiseType::None, var: 0.0 }
    }
}

/// Learning-average update rates used in `spec.md` §4.4 step 8
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActAvgDtParams {
    /// Super-short timescale rate
    pub ss_dt: f32,
    /// Short timescale rate
    pub s_dt: f32,
    /// Medium timescale rate
    pub m_dt: f32,
    /// Short-term learning signal blend (with `lrn_m`, sums to 1)
    pub lrn_s: f32,
    /// Medium-term learning signal blend
    pub lrn_m: f32,
}

impl Default for ActAvgDtParams {
    fn default() -> Self {
        Self { ss_dt: 0.5, s_dt: 0.5, m_dt: 0.1, lrn_s: 0.9, lrn_m: 0.1 }
    }
}

/// Sodium-gated potassium adaptation (optional; off by default)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KNaParams {
    /// Enable adaptation
    pub on: bool,
    /// Fast-channel rise rate
    pub fast_rise: f32,
    /// Fast-channel decay rate
    pub fast_dt: f32,
    /// Medium-channel rise rate
    pub med_rise: f32,
    /// Medium-channel decay rate
    pub med_dt: f32,
    /// Slow-channel rise rate
    pub slow_rise: f32,
    /// Slow-channel decay rate
    pub slow_dt: f32,
}

impl Default for KNaParams {
    fn default() -> Self {
        Self {
            on: false,
            fast_rise: 0.05,
            fast_dt: 1.0 / 50.0,
            med_rise: 0.02,
            med_dt: 1.0 / 200.0,
            slow_rise: 0.001,
            slow_dt: 1.0 / 1000.0,
        }
    }
}

/// Full activation parameter block for a layer
#[derive(Debug, Clone)]
pub struct ActParams {
    /// NXX1 threshold
    pub thr: f32,
    /// NXX1 gain
    pub gain: f32,
    /// NXX1 noise standard deviation
    pub n_var: f32,
    /// Below this `Act`, with `Vm <= Thr`, use the subthreshold Vm-driven branch
    pub vm_act_thr: f32,
    /// Conductance gains
    pub gbar: GBarParams,
    /// Reversal potentials
    pub erev: ErevParams,
    /// Membrane potential clip range
    pub vm_range: VmRange,
    /// Integration step scale (numerator of both `VmDt` and `GDt`)
    pub integ: f32,
    /// Membrane potential time constant
    pub vm_tau: f32,
    /// Conductance time constant
    pub g_tau: f32,
    /// Clamping behavior
    pub clamp: ClampParams,
    /// Noise parameters
    pub noise: NoiseParams,
    /// Learning-average rates
    pub avg: ActAvgDtParams,
    /// KNa adaptation
    pub k_na: KNaParams,

    /// Precomputed NXX1 convolution table, rebuilt by `update()`
    pub nxx1_table: Arc<NXX1Table>,
    /// `Integ / VmTau`, cached by `update()`
    pub vm_dt: f32,
    /// `Integ / GTau`, cached by `update()`
    pub g_dt: f32,
}

impl Default for ActParams {
    fn default() -> Self {
        let thr = 0.5;
        let gain = 100.0;
        let n_var = 0.005;
        let integ = 1.0;
        let vm_tau = 3.3;
        let g_tau = 1.4;
        Self {
            thr,
            gain,
            n_var,
            vm_act_thr: 0.01,
            gbar: GBarParams::default(),
            erev: ErevParams::default(),
            vm_range: VmRange::default(),
            integ,
            vm_tau,
            g_tau,
            clamp: ClampParams::default(),
            noise: NoiseParams::default(),
            avg: ActAvgDtParams::default(),
            k_na: KNaParams::default(),
            nxx1_table: Arc::new(NXX1Table::build(gain, n_var)),
            vm_dt: integ / vm_tau,
            g_dt: integ / g_tau,
        }
    }
}

impl ParamUpdate for ActParams {
    fn update(&mut self) {
        self.nxx1_table = Arc::new(NXX1Table::build(self.gain, self.n_var));
        self.vm_dt = self.integ / self.vm_tau;
        self.g_dt = self.integ / self.g_tau;
    }
}

impl ActParams {
    /// Evaluate NXX1 at threshold-relative input `x`
    pub fn nxx1(&self, x: f32) -> f32 {
        crate::nxx1::nxx1(&self.nxx1_table, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_consistent_after_update() {
        let mut p = ActParams::default();
        p.gain = 50.0;
        p.n_var = 0.01;
        p.update();
        assert_eq!(p.nxx1_table.gain(), 50.0);
        assert_eq!(p.nxx1_table.n_var(), 0.01);
    }

    #[test]
    fn test_vm_dt_g_dt_defaults() {
        let p = ActParams::default();
        assert!((p.vm_dt - (1.0 / 3.3)).abs() < 1e-6);
        assert!((p.g_dt - (1.0 / 1.4)).abs() < 1e-6);
    }
}
