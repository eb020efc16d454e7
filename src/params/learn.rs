//! XCAL learning parameter blocks

use super::ParamUpdate;
use crate::sigmoid::WtSigParams;

/// XCAL check-mark function parameters (`spec.md` §4.6)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XCalParams {
    /// Overall learning-rate multiplier on the error-driven term
    pub m_lrn: f32,
    /// Threshold crossover point, as a fraction of `thr`
    pub d_rev: f32,
    /// Minimum `sr` below which there is no learning
    pub d_thr: f32,
}

impl Default for XCalParams {
    fn default() -> Self {
        Self { m_lrn: 1.0, d_rev: 0.1, d_thr: 1e-4 }
    }
}

impl XCalParams {
    /// `XCAL(sr, thr)`: the piecewise check-mark function
    pub fn xcal(&self, sr: f32, thr: f32) -> f32 {
        if sr < self.d_thr {
            0.0
        } else if sr > self.d_rev * thr {
            sr - thr
        } else {
            sr * (-(1.0 - self.d_rev) / self.d_rev)
        }
    }
}

/// Per-synapse `DWt` magnitude normalization
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormParams {
    /// Enable normalization
    pub on: bool,
    /// Decay rate applied to the running `Norm` each trial
    pub decay_dt: f32,
    /// Floor for the normalization denominator
    pub norm_min: f32,
    /// Learning-rate compensation factor applied after normalization
    pub lr_comp: f32,
}

impl Default for NormParams {
    fn default() -> Self {
        Self { on: true, decay_dt: 0.1, norm_min: 0.1, lr_comp: 0.15 }
    }
}

impl NormParams {
    /// Update the running `Norm` and return the normalization factor for this trial
    pub fn normalize(&self, norm: &mut f32, dwt: f32) -> f32 {
        let decayed = self.decay_dt * *norm;
        let denom = decayed.max(dwt.abs()).max(self.norm_min);
        *norm = decayed.max(dwt.abs());
        self.lr_comp / denom
    }
}

/// Synaptic weight-change momentum (heavy-ball smoothing of `DWt`)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumParams {
    /// Enable momentum
    pub on: bool,
    /// Momentum decay factor
    pub m_dt: f32,
    /// Learning-rate compensation factor applied after momentum
    pub lr_comp: f32,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self { on: true, m_dt: 0.9, lr_comp: 0.1 }
    }
}

impl MomentumParams {
    /// Update the running momentum and return the dwt to apply this trial
    pub fn apply(&self, moment: &mut f32, dwt: f32) -> f32 {
        *moment = self.m_dt * *moment + dwt;
        self.lr_comp * *moment
    }
}

/// Periodic soft-renormalization of weight-increase vs. weight-decrease gain
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WtBalParams {
    /// Enable `WtBal`
    pub on: bool,
    /// `LWt` threshold above which a synapse counts toward the receiver average
    pub avg_thr: f32,
    /// High-average threshold that triggers increase-suppression
    pub hi_thr: f32,
    /// Gain applied above `hi_thr`
    pub hi_gain: f32,
    /// Low-average threshold that triggers decrease-suppression
    pub lo_thr: f32,
    /// Gain applied below `lo_thr`
    pub lo_gain: f32,
    /// Trials between `WtBal` recomputations
    pub interval: u32,
}

impl Default for WtBalParams {
    fn default() -> Self {
        Self { on: true, avg_thr: 0.25, hi_thr: 0.4, hi_gain: 4.0, lo_thr: 0.4, lo_gain: 6.0, interval: 10 }
    }
}

impl WtBalParams {
    /// Compute `(wb_inc, wb_dec)` from a receiver unit's average above-threshold `LWt`
    pub fn factors(&self, avg: f32) -> (f32, f32) {
        if avg > self.hi_thr {
            let fact = self.hi_gain * (avg - self.hi_thr);
            let wb_inc = 1.0 / (1.0 + fact);
            (wb_inc, 2.0 - wb_inc)
        } else if avg < self.lo_thr {
            let fact = self.lo_gain * (self.lo_thr - avg);
            let wb_dec = 1.0 / (1.0 + fact);
            (2.0 - wb_dec, wb_dec)
        } else {
            (1.0, 1.0)
        }
    }
}

/// Long-run (BCM) floating threshold parameters
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvgLParams {
    /// Time constant, in trials
    pub tau: f32,
    /// Gain applied to `AvgM` when updating toward the target
    pub gain: f32,
    /// Floor on `AvgL`
    pub min: f32,
    /// `1 / tau`, cached by `update()`
    pub dt: f32,
}

impl Default for AvgLParams {
    fn default() -> Self {
        let tau = 10.0;
        Self { tau, gain: 2.5, min: 0.2, dt: 1.0 / tau }
    }
}

impl ParamUpdate for AvgLParams {
    fn update(&mut self) {
        self.dt = 1.0 / self.tau;
    }
}

impl AvgLParams {
    /// One `AvgL` integration step, floored at `min`
    pub fn step(&self, avg_l: f32, avg_m: f32) -> f32 {
        (avg_l + self.dt * (self.gain * avg_m - avg_l)).max(self.min)
    }
}

/// Per-path excitatory/inhibitory scaling weights feeding `GScale` (`spec.md` §4.3)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WtScaleParams {
    /// Absolute scale, applied unconditionally
    pub abs: f32,
    /// Relative scale, normalized against sibling excitatory paths at the receiver
    pub rel: f32,
}

impl Default for WtScaleParams {
    fn default() -> Self {
        Self { abs: 1.0, rel: 1.0 }
    }
}

/// Full learning parameter block for a path
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnParams {
    /// Enable learning on this path at all
    pub learn: bool,
    /// Base learning rate applied after norm/momentum compensation
    pub lrate: f32,
    /// XCAL check-mark parameters
    pub xcal: XCalParams,
    /// Weight sigmoid parameters
    pub wt_sig: WtSigParams,
    /// `DWt` normalization
    pub norm: NormParams,
    /// `DWt` momentum
    pub momentum: MomentumParams,
    /// Periodic weight balance
    pub wt_bal: WtBalParams,
}

impl Default for LearnParams {
    fn default() -> Self {
        Self {
            learn: true,
            lrate: 0.04,
            xcal: XCalParams::default(),
            wt_sig: WtSigParams::default(),
            norm: NormParams::default(),
            momentum: MomentumParams::default(),
            wt_bal: WtBalParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xcal_below_threshold_is_zero() {
        let p = XCalParams::default();
        assert_eq!(p.xcal(1e-6, 0.5), 0.0);
    }

    #[test]
    fn test_xcal_above_crossover_is_linear() {
        let p = XCalParams::default();
        let sr = 0.5;
        let thr = 0.1; // d_rev*thr = 0.01, sr far above
        assert!((p.xcal(sr, thr) - (sr - thr)).abs() < 1e-6);
    }

    #[test]
    fn test_wt_bal_middle_is_identity() {
        let p = WtBalParams::default();
        let (inc, dec) = p.factors(0.3);
        assert_eq!(inc, 1.0);
        assert_eq!(dec, 1.0);
    }

    #[test]
    fn test_wt_bal_high_avg_suppresses_increase() {
        let p = WtBalParams::default();
        let (inc, dec) = p.factors(0.6);
        assert!(inc < 1.0);
        assert!(dec > 1.0);
    }

    #[test]
    fn test_wt_bal_low_avg_suppresses_decrease() {
        let p = WtBalParams::default();
        let (inc, dec) = p.factors(0.1);
        assert!(inc > 1.0);
        assert!(dec < 1.0);
    }

    #[test]
    fn test_avg_l_floored_at_min() {
        let p = AvgLParams::default();
        let mut avg_l = p.min;
        for _ in 0..1000 {
            avg_l = p.step(avg_l, 0.0);
        }
        assert!((avg_l - p.min).abs() < 1e-6);
    }
}
