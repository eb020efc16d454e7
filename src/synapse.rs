//! Per-connection synaptic state

use crate::sigmoid::WtSigParams;

/// One directed connection's weight and learning state.
///
/// `Wt` and `LWt` are kept in lockstep: `Wt = Scale · σ(LWt)`. Callers that
/// want to set `Wt` directly must go through [`Synapse::set_wt`], which
/// recomputes `LWt` via `σ⁻¹`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synapse {
    /// Effective, contrast-enhanced weight
    pub wt: f32,
    /// Linear weight, always in `[0, 1]`
    pub lwt: f32,
    /// Accumulated weight delta for the current trial
    pub dwt: f32,
    /// Running normalization of `|DWt|` magnitude (XCAL `Norm`)
    pub norm: f32,
    /// Momentum accumulator (XCAL `Moment`)
    pub moment: f32,
    /// Per-synapse scale multiplier (`Wt = Scale · σ(LWt)`)
    pub scale: f32,
}

impl Synapse {
    /// Construct a synapse from a linear weight, deriving `Wt` via `σ`
    pub fn from_lwt(lwt: f32, scale: f32, wt_sig: &WtSigParams) -> Self {
        let lwt = lwt.clamp(0.0, 1.0);
        Self {
            wt: scale * wt_sig.sig(lwt),
            lwt,
            dwt: 0.0,
            norm: 0.0,
            moment: 0.0,
            scale,
        }
    }

    /// Set the effective weight directly, recomputing `LWt = σ⁻¹(Wt/Scale)`
    pub fn set_wt(&mut self, wt: f32, wt_sig: &WtSigParams) {
        self.wt = wt;
        let normalized = if self.scale != 0.0 { wt / self.scale } else { wt };
        self.lwt = wt_sig.sig_inv(normalized.clamp(0.0, 1.0));
    }

    /// Set the linear weight directly, recomputing `Wt = Scale · σ(LWt)`
    pub fn set_lwt(&mut self, lwt: f32, wt_sig: &WtSigParams) {
        self.lwt = lwt.clamp(0.0, 1.0);
        self.wt = self.scale * wt_sig.sig(self.lwt);
    }

    /// Recompute `Wt` from the current `LWt` (used after `WtFromDWt` updates `LWt`)
    pub fn wt_from_lwt(&mut self, wt_sig: &WtSigParams) {
        self.wt = self.scale * wt_sig.sig(self.lwt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lwt_bounds_invariant() {
        let wt_sig = WtSigParams::default();
        let syn = Synapse::from_lwt(1.5, 1.0, &wt_sig);
        assert!((0.0..=1.0).contains(&syn.lwt));
        let syn = Synapse::from_lwt(-0.5, 1.0, &wt_sig);
        assert!((0.0..=1.0).contains(&syn.lwt));
    }

    #[test]
    fn test_wt_lwt_lockstep() {
        let wt_sig = WtSigParams::default();
        let mut syn = Synapse::from_lwt(0.5, 1.0, &wt_sig);
        assert!((syn.wt - wt_sig.sig(0.5)).abs() < 1e-6);

        syn.set_wt(0.15, &wt_sig);
        assert!((syn.wt - 0.15).abs() < 1e-6);
        assert!((syn.lwt - 0.42822415).abs() < 1e-4);
    }

    #[test]
    fn test_scaled_set_wt() {
        let wt_sig = WtSigParams::default();
        let mut syn = Synapse::from_lwt(0.5, 2.0, &wt_sig);
        syn.set_wt(0.3, &wt_sig);
        assert!((syn.wt - 0.3).abs() < 1e-6);
        // lwt should correspond to wt/scale = 0.15
        let expected_lwt = wt_sig.sig_inv(0.15);
        assert!((syn.lwt - expected_lwt).abs() < 1e-5);
    }
}
