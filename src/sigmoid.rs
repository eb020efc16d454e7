//! Weight contrast sigmoid and its inverse
//!
//! Synapses store a linear weight `LWt ∈ [0, 1]` and an effective,
//! contrast-enhanced weight `Wt = Scale · σ(LWt)`. `σ` and `σ⁻¹` are the
//! same reciprocal-power family evaluated with `(gain, off)` and
//! `(1/gain, 1/off)` respectively, which makes them exact inverses of one
//! another on the open interval `(0, 1)`.

/// Sigmoid steepness and offset parameters
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WtSigParams {
    /// Steepness of the contrast enhancement
    pub gain: f32,
    /// Offset of the contrast enhancement
    pub off: f32,
    /// Use soft-bounding in `WtFromDWt` (see `path::Path::wt_from_dwt`)
    pub soft_bound: bool,
}

impl Default for WtSigParams {
    fn default() -> Self {
        Self { gain: 6.0, off: 1.0, soft_bound: true }
    }
}

/// `σ(lwt)`: maps linear weight in `[0, 1]` to contrast-enhanced weight in `[0, 1]`
pub fn sig(lwt: f32, gain: f32, off: f32) -> f32 {
    if lwt <= 0.0 {
        0.0
    } else if lwt >= 1.0 {
        1.0
    } else {
        1.0 / (1.0 + (off * (1.0 - lwt) / lwt).powf(gain))
    }
}

/// `σ⁻¹(wt)`: inverse of [`sig`]
pub fn sig_inv(wt: f32, gain: f32, off: f32) -> f32 {
    if wt <= 0.0 {
        0.0
    } else if wt >= 1.0 {
        1.0
    } else {
        1.0 / (1.0 + ((1.0 - wt) / wt).powf(1.0 / gain) / off)
    }
}

impl WtSigParams {
    /// `σ(lwt)` under this parameter set
    pub fn sig(&self, lwt: f32) -> f32 {
        sig(lwt, self.gain, self.off)
    }

    /// `σ⁻¹(wt)` under this parameter set
    pub fn sig_inv(&self, wt: f32) -> f32 {
        sig_inv(wt, self.gain, self.off)
    }
}
