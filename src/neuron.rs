//! Per-unit neuron state
//!
//! A dense, cache-friendly record per unit. Every cycle, `layer::Layer`
//! walks `Neurons[]` in place — no per-neuron heap allocation, no dynamic
//! dispatch.

/// Per-neuron boolean flags. Kept as a packed struct rather than a
/// bitflags type since every field is read on the hot path and the extra
/// indirection of a bitset buys nothing at this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeuronFlags {
    /// Neuron is administratively disabled (not updated, not connected)
    pub off: bool,
    /// Receiving an external input this trial (clamp or soft bias)
    pub has_ext: bool,
    /// Has a target value this trial (for `Target` layers)
    pub has_targ: bool,
    /// Has a comparison value this trial (for `Compare` layers, not learned)
    pub has_cmpr: bool,
}

/// Single rate-coded unit's full cycle/quarter/trial state.
///
/// Invariant: `act ∈ [0, 1]` after `act_from_g`; `vm ∈ vm_range` (enforced
/// by the caller's `ActParams.vm_range`, see `params::act`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neuron {
    // -- activation --
    /// Rate-code activation, settled value after NXX1 + smoothing
    pub act: f32,
    /// Time-integrated excitatory conductance
    pub ge: f32,
    /// Time-integrated inhibitory conductance (pool Gi + GiSyn + GiSelf)
    pub gi: f32,
    /// Potassium (adaptation) conductance
    pub gk: f32,
    /// Membrane potential
    pub vm: f32,
    /// Net current driving `vm`
    pub inet: f32,
    /// Per-cycle noise sample
    pub noise: f32,
    /// Target value (Target layers)
    pub targ: f32,
    /// External input value (Input/clamped layers)
    pub ext: f32,

    // -- learning averages --
    /// Super-short running average of `act_lrn`
    pub avg_ss: f32,
    /// Short running average
    pub avg_s: f32,
    /// Medium running average
    pub avg_m: f32,
    /// Long running average (floating BCM threshold)
    pub avg_l: f32,
    /// Short-term learning signal, `LrnS·AvgS + LrnM·AvgM`
    pub avg_s_lrn: f32,
    /// Long-term learning modulation derived from `avg_l`
    pub avg_l_lrn: f32,
    /// Activation used for learning averages (may differ from `act` when gated)
    pub act_lrn: f32,

    // -- phase snapshots --
    /// `Act` at the end of quarter 0
    pub act_q0: f32,
    /// `Act` at the end of quarter 1
    pub act_q1: f32,
    /// `Act` at the end of quarter 2
    pub act_q2: f32,
    /// Minus-phase (quarters 0-2) settled activation
    pub act_m: f32,
    /// Plus-phase (quarter 3) settled activation
    pub act_p: f32,
    /// `act_p - act_m`
    pub act_dif: f32,
    /// `nwAct - act` from the most recent cycle (pre-smoothing delta)
    pub act_del: f32,
    /// Slow running average of `act_p` across trials (this layer's `ActPAvgEff`-feeding signal)
    pub act_avg: f32,

    // -- conductance detail --
    /// Synaptic inhibitory conductance delivered this cycle
    pub gi_syn: f32,
    /// Self-inhibition conductance (optional per-neuron feedback)
    pub gi_self: f32,
    /// Last `act` value sent to receivers (`SendGDelta` delta-coding state)
    pub act_sent: f32,
    /// Raw (pre-time-integration) excitatory conductance
    pub ge_raw: f32,
    /// Raw (pre-time-integration) inhibitory conductance
    pub gi_raw: f32,
    /// Fast-timescale sodium-gated potassium conductance
    pub gkna_fast: f32,
    /// Medium-timescale sodium-gated potassium conductance
    pub gkna_med: f32,
    /// Slow-timescale sodium-gated potassium conductance
    pub gkna_slow: f32,

    /// Administrative / trial-context flags
    pub flags: NeuronFlags,
    /// Index of the sub-pool this neuron belongs to (0 = whole-layer pool)
    pub sub_pool: usize,
}

impl Default for Neuron {
    fn default() -> Self {
        Self {
            act: 0.0,
            ge: 0.0,
            gi: 0.0,
            gk: 0.0,
            vm: 0.0,
            inet: 0.0,
            noise: 0.0,
            targ: 0.0,
            ext: 0.0,
            avg_ss: 0.0,
            avg_s: 0.0,
            avg_m: 0.0,
            avg_l: 0.4,
            avg_s_lrn: 0.0,
            avg_l_lrn: 0.0,
            act_lrn: 0.0,
            act_q0: 0.0,
            act_q1: 0.0,
            act_q2: 0.0,
            act_m: 0.0,
            act_p: 0.0,
            act_dif: 0.0,
            act_del: 0.0,
            act_avg: 0.15,
            gi_syn: 0.0,
            gi_self: 0.0,
            act_sent: 0.0,
            ge_raw: 0.0,
            gi_raw: 0.0,
            gkna_fast: 0.0,
            gkna_med: 0.0,
            gkna_slow: 0.0,
            flags: NeuronFlags::default(),
            sub_pool: 0,
        }
    }
}

impl Neuron {
    /// Reset all dynamic fields the way `AlphaCycInit`'s `DecayState` does
    /// when the decay factor is 1 (the default: full reset).
    pub fn decay_state(&mut self, decay: f32) {
        if decay <= 0.0 {
            return;
        }
        self.ge -= decay * self.ge;
        self.gi -= decay * self.gi;
        self.gi_syn -= decay * self.gi_syn;
        self.ge_raw -= decay * self.ge_raw;
        self.gi_raw -= decay * self.gi_raw;
        self.vm -= decay * (self.vm - 0.3);
        self.act -= decay * self.act;
        self.act_lrn -= decay * self.act_lrn;
        self.act_sent -= decay * self.act_sent;
        self.inet -= decay * self.inet;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let n = Neuron::default();
        assert!((0.0..=1.0).contains(&n.act));
        assert!(!n.flags.off);
    }

    #[test]
    fn test_full_decay_zeroes_activation() {
        let mut n = Neuron::default();
        n.act = 0.8;
        n.ge = 0.5;
        n.decay_state(1.0);
        assert_eq!(n.act, 0.0);
        assert_eq!(n.ge, 0.0);
    }

    #[test]
    fn test_full_decay_resets_act_sent() {
        let mut n = Neuron::default();
        n.act_sent = 0.95;
        n.decay_state(1.0);
        assert_eq!(n.act_sent, 0.0);
    }

    #[test]
    fn test_zero_decay_is_noop() {
        let mut n = Neuron::default();
        n.act = 0.8;
        n.ge = 0.5;
        n.decay_state(0.0);
        assert_eq!(n.act, 0.8);
        assert_eq!(n.ge, 0.5);
    }
}
