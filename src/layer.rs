//! Layer: a population of units sharing activation/inhibition parameters
//!
//! Drives the per-cycle activation pipeline (`spec.md` §4.4) entirely over
//! its own `Neurons[]`/`Pools[]`/`recv_paths`; the only cross-layer data a
//! `Layer` ever needs — another layer's per-neuron send deltas, or another
//! layer's `ActPAvgEff` — arrives as a read-only snapshot slice supplied by
//! `network::Network`, never as a live reference to another `Layer`. That's
//! what lets `network::Network` dispatch one layer per worker with no
//! shared mutable state between them.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::context::Context;
use crate::neuron::Neuron;
use crate::nxx1;
use crate::params::{ActParams, AvgLParams, FFFBParams, NoiseType, SelfInhibParams};
use crate::path::{LayerId, Path, PathKind};
use crate::pool::Pool;

/// Running-average timescale (in trials) for a pool's `ActPAvg`
const ACT_AVG_TAU: f32 = 100.0;
/// Running-average timescale (in trials) for `CosDiff.Avg`
const COS_DIFF_TAU: f32 = 100.0;

/// Functional role of a layer (`spec.md` §3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Ordinary hidden/processing layer
    Super,
    /// Receives external input, normally hard-clamped
    Input,
    /// Receives a target value used only in the plus phase
    Target,
    /// Receives a comparison value; contributes to stats but never learns
    Compare,
}

impl LayerKind {
    /// Whether this layer kind participates in the `AvgL`/`AvgLLrn` BCM
    /// modulation the way a processing layer does, vs. being held at zero
    /// (`spec.md` §9 supplemented open question)
    pub fn learns_avg_l(&self) -> bool {
        !matches!(self, LayerKind::Input | LayerKind::Target)
    }
}

/// Per-layer send-delta gating (`spec.md` §4.3 `SendGDelta`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptThreshParams {
    /// Minimum `Act` for a sender to be eligible to send at all
    pub send: f32,
    /// Minimum `|Act - ActSent|` for a send to occur
    pub delta: f32,
}

impl Default for OptThreshParams {
    fn default() -> Self {
        Self { send: 0.1, delta: 0.005 }
    }
}

/// Running cosine-similarity statistics between a layer's minus- and
/// plus-phase activation patterns (`spec.md` §4.7)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CosDiffState {
    /// This trial's cosine similarity between `ActM` and `ActP`
    pub cos: f32,
    /// Running average of `cos`
    pub avg: f32,
    /// Running variance of `cos`
    pub var: f32,
    /// `1 - avg` for processing layers, `0` for Input/Target (§9)
    pub mod_avg_l_lrn: f32,
}

impl CosDiffState {
    /// Exponentially-weighted update of `avg`/`var` from this trial's `cos`
    pub fn update(&mut self, cos: f32, tau: f32, learns_avg_l: bool) {
        self.cos = cos;
        let dt = 1.0 / tau;
        let delta = cos - self.avg;
        self.avg += dt * delta;
        let delta2 = cos - self.avg;
        self.var = (1.0 - dt) * (self.var + dt * delta * delta2);
        self.mod_avg_l_lrn = if learns_avg_l { 1.0 - self.avg } else { 0.0 };
    }
}

/// A population of rate-coded units
#[derive(Debug)]
pub struct Layer {
    /// Layer name, used for lookups and error messages
    pub name: String,
    /// Unit-group shape: `[y, x]` (2-D, one pool) or `[pool_y, pool_x, unit_y, unit_x]` (4-D, one pool per group)
    pub shape: Vec<usize>,
    /// Functional role
    pub kind: LayerKind,
    /// Per-unit state, flat in group-major order
    pub neurons: Vec<Neuron>,
    /// Inhibition pools; one entry for 2-D shapes, one per unit-group for 4-D shapes
    pub pools: Vec<Pool>,
    /// Paths for which this layer is the receiver; see module docs for why
    /// paths are owned here rather than by the sender
    pub recv_paths: Vec<Path>,

    /// Activation dynamics parameters
    pub act: ActParams,
    /// Pool-level FFFB inhibition
    pub inhib: FFFBParams,
    /// Optional per-neuron self-inhibition
    pub self_inhib: SelfInhibParams,
    /// Floating BCM threshold dynamics
    pub avg_l: AvgLParams,
    /// Delta-coding send gate
    pub opt_thresh: OptThreshParams,
    /// `AlphaCycInit`'s state-decay factor (1.0 = full reset every trial)
    pub decay: f32,

    /// Cosine-diff running statistics
    pub cos_diff: CosDiffState,
    /// Scratch buffer: this trial's per-sender send delta, `0.0` = no send.
    /// Read by `network::Network` as the cross-layer snapshot for `SendGDelta`.
    pub pending_send_delta: Vec<f32>,

    rng: StdRng,
}

impl Layer {
    /// Register a layer's shape/kind; `Neurons`/`Pools` stay empty until
    /// [`Layer::build`] is called (mirrors `spec.md` §6 `AddLayer`)
    pub fn new(name: impl Into<String>, shape: Vec<usize>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            shape,
            kind,
            neurons: Vec::new(),
            pools: Vec::new(),
            recv_paths: Vec::new(),
            act: ActParams::default(),
            inhib: FFFBParams::default(),
            self_inhib: SelfInhibParams::default(),
            avg_l: AvgLParams::default(),
            opt_thresh: OptThreshParams::default(),
            decay: 1.0,
            cos_diff: CosDiffState::default(),
            pending_send_delta: Vec::new(),
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Total unit count
    pub fn n_units(&self) -> usize {
        self.shape.iter().product()
    }

    fn group_size(&self) -> usize {
        if self.shape.len() <= 2 {
            self.n_units().max(1)
        } else {
            self.shape[2..].iter().product::<usize>().max(1)
        }
    }

    fn sub_pool_of(&self, idx: usize) -> usize {
        if self.shape.len() <= 2 {
            0
        } else {
            idx / self.group_size()
        }
    }

    /// Allocate `Neurons`/`Pools`/scratch buffers (`spec.md` §6 `Build`)
    pub fn build(&mut self, seed: u64) {
        let n = self.n_units();
        self.neurons = vec![Neuron::default(); n];
        for (i, neuron) in self.neurons.iter_mut().enumerate() {
            neuron.sub_pool = self.sub_pool_of(i);
        }
        self.pools = if self.shape.len() <= 2 {
            vec![Pool::new(0, n)]
        } else {
            let groups = self.shape[0] * self.shape[1];
            let gsz = self.group_size();
            (0..groups).map(|g| Pool::new(g * gsz, (g + 1) * gsz)).collect()
        };
        self.pending_send_delta = vec![0.0; n];
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Apply external input (`spec.md` §6 `ApplyExt`). `values.len()` must
    /// equal `n_units()`.
    pub fn apply_ext(&mut self, values: &[f32]) -> crate::error::Result<()> {
        if values.len() != self.n_units() {
            return Err(crate::error::LeabraError::ShapeMismatch {
                layer: self.name.clone(),
                expected: self.shape.clone(),
                got: vec![values.len()],
            });
        }
        for (n, &v) in self.neurons.iter_mut().zip(values.iter()) {
            match self.kind {
                LayerKind::Target => {
                    n.targ = v;
                    n.flags.has_targ = true;
                    // Target layers hard/soft-clamp the same way Input does during
                    // the plus phase this value gets applied in; Type only changes
                    // how the layer is treated for AvgL/learning (`learns_avg_l`).
                    n.ext = v;
                    n.flags.has_ext = true;
                }
                LayerKind::Compare => {
                    n.targ = v;
                    n.flags.has_cmpr = true;
                }
                _ => {
                    n.ext = v;
                    n.flags.has_ext = true;
                }
            }
        }
        Ok(())
    }

    /// Clear the "has external input" flags set by `apply_ext`, normally
    /// called at the start of a new trial
    pub fn clear_ext_flags(&mut self) {
        for n in &mut self.neurons {
            n.flags.has_ext = false;
            n.flags.has_targ = false;
            n.flags.has_cmpr = false;
        }
    }

    /// `AlphaCycInit`: snapshot `ActQ0`, decay dynamic state, zero incoming
    /// conductance accumulators, and (outside test mode) nudge `ActPAvgEff`
    /// toward last trial's plus-phase pool average
    pub fn alpha_cyc_init(&mut self, update_act_avg: bool) {
        for n in &mut self.neurons {
            n.act_q0 = n.act_p;
            n.decay_state(self.decay);
            if self.act.noise.ty == NoiseType::Fixed {
                let dist = Normal::new(0.0, self.act.noise.var.max(1e-6)).unwrap();
                n.noise = dist.sample(&mut self.rng);
            }
        }
        for path in &mut self.recv_paths {
            for g in &mut path.g_inc {
                *g = 0.0;
            }
        }
        if update_act_avg {
            for pool in &mut self.pools {
                let last_plus = pool.act_p.avg;
                pool.act_avg.avg_from_act(last_plus, ACT_AVG_TAU);
            }
        }
    }

    /// Recompute every `recv_paths[_].g_scale` from the sending layers'
    /// `ActPAvgEff` (supplied by the caller, indexed by `LayerId`)
    pub fn recompute_g_scale(&mut self, send_act_p_avg_eff: &[f32]) {
        let mut exc_sum = 0.0f32;
        let mut inh_sum = 0.0f32;
        for p in &self.recv_paths {
            match p.kind {
                PathKind::Excitatory => exc_sum += p.wt_scale.rel,
                PathKind::Inhibitory => inh_sum += p.wt_scale.rel,
            }
        }
        let exc_sum = if exc_sum > 0.0 { exc_sum } else { 1.0 };
        let inh_sum = if inh_sum > 0.0 { inh_sum } else { 1.0 };
        for p in &mut self.recv_paths {
            let rel_norm = match p.kind {
                PathKind::Excitatory => p.wt_scale.rel / exc_sum,
                PathKind::Inhibitory => p.wt_scale.rel / inh_sum,
            };
            let eff = send_act_p_avg_eff[p.send_layer.0];
            p.compute_g_scale(eff, rel_norm);
        }
    }

    /// `SendGDelta`, local half: decide which neurons send this cycle and
    /// update `ActSent` bookkeeping, writing the thresholded delta (`0.0`
    /// for "no send") into `pending_send_delta` for the caller to snapshot.
    /// A sender that falls back below `OptThresh.Send` after having sent
    /// sends one final zero-out delta (`-ActSent`) so receivers don't keep
    /// integrating a conductance contribution the sender no longer backs.
    pub fn compute_send_deltas(&mut self) {
        for (n, slot) in self.neurons.iter_mut().zip(self.pending_send_delta.iter_mut()) {
            if n.act >= self.opt_thresh.send {
                let delta = n.act - n.act_sent;
                if delta.abs() > self.opt_thresh.delta {
                    *slot = delta;
                    n.act_sent = n.act;
                } else {
                    *slot = 0.0;
                }
            } else if n.act_sent != 0.0 {
                *slot = -n.act_sent;
                n.act_sent = 0.0;
            } else {
                *slot = 0.0;
            }
        }
    }

    /// `SendGDelta`, deliver half: push every `recv_paths[_]`'s contribution
    /// given a read-only snapshot of all layers' `pending_send_delta`,
    /// indexed by `LayerId`
    pub fn deliver_g_delta(&mut self, send_deltas: &[Vec<f32>]) {
        for p in &mut self.recv_paths {
            p.send_g_delta(&send_deltas[p.send_layer.0]);
        }
    }

    /// `GFromInc`: drain every `recv_paths[_].g_inc` into `GeRaw`/`GiRaw`,
    /// then time-integrate into `Ge`/`Gi`
    pub fn g_from_inc(&mut self) {
        let n = self.neurons.len();
        let mut ge_raw = vec![0.0f32; n];
        let mut gi_raw = vec![0.0f32; n];
        for p in &mut self.recv_paths {
            match p.kind {
                PathKind::Excitatory => p.drain_g_inc(&mut ge_raw),
                PathKind::Inhibitory => p.drain_g_inc(&mut gi_raw),
            }
        }
        for ((neuron, &ger), &gir) in self.neurons.iter_mut().zip(ge_raw.iter()).zip(gi_raw.iter()) {
            neuron.ge_raw = ger;
            neuron.gi_raw = gir;
            neuron.ge += self.act.g_dt * (ger - neuron.ge);
            neuron.gi += self.act.g_dt * (gir - neuron.gi);
        }
    }

    /// `AvgMaxGe`: per-pool average/max of `Ge`
    pub fn avg_max_ge(&mut self) {
        for pool in &mut self.pools {
            pool.inhib.ge = crate::pool::AvgMax::compute(self.neurons[pool.st_index..pool.ed_index].iter().map(|n| n.ge));
        }
    }

    /// `InhibFromGeAct`: FFFB pool inhibition plus optional per-neuron self-inhibition
    pub fn inhib_from_ge_act(&mut self) {
        for pool in &mut self.pools {
            let ge_drive = self.inhib.ge_drive(pool.inhib.ge.avg, pool.inhib.ge.max);
            let ff_i = self.inhib.ff_inhib(ge_drive);
            let fb_i = self.inhib.fb_step(pool.inhib.fb_i, pool.inhib.act.avg);
            pool.inhib.ff_i = ff_i;
            pool.inhib.fb_i = fb_i;
            pool.inhib.gi = self.inhib.pool_gi(ff_i, fb_i);
        }
        for n in &mut self.neurons {
            let pool_gi = self.pools[n.sub_pool].inhib.gi;
            n.gi_self = self.self_inhib.step(n.gi_self, n.act);
            n.gi_syn = pool_gi;
        }
    }

    /// `ActFromG`: hard/soft clamp, noise, `Vm`/`Inet` dynamics, NXX1
    /// activation, optional KNa adaptation, and learning-average updates
    pub fn act_from_g(&mut self) {
        let Layer { neurons, act, rng, .. } = self;
        for n in neurons.iter_mut() {
            if n.flags.has_ext && act.clamp.hard {
                n.act = act.clamp.range.clip(n.ext);
                n.inet = 0.0;
                n.act_del = 0.0;
                n.vm = act.thr + n.act / act.gain;
                n.act_lrn = n.act;
                Self::update_learning_avgs(n, act);
                continue;
            }

            if n.flags.has_ext && !act.clamp.hard {
                let bias = n.ext * act.gbar.e;
                n.ge = if act.clamp.avg {
                    (1.0 - act.clamp.avg_gain) * n.ge + act.clamp.avg_gain * bias
                } else {
                    n.ge + bias
                };
            }

            let noise = match act.noise.ty {
                NoiseType::None => 0.0,
                NoiseType::Fixed => n.noise,
                NoiseType::Gaussian => {
                    let dist = Normal::new(0.0, act.noise.var.max(1e-6)).unwrap();
                    let v: f32 = dist.sample(rng);
                    n.noise = v;
                    v
                }
            };

            if act.k_na.on {
                let k = &act.k_na;
                n.gkna_fast += k.fast_rise * n.act * (1.0 - n.gkna_fast) - k.fast_dt * n.gkna_fast;
                n.gkna_med += k.med_rise * n.act * (1.0 - n.gkna_med) - k.med_dt * n.gkna_med;
                n.gkna_slow += k.slow_rise * n.act * (1.0 - n.gkna_slow) - k.slow_dt * n.gkna_slow;
                n.gk = n.gkna_fast + n.gkna_med + n.gkna_slow;
            }

            let gi_total = n.gi_syn + n.gi_self;
            n.inet = act.gbar.e * n.ge * (act.erev.e - n.vm)
                + act.gbar.l * (act.erev.l - n.vm)
                + act.gbar.i * gi_total * (act.erev.i - n.vm)
                + act.gbar.k * n.gk * (act.erev.k - n.vm)
                + noise;
            n.vm = act.vm_range.clip(n.vm + act.vm_dt * n.inet);

            let ge_thr = (act.gbar.i * gi_total * (act.erev.i - act.thr)
                + act.gbar.l * (act.erev.l - act.thr)
                + act.gbar.k * n.gk * (act.erev.k - act.thr))
                / (act.thr - act.erev.e);
            let subthreshold = n.act < act.vm_act_thr && n.vm <= act.thr;
            let nw_act = if subthreshold {
                act.nxx1(n.vm - act.thr)
            } else {
                act.nxx1(act.gbar.e * n.ge - ge_thr)
            };

            n.act_del = nw_act - n.act;
            n.act = (n.act + act.vm_dt * n.act_del).clamp(0.0, 1.0);

            // nwActLrn recomputes geThr with Gk=0 so KNa adaptation never
            // feeds into the activation used for learning averages.
            let ge_thr_lrn = (act.gbar.i * gi_total * (act.erev.i - act.thr)
                + act.gbar.l * (act.erev.l - act.thr))
                / (act.thr - act.erev.e);
            let nw_act_lrn = if subthreshold {
                act.nxx1(n.vm - act.thr)
            } else {
                act.nxx1(act.gbar.e * n.ge - ge_thr_lrn)
            };
            n.act_lrn = (n.act_lrn + act.vm_dt * (nw_act_lrn - n.act_lrn)).clamp(0.0, 1.0);
            Self::update_learning_avgs(n, act);
        }
    }

    /// Decided open question (`spec.md` §9): skip the running-average
    /// update on the strict `act_lrn == 0.0` guard rather than a small
    /// epsilon, matching the regression artifacts' assumption.
    fn update_learning_avgs(n: &mut Neuron, act: &ActParams) {
        if n.act_lrn == 0.0 {
            return;
        }
        n.avg_ss += act.avg.ss_dt * (n.act_lrn - n.avg_ss);
        n.avg_s += act.avg.s_dt * (n.avg_ss - n.avg_s);
        n.avg_m += act.avg.m_dt * (n.avg_s - n.avg_m);
        n.avg_s_lrn = act.avg.lrn_s * n.avg_s + act.avg.lrn_m * n.avg_m;
    }

    /// `AvgMaxAct`: per-pool average/max of `Act`
    pub fn avg_max_act(&mut self) {
        for pool in &mut self.pools {
            pool.inhib.act = crate::pool::AvgMax::compute(self.neurons[pool.st_index..pool.ed_index].iter().map(|n| n.act));
        }
    }

    /// `QuarterFinal`: snapshot phase activations, minus/plus pool stats,
    /// cosine-diff stats, and the `AvgL`/`AvgLLrn` update — `q` is the
    /// quarter that just finished (0-based, 0..=3)
    pub fn quarter_final(&mut self, q: i32) {
        match q {
            1 => {
                for n in &mut self.neurons {
                    n.act_q1 = n.act;
                }
            }
            2 => {
                for n in &mut self.neurons {
                    n.act_q2 = n.act;
                    n.act_m = n.act;
                }
                for pool in &mut self.pools {
                    pool.act_m = crate::pool::AvgMax::compute(self.neurons[pool.st_index..pool.ed_index].iter().map(|n| n.act));
                }
            }
            3 => {
                for n in &mut self.neurons {
                    n.act_p = n.act;
                    n.act_dif = n.act_p - n.act_m;
                }
                for pool in &mut self.pools {
                    pool.act_p = crate::pool::AvgMax::compute(self.neurons[pool.st_index..pool.ed_index].iter().map(|n| n.act));
                }
                self.compute_cos_diff();
                let learns = self.kind.learns_avg_l();
                for n in &mut self.neurons {
                    n.avg_l = self.avg_l.step(n.avg_l, n.avg_m);
                    n.avg_l_lrn = if learns {
                        const LRN_FACT: f32 = 0.5;
                        LRN_FACT * (n.avg_l - self.avg_l.min) * self.cos_diff.mod_avg_l_lrn
                    } else {
                        0.0
                    };
                }
            }
            _ => {}
        }
    }

    fn compute_cos_diff(&mut self) {
        let mut dot = 0.0f32;
        let mut norm_m = 0.0f32;
        let mut norm_p = 0.0f32;
        for n in &self.neurons {
            dot += n.act_m * n.act_p;
            norm_m += n.act_m * n.act_m;
            norm_p += n.act_p * n.act_p;
        }
        let denom = norm_m.sqrt() * norm_p.sqrt();
        let cos = if denom > 1e-6 { dot / denom } else { 0.0 };
        let learns = self.kind.learns_avg_l();
        self.cos_diff.update(cos, COS_DIFF_TAU, learns);
    }

    /// `Layer.UnitValues(var)` (`spec.md` §6): read out a named per-unit variable
    pub fn unit_values(&self, var: &str) -> Vec<f32> {
        self.neurons
            .iter()
            .map(|n| match var {
                "Act" => n.act,
                "ActM" => n.act_m,
                "ActP" => n.act_p,
                "Vm" => n.vm,
                "Ge" => n.ge,
                "Gi" => n.gi,
                "AvgL" => n.avg_l,
                _ => f32::NAN,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{ConnectivityPattern, OneToOne};
    use crate::path::WtInitParams;
    use crate::params::{LearnParams, WtScaleParams};

    fn build_input_output(n: usize) -> (Layer, Layer) {
        let mut input = Layer::new("Input", vec![n], LayerKind::Input);
        input.build(1);
        let mut output = Layer::new("Output", vec![n], LayerKind::Super);
        let conn = OneToOne.connect(n, n);
        let path = Path::build(
            n,
            n,
            conn,
            PathKind::Excitatory,
            WtInitParams::default(),
            WtScaleParams::default(),
            LearnParams::default(),
            false,
        );
        output.recv_paths.push(path);
        output.build(2);
        output.recv_paths[0].send_layer = LayerId(0);
        (input, output)
    }

    #[test]
    fn test_build_allocates_neurons_and_single_pool() {
        let mut l = Layer::new("L", vec![4], LayerKind::Super);
        l.build(0);
        assert_eq!(l.neurons.len(), 4);
        assert_eq!(l.pools.len(), 1);
        assert_eq!(l.pools[0].len(), 4);
    }

    #[test]
    fn test_build_4d_creates_subpools() {
        let mut l = Layer::new("L", vec![2, 2, 3, 3], LayerKind::Super);
        l.build(0);
        assert_eq!(l.neurons.len(), 36);
        assert_eq!(l.pools.len(), 4);
        assert_eq!(l.pools[0].len(), 9);
        assert_eq!(l.neurons[0].sub_pool, 0);
        assert_eq!(l.neurons[9].sub_pool, 1);
    }

    #[test]
    fn test_apply_ext_hard_clamp_sets_act() {
        let (mut input, _output) = build_input_output(4);
        input.apply_ext(&[1.0, 0.0, 0.8, 0.2]).unwrap();
        input.act_from_g();
        assert!((input.neurons[0].act - 0.95).abs() < 1e-6); // clamp.range.max = 0.95
        assert!((input.neurons[1].act - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_apply_ext_shape_mismatch_errors() {
        let mut l = Layer::new("L", vec![4], LayerKind::Input);
        l.build(0);
        assert!(l.apply_ext(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_send_deltas_respect_opt_thresh() {
        let (_input, mut output) = build_input_output(4);
        output.neurons[0].act = 0.2; // above send threshold
        output.neurons[0].act_sent = 0.0;
        output.neurons[1].act = 0.05; // below send threshold
        output.compute_send_deltas();
        assert!(output.pending_send_delta[0] != 0.0);
        assert_eq!(output.pending_send_delta[1], 0.0);
        assert!((output.neurons[0].act_sent - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_send_deltas_zero_out_when_falling_below_threshold() {
        let (_input, mut output) = build_input_output(4);
        // previously sent, now fallen below OptThresh.Send
        output.neurons[0].act = 0.02;
        output.neurons[0].act_sent = 0.9;
        output.compute_send_deltas();
        assert!((output.pending_send_delta[0] - (-0.9)).abs() < 1e-6);
        assert_eq!(output.neurons[0].act_sent, 0.0);

        // a second cycle at the same sub-threshold level sends nothing more
        output.compute_send_deltas();
        assert_eq!(output.pending_send_delta[0], 0.0);
    }

    #[test]
    fn test_g_from_inc_integrates_conductance() {
        let (_input, mut output) = build_input_output(2);
        output.recv_paths[0].g_inc[0] = 1.0;
        output.g_from_inc();
        assert!(output.neurons[0].ge > 0.0);
        assert_eq!(output.neurons[0].ge_raw, 1.0);
        // g_inc drained to zero
        assert_eq!(output.recv_paths[0].g_inc[0], 0.0);
    }

    #[test]
    fn test_subthreshold_unit_uses_vm_driven_branch() {
        // act starts at 0 (< VmActThr) and ge=0 leaves Vm decaying toward the
        // leak reversal, well below Thr, so nw_act should come out at 0 via
        // the Vm branch rather than a stale conductance-branch evaluation.
        let mut l = Layer::new("L", vec![2], LayerKind::Super);
        l.build(0);
        l.act_from_g();
        for n in &l.neurons {
            assert!((0.0..=1.0).contains(&n.act));
            assert_eq!(n.act, 0.0);
        }
    }

    #[test]
    fn test_hard_clamp_sets_vm_from_thr_and_gain() {
        let (mut input, _output) = build_input_output(1);
        input.apply_ext(&[0.5]).unwrap();
        input.act_from_g();
        let expected_vm = input.act.thr + input.neurons[0].act / input.act.gain;
        assert!((input.neurons[0].vm - expected_vm).abs() < 1e-6);
        assert_eq!(input.neurons[0].inet, 0.0);
        assert_eq!(input.neurons[0].act_del, 0.0);
    }

    #[test]
    fn test_act_bounds_after_act_from_g() {
        let mut l = Layer::new("L", vec![4], LayerKind::Super);
        l.build(0);
        for n in &mut l.neurons {
            n.ge = 5.0; // strong drive
        }
        l.act_from_g();
        for n in &l.neurons {
            assert!((0.0..=1.0).contains(&n.act));
        }
    }

    #[test]
    fn test_quarter_final_snapshots() {
        let mut l = Layer::new("L", vec![2], LayerKind::Super);
        l.build(0);
        l.neurons[0].act = 0.3;
        l.quarter_final(1);
        assert_eq!(l.neurons[0].act_q1, 0.3);
        l.neurons[0].act = 0.5;
        l.quarter_final(2);
        assert_eq!(l.neurons[0].act_q2, 0.5);
        assert_eq!(l.neurons[0].act_m, 0.5);
        l.neurons[0].act = 0.7;
        l.quarter_final(3);
        assert_eq!(l.neurons[0].act_p, 0.7);
        assert!((l.neurons[0].act_dif - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_cos_diff_identical_patterns_is_one() {
        let mut l = Layer::new("L", vec![4], LayerKind::Super);
        l.build(0);
        for n in &mut l.neurons {
            n.act_m = 0.5;
            n.act_p = 0.5;
        }
        l.compute_cos_diff();
        assert!((l.cos_diff.cos - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_mod_avg_l_lrn_zero_for_input_layer() {
        let mut l = Layer::new("In", vec![2], LayerKind::Input);
        l.build(0);
        for n in &mut l.neurons {
            n.act_m = 0.3;
            n.act_p = 0.6;
        }
        l.quarter_final(3);
        for n in &l.neurons {
            assert_eq!(n.avg_l_lrn, 0.0);
        }
    }
}
