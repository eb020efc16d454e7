//! Path: a sender-owned synapse bundle with receiver-side index tables
//!
//! Mirrors `spec.md` §3/§4.3/§4.6. A `Path` is owned by its *receiving*
//! layer (see `layer::Layer::recv_paths`) so that the per-cycle pipeline
//! stages that touch it (`GFromInc`, `InhibFromGeAct`, `DWt`, `WtFromDWt`)
//! are entirely local to that layer's worker; only `SendGDelta` needs a
//! read-only glance at the *sending* layer's per-neuron scratch buffer,
//! supplied by the caller as a plain slice (see `network::Network::cycle`).

use crate::connectivity::GeneratedConnectivity;
use crate::params::{LearnParams, WtScaleParams};
use crate::synapse::Synapse;

/// Index of a layer within `network::Network::layers`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub usize);

/// Identifies a path by the receiving layer that owns it plus its index
/// within that layer's `recv_paths`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathId {
    /// Receiving layer
    pub recv: LayerId,
    /// Index into `recv_paths`
    pub index: usize,
}

/// Whether a path's synapses excite or inhibit their receivers
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Contributes to `GeRaw`
    Excitatory,
    /// Contributes to `GiRaw`
    Inhibitory,
}

/// Per-sender initial-weight sampling (uniform on `[mean - var, mean + var]`)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WtInitParams {
    /// Distribution mean
    pub mean: f32,
    /// Half-width of the uniform range around `mean`
    pub var: f32,
}

impl Default for WtInitParams {
    fn default() -> Self {
        Self { mean: 0.5, var: 0.25 }
    }
}

/// Sender-receiver connection bundle
#[derive(Debug, Clone)]
pub struct Path {
    /// Sending layer
    pub send_layer: LayerId,
    /// Excitatory vs. inhibitory
    pub kind: PathKind,
    /// Request weight symmetry with the reciprocal path at `Build`/`InitWtSym` time
    pub sym: bool,

    /// Dense, sender-major synapse array
    pub syns: Vec<Synapse>,
    /// Per-sender connection count
    pub s_con_n: Vec<u32>,
    /// Per-sender start offset into `s_con_index`/`syns`
    pub s_con_index_st: Vec<u32>,
    /// Receiver-unit index for the k-th sender-major connection
    pub s_con_index: Vec<u32>,
    /// Per-receiver connection count
    pub r_con_n: Vec<u32>,
    /// Per-receiver start offset into `r_con_index`/`r_syn_index`
    pub r_con_index_st: Vec<u32>,
    /// Sender-unit index for the j-th receiver-major connection
    pub r_con_index: Vec<u32>,
    /// Offset into sender-major `syns` for the j-th receiver-major connection
    pub r_syn_index: Vec<u32>,

    /// Per-receiver-unit conductance delta accumulator, zeroed by `g_from_inc`
    pub g_inc: Vec<f32>,

    /// Initial-weight sampling parameters
    pub wt_init: WtInitParams,
    /// Excitatory scaling feeding `GScale`
    pub wt_scale: WtScaleParams,
    /// Learning parameters
    pub learn: LearnParams,
    /// Computed per-trial conductance scale (`spec.md` §4.3)
    pub g_scale: f32,
    /// Cached per-receiver `WtBal` increase gain, refreshed every `WtBalParams::interval` trials
    pub wb_inc: Vec<f32>,
    /// Cached per-receiver `WtBal` decrease gain, refreshed every `WtBalParams::interval` trials
    pub wb_dec: Vec<f32>,
}

impl Path {
    /// Build a path's index tables from a generated connectivity. Synapses
    /// are left at their zero value; call [`Path::init_weights`] afterward.
    pub fn build(
        send_n: usize,
        recv_n: usize,
        conn: GeneratedConnectivity,
        kind: PathKind,
        wt_init: WtInitParams,
        wt_scale: WtScaleParams,
        learn: LearnParams,
        sym: bool,
    ) -> Self {
        let mut bits = conn.conn_bits;
        bits.sort_by_key(|&(si, ri)| (si, ri));
        let n_con = bits.len();

        let mut s_con_n = vec![0u32; send_n];
        let mut s_con_index = vec![0u32; n_con];
        for (k, &(si, ri)) in bits.iter().enumerate() {
            s_con_n[si] += 1;
            s_con_index[k] = ri as u32;
        }
        let mut s_con_index_st = vec![0u32; send_n];
        let mut acc = 0u32;
        for si in 0..send_n {
            s_con_index_st[si] = acc;
            acc += s_con_n[si];
        }

        let mut recv_order: Vec<usize> = (0..n_con).collect();
        recv_order.sort_by_key(|&k| (bits[k].1, bits[k].0));
        let mut r_con_n = vec![0u32; recv_n];
        let mut r_con_index = vec![0u32; n_con];
        let mut r_syn_index = vec![0u32; n_con];
        for (j, &k) in recv_order.iter().enumerate() {
            let (si, ri) = bits[k];
            r_con_n[ri] += 1;
            r_con_index[j] = si as u32;
            r_syn_index[j] = k as u32;
        }
        let mut r_con_index_st = vec![0u32; recv_n];
        let mut acc = 0u32;
        for ri in 0..recv_n {
            r_con_index_st[ri] = acc;
            acc += r_con_n[ri];
        }

        Self {
            send_layer: LayerId(usize::MAX), // patched by Network::build
            kind,
            sym,
            syns: vec![Synapse::from_lwt(0.5, 1.0, &learn.wt_sig); n_con],
            s_con_n,
            s_con_index_st,
            s_con_index,
            r_con_n,
            r_con_index_st,
            r_con_index,
            r_syn_index,
            g_inc: vec![0.0; recv_n],
            wt_init,
            wt_scale,
            learn,
            g_scale: 1.0,
            wb_inc: vec![1.0; recv_n],
            wb_dec: vec![1.0; recv_n],
        }
    }

    /// Number of synapses; invariant `sum(s_con_n) == sum(r_con_n) == len(syns)`
    pub fn n_con(&self) -> usize {
        self.syns.len()
    }

    /// Sample `LWt` from `WtInit`, derive `Wt`, zero `DWt`/`Norm`/`Moment`
    pub fn init_weights(&mut self, rng: &mut impl rand::Rng) {
        let lo = self.wt_init.mean - self.wt_init.var;
        let hi = self.wt_init.mean + self.wt_init.var;
        for syn in &mut self.syns {
            let lwt = if hi > lo { rng.gen_range(lo..hi) } else { self.wt_init.mean }.clamp(0.0, 1.0);
            *syn = Synapse::from_lwt(lwt, syn.scale.max(1.0), &self.learn.wt_sig);
        }
    }

    /// `SLayActScale`: `1 / expectedActiveRecv`
    fn s_lay_act_scale(savg: f32, ncon: f32) -> f32 {
        const SEM_EXTRA: f32 = 2.0;
        let expected = ((savg * ncon).round() + SEM_EXTRA).min(ncon).max(1.0);
        1.0 / expected
    }

    /// Recompute `GScale` from the sending layer's `ActPAvgEff` and this
    /// path's `Rel` normalized against sibling excitatory paths at the
    /// receiver (`rel_norm`, computed by the caller across all of a
    /// layer's `recv_paths`)
    pub fn compute_g_scale(&mut self, send_act_p_avg_eff: f32, rel_norm: f32) {
        let recv_n = self.g_inc.len().max(1);
        let ncon = self.n_con() as f32 / recv_n as f32;
        let scale = Self::s_lay_act_scale(send_act_p_avg_eff, ncon);
        self.g_scale = self.wt_scale.abs * rel_norm * scale;
    }

    /// Accumulate `GScale · Wt · delta` for every sender with a nonzero
    /// entry in `send_deltas` (already thresholded by the caller) into
    /// this path's `g_inc`.
    pub fn send_g_delta(&mut self, send_deltas: &[f32]) {
        for (si, &delta) in send_deltas.iter().enumerate() {
            if delta == 0.0 {
                continue;
            }
            let st = self.s_con_index_st[si] as usize;
            let n = self.s_con_n[si] as usize;
            for k in st..st + n {
                let ri = self.s_con_index[k] as usize;
                self.g_inc[ri] += self.g_scale * self.syns[k].wt * delta;
            }
        }
    }

    /// Drain `g_inc` into the caller's raw conductance accumulator (`GeRaw`
    /// or `GiRaw` depending on `kind`), zeroing it for the next cycle.
    pub fn drain_g_inc(&mut self, raw: &mut [f32]) {
        for (ri, g) in self.g_inc.iter_mut().enumerate() {
            raw[ri] += *g;
            *g = 0.0;
        }
    }

    /// Look up a synapse index by `(send_idx, recv_idx)`, scanning this
    /// sender's connection range
    pub fn find_syn(&self, send_idx: usize, recv_idx: usize) -> Option<usize> {
        let st = *self.s_con_index_st.get(send_idx)? as usize;
        let n = *self.s_con_n.get(send_idx)? as usize;
        (st..st + n).find(|&k| self.s_con_index[k] as usize == recv_idx)
    }

    /// `Path.SynValue(var, sendIdx, recvIdx)` (`spec.md` §6)
    pub fn syn_value(&self, var: &str, send_idx: usize, recv_idx: usize) -> Option<f32> {
        let k = self.find_syn(send_idx, recv_idx)?;
        let syn = &self.syns[k];
        match var {
            "Wt" => Some(syn.wt),
            "LWt" => Some(syn.lwt),
            "DWt" => Some(syn.dwt),
            "Norm" => Some(syn.norm),
            "Moment" => Some(syn.moment),
            "Scale" => Some(syn.scale),
            _ => None,
        }
    }

    /// `Path.SetSynValue(var, si, ri, v)` (`spec.md` §6)
    pub fn set_syn_value(&mut self, var: &str, send_idx: usize, recv_idx: usize, v: f32) -> bool {
        let Some(k) = self.find_syn(send_idx, recv_idx) else { return false };
        match var {
            "Wt" => self.syns[k].set_wt(v, &self.learn.wt_sig),
            "LWt" => self.syns[k].set_lwt(v, &self.learn.wt_sig),
            "DWt" => self.syns[k].dwt = v,
            "Norm" => self.syns[k].norm = v,
            "Moment" => self.syns[k].moment = v,
            "Scale" => {
                self.syns[k].scale = v;
                self.syns[k].wt_from_lwt(&self.learn.wt_sig);
            }
            _ => return false,
        }
        true
    }

    /// `DWt`: one trial's XCAL weight-change accumulation (`spec.md` §4.6).
    /// `recv_neurons` supplies this path's own receiving layer's learning
    /// state; `send_avg_s_lrn`/`send_avg_m` are a read-only snapshot of the
    /// sending layer's, taken by the caller before any layer mutates its
    /// own state this trial.
    pub fn dwt(&mut self, send_avg_s_lrn: &[f32], send_avg_m: &[f32], recv_neurons: &[crate::neuron::Neuron]) {
        if !self.learn.learn {
            return;
        }
        for si in 0..self.s_con_n.len() {
            let st = self.s_con_index_st[si] as usize;
            let n = self.s_con_n[si] as usize;
            let send_s = send_avg_s_lrn[si];
            let send_m = send_avg_m[si];
            for k in st..st + n {
                let ri = self.s_con_index[k] as usize;
                let recv = &recv_neurons[ri];
                let srs = send_s * recv.avg_s_lrn;
                let srm = send_m * recv.avg_m;
                let err = self.learn.xcal.xcal(srs, srm);
                let bcm = self.learn.xcal.xcal(srs, recv.avg_l) * recv.avg_l_lrn;
                let mut dwt = self.learn.xcal.m_lrn * err + bcm;

                let syn = &mut self.syns[k];
                let norm_factor = if self.learn.norm.on {
                    self.learn.norm.normalize(&mut syn.norm, dwt)
                } else {
                    1.0
                };
                if self.learn.momentum.on {
                    dwt = self.learn.momentum.apply(&mut syn.moment, dwt);
                }
                syn.dwt += self.learn.lrate * norm_factor * dwt;
            }
        }

        if self.learn.norm.on {
            for si in 0..self.s_con_n.len() {
                let st = self.s_con_index_st[si] as usize;
                let n = self.s_con_n[si] as usize;
                let max_norm = self.syns[st..st + n].iter().map(|s| s.norm).fold(0.0f32, f32::max);
                for syn in &mut self.syns[st..st + n] {
                    syn.norm = max_norm;
                }
            }
        }
    }

    /// `WtBal`: recompute the cached `wb_inc`/`wb_dec` from the average
    /// above-threshold `LWt` per receiver unit. Called periodically, every
    /// `WtBalParams::interval` trials (`network::Network::wt_from_dwt`
    /// decides when); in between, the last computed gains carry over.
    pub fn recompute_wt_bal(&mut self) {
        if !self.learn.wt_bal.on {
            return;
        }
        let recv_n = self.r_con_n.len();
        for ri in 0..recv_n {
            let st = self.r_con_index_st[ri] as usize;
            let n = self.r_con_n[ri] as usize;
            let mut sum = 0.0f32;
            let mut cnt = 0u32;
            for j in st..st + n {
                let k = self.r_syn_index[j] as usize;
                let lwt = self.syns[k].lwt;
                if lwt > self.learn.wt_bal.avg_thr {
                    sum += lwt;
                    cnt += 1;
                }
            }
            let avg = if cnt > 0 { sum / cnt as f32 } else { 0.0 };
            let (inc, dec) = self.learn.wt_bal.factors(avg);
            self.wb_inc[ri] = inc;
            self.wb_dec[ri] = dec;
        }
    }

    /// `WtFromDWt`: commit accumulated `DWt` into `LWt`/`Wt`, applying
    /// soft/hard bounding and the cached `WtBal` gain for each synapse's receiver
    pub fn wt_from_dwt(&mut self) {
        let soft_bound = self.learn.wt_sig.soft_bound;
        let wt_sig = self.learn.wt_sig;
        for si in 0..self.s_con_n.len() {
            let st = self.s_con_index_st[si] as usize;
            let n = self.s_con_n[si] as usize;
            for k in st..st + n {
                let syn = &mut self.syns[k];
                if syn.dwt == 0.0 {
                    continue;
                }
                let ri = self.s_con_index[k] as usize;
                let (inc, dec) = (self.wb_inc[ri], self.wb_dec[ri]);
                if soft_bound {
                    if syn.dwt > 0.0 {
                        syn.dwt *= inc * (1.0 - syn.lwt);
                    } else {
                        syn.dwt *= dec * syn.lwt;
                    }
                } else if syn.dwt > 0.0 {
                    syn.dwt *= inc;
                } else {
                    syn.dwt *= dec;
                }
                syn.lwt = (syn.lwt + syn.dwt).clamp(0.0, 1.0);
                syn.wt_from_lwt(&wt_sig);
                syn.dwt = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{ConnectivityPattern, Full, OneToOne};

    fn build_one_to_one(n: usize) -> Path {
        let conn = OneToOne.connect(n, n);
        Path::build(
            n,
            n,
            conn,
            PathKind::Excitatory,
            WtInitParams::default(),
            WtScaleParams::default(),
            LearnParams::default(),
            false,
        )
    }

    #[test]
    fn test_connection_count_invariant() {
        let conn = Full.connect(3, 4);
        let n_con = conn.conn_bits.len();
        let path = Path::build(
            3,
            4,
            conn,
            PathKind::Excitatory,
            WtInitParams::default(),
            WtScaleParams::default(),
            LearnParams::default(),
            false,
        );
        assert_eq!(path.n_con(), n_con);
        assert_eq!(path.s_con_n.iter().sum::<u32>() as usize, n_con);
        assert_eq!(path.r_con_n.iter().sum::<u32>() as usize, n_con);
    }

    #[test]
    fn test_find_syn_one_to_one() {
        let path = build_one_to_one(4);
        assert_eq!(path.find_syn(1, 1), Some(1));
        assert_eq!(path.find_syn(1, 2), None);
    }

    #[test]
    fn test_syn_value_getter_setter_s1() {
        let mut path = build_one_to_one(4);
        // default LWt = 0.5 (seeded by `Synapse::from_lwt(0.5, ..)` before InitWeights)
        assert!((path.syn_value("Wt", 1, 1).unwrap() - 0.5).abs() < 1e-6);
        assert!((path.syn_value("LWt", 1, 1).unwrap() - 0.5).abs() < 1e-6);

        assert!(path.set_syn_value("Wt", 1, 1, 0.15));
        assert!((path.syn_value("Wt", 1, 1).unwrap() - 0.15).abs() < 1e-6);
        assert!((path.syn_value("LWt", 1, 1).unwrap() - 0.42822415).abs() < 1e-4);
    }

    #[test]
    fn test_no_learn_idempotence() {
        let mut path = build_one_to_one(4);
        path.learn.learn = false;
        let before: Vec<Synapse> = path.syns.clone();
        let send_avg = vec![0.8; 4];
        let recv_neurons = vec![crate::neuron::Neuron::default(); 4];
        for _ in 0..5 {
            path.dwt(&send_avg, &send_avg, &recv_neurons);
            path.recompute_wt_bal();
            path.wt_from_dwt();
        }
        for (a, b) in before.iter().zip(path.syns.iter()) {
            assert!((a.wt - b.wt).abs() < 1e-12);
            assert!((a.lwt - b.lwt).abs() < 1e-12);
        }
    }

    #[test]
    fn test_soft_bound_monotonic_shrink_toward_one() {
        let mut path = build_one_to_one(1);
        path.learn.wt_sig.soft_bound = true;
        let mut prev_applied = f32::MAX;
        path.syns[0].lwt = 0.5;
        for _ in 0..5 {
            path.syns[0].dwt = 0.1; // positive raw dwt each round
            let lwt_before = path.syns[0].lwt;
            path.wt_from_dwt();
            let applied = path.syns[0].lwt - lwt_before;
            if lwt_before > 0.01 {
                assert!(applied <= prev_applied + 1e-6, "applied dwt should shrink as lwt -> 1");
            }
            prev_applied = applied;
        }
    }

    #[test]
    fn test_lwt_bounds_after_wt_from_dwt() {
        let mut path = build_one_to_one(1);
        path.syns[0].lwt = 0.99;
        path.syns[0].dwt = 10.0; // huge positive delta
        path.recompute_wt_bal();
        path.wt_from_dwt();
        assert!((0.0..=1.0).contains(&path.syns[0].lwt));
    }
}
