//! Network: layer registry plus the per-cycle/quarter/trial driver
//!
//! Config (`add_layer`/`connect_layers`) only records intent; `build()`
//! allocates every array. The cycle-level stages dispatch one closure per
//! layer across the configured worker count (`cfg(feature = "parallel")`
//! uses `rayon`; otherwise a plain sequential loop) — see the module docs
//! on `layer::Layer` for why each stage is safe to parallelize that way.

use std::collections::HashMap;

use log::{debug, info};

use crate::connectivity::ConnectivityPattern;
use crate::context::{Context, RunMode};
use crate::error::{LeabraError, Result};
use crate::layer::{Layer, LayerKind};
use crate::params::{LearnParams, WtScaleParams};
use crate::path::{LayerId, Path, PathId, PathKind, WtInitParams};

struct PendingPath {
    send: LayerId,
    recv: LayerId,
    pattern: Box<dyn ConnectivityPattern + Send + Sync>,
    kind: PathKind,
    wt_init: WtInitParams,
    wt_scale: WtScaleParams,
    learn: LearnParams,
    sym: bool,
}

/// A full Leabra network: layers, their connecting paths, and the clock driving them
pub struct Network {
    /// All layers, indexed by `LayerId`
    pub layers: Vec<Layer>,
    name_to_id: HashMap<String, LayerId>,
    pending_paths: Vec<PendingPath>,
    built: bool,
    /// Current simulation clock
    pub ctx: Context,
    wt_bal_ctr: u32,
    /// Trials between `WtBal` gain recomputation
    pub wt_bal_interval: u32,
    seed: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "parallel")]
fn for_each_layer_mut(layers: &mut [Layer], f: impl Fn(&mut Layer) + Sync + Send) {
    use rayon::prelude::*;
    layers.par_iter_mut().for_each(f);
}

#[cfg(not(feature = "parallel"))]
fn for_each_layer_mut(layers: &mut [Layer], f: impl Fn(&mut Layer)) {
    layers.iter_mut().for_each(f);
}

impl Network {
    /// An empty, unbuilt network
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            name_to_id: HashMap::new(),
            pending_paths: Vec::new(),
            built: false,
            ctx: Context::default(),
            wt_bal_ctr: 0,
            wt_bal_interval: 10,
            seed: 0,
        }
    }

    /// Seed used to derive each layer's private RNG at `build()`
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `AddLayer`: register a layer's shape/kind (`spec.md` §6)
    pub fn add_layer(&mut self, name: impl Into<String>, shape: Vec<usize>, kind: LayerKind) -> LayerId {
        let name = name.into();
        let id = LayerId(self.layers.len());
        self.name_to_id.insert(name.clone(), id);
        self.layers.push(Layer::new(name, shape, kind));
        id
    }

    /// Resolve a layer name to its id
    pub fn layer_id(&self, name: &str) -> Result<LayerId> {
        self.name_to_id.get(name).copied().ok_or_else(|| LeabraError::layer_not_found(name))
    }

    /// `ConnectLayers`: register a path between two layers (`spec.md` §6).
    /// Returns the `PathId` it will have once `build()` runs.
    pub fn connect_layers(
        &mut self,
        send: LayerId,
        recv: LayerId,
        pattern: impl ConnectivityPattern + Send + Sync + 'static,
        kind: PathKind,
        wt_init: WtInitParams,
        wt_scale: WtScaleParams,
        learn: LearnParams,
        sym: bool,
    ) -> PathId {
        let index = self.pending_paths.iter().filter(|p| p.recv.0 == recv.0).count();
        self.pending_paths.push(PendingPath {
            send,
            recv,
            pattern: Box::new(pattern),
            kind,
            wt_init,
            wt_scale,
            learn,
            sym,
        });
        PathId { recv, index }
    }

    /// `Build`: allocate every layer's `Neurons`/`Pools` and run each
    /// pending path's connectivity pattern to fill its index tables
    pub fn build(&mut self) -> Result<()> {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.build(self.seed.wrapping_add(i as u64));
        }
        for pending in self.pending_paths.drain(..) {
            let send_n = self.layers[pending.send.0].n_units();
            let recv_n = self.layers[pending.recv.0].n_units();
            let conn = pending.pattern.connect(send_n, recv_n);
            let mut path = Path::build(send_n, recv_n, conn, pending.kind, pending.wt_init, pending.wt_scale, pending.learn, pending.sym);
            path.send_layer = pending.send;
            self.layers[pending.recv.0].recv_paths.push(path);
        }
        self.built = true;
        info!("network built: {} layers, {} total paths", self.layers.len(), self.layers.iter().map(|l| l.recv_paths.len()).sum::<usize>());
        Ok(())
    }

    /// Sample every path's initial weights (`spec.md` §6 `InitWeights`)
    pub fn init_weights(&mut self, seed: u64) {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        for layer in &mut self.layers {
            for path in &mut layer.recv_paths {
                path.init_weights(&mut rng);
            }
        }
    }

    /// `InitWtSym`: copy weights from the reciprocal path for every path
    /// that requested symmetry, erroring if no reciprocal exists
    pub fn init_wt_sym(&mut self) -> Result<()> {
        for ri in 0..self.layers.len() {
            for pi in 0..self.layers[ri].recv_paths.len() {
                let (send_id, wants_sym) = {
                    let p = &self.layers[ri].recv_paths[pi];
                    (p.send_layer, p.sym)
                };
                if !wants_sym {
                    continue;
                }
                let recip_index = self.layers[send_id.0]
                    .recv_paths
                    .iter()
                    .position(|p| p.send_layer.0 == ri && p.sym);
                let Some(recip_index) = recip_index else {
                    return Err(LeabraError::MissingReciprocalPath {
                        send: self.layers[ri].name.clone(),
                        recv: self.layers[send_id.0].name.clone(),
                    });
                };

                let send_n = self.layers[ri].recv_paths[pi].s_con_n.len();
                let recv_n = self.layers[ri].recv_paths[pi].g_inc.len();
                for si in 0..send_n {
                    for ri_unit in 0..recv_n {
                        let Some(v) = self.layers[send_id.0].recv_paths[recip_index].syn_value("LWt", ri_unit, si) else {
                            continue;
                        };
                        self.layers[ri].recv_paths[pi].set_syn_value("LWt", si, ri_unit, v);
                    }
                }
            }
        }
        Ok(())
    }

    /// `ApplyExt`: push external input into a named layer
    pub fn apply_ext(&mut self, layer_name: &str, values: &[f32]) -> Result<()> {
        let id = self.layer_id(layer_name)?;
        self.layers[id.0].apply_ext(values)
    }

    /// `AlphaCycInit`: reset the clock, decay every layer's dynamic state,
    /// and recompute `GScale` from the refreshed `ActPAvgEff` values
    pub fn alpha_cyc_init(&mut self, update_act_avg: bool) {
        debug_assert!(self.built, "alpha_cyc_init called before build()");
        self.ctx.alpha_cyc_init();
        let update = update_act_avg && matches!(self.ctx.mode, RunMode::Train);
        for_each_layer_mut(&mut self.layers, |l| l.alpha_cyc_init(update));

        let eff: Vec<f32> = self.layers.iter().map(|l| l.pools.first().map(|p| p.act_avg.act_p_avg_eff).unwrap_or(0.15)).collect();
        for_each_layer_mut(&mut self.layers, |l| l.recompute_g_scale(&eff));
    }

    /// One cycle of the `spec.md` §4.3/§4.4 pipeline:
    /// `SendGDelta -> GFromInc -> AvgMaxGe -> InhibFromGeAct -> ActFromG -> AvgMaxAct`
    pub fn cycle(&mut self) {
        for_each_layer_mut(&mut self.layers, |l| l.compute_send_deltas());

        let send_deltas: Vec<Vec<f32>> = self.layers.iter().map(|l| l.pending_send_delta.clone()).collect();
        for_each_layer_mut(&mut self.layers, |l| l.deliver_g_delta(&send_deltas));

        for_each_layer_mut(&mut self.layers, |l| l.g_from_inc());
        for_each_layer_mut(&mut self.layers, |l| l.avg_max_ge());
        for_each_layer_mut(&mut self.layers, |l| l.inhib_from_ge_act());
        for_each_layer_mut(&mut self.layers, |l| l.act_from_g());
        for_each_layer_mut(&mut self.layers, |l| l.avg_max_act());

        self.ctx.cycle_inc();
        debug!("cycle {} (quarter {}) complete", self.ctx.trial_cycle, self.ctx.quarter);
    }

    /// `QuarterFinal`: snapshot phase activations/pool stats, compute
    /// cosine-diff stats, update `AvgL`, and advance to the next quarter
    pub fn quarter_final(&mut self) {
        let q = self.ctx.quarter;
        for_each_layer_mut(&mut self.layers, move |l| l.quarter_final(q));
        self.ctx.quarter_inc();
    }

    /// `DWt`: accumulate one trial's XCAL weight changes on every path
    pub fn dwt(&mut self) {
        let send_avg_s_lrn: Vec<Vec<f32>> = self.layers.iter().map(|l| l.neurons.iter().map(|n| n.avg_s_lrn).collect()).collect();
        let send_avg_m: Vec<Vec<f32>> = self.layers.iter().map(|l| l.neurons.iter().map(|n| n.avg_m).collect()).collect();

        for_each_layer_mut(&mut self.layers, |l| {
            let Layer { neurons, recv_paths, .. } = l;
            for p in recv_paths.iter_mut() {
                let s_lrn = &send_avg_s_lrn[p.send_layer.0];
                let s_m = &send_avg_m[p.send_layer.0];
                p.dwt(s_lrn, s_m, neurons);
            }
        });
    }

    /// `WtFromDWt`: commit accumulated `DWt`, refreshing each path's
    /// `WtBal` gains only on `wt_bal_interval`-trial boundaries
    pub fn wt_from_dwt(&mut self) {
        self.wt_bal_ctr += 1;
        let due = self.wt_bal_ctr % self.wt_bal_interval.max(1) == 0;
        for_each_layer_mut(&mut self.layers, move |l| {
            for p in &mut l.recv_paths {
                if due {
                    p.recompute_wt_bal();
                }
                p.wt_from_dwt();
            }
        });
    }

    /// Drive one full alpha cycle (4 quarters x 25 cycles), calling
    /// `minus_phase_end` right after the minus phase's last cycle so the
    /// caller can apply plus-phase targets before it continues
    pub fn run_trial(&mut self, update_act_avg: bool, mut on_minus_phase_end: impl FnMut(&mut Network)) {
        self.alpha_cyc_init(update_act_avg);
        for _ in 0..crate::context::QUARTERS_PER_ALPHA {
            for _ in 0..crate::context::CYCLES_PER_QUARTER {
                self.cycle();
            }
            let was_minus_end = self.ctx.is_minus_phase_end();
            self.quarter_final();
            if was_minus_end {
                on_minus_phase_end(self);
            }
        }
        if matches!(self.ctx.mode, RunMode::Train) {
            self.dwt();
            self.wt_from_dwt();
        }
    }
}
