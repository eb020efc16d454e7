//! In-memory external weight-value surface
//!
//! `spec.md` §6 names a weight-file load/save path as an out-of-scope
//! collaborator (format, compression, and versioning live elsewhere); what
//! this crate owns is the in-memory surface that collaborator would drive:
//! a name-addressed tree of per-path synapse values a caller can both read
//! (`SynValue`-style introspection) and bulk-write (`SetWts`) without
//! reaching into `network::Network` internals directly.

use std::collections::HashMap;

use crate::error::{LeabraError, Result};
use crate::network::Network;

/// One path's weights, addressed by `(send_idx, recv_idx)` synapse pairs
#[derive(Debug, Clone, Default)]
pub struct PathWeights {
    /// `(send_idx, recv_idx) -> LWt`
    pub lwt: HashMap<(usize, usize), f32>,
}

/// A name-addressed snapshot of every path's weights in a network,
/// independent of any on-disk representation
#[derive(Debug, Clone, Default)]
pub struct WeightTree {
    /// `recv_layer_name -> path_index -> weights`
    paths: HashMap<String, Vec<PathWeights>>,
}

impl WeightTree {
    /// An empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// `SetWts`: snapshot every path's current `LWt` values out of a built network
    pub fn capture(net: &Network) -> Self {
        let mut paths = HashMap::new();
        for layer in &net.layers {
            let mut per_layer = Vec::with_capacity(layer.recv_paths.len());
            for path in &layer.recv_paths {
                let mut lwt = HashMap::new();
                for si in 0..path.s_con_n.len() {
                    let st = path.s_con_index_st[si] as usize;
                    let n = path.s_con_n[si] as usize;
                    for k in st..st + n {
                        let ri = path.s_con_index[k] as usize;
                        lwt.insert((si, ri), path.syns[k].lwt);
                    }
                }
                per_layer.push(PathWeights { lwt });
            }
            paths.insert(layer.name.clone(), per_layer);
        }
        Self { paths }
    }

    /// `SetWts`: push this tree's `LWt` values back into a network's paths,
    /// recomputing `Wt` from the sigmoid for every synapse touched
    pub fn apply(&self, net: &mut Network) -> Result<()> {
        for (layer_name, per_layer) in &self.paths {
            let layer_id = net.layer_id(layer_name)?;
            let layer = &mut net.layers[layer_id.0];
            if per_layer.len() != layer.recv_paths.len() {
                return Err(LeabraError::invalid_config(format!(
                    "weight tree has {} paths for layer {:?}, network has {}",
                    per_layer.len(),
                    layer_name,
                    layer.recv_paths.len()
                )));
            }
            for (path, weights) in layer.recv_paths.iter_mut().zip(per_layer.iter()) {
                for (&(si, ri), &lwt) in &weights.lwt {
                    path.set_syn_value("LWt", si, ri, lwt);
                }
            }
        }
        Ok(())
    }

    /// Read a single synapse's `LWt` out of the tree, if present
    pub fn get(&self, layer_name: &str, path_index: usize, send_idx: usize, recv_idx: usize) -> Option<f32> {
        self.paths.get(layer_name)?.get(path_index)?.lwt.get(&(send_idx, recv_idx)).copied()
    }

    /// Directly set a single synapse's `LWt` in the tree (does not touch any network)
    pub fn set(&mut self, layer_name: impl Into<String>, path_index: usize, send_idx: usize, recv_idx: usize, lwt: f32) {
        let per_layer = self.paths.entry(layer_name.into()).or_default();
        if per_layer.len() <= path_index {
            per_layer.resize(path_index + 1, PathWeights::default());
        }
        per_layer[path_index].lwt.insert((send_idx, recv_idx), lwt);
    }
}
