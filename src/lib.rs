//! Cycle-by-cycle activation dynamics, FFFB inhibition, and XCAL learning
//! for rate-coded Leabra neural networks.
//!
//! A network is a graph of [`layer::Layer`]s connected by [`path::Path`]s.
//! Each [`path::Path`] is owned by the layer it delivers conductance into
//! (its receiver), so the per-cycle pipeline that [`network::Network`]
//! drives never needs two workers to touch the same memory; see the
//! `layer` module docs for why. A typical run:
//!
//! ```no_run
//! use leabra_core::connectivity::Full;
//! use leabra_core::layer::LayerKind;
//! use leabra_core::network::Network;
//! use leabra_core::params::{LearnParams, WtScaleParams};
//! use leabra_core::path::{PathKind, WtInitParams};
//!
//! let mut net = Network::new().with_seed(1);
//! let input = net.add_layer("Input", vec![5], LayerKind::Input);
//! let hidden = net.add_layer("Hidden", vec![10], LayerKind::Super);
//! net.connect_layers(
//!     input,
//!     hidden,
//!     Full,
//!     PathKind::Excitatory,
//!     WtInitParams::default(),
//!     WtScaleParams::default(),
//!     LearnParams::default(),
//!     false,
//! );
//! net.build().unwrap();
//! net.init_weights(42);
//!
//! net.apply_ext("Input", &[1.0, 0.0, 1.0, 0.0, 1.0]).unwrap();
//! net.run_trial(true, |_net| {});
//! ```

pub mod connectivity;
pub mod context;
pub mod error;
pub mod layer;
pub mod network;
pub mod neuron;
pub mod nxx1;
pub mod params;
pub mod path;
pub mod pool;
pub mod sigmoid;
pub mod synapse;
pub mod weights;
pub mod worker;

pub use error::{LeabraError, Result};
pub use network::Network;

/// Crate version, re-exported for callers that want to stamp it into logs
/// or serialized parameter sheets
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
