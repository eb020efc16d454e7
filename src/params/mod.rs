//! Parameter blocks: `Defaults` + `Update` contracts
//!
//! Every parameter block implements [`Default`] (the `Defaults()` contract
//! of `spec.md` §3) and, where it owns a derived/cached value (the NXX1
//! table, integration rates), [`ParamUpdate::update`] to recompute that
//! cache after fields are edited by a parameter sheet (`spec.md` §6).

pub mod act;
pub mod inhib;
pub mod learn;

/// Recompute any cached/derived fields after direct field edits.
///
/// Mirrors the teacher's and the source engine's `Update()` method: plain
/// field assignment (as a parameter-sheet apply would do) never by itself
/// keeps derived state in sync, so every apply is followed by a call here.
pub trait ParamUpdate {
    /// Recompute derived fields from the current primary fields
    fn update(&mut self);
}

pub use act::{ActParams, ClampParams, GBarParams, ErevParams, NoiseParams, NoiseType, VmRange};
pub use inhib::{FFFBParams, SelfInhibParams};
pub use learn::{
    AvgLParams, LearnParams, MomentumParams, NormParams, WtBalParams, WtScaleParams, XCalParams,
};
