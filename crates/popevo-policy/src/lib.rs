//! Policies evolved by the population engine.
//!
//! A [`Policy`] maps an observation vector to an action and exposes its
//! parameters as one flat `f32` vector. Evolution never looks inside a
//! policy beyond that vector and its allowed [`ParamRange`].
//!
//! - [`policy`]: the [`Policy`] trait and action selection
//! - [`mlp`]: a multilayer perceptron implementation
//! - [`weights`]: initialisation, mutation and clipping of parameter vectors

pub use self::{
    mlp::Mlp,
    policy::{ActionSelection, Policy},
    weights::ParamRange,
};

pub mod mlp;
pub mod policy;
pub mod weights;
