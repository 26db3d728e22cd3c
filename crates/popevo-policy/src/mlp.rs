//! Small fully connected network with flat parameter storage.
//!
//! Parameters are laid out layer by layer; each layer stores its
//! `inputs * outputs` weights (input-major) followed by its `outputs` biases.
//! Hidden layers use `tanh`, the output layer a softmax, so the network maps an
//! observation to action probabilities.

use rand::Rng;

use crate::{
    policy::{ActionSelection, Policy},
    weights::{self, ParamRange},
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum MlpError {
    #[display("network needs at least an input and an output layer, got {_0} layers")]
    TooFewLayers(#[error(not(source))] usize),
    #[display("layer {_0} has zero width")]
    EmptyLayer(#[error(not(source))] usize),
    #[display("invalid parameter range [{}, {}]", _0.min, _0.max)]
    InvalidRange(#[error(not(source))] ParamRange),
    #[display("expected {expected} parameters, got {actual}")]
    ParamCountMismatch { expected: usize, actual: usize },
    #[display("parameter {index} ({value}) lies outside the allowed range")]
    ParamOutOfRange { index: usize, value: f32 },
}

/// Multilayer perceptron policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    layers: Vec<usize>,
    params: Vec<f32>,
    range: ParamRange,
    selection: ActionSelection,
}

impl Mlp {
    /// Number of parameters needed for the given layer widths.
    ///
    /// ```
    /// use popevo_policy::mlp::Mlp;
    ///
    /// // 6 inputs -> 8 hidden -> 4 actions
    /// assert_eq!(Mlp::param_count(&[6, 8, 4]), 6 * 8 + 8 + 8 * 4 + 4);
    /// ```
    #[must_use]
    pub fn param_count(layers: &[usize]) -> usize {
        layers.windows(2).map(|w| w[0] * w[1] + w[1]).sum()
    }

    /// Creates a network with parameters drawn uniformly from `range`.
    pub fn random<R>(
        layers: Vec<usize>,
        range: ParamRange,
        selection: ActionSelection,
        rng: &mut R,
    ) -> Result<Self, MlpError>
    where
        R: Rng + ?Sized,
    {
        validate_layout(&layers, range)?;
        let params = weights::random(rng, range, Self::param_count(&layers));
        Ok(Self {
            layers,
            params,
            range,
            selection,
        })
    }

    /// Creates a network from explicit parameters.
    pub fn from_params(
        layers: Vec<usize>,
        params: Vec<f32>,
        range: ParamRange,
        selection: ActionSelection,
    ) -> Result<Self, MlpError> {
        validate_layout(&layers, range)?;
        let expected = Self::param_count(&layers);
        if params.len() != expected {
            return Err(MlpError::ParamCountMismatch {
                expected,
                actual: params.len(),
            });
        }
        if let Some((index, &value)) = params.iter().enumerate().find(|(_, v)| !range.contains(**v))
        {
            return Err(MlpError::ParamOutOfRange { index, value });
        }
        Ok(Self {
            layers,
            params,
            range,
            selection,
        })
    }

    #[must_use]
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    /// Raw output-layer activations before the softmax.
    #[must_use]
    pub fn logits(&self, observation: &[f32]) -> Vec<f32> {
        debug_assert_eq!(observation.len(), self.input_len());
        let mut activations = observation.to_vec();
        let mut offset = 0;
        let last = self.layers.len() - 2;
        for (l, w) in self.layers.windows(2).enumerate() {
            let (inputs, outputs) = (w[0], w[1]);
            let weights = &self.params[offset..offset + inputs * outputs];
            let biases = &self.params[offset + inputs * outputs..offset + inputs * outputs + outputs];
            let mut next = biases.to_vec();
            for (i, a) in activations.iter().enumerate() {
                let row = &weights[i * outputs..(i + 1) * outputs];
                for (n, w) in next.iter_mut().zip(row) {
                    *n += a * w;
                }
            }
            if l < last {
                for n in &mut next {
                    *n = n.tanh();
                }
            }
            activations = next;
            offset += inputs * outputs + outputs;
        }
        activations
    }
}

impl Policy for Mlp {
    fn input_len(&self) -> usize {
        self.layers[0]
    }

    fn output_len(&self) -> usize {
        self.layers[self.layers.len() - 1]
    }

    fn action_probabilities(&self, observation: &[f32]) -> Vec<f32> {
        softmax(&self.logits(observation))
    }

    fn action_selection(&self) -> ActionSelection {
        self.selection
    }

    fn params(&self) -> &[f32] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [f32] {
        &mut self.params
    }

    fn param_range(&self) -> ParamRange {
        self.range
    }
}

fn validate_layout(layers: &[usize], range: ParamRange) -> Result<(), MlpError> {
    if layers.len() < 2 {
        return Err(MlpError::TooFewLayers(layers.len()));
    }
    if let Some(i) = layers.iter().position(|&n| n == 0) {
        return Err(MlpError::EmptyLayer(i));
    }
    if !range.is_valid() {
        return Err(MlpError::InvalidRange(range));
    }
    Ok(())
}

/// Numerically stable softmax.
#[must_use]
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.iter().map(|l| (l - max).exp()).collect::<Vec<_>>();
    let sum = exps.iter().sum::<f32>();
    exps.into_iter().map(|e| e / sum).collect()
}
