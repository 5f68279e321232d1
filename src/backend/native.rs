//! Built-in backend.
//!
//! Parameters and activations live in flat `Vec<f32>` buffers allocated once
//! per network, so the per-sample training step does not allocate.
//!
//! Supports both [`TrainingAlgorithm`]s: incremental updates after every
//! sample, or one averaged update per epoch in batch mode.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, BackendKind, NetworkState, TrainingState};
use crate::serde_model::{self, SerializedLayer};
use crate::{
    Error, Layer, NetworkConfig, Result, Topology, TrainingAlgorithm, TrainingData, buffer, loss,
};

#[derive(Debug, Clone, Copy)]
pub struct NativeBackend;

impl Backend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn create_network(
        &self,
        topology: Topology,
        config: &NetworkConfig,
    ) -> Result<Box<dyn NetworkState>> {
        let mut rng = config.rng();
        let hidden = Layer::new_with_rng(
            topology.num_input,
            topology.num_hidden,
            config.hidden_activation,
            config.steepness,
            config.init_weight_range,
            &mut rng,
        )?;
        let output = Layer::new_with_rng(
            topology.num_hidden,
            topology.num_output,
            config.output_activation,
            config.steepness,
            config.init_weight_range,
            &mut rng,
        )?;
        Ok(Box::new(NativeNetwork::from_layers(
            hidden,
            output,
            config.algorithm,
        )?))
    }

    fn create_training(
        &self,
        num_samples: usize,
        num_input: usize,
        num_output: usize,
    ) -> Result<Box<dyn TrainingState>> {
        Ok(Box::new(NativeTraining::zeroed(
            num_samples,
            num_input,
            num_output,
        )?))
    }

    fn network_from_json(&self, json: &str) -> Result<(Box<dyn NetworkState>, f32)> {
        let (learning_rate, saved) =
            serde_model::from_json_str::<SerializedNative>(BackendKind::Native, json)?;
        Ok((Box::new(NativeNetwork::try_from(saved)?), learning_rate))
    }
}

/// Contiguous training storage: `inputs` is `(len, input_dim)` and
/// `targets` is `(len, target_dim)`, both row-major.
#[derive(Debug)]
pub struct NativeTraining {
    inputs: Vec<f32>,
    targets: Vec<f32>,
    input_dim: usize,
    target_dim: usize,
}

impl NativeTraining {
    fn zeroed(len: usize, input_dim: usize, target_dim: usize) -> Result<Self> {
        let inputs = buffer::zeroed(
            buffer::checked_len(len, input_dim, "training inputs")?,
            "training inputs",
        )?;
        let targets = buffer::zeroed(
            buffer::checked_len(len, target_dim, "training outputs")?,
            "training outputs",
        )?;
        Ok(Self {
            inputs,
            targets,
            input_dim,
            target_dim,
        })
    }

    /// Number of samples.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.inputs.len() / self.input_dim
    }

    /// Returns the `idx`-th input row.
    ///
    /// Panics if `idx >= len`.
    #[inline]
    pub(crate) fn input(&self, idx: usize) -> &[f32] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    /// Returns the `idx`-th target row.
    ///
    /// Panics if `idx >= len`.
    #[inline]
    pub(crate) fn target(&self, idx: usize) -> &[f32] {
        let start = idx * self.target_dim;
        &self.targets[start..start + self.target_dim]
    }
}

impl TrainingState for NativeTraining {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn inputs(&self) -> &[f32] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut [f32] {
        &mut self.inputs
    }

    fn outputs(&self) -> &[f32] {
        &self.targets
    }

    fn outputs_mut(&mut self) -> &mut [f32] {
        &mut self.targets
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Parameter gradients for both layers (overwrite semantics).
#[derive(Debug)]
struct Gradients {
    d_hidden_weights: Vec<f32>,
    d_hidden_biases: Vec<f32>,
    d_output_weights: Vec<f32>,
    d_output_biases: Vec<f32>,
}

impl Gradients {
    fn new(hidden: &Layer, output: &Layer) -> Result<Self> {
        Ok(Self {
            d_hidden_weights: buffer::zeroed(hidden.weights().len(), "hidden gradients")?,
            d_hidden_biases: buffer::zeroed(hidden.out_dim(), "hidden gradients")?,
            d_output_weights: buffer::zeroed(output.weights().len(), "output gradients")?,
            d_output_biases: buffer::zeroed(output.out_dim(), "output gradients")?,
        })
    }

    fn fill(&mut self, value: f32) {
        for buf in self.buffers_mut() {
            buf.fill(value);
        }
    }

    fn accumulate(&mut self, other: &Gradients) {
        for (acc, g) in self.buffers_mut().into_iter().zip(other.buffers()) {
            for (a, &v) in acc.iter_mut().zip(g) {
                *a += v;
            }
        }
    }

    fn scale(&mut self, factor: f32) {
        for buf in self.buffers_mut() {
            for v in buf.iter_mut() {
                *v *= factor;
            }
        }
    }

    fn buffers(&self) -> [&[f32]; 4] {
        [
            &self.d_hidden_weights,
            &self.d_hidden_biases,
            &self.d_output_weights,
            &self.d_output_biases,
        ]
    }

    fn buffers_mut(&mut self) -> [&mut Vec<f32>; 4] {
        [
            &mut self.d_hidden_weights,
            &mut self.d_hidden_biases,
            &mut self.d_output_weights,
            &mut self.d_output_biases,
        ]
    }
}

/// Three-layer network: input -> hidden -> output.
#[derive(Debug)]
pub struct NativeNetwork {
    hidden: Layer,
    output: Layer,
    algorithm: TrainingAlgorithm,

    // Forward scratch. `output_values` doubles as the `run` result buffer.
    hidden_values: Vec<f32>,
    output_values: Vec<f32>,

    // Backprop scratch.
    d_output_values: Vec<f32>,
    d_hidden_values: Vec<f32>,
    d_input: Vec<f32>,
    grads: Gradients,
    // Epoch accumulator, only allocated in batch mode.
    batch: Option<Gradients>,
}

impl NativeNetwork {
    pub fn from_layers(hidden: Layer, output: Layer, algorithm: TrainingAlgorithm) -> Result<Self> {
        if output.in_dim() != hidden.out_dim() {
            return Err(Error::dimension(
                "output layer in_dim",
                output.in_dim(),
                hidden.out_dim(),
            ));
        }

        let grads = Gradients::new(&hidden, &output)?;
        let batch = match algorithm {
            TrainingAlgorithm::Incremental => None,
            TrainingAlgorithm::Batch => Some(Gradients::new(&hidden, &output)?),
        };

        Ok(Self {
            hidden_values: buffer::zeroed(hidden.out_dim(), "hidden activations")?,
            output_values: buffer::zeroed(output.out_dim(), "output activations")?,
            d_output_values: buffer::zeroed(output.out_dim(), "output deltas")?,
            d_hidden_values: buffer::zeroed(hidden.out_dim(), "hidden deltas")?,
            d_input: buffer::zeroed(hidden.in_dim(), "input deltas")?,
            grads,
            batch,
            hidden,
            output,
            algorithm,
        })
    }

    fn forward(&mut self, input: &[f32]) {
        self.hidden.forward(input, &mut self.hidden_values);
        self.output
            .forward(&self.hidden_values, &mut self.output_values);
    }

    /// Backprop for the sample last passed to `forward`.
    ///
    /// Expects `d_output_values` to hold dL/d(output). Overwrites `grads`.
    fn backward(&mut self, input: &[f32]) {
        self.output.backward(
            &self.hidden_values,
            &self.output_values,
            &self.d_output_values,
            &mut self.d_hidden_values,
            &mut self.grads.d_output_weights,
            &mut self.grads.d_output_biases,
        );
        self.hidden.backward(
            input,
            &self.hidden_values,
            &self.d_hidden_values,
            &mut self.d_input,
            &mut self.grads.d_hidden_weights,
            &mut self.grads.d_hidden_biases,
        );
    }
}

fn apply(hidden: &mut Layer, output: &mut Layer, grads: &Gradients, lr: f32) {
    hidden.sgd_step(&grads.d_hidden_weights, &grads.d_hidden_biases, lr);
    output.sgd_step(&grads.d_output_weights, &grads.d_output_biases, lr);
}

impl NetworkState for NativeNetwork {
    fn topology(&self) -> Topology {
        Topology {
            num_input: self.hidden.in_dim(),
            num_hidden: self.hidden.out_dim(),
            num_output: self.output.out_dim(),
        }
    }

    fn train_epoch(&mut self, data: &TrainingData, learning_rate: f32) -> Result<f32> {
        let train = data
            .state()
            .as_any()
            .downcast_ref::<NativeTraining>()
            .ok_or(Error::BackendMismatch {
                expected: BackendKind::Native,
                found: data.kind(),
            })?;

        if let Some(batch) = self.batch.as_mut() {
            batch.fill(0.0);
        }

        let mut sum_sq = 0.0_f32;
        for idx in 0..train.len() {
            let input = train.input(idx);
            let target = train.target(idx);

            self.forward(input);
            sum_sq += loss::squared_error_backward(
                &self.output_values,
                target,
                &mut self.d_output_values,
            );
            self.backward(input);

            match self.batch.as_mut() {
                None => apply(&mut self.hidden, &mut self.output, &self.grads, learning_rate),
                Some(batch) => batch.accumulate(&self.grads),
            }
        }

        if let Some(batch) = self.batch.as_mut() {
            batch.scale(1.0 / train.len() as f32);
            apply(&mut self.hidden, &mut self.output, batch, learning_rate);
        }

        Ok(sum_sq / (train.len() * self.output.out_dim()) as f32)
    }

    fn run(&mut self, input: &[f32]) -> &[f32] {
        debug_assert_eq!(input.len(), self.hidden.in_dim());
        self.forward(input);
        &self.output_values
    }

    fn to_json(&self, learning_rate: f32) -> Result<String> {
        serde_model::to_json_string(
            BackendKind::Native,
            learning_rate,
            &SerializedNative::from(self),
        )
    }

    fn try_clone(&self) -> Result<Box<dyn NetworkState>> {
        Ok(Box::new(Self::from_layers(
            self.hidden.try_clone()?,
            self.output.try_clone()?,
            self.algorithm,
        )?))
    }
}

/// Native payload of a saved network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNative {
    pub algorithm: TrainingAlgorithm,
    pub hidden: SerializedLayer,
    pub output: SerializedLayer,
}

impl From<&NativeNetwork> for SerializedNative {
    fn from(net: &NativeNetwork) -> Self {
        Self {
            algorithm: net.algorithm,
            hidden: SerializedLayer::from(&net.hidden),
            output: SerializedLayer::from(&net.output),
        }
    }
}

impl TryFrom<SerializedNative> for NativeNetwork {
    type Error = Error;

    fn try_from(value: SerializedNative) -> std::result::Result<Self, Self::Error> {
        if value.output.in_dim != value.hidden.out_dim {
            return Err(Error::InvalidData(format!(
                "output layer in_dim {} does not match hidden out_dim {}",
                value.output.in_dim, value.hidden.out_dim
            )));
        }
        let hidden = value.hidden.into_layer("hidden")?;
        let output = value.output.into_layer("output")?;
        NativeNetwork::from_layers(hidden, output, value.algorithm)
    }
}
