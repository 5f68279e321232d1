//! Backend built on the `ndarray` crate.
//!
//! Layer parameters are `Array2`/`Array1` values and the per-sample products
//! go through `ndarray::linalg`. Initialization draws from the same stream as
//! the native backend, so two networks created with the same seed start from
//! identical parameters.
//!
//! Only incremental training is supported.

use std::any::Any;

use ndarray::linalg::{general_mat_mul, general_mat_vec_mul};
use ndarray::{
    Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, ShapeError, Zip, aview_mut1,
    aview1,
};
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, BackendKind, NetworkState, TrainingState};
use crate::serde_model::{self, SerializedLayer};
use crate::{
    Activation, Error, Layer, NetworkConfig, Result, Topology, TrainingAlgorithm, TrainingData,
    buffer,
};

fn shape_error(e: ShapeError) -> Error {
    Error::InvalidSize(format!("ndarray shape mismatch: {e}"))
}

#[derive(Debug, Clone, Copy)]
pub struct NdarrayBackend;

impl Backend for NdarrayBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ndarray
    }

    fn create_network(
        &self,
        topology: Topology,
        config: &NetworkConfig,
    ) -> Result<Box<dyn NetworkState>> {
        if config.algorithm != TrainingAlgorithm::Incremental {
            return Err(Error::InvalidParameter(format!(
                "ndarray backend only supports incremental training, got {:?}",
                config.algorithm
            )));
        }

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
        Ok(Box::new(NdarrayNetwork::new(
            DenseArrays::from_layer(hidden)?,
            DenseArrays::from_layer(output)?,
        )?))
    }

    fn create_training(
        &self,
        num_samples: usize,
        num_input: usize,
        num_output: usize,
    ) -> Result<Box<dyn TrainingState>> {
        Ok(Box::new(NdarrayTraining::zeroed(
            num_samples,
            num_input,
            num_output,
        )?))
    }

    fn network_from_json(&self, json: &str) -> Result<(Box<dyn NetworkState>, f32)> {
        let (learning_rate, saved) =
            serde_model::from_json_str::<SerializedNdarray>(BackendKind::Ndarray, json)?;
        Ok((Box::new(NdarrayNetwork::try_from(saved)?), learning_rate))
    }
}

/// Training storage viewed as `(num_samples, width)` matrices.
#[derive(Debug)]
pub struct NdarrayTraining {
    num_samples: usize,
    num_input: usize,
    num_output: usize,
    inputs: Vec<f32>,
    outputs: Vec<f32>,
}

impl NdarrayTraining {
    fn zeroed(num_samples: usize, num_input: usize, num_output: usize) -> Result<Self> {
        let inputs = buffer::zeroed(
            buffer::checked_len(num_samples, num_input, "training inputs")?,
            "training inputs",
        )?;
        let outputs = buffer::zeroed(
            buffer::checked_len(num_samples, num_output, "training outputs")?,
            "training outputs",
        )?;
        Ok(Self {
            num_samples,
            num_input,
            num_output,
            inputs,
            outputs,
        })
    }

    /// `(inputs, outputs)` as row-per-sample matrices.
    pub fn views(&self) -> Result<(ArrayView2<'_, f32>, ArrayView2<'_, f32>)> {
        let inputs = ArrayView2::from_shape((self.num_samples, self.num_input), &self.inputs)
            .map_err(shape_error)?;
        let outputs = ArrayView2::from_shape((self.num_samples, self.num_output), &self.outputs)
            .map_err(shape_error)?;
        Ok((inputs, outputs))
    }
}

impl TrainingState for NdarrayTraining {
    fn kind(&self) -> BackendKind {
        BackendKind::Ndarray
    }

    fn inputs(&self) -> &[f32] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut [f32] {
        &mut self.inputs
    }

    fn outputs(&self) -> &[f32] {
        &self.outputs
    }

    fn outputs_mut(&mut self) -> &mut [f32] {
        &mut self.outputs
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One dense layer: `weights` has shape `(out_dim, in_dim)`.
#[derive(Debug)]
struct DenseArrays {
    weights: Array2<f32>,
    biases: Array1<f32>,
    activation: Activation,
    steepness: f32,
}

impl DenseArrays {
    fn from_layer(layer: Layer) -> Result<Self> {
        let (in_dim, out_dim) = (layer.in_dim(), layer.out_dim());
        let (activation, steepness) = (layer.activation(), layer.steepness());
        let (weights, biases) = layer.into_parts();
        Ok(Self {
            weights: Array2::from_shape_vec((out_dim, in_dim), weights).map_err(shape_error)?,
            biases: Array1::from(biases),
            activation,
            steepness,
        })
    }

    fn in_dim(&self) -> usize {
        self.weights.ncols()
    }

    fn out_dim(&self) -> usize {
        self.weights.nrows()
    }

    fn try_clone(&self) -> Result<Self> {
        let weights = buffer::collected(
            self.weights.iter().copied(),
            self.weights.len(),
            "layer weights",
        )?;
        let biases = buffer::collected(
            self.biases.iter().copied(),
            self.biases.len(),
            "layer biases",
        )?;
        Ok(Self {
            weights: Array2::from_shape_vec(self.weights.raw_dim(), weights)
                .map_err(shape_error)?,
            biases: Array1::from(biases),
            activation: self.activation,
            steepness: self.steepness,
        })
    }

    /// `out = activation(W * input + b)`.
    fn forward(&self, input: ArrayView1<'_, f32>, mut out: ArrayViewMut1<'_, f32>) {
        out.assign(&self.biases);
        general_mat_vec_mul(1.0, &self.weights, &input, 1.0, &mut out);
        let (activation, steepness) = (self.activation, self.steepness);
        out.mapv_inplace(|z| activation.forward(z, steepness));
    }

    /// `W -= lr * delta input^T`, `b -= lr * delta`.
    fn sgd_step(&mut self, delta: &Array1<f32>, input: ArrayView1<'_, f32>, lr: f32) {
        let column = delta.view().insert_axis(Axis(1));
        let row = input.insert_axis(Axis(0));
        general_mat_mul(-lr, &column, &row, 1.0, &mut self.weights);
        self.biases.scaled_add(-lr, delta);
    }
}

impl From<&DenseArrays> for SerializedLayer {
    fn from(layer: &DenseArrays) -> Self {
        Self {
            in_dim: layer.in_dim(),
            out_dim: layer.out_dim(),
            activation: layer.activation,
            steepness: layer.steepness,
            weights: layer.weights.iter().copied().collect(),
            biases: layer.biases.to_vec(),
        }
    }
}

#[derive(Debug)]
pub struct NdarrayNetwork {
    hidden: DenseArrays,
    output: DenseArrays,

    hidden_values: Array1<f32>,
    // Plain buffer so `run` can hand out a slice.
    output_values: Vec<f32>,

    d_hidden: Array1<f32>,
    d_output: Array1<f32>,
}

impl NdarrayNetwork {
    fn new(hidden: DenseArrays, output: DenseArrays) -> Result<Self> {
        if output.in_dim() != hidden.out_dim() {
            return Err(Error::dimension(
                "output layer in_dim",
                output.in_dim(),
                hidden.out_dim(),
            ));
        }
        Ok(Self {
            hidden_values: Array1::from(buffer::zeroed(hidden.out_dim(), "hidden activations")?),
            output_values: buffer::zeroed(output.out_dim(), "output activations")?,
            d_hidden: Array1::from(buffer::zeroed(hidden.out_dim(), "hidden deltas")?),
            d_output: Array1::from(buffer::zeroed(output.out_dim(), "output deltas")?),
            hidden,
            output,
        })
    }

    fn forward(&mut self, input: ArrayView1<'_, f32>) {
        self.hidden.forward(input, self.hidden_values.view_mut());
        self.output.forward(
            self.hidden_values.view(),
            aview_mut1(&mut self.output_values),
        );
    }

    /// Forward, backprop and update for one sample. Returns its squared error.
    fn train_sample(
        &mut self,
        input: ArrayView1<'_, f32>,
        target: ArrayView1<'_, f32>,
        learning_rate: f32,
    ) -> f32 {
        self.forward(input);

        let mut sum_sq = 0.0_f32;
        let (activation, steepness) = (self.output.activation, self.output.steepness);
        Zip::from(&mut self.d_output)
            .and(aview1(&self.output_values))
            .and(target)
            .for_each(|d, &y, &t| {
                let err = y - t;
                sum_sq += err * err;
                *d = err * activation.grad_from_output(y, steepness);
            });

        // Hidden deltas must see the output weights before they are updated.
        general_mat_vec_mul(
            1.0,
            &self.output.weights.t(),
            &self.d_output,
            0.0,
            &mut self.d_hidden,
        );
        let (activation, steepness) = (self.hidden.activation, self.hidden.steepness);
        Zip::from(&mut self.d_hidden)
            .and(&self.hidden_values)
            .for_each(|d, &h| *d *= activation.grad_from_output(h, steepness));

        self.output
            .sgd_step(&self.d_output, self.hidden_values.view(), learning_rate);
        self.hidden.sgd_step(&self.d_hidden, input, learning_rate);
        sum_sq
    }
}

impl NetworkState for NdarrayNetwork {
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
            .downcast_ref::<NdarrayTraining>()
            .ok_or(Error::BackendMismatch {
                expected: BackendKind::Ndarray,
                found: data.kind(),
            })?;
        let (inputs, targets) = train.views()?;

        let mut sum_sq = 0.0_f32;
        for (input, target) in inputs.outer_iter().zip(targets.outer_iter()) {
            sum_sq += self.train_sample(input, target, learning_rate);
        }
        Ok(sum_sq / targets.len() as f32)
    }

    fn run(&mut self, input: &[f32]) -> &[f32] {
        debug_assert_eq!(input.len(), self.hidden.in_dim());
        self.forward(aview1(input));
        &self.output_values
    }

    fn to_json(&self, learning_rate: f32) -> Result<String> {
        serde_model::to_json_string(
            BackendKind::Ndarray,
            learning_rate,
            &SerializedNdarray::from(self),
        )
    }

    fn try_clone(&self) -> Result<Box<dyn NetworkState>> {
        Ok(Box::new(Self::new(
            self.hidden.try_clone()?,
            self.output.try_clone()?,
        )?))
    }
}

/// Ndarray payload of a saved network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNdarray {
    pub hidden: SerializedLayer,
    pub output: SerializedLayer,
}

impl From<&NdarrayNetwork> for SerializedNdarray {
    fn from(net: &NdarrayNetwork) -> Self {
        Self {
            hidden: SerializedLayer::from(&net.hidden),
            output: SerializedLayer::from(&net.output),
        }
    }
}

impl TryFrom<SerializedNdarray> for NdarrayNetwork {
    type Error = Error;

    fn try_from(value: SerializedNdarray) -> std::result::Result<Self, Self::Error> {
        if value.output.in_dim != value.hidden.out_dim {
            return Err(Error::InvalidData(format!(
                "output layer in_dim {} does not match hidden out_dim {}",
                value.output.in_dim, value.hidden.out_dim
            )));
        }
        let hidden = DenseArrays::from_layer(value.hidden.into_layer("hidden")?)?;
        let output = DenseArrays::from_layer(value.output.into_layer("output")?)?;
        NdarrayNetwork::new(hidden, output)
    }
}
