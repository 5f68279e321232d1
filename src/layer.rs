use rand::Rng;

use crate::{Activation, Error, Result, buffer};

/// Dense layer used by the native backend.
#[derive(Debug)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    activation: Activation,
    steepness: f32,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// Layer with weights and biases drawn uniformly from `[-range, range]`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        steepness: f32,
        range: f32,
        rng: &mut R,
    ) -> Result<Self> {
        let len = buffer::checked_len(out_dim, in_dim, "layer weights")?;
        let mut weights = buffer::zeroed(len, "layer weights")?;
        let mut biases = buffer::zeroed(out_dim, "layer biases")?;
        for w in weights.iter_mut().chain(biases.iter_mut()) {
            *w = rng.random_range(-range..=range);
        }
        Self::from_parts(in_dim, out_dim, activation, steepness, weights, biases)
    }

    /// Build a layer from explicit parameters.
    ///
    /// Validates shapes and that every parameter is finite.
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        steepness: f32,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidTopology(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        activation.validate_steepness(steepness)?;
        let expected = buffer::checked_len(out_dim, in_dim, "layer weights")?;
        if weights.len() != expected {
            return Err(Error::dimension("layer weights", weights.len(), expected));
        }
        if biases.len() != out_dim {
            return Err(Error::dimension("layer biases", biases.len(), out_dim));
        }
        if weights.iter().chain(&biases).any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter(
                "layer parameters must be finite".to_owned(),
            ));
        }

        Ok(Self {
            in_dim,
            out_dim,
            activation,
            steepness,
            weights,
            biases,
        })
    }

    /// Deep copy with fallible allocation.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            in_dim: self.in_dim,
            out_dim: self.out_dim,
            activation: self.activation,
            steepness: self.steepness,
            weights: buffer::copied(&self.weights, "layer weights")?,
            biases: buffer::copied(&self.biases, "layer biases")?,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn steepness(&self) -> f32 {
        self.steepness
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Consume the layer, returning `(weights, biases)`.
    #[cfg_attr(not(feature = "ndarray"), allow(dead_code))]
    pub(crate) fn into_parts(self) -> (Vec<f32>, Vec<f32>) {
        (self.weights, self.biases)
    }

    #[cfg(test)]
    pub(crate) fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    /// Forward pass for a single sample.
    ///
    /// Computes `outputs = activation(W * inputs + b)`.
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `outputs.len() == self.out_dim`
    #[inline]
    pub fn forward(&self, inputs: &[f32], outputs: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        for (o, out) in outputs.iter_mut().enumerate() {
            let row = &self.weights[o * self.in_dim..(o + 1) * self.in_dim];
            let mut sum = self.biases[o];
            for (&w, &x) in row.iter().zip(inputs) {
                sum = w.mul_add(x, sum);
            }
            *out = self.activation.forward(sum, self.steepness);
        }
    }

    /// Backward pass for a single sample.
    ///
    /// Overwrite semantics: `d_inputs`, `d_weights` and `d_biases` are overwritten.
    ///
    /// Inputs:
    /// - `inputs`: the same inputs passed to `forward`
    /// - `outputs`: the post-activation outputs produced by `forward`
    /// - `d_outputs`: upstream gradient dL/d(outputs)
    #[inline]
    pub fn backward(
        &self,
        inputs: &[f32],
        outputs: &[f32],
        d_outputs: &[f32],
        d_inputs: &mut [f32],
        d_weights: &mut [f32],
        d_biases: &mut [f32],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);
        debug_assert_eq!(d_outputs.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        d_inputs.fill(0.0);

        for o in 0..self.out_dim {
            let d_z = d_outputs[o] * self.activation.grad_from_output(outputs[o], self.steepness);
            d_biases[o] = d_z;

            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                let w = self.weights[row + i];
                d_weights[row + i] = d_z * inputs[i];
                d_inputs[i] = w.mul_add(d_z, d_inputs[i]);
            }
        }
    }

    /// `param -= lr * d_param`.
    #[inline]
    pub fn sgd_step(&mut self, d_weights: &[f32], d_biases: &[f32], lr: f32) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.biases.len());

        for (w, &g) in self.weights.iter_mut().zip(d_weights) {
            *w = (-lr).mul_add(g, *w);
        }
        for (b, &g) in self.biases.iter_mut().zip(d_biases) {
            *b = (-lr).mul_add(g, *b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn from_parts_validates_shapes_and_values() {
        let ok = Layer::from_parts(2, 1, Activation::Linear, 0.5, vec![1.0, 2.0], vec![0.0]);
        assert!(ok.is_ok());

        let short = Layer::from_parts(2, 1, Activation::Linear, 0.5, vec![1.0], vec![0.0]);
        assert!(matches!(short, Err(Error::DimensionMismatch { .. })));

        let nan = Layer::from_parts(2, 1, Activation::Linear, 0.5, vec![1.0, f32::NAN], vec![0.0]);
        assert!(matches!(nan, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn random_init_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let layer =
            Layer::new_with_rng(4, 3, Activation::SigmoidSymmetric, 0.5, 0.1, &mut rng).unwrap();
        assert!(
            layer
                .weights()
                .iter()
                .chain(layer.biases())
                .all(|w| (-0.1..=0.1).contains(w))
        );
    }

    #[test]
    fn linear_forward_is_affine() {
        let layer = Layer::from_parts(
            2,
            2,
            Activation::Linear,
            0.5,
            vec![1.0, 2.0, -1.0, 0.5],
            vec![0.5, -0.5],
        )
        .unwrap();
        let mut out = [0.0_f32; 2];
        layer.forward(&[1.0, 1.0], &mut out);
        assert_eq!(out, [3.5, -1.0]);
    }

    #[test]
    fn sgd_step_moves_against_gradient() {
        let mut layer =
            Layer::from_parts(1, 1, Activation::Linear, 0.5, vec![1.0], vec![2.0]).unwrap();
        layer.sgd_step(&[3.0], &[4.0], 0.1);
        assert!((layer.weights()[0] - 0.7).abs() < 1e-6);
        assert!((layer.biases()[0] - 1.6).abs() < 1e-6);
    }

    #[test]
    fn clone_is_deep() {
        let mut layer =
            Layer::from_parts(1, 1, Activation::Linear, 0.5, vec![1.0], vec![2.0]).unwrap();
        let copy = layer.try_clone().unwrap();
        layer.weights_mut()[0] = 5.0;
        assert_eq!(copy.weights()[0], 1.0);
    }
}
