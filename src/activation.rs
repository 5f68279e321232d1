//! Activation functions.
//!
//! A layer computes a pre-activation value `z = W x + b` and then applies an
//! activation element-wise: `y = activation(z)`.
//!
//! Sigmoid-shaped activations are scaled by a steepness `s` (FANN convention,
//! default `0.5`): `y = f(s * z)`. `Linear` ignores the steepness.
//!
//! Backends cache the *post-activation* outputs `y` of each layer, so the
//! derivative is expressed in terms of `y`.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Element-wise activation function.
pub enum Activation {
    /// Identity: `y = z`.
    Linear,
    /// Logistic sigmoid with range `(0, 1)`.
    Sigmoid,
    /// Symmetric sigmoid (`tanh`) with range `(-1, 1)`.
    SigmoidSymmetric,
}

impl Activation {
    /// Validate a steepness value for use with this activation.
    pub fn validate_steepness(self, steepness: f32) -> Result<()> {
        if !(steepness.is_finite() && steepness > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "activation steepness must be finite and > 0, got {steepness}"
            )));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn forward(self, z: f32, steepness: f32) -> f32 {
        match self {
            Activation::Linear => z,
            Activation::Sigmoid => sigmoid(steepness * z),
            Activation::SigmoidSymmetric => (steepness * z).tanh(),
        }
    }

    /// Derivative of the activation with respect to `z`, from the cached output `y`.
    #[inline]
    pub(crate) fn grad_from_output(self, y: f32, steepness: f32) -> f32 {
        match self {
            Activation::Linear => 1.0,
            Activation::Sigmoid => steepness * y * (1.0 - y),
            Activation::SigmoidSymmetric => steepness * (1.0 - y * y),
        }
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steepness_must_be_finite_and_positive() {
        let act = Activation::SigmoidSymmetric;
        assert!(act.validate_steepness(f32::NAN).is_err());
        assert!(act.validate_steepness(0.0).is_err());
        assert!(act.validate_steepness(-0.5).is_err());
        assert!(act.validate_steepness(0.5).is_ok());
    }

    #[test]
    fn symmetric_sigmoid_is_bounded_and_odd() {
        let act = Activation::SigmoidSymmetric;
        assert_eq!(act.forward(0.0, 0.5), 0.0);
        assert!(act.forward(100.0, 0.5) <= 1.0);
        assert!(act.forward(-100.0, 0.5) >= -1.0);
        assert!((act.forward(0.7, 0.5) + act.forward(-0.7, 0.5)).abs() < 1e-6);
    }

    #[test]
    fn linear_ignores_steepness() {
        assert_eq!(Activation::Linear.forward(3.0, 0.5), 3.0);
        assert_eq!(Activation::Linear.grad_from_output(3.0, 0.5), 1.0);
    }

    #[test]
    fn sigmoid_basic_values() {
        let y0 = Activation::Sigmoid.forward(0.0, 1.0);
        assert!((y0 - 0.5).abs() < 1e-6);

        assert!(Activation::Sigmoid.forward(20.0, 1.0) > 0.999);
        assert!(Activation::Sigmoid.forward(-20.0, 1.0) < 0.001);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let eps = 1e-3_f32;
        for act in [
            Activation::Linear,
            Activation::Sigmoid,
            Activation::SigmoidSymmetric,
        ] {
            for &z in &[-1.5_f32, -0.2, 0.0, 0.4, 1.1] {
                let s = 0.5;
                let y = act.forward(z, s);
                let numeric = (act.forward(z + eps, s) - act.forward(z - eps, s)) / (2.0 * eps);
                let analytic = act.grad_from_output(y, s);
                assert!(
                    (numeric - analytic).abs() < 1e-3,
                    "{act:?} z={z} numeric={numeric} analytic={analytic}"
                );
            }
        }
    }
}
