//! Network topology and construction-time configuration.
//!
//! Every network has exactly three layers: input, one hidden layer, output.
//! What varies per network is captured by [`NetworkConfig`], which backends
//! either honor or reject with [`Error::InvalidParameter`].

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Result};

/// Layer sizes of a three-layer feed-forward network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub num_input: usize,
    pub num_hidden: usize,
    pub num_output: usize,
}

impl Topology {
    pub fn new(num_input: usize, num_hidden: usize, num_output: usize) -> Result<Self> {
        let topology = Self {
            num_input,
            num_hidden,
            num_output,
        };
        topology.validate()?;
        Ok(topology)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_input == 0 || self.num_hidden == 0 || self.num_output == 0 {
            return Err(Error::InvalidTopology(format!(
                "all layer sizes must be > 0, got {}-{}-{}",
                self.num_input, self.num_hidden, self.num_output
            )));
        }
        Ok(())
    }

    /// Number of trainable parameters (weights and biases).
    pub fn num_parameters(&self) -> usize {
        (self.num_input + 1) * self.num_hidden + (self.num_hidden + 1) * self.num_output
    }
}

/// How weight updates are scheduled during an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingAlgorithm {
    /// Update after every sample (online training).
    #[default]
    Incremental,
    /// Accumulate over the whole epoch and apply one averaged update.
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    pub algorithm: TrainingAlgorithm,
    /// Steepness applied to sigmoid-shaped activations.
    pub steepness: f32,
    /// Initial weights are drawn uniformly from `[-init_weight_range, init_weight_range]`.
    ///
    /// The default of 0.1 keeps symmetric-sigmoid hidden units in their linear
    /// region. Problems whose targets are uncorrelated with every input, such as
    /// XOR, stall at the all-zero output with it; use a range near 1.0 there.
    pub init_weight_range: f32,
    /// Seed for weight initialization. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_activation: Activation::SigmoidSymmetric,
            output_activation: Activation::Linear,
            algorithm: TrainingAlgorithm::Incremental,
            steepness: 0.5,
            init_weight_range: 0.1,
            seed: None,
        }
    }
}

impl NetworkConfig {
    /// Default configuration with a fixed initialization seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.hidden_activation.validate_steepness(self.steepness)?;
        self.output_activation.validate_steepness(self.steepness)?;
        if !(self.init_weight_range.is_finite() && self.init_weight_range > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "init_weight_range must be finite and > 0, got {}",
                self.init_weight_range
            )));
        }
        Ok(())
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

pub(crate) fn validate_learning_rate(learning_rate: f32) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "learning rate must be finite and > 0, got {learning_rate}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_rejects_empty_layers() {
        assert!(matches!(
            Topology::new(0, 3, 1),
            Err(Error::InvalidTopology(_))
        ));
        assert!(matches!(
            Topology::new(2, 0, 1),
            Err(Error::InvalidTopology(_))
        ));
        assert!(matches!(
            Topology::new(2, 3, 0),
            Err(Error::InvalidTopology(_))
        ));
        assert_eq!(Topology::new(2, 3, 1).unwrap().num_parameters(), 13);
    }

    #[test]
    fn default_config_matches_value_estimator_setup() {
        let cfg = NetworkConfig::default();
        assert_eq!(cfg.hidden_activation, Activation::SigmoidSymmetric);
        assert_eq!(cfg.output_activation, Activation::Linear);
        assert_eq!(cfg.algorithm, TrainingAlgorithm::Incremental);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        let cfg = NetworkConfig {
            steepness: 0.0,
            ..NetworkConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidParameter(_))));

        let cfg = NetworkConfig {
            init_weight_range: f32::INFINITY,
            ..NetworkConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn learning_rate_must_be_positive() {
        assert!(validate_learning_rate(0.0).is_err());
        assert!(validate_learning_rate(-0.1).is_err());
        assert!(validate_learning_rate(f32::NAN).is_err());
        assert!(validate_learning_rate(0.3).is_ok());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: NetworkConfig =
            serde_json::from_str(r#"{"algorithm":"batch","seed":7}"#).unwrap();
        assert_eq!(cfg.algorithm, TrainingAlgorithm::Batch);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.steepness, 0.5);
        assert_eq!(cfg.hidden_activation, Activation::SigmoidSymmetric);
    }
}
