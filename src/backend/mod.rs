//! Backend dispatch.
//!
//! A backend is the numeric engine behind [`Network`](crate::Network) and
//! [`TrainingData`]. Each [`BackendKind`] maps to exactly one static
//! [`Backend`] implementation which every handle of that kind shares; the
//! per-handle state lives in an owned [`NetworkState`] / [`TrainingState`].
//!
//! Callers normally never touch these traits directly. They exist so a new
//! engine can be added by implementing three traits and a `BackendKind` arm.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NetworkConfig, Result, Topology, TrainingData};

pub mod native;
#[cfg(feature = "ndarray")]
pub mod ndarray_backend;

static NATIVE: native::NativeBackend = native::NativeBackend;
#[cfg(feature = "ndarray")]
static NDARRAY: ndarray_backend::NdarrayBackend = ndarray_backend::NdarrayBackend;

/// Selects the numeric engine for a network or training set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Built-in dense implementation over flat row-major buffers.
    Native,
    /// Delegates the linear algebra to the `ndarray` crate.
    Ndarray,
}

impl BackendKind {
    /// Every kind compiled into this build.
    pub fn available() -> &'static [BackendKind] {
        #[cfg(feature = "ndarray")]
        {
            &[BackendKind::Native, BackendKind::Ndarray]
        }
        #[cfg(not(feature = "ndarray"))]
        {
            &[BackendKind::Native]
        }
    }

    /// The shared operation table for this kind.
    pub fn backend(self) -> Result<&'static dyn Backend> {
        match self {
            BackendKind::Native => Ok(&NATIVE),
            #[cfg(feature = "ndarray")]
            BackendKind::Ndarray => Ok(&NDARRAY),
            #[cfg(not(feature = "ndarray"))]
            BackendKind::Ndarray => Err(crate::Error::InvalidParameter(
                "ndarray backend is not compiled in (enable the `ndarray` feature)".to_owned(),
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => f.write_str("native"),
            BackendKind::Ndarray => f.write_str("ndarray"),
        }
    }
}

/// Operation table bound once per backend kind.
pub trait Backend: fmt::Debug + Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Allocate and initialize a network. `topology` and `config` are already validated.
    fn create_network(
        &self,
        topology: Topology,
        config: &NetworkConfig,
    ) -> Result<Box<dyn NetworkState>>;

    /// Allocate zero-filled training storage. Dimensions are already validated.
    fn create_training(
        &self,
        num_samples: usize,
        num_input: usize,
        num_output: usize,
    ) -> Result<Box<dyn TrainingState>>;

    /// Rebuild a network from a document produced by [`NetworkState::to_json`].
    ///
    /// Returns the state and the persisted learning rate.
    fn network_from_json(&self, json: &str) -> Result<(Box<dyn NetworkState>, f32)>;
}

/// Backend-owned network parameters and buffers.
pub trait NetworkState: fmt::Debug + Send {
    fn topology(&self) -> Topology;

    /// One pass over `data` in sample order. Returns the epoch's mean squared error.
    ///
    /// The caller guarantees that `data` matches the topology and backend kind.
    fn train_epoch(&mut self, data: &TrainingData, learning_rate: f32) -> Result<f32>;

    /// One forward pass. `input.len()` equals `topology().num_input`.
    ///
    /// The returned slice is the backend's reusable output buffer.
    fn run(&mut self, input: &[f32]) -> &[f32];

    /// Serialize parameters together with `learning_rate`.
    fn to_json(&self, learning_rate: f32) -> Result<String>;

    /// Independent deep copy.
    fn try_clone(&self) -> Result<Box<dyn NetworkState>>;
}

/// Backend-owned training storage.
///
/// Both matrices are row-major: `inputs().len() == num_samples * num_input`
/// and `outputs().len() == num_samples * num_output`.
pub trait TrainingState: fmt::Debug + Send {
    fn kind(&self) -> BackendKind;

    fn inputs(&self) -> &[f32];

    fn inputs_mut(&mut self) -> &mut [f32];

    fn outputs(&self) -> &[f32];

    fn outputs_mut(&mut self) -> &mut [f32];

    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_available_kind_resolves_to_its_backend() {
        for &kind in BackendKind::available() {
            assert_eq!(kind.backend().unwrap().kind(), kind);
        }
    }

    #[test]
    fn kinds_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&BackendKind::Native).unwrap(),
            "\"native\""
        );
        assert_eq!(
            serde_json::from_str::<BackendKind>("\"ndarray\"").unwrap(),
            BackendKind::Ndarray
        );
    }
}
