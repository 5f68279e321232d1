//! Network persistence.
//!
//! Every saved network is a JSON document with a small common envelope:
//!
//! ```json
//! { "format_version": 1, "backend": "native", "learning_rate": 0.5, "network": { ... } }
//! ```
//!
//! The `network` payload is defined by the backend that wrote the file and is
//! opaque to the rest of the crate.
//!
//! Design notes:
//! - Backends do NOT serialize their internal structs directly; each defines a
//!   payload type so the file format stays stable if internals change.
//! - Loading validates the version, the backend kind, the learning rate, and
//!   (in the backend) dimensions and finiteness of every parameter.

use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::validate_learning_rate;
use crate::{Activation, BackendKind, Error, Layer, Network, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct EnvelopeRef<'a, T> {
    format_version: u32,
    backend: BackendKind,
    learning_rate: f32,
    network: &'a T,
}

/// Envelope fields checked before the payload is parsed.
#[derive(Debug, Deserialize)]
struct Header {
    format_version: u32,
    backend: BackendKind,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    learning_rate: f32,
    network: T,
}

/// Wrap a backend payload in the common envelope (pretty-printed).
pub(crate) fn to_json_string<T: Serialize>(
    backend: BackendKind,
    learning_rate: f32,
    network: &T,
) -> Result<String> {
    let envelope = EnvelopeRef {
        format_version: MODEL_FORMAT_VERSION,
        backend,
        learning_rate,
        network,
    };
    serde_json::to_string_pretty(&envelope)
        .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
}

/// Parse an envelope written for `expected`, returning the learning rate and payload.
pub(crate) fn from_json_str<T: DeserializeOwned>(
    expected: BackendKind,
    s: &str,
) -> Result<(f32, T)> {
    let header: Header = serde_json::from_str(s)
        .map_err(|e| Error::InvalidData(format!("failed to parse network json: {e}")))?;
    if header.format_version != MODEL_FORMAT_VERSION {
        return Err(Error::InvalidData(format!(
            "unsupported network format_version {}; expected {}",
            header.format_version, MODEL_FORMAT_VERSION
        )));
    }
    if header.backend != expected {
        return Err(Error::BackendMismatch {
            expected,
            found: header.backend,
        });
    }

    let envelope: Envelope<T> = serde_json::from_str(s)
        .map_err(|e| Error::InvalidData(format!("failed to parse {expected} network: {e}")))?;
    validate_learning_rate(envelope.learning_rate)
        .map_err(|e| Error::InvalidData(format!("invalid saved learning rate: {e}")))?;
    Ok((envelope.learning_rate, envelope.network))
}

/// On-disk form of one dense layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    pub in_dim: usize,
    pub out_dim: usize,
    pub activation: Activation,
    pub steepness: f32,
    /// Row-major (out_dim, in_dim).
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

impl SerializedLayer {
    fn validate(&self) -> Result<()> {
        if self.in_dim == 0 || self.out_dim == 0 {
            return Err(Error::InvalidData(format!(
                "layer dims must be > 0, got in_dim={} out_dim={}",
                self.in_dim, self.out_dim
            )));
        }

        let expected_w = self
            .in_dim
            .checked_mul(self.out_dim)
            .ok_or_else(|| Error::InvalidData("layer weight shape overflow".to_owned()))?;
        if self.weights.len() != expected_w {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match out_dim * in_dim ({} * {})",
                self.weights.len(),
                self.out_dim,
                self.in_dim
            )));
        }
        if self.biases.len() != self.out_dim {
            return Err(Error::InvalidData(format!(
                "biases length {} does not match out_dim {}",
                self.biases.len(),
                self.out_dim
            )));
        }

        self.activation
            .validate_steepness(self.steepness)
            .map_err(|e| Error::InvalidData(format!("invalid activation: {e}")))?;

        if self.weights.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }
        if self.biases.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "biases must contain only finite values".to_owned(),
            ));
        }

        Ok(())
    }

    pub(crate) fn into_layer(self, name: &str) -> Result<Layer> {
        self.validate()
            .map_err(|e| Error::InvalidData(format!("{name} layer invalid: {e}")))?;
        Layer::from_parts(
            self.in_dim,
            self.out_dim,
            self.activation,
            self.steepness,
            self.weights,
            self.biases,
        )
        .map_err(|e| Error::InvalidData(format!("{name} layer invalid: {e}")))
    }
}

impl From<&Layer> for SerializedLayer {
    fn from(layer: &Layer) -> Self {
        Self {
            in_dim: layer.in_dim(),
            out_dim: layer.out_dim(),
            activation: layer.activation(),
            steepness: layer.steepness(),
            weights: layer.weights().to_vec(),
            biases: layer.biases().to_vec(),
        }
    }
}

impl Network {
    /// Serialize the network (parameters and learning rate) to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        self.state.to_json(self.learning_rate)
    }

    /// Parse a network previously written by a `kind` backend.
    pub fn from_json_str(kind: BackendKind, s: &str) -> Result<Self> {
        let backend = kind.backend()?;
        let (state, learning_rate) = backend.network_from_json(s)?;
        Ok(Network::from_parts(backend, learning_rate, state))
    }

    /// Save the network to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        let s = self.to_json_string()?;
        std::fs::write(p, s).map_err(|source| Error::Io {
            path: p.to_path_buf(),
            source,
        })?;
        debug!("saved {} network to {}", self.kind(), p.display());
        Ok(())
    }

    /// Load a network saved by a `kind` backend into a new handle.
    pub fn load<P: AsRef<Path>>(kind: BackendKind, path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p).map_err(|source| Error::Io {
            path: p.to_path_buf(),
            source,
        })?;
        let network = Self::from_json_str(kind, &s)?;
        debug!(
            "loaded {kind} network {:?} from {}",
            network.topology(),
            p.display()
        );
        Ok(network)
    }
}
