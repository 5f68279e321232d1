//! Backend-agnostic three-layer feed-forward networks.
//!
//! `rust-nnet` provides a fixed-shape network (input, one hidden layer,
//! output) meant for small function approximation jobs such as value
//! estimation in reinforcement learning. Callers create a [`Network`] for a
//! [`BackendKind`], fill a [`TrainingData`] set, train for a fixed number of
//! epochs with plain stochastic gradient descent, and query it with
//! [`Network::run`].
//!
//! # Backends
//!
//! Every handle is bound to one backend at creation time:
//!
//! - [`BackendKind::Native`]: built-in implementation over flat buffers.
//!   Supports incremental and batch training.
//! - [`BackendKind::Ndarray`] (feature `ndarray`, on by default): delegates
//!   the linear algebra to the `ndarray` crate. Incremental training only.
//!
//! Training sets are backend-owned too. Training a network with a set created
//! for another backend fails with [`Error::BackendMismatch`].
//!
//! # Defaults
//!
//! [`Network::create`] uses [`NetworkConfig::default`]: symmetric sigmoid
//! (`tanh(0.5 z)`) hidden units, linear outputs, incremental updates, and
//! parameters drawn uniformly from `[-0.1, 0.1]`.
//!
//! # Data layout
//!
//! - Scalars are `f32`.
//! - Training matrices are row-major: sample `i` occupies
//!   `inputs()[i * num_input..(i + 1) * num_input]`.
//! - Layer weights are row-major with shape `(out_dim, in_dim)`.
//!
//! # Quick start
//!
//! ```rust
//! use rust_nnet::{BackendKind, Network, NetworkConfig, Topology, TrainingData};
//!
//! # fn main() -> rust_nnet::Result<()> {
//! let xs = vec![
//!     vec![-1.0, -1.0],
//!     vec![-1.0, 1.0],
//!     vec![1.0, -1.0],
//!     vec![1.0, 1.0],
//! ];
//! let ys = vec![vec![-1.0], vec![1.0], vec![1.0], vec![-1.0]];
//! let data = TrainingData::from_rows(BackendKind::Native, &xs, &ys)?;
//!
//! // XOR needs a wider initial range than the 0.1 default.
//! let cfg = NetworkConfig {
//!     init_weight_range: 1.0,
//!     ..NetworkConfig::seeded(0)
//! };
//! let topology = Topology::new(2, 4, 1)?;
//! let mut net = Network::create_with_config(BackendKind::Native, topology, 0.1, &cfg)?;
//! net.train(&data, 100)?;
//!
//! let y = net.run(&[1.0, -1.0])?;
//! assert_eq!(y.len(), 1);
//!
//! let report = net.evaluate(&data)?;
//! assert!(report.mse.is_finite());
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod backend;
pub(crate) mod buffer;
pub mod config;
pub mod data;
pub mod error;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod serde_model;
mod train;

pub use activation::Activation;
pub use backend::{Backend, BackendKind, NetworkState, TrainingState};
pub use config::{NetworkConfig, Topology, TrainingAlgorithm};
pub use data::TrainingData;
pub use error::{Error, MatrixKind, Result};
pub use layer::Layer;
pub use metrics::{EvalReport, SampleEval};
pub use network::Network;
pub use serde_model::MODEL_FORMAT_VERSION;
