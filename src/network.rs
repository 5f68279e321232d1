use log::debug;

use crate::backend::{Backend, NetworkState};
use crate::config::validate_learning_rate;
use crate::{BackendKind, Error, NetworkConfig, Result, Topology, TrainingData};

/// A three-layer feed-forward network bound to one backend.
///
/// The handle exclusively owns its backend state. It is either fully
/// initialized or does not exist: every constructor returns `Result` and no
/// partially built handle is ever observable.
#[derive(Debug)]
pub struct Network {
    pub(crate) backend: &'static dyn Backend,
    pub(crate) learning_rate: f32,
    pub(crate) state: Box<dyn NetworkState>,
}

impl Network {
    /// Create a network with the default configuration: symmetric sigmoid
    /// hidden layer, linear output layer, incremental training.
    pub fn create(
        kind: BackendKind,
        num_input: usize,
        num_hidden: usize,
        num_output: usize,
        learning_rate: f32,
    ) -> Result<Self> {
        let topology = Topology::new(num_input, num_hidden, num_output)?;
        Self::create_with_config(kind, topology, learning_rate, &NetworkConfig::default())
    }

    pub fn create_with_config(
        kind: BackendKind,
        topology: Topology,
        learning_rate: f32,
        config: &NetworkConfig,
    ) -> Result<Self> {
        topology.validate()?;
        validate_learning_rate(learning_rate)?;
        config.validate()?;

        let backend = kind.backend()?;
        let state = backend.create_network(topology, config)?;
        debug!(
            "created {kind} network {}-{}-{} ({} parameters) lr={learning_rate} {:?}/{:?} {:?}",
            topology.num_input,
            topology.num_hidden,
            topology.num_output,
            topology.num_parameters(),
            config.hidden_activation,
            config.output_activation,
            config.algorithm
        );
        Ok(Self::from_parts(backend, learning_rate, state))
    }

    pub(crate) fn from_parts(
        backend: &'static dyn Backend,
        learning_rate: f32,
        state: Box<dyn NetworkState>,
    ) -> Self {
        Self {
            backend,
            learning_rate,
            state,
        }
    }

    /// A zero-filled training set shaped for this network, on the same backend.
    pub fn create_training_set(&self, num_samples: usize) -> Result<TrainingData> {
        let topology = self.topology();
        TrainingData::create(
            self.kind(),
            num_samples,
            topology.num_input,
            topology.num_output,
        )
    }

    #[inline]
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.state.topology()
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// One forward pass.
    ///
    /// The returned slice is the network's reusable output buffer: it borrows
    /// the handle, so it must be consumed (or copied) before the next call.
    pub fn run(&mut self, input: &[f32]) -> Result<&[f32]> {
        let expected = self.topology().num_input;
        if input.len() != expected {
            return Err(Error::dimension("network input", input.len(), expected));
        }
        Ok(self.state.run(input))
    }

    /// Like [`Network::run`], but returns an owned copy of the outputs.
    pub fn run_to_vec(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.run(input).map(<[f32]>::to_vec)
    }

    /// Deep copy: same backend, same learning rate, independent parameters.
    pub fn try_clone(&self) -> Result<Self> {
        let state = self.state.try_clone()?;
        debug!("cloned {} network {:?}", self.kind(), self.topology());
        Ok(Self::from_parts(self.backend, self.learning_rate, state))
    }

    /// Release the backend state.
    pub fn destroy(self) {
        debug!("destroying {} network {:?}", self.kind(), self.topology());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_validates_topology_and_learning_rate() {
        let err = Network::create(BackendKind::Native, 2, 0, 1, 0.1).unwrap_err();
        assert!(matches!(err, Error::InvalidTopology(_)));

        let err = Network::create(BackendKind::Native, 2, 3, 1, 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));

        let err = Network::create(BackendKind::Native, 2, 3, 1, f32::NAN).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn create_with_config_rejects_bad_config() {
        let cfg = NetworkConfig {
            steepness: -1.0,
            ..NetworkConfig::default()
        };
        let topology = Topology::new(2, 3, 1).unwrap();
        let err =
            Network::create_with_config(BackendKind::Native, topology, 0.1, &cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn run_checks_input_length() {
        let mut net = Network::create(BackendKind::Native, 3, 4, 2, 0.1).unwrap();
        assert_eq!(net.run(&[0.1, 0.2, 0.3]).unwrap().len(), 2);

        let err = net.run(&[0.1, 0.2]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                got: 2,
                expected: 3,
                ..
            }
        ));
    }

    #[test]
    fn seeded_networks_are_deterministic() {
        let topology = Topology::new(2, 3, 1).unwrap();
        let cfg = NetworkConfig::seeded(42);
        let mut a = Network::create_with_config(BackendKind::Native, topology, 0.1, &cfg).unwrap();
        let mut b = Network::create_with_config(BackendKind::Native, topology, 0.1, &cfg).unwrap();
        assert_eq!(
            a.run_to_vec(&[0.3, -0.7]).unwrap(),
            b.run_to_vec(&[0.3, -0.7]).unwrap()
        );
    }

    #[test]
    fn run_does_not_change_outputs() {
        let mut net = Network::create(BackendKind::Native, 2, 3, 1, 0.1).unwrap();
        let first = net.run_to_vec(&[0.5, 0.5]).unwrap();
        let second = net.run_to_vec(&[0.5, 0.5]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn training_set_from_network_matches_topology() {
        let net = Network::create(BackendKind::Native, 3, 4, 2, 0.1).unwrap();
        let data = net.create_training_set(5).unwrap();
        assert_eq!(data.kind(), BackendKind::Native);
        assert_eq!(data.num_samples(), 5);
        assert_eq!(data.num_input(), 3);
        assert_eq!(data.num_output(), 2);
    }

    #[test]
    fn handles_can_move_between_threads() {
        fn assert_send<T: Send>() {}
        assert_send::<Network>();
        assert_send::<TrainingData>();
    }

    #[test]
    fn clone_keeps_learning_rate_and_outputs() {
        let mut net = Network::create(BackendKind::Native, 2, 3, 1, 0.35).unwrap();
        let mut copy = net.try_clone().unwrap();
        assert_eq!(copy.learning_rate(), 0.35);
        assert_eq!(copy.kind(), BackendKind::Native);
        assert_eq!(
            net.run_to_vec(&[0.2, 0.4]).unwrap(),
            copy.run_to_vec(&[0.2, 0.4]).unwrap()
        );
        net.destroy();
        assert_eq!(copy.run(&[0.2, 0.4]).unwrap().len(), 1);
    }
}
