use rust_nnet::{BackendKind, Network, NetworkConfig, Topology, TrainingData};

const CHECKPOINTS: usize = 8;
const EPOCHS_PER_CHECKPOINT: usize = 500;
// Checkpoints after which the error must no longer rise.
const BURN_IN: usize = 4;

fn xor(kind: BackendKind) -> TrainingData {
    let xs = vec![
        vec![-1.0, -1.0],
        vec![-1.0, 1.0],
        vec![1.0, -1.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![-1.0], vec![1.0], vec![1.0], vec![-1.0]];
    TrainingData::from_rows(kind, &xs, &ys).unwrap()
}

/// Symmetric-sigmoid hidden units need weights of order one to leave the
/// all-zero saddle; the 0.1 default stalls there.
fn xor_network(kind: BackendKind, seed: u64) -> Network {
    let cfg = NetworkConfig {
        init_weight_range: 1.0,
        ..NetworkConfig::seeded(seed)
    };
    let topology = Topology::new(2, 4, 1).unwrap();
    Network::create_with_config(kind, topology, 0.1, &cfg).unwrap()
}

#[test]
fn xor_is_learned_by_every_backend_and_seed() {
    let _ = env_logger::builder().is_test(true).try_init();

    for &kind in BackendKind::available() {
        let data = xor(kind);

        for seed in 0..8 {
            let mut net = xor_network(kind, seed);

            let mut history = vec![net.evaluate(&data).unwrap().mse];
            for _ in 0..CHECKPOINTS {
                net.train(&data, EPOCHS_PER_CHECKPOINT).unwrap();
                history.push(net.evaluate(&data).unwrap().mse);
            }

            let drops: Vec<f32> = history.windows(2).map(|w| w[0] - w[1]).collect();
            let mean_drop = drops.iter().sum::<f32>() / drops.len() as f32;
            assert!(
                mean_drop > 0.0,
                "{kind} seed {seed}: error did not fall on average: {history:?}"
            );
            for (i, w) in history.windows(2).enumerate().skip(BURN_IN) {
                assert!(
                    w[1] <= w[0] + 1e-3,
                    "{kind} seed {seed}: error rose at checkpoint {}: {history:?}",
                    i + 1
                );
            }

            let report = net.evaluate(&data).unwrap();
            assert_eq!(
                report.sign_accuracy(),
                1.0,
                "{kind} seed {seed}: {:?}",
                report.samples
            );
        }
    }
}
