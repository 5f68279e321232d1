use rust_nnet::{BackendKind, Network, NetworkConfig, Topology, TrainingData};

fn main() -> rust_nnet::Result<()> {
    env_logger::init();

    // XOR with symmetric (+/-1) encoding.
    let xs = vec![
        vec![-1.0, -1.0],
        vec![-1.0, 1.0],
        vec![1.0, -1.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![-1.0], vec![1.0], vec![1.0], vec![-1.0]];

    for &kind in BackendKind::available() {
        let data = TrainingData::from_rows(kind, &xs, &ys)?;
        // XOR needs order-one initial weights to leave the all-zero saddle.
        let cfg = NetworkConfig {
            init_weight_range: 1.0,
            ..NetworkConfig::seeded(0)
        };
        let mut net = Network::create_with_config(kind, Topology::new(2, 4, 1)?, 0.1, &cfg)?;

        for round in 1..=8 {
            net.train(&data, 500)?;
            let report = net.evaluate(&data)?;
            println!(
                "[{kind}] epochs={} mse={:.5} sign_accuracy={:.2}",
                round * 500,
                report.mse,
                report.sign_accuracy()
            );
        }

        for x in &xs {
            let y = net.run(x)?;
            println!("[{kind}] x={x:?} y={:.4}", y[0]);
        }
    }
    Ok(())
}
