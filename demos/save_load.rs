use rust_nnet::{BackendKind, Network};

fn main() -> rust_nnet::Result<()> {
    env_logger::init();

    let kind = BackendKind::Native;
    let mut net = Network::create(kind, 3, 4, 2, 0.1)?;
    let mut data = net.create_training_set(2)?;
    data.set_sample(0, &[0.1, 0.2, 0.3], &[1.0, 0.0])?;
    data.set_sample(1, &[0.3, 0.2, 0.1], &[0.0, 1.0])?;
    net.train(&data, 100)?;

    let path = "target/tmp_network.json";
    net.save(path)?;
    let mut loaded = Network::load(kind, path)?;

    let probe = [0.2, 0.2, 0.2];
    println!("saved and loaded network: {path}");
    println!("original: {:?}", net.run_to_vec(&probe)?);
    println!("loaded:   {:?}", loaded.run(&probe)?);

    loaded.destroy();
    net.destroy();
    data.destroy();
    Ok(())
}
