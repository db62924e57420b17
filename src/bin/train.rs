use neuroflow::activator::Activator;
use neuroflow::config::{Config, Mode};
use neuroflow::data::{Example, Examples};
use neuroflow::feed_forward::Network;
use neuroflow::progress::accuracy;
use neuroflow::solver::Sgd;
use neuroflow::trainer::{BatchTrainer, Logging, Trainer};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::process;

/// Points scattered around the unit circle, labelled by whether they fall in
/// the first/third or the second/fourth quadrant.
fn generate_data<R: Rng>(rng: &mut R, num_samples: usize) -> Examples {
    (0..num_samples)
        .map(|_| {
            let theta = rng.random_range(0.0..2.0 * std::f64::consts::PI);
            let dx: f64 = rng.sample(StandardNormal);
            let dy: f64 = rng.sample(StandardNormal);
            let point = vec![theta.cos() + 0.1 * dx, theta.sin() + 0.1 * dy];
            let class = if point[0] * point[1] > 0.0 {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            };
            Example::new(point, class)
        })
        .collect()
}

fn run() -> neuroflow::Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let (training, validation) = generate_data(&mut rng, 10_000).split(0.9);

    let config = Config::new(2, &[5, 5, 2])
        .activation(Activator::TanH)
        .mode(Mode::MultiClass)
        .bias(true)
        .seed(7);
    let mut network = Network::new(&config)?;

    BatchTrainer::new(Sgd::new(0.01, 0.9, 1e-3, true))
        .batch_size(16)
        .logging(Logging::Iterations(10))
        .seed(7)
        .train(&mut network, &training, &validation, 50)?;
    log::info!(
        "Validation accuracy {:.3} on {} examples",
        accuracy(&mut network, &validation)?,
        validation.len()
    );

    let bytes = network.marshal()?;
    let mut restored = Network::unmarshal(&bytes)?;
    log::debug!("Restored network from {} bytes:\n{}", bytes.len(), restored);
    let probe = [0.7, 0.7];
    log::info!("Prediction for {:?}: {:?}", probe, restored.predict(&probe)?);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Training is started");
    if let Err(e) = run() {
        log::error!("Training failed: {}", e);
        process::exit(1);
    }
}
