//! Utilities for training neural networks.
//!
//! Two trainers are provided. The [`OnlineTrainer`] applies a solver step
//! after every example. The [`BatchTrainer`] spreads each mini-batch over a
//! pool of worker threads and applies a single step per batch.

mod batch;
mod online;

pub use self::batch::BatchTrainer;
pub use self::online::OnlineTrainer;

use crate::data::Example;
use crate::error::{Error, Result};
use crate::feed_forward::Network;
use crate::progress::Stats;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Trains a network in place.
pub trait Trainer {
    /// Trains `network` on `examples` for `iterations` epochs.
    ///
    /// `validation` is only used for progress reports and may be empty. Every
    /// example is checked against the network's dimensions before the first
    /// update, so a malformed example fails the call without touching any
    /// weight.
    fn train(
        &mut self,
        network: &mut Network,
        examples: &[Example],
        validation: &[Example],
        iterations: usize,
    ) -> Result<()>;
}

impl<T: Trainer + ?Sized> Trainer for Box<T> {
    fn train(
        &mut self,
        network: &mut Network,
        examples: &[Example],
        validation: &[Example],
        iterations: usize,
    ) -> Result<()> {
        (**self).train(network, examples, validation, iterations)
    }
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be logged at completion
    Completion,
    /// Validation progress will be logged after every `n` training epochs
    Iterations(usize),
}

impl Logging {
    /// Performs logging at the end of epoch `iteration`.
    fn iteration(
        &self,
        network: &mut Network,
        validation: &[Example],
        iteration: usize,
        start_time: Instant,
    ) -> Result<()> {
        if let Logging::Iterations(freq) = *self {
            if freq > 0 && iteration % freq == 0 && !validation.is_empty() {
                let stats = Stats::measure(network, validation, iteration, start_time.elapsed())?;
                log::info!("{}", stats);
            }
        }
        Ok(())
    }

    /// Performs logging at the end of training.
    fn completion(
        &self,
        network: &mut Network,
        validation: &[Example],
        iterations: usize,
        start_time: Instant,
    ) -> Result<()> {
        if let Logging::Silent = *self {
            return Ok(());
        }
        log::info!(
            "Ran {} epochs in {:.2?}.",
            iterations,
            start_time.elapsed()
        );
        if !validation.is_empty() {
            let stats = Stats::measure(network, validation, iterations, start_time.elapsed())?;
            log::info!("Final {}", stats);
        }
        Ok(())
    }
}

/// Verifies that every example fits the network, returning an error if
/// something is wrong.
fn validate(network: &Network, examples: &[Example]) -> Result<()> {
    for example in examples {
        if example.input.len() != network.input_len() {
            return Err(Error::DimensionMismatch {
                what: "example input",
                expected: network.input_len(),
                got: example.input.len(),
            });
        }
        if example.response.len() != network.output_len() {
            return Err(Error::DimensionMismatch {
                what: "example response",
                expected: network.output_len(),
                got: example.response.len(),
            });
        }
    }
    Ok(())
}

/// The generator used to shuffle examples between epochs.
fn shuffle_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn cancelled(flag: &Option<Arc<AtomicBool>>) -> bool {
    flag.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activator::Activator;
    use crate::config::{Config, Mode};
    use crate::data::Examples;
    use crate::solver::Sgd;
    use crate::utils::argmax;

    fn xor() -> Examples {
        vec![
            Example::new(vec![0.0, 0.0], vec![0.0]),
            Example::new(vec![0.0, 1.0], vec![1.0]),
            Example::new(vec![1.0, 0.0], vec![1.0]),
            Example::new(vec![1.0, 1.0], vec![0.0]),
        ]
        .into()
    }

    fn xor_network() -> Network {
        let config = Config::new(2, &[2, 1])
            .activation(Activator::Sigmoid)
            .mode(Mode::Binary)
            .bias(true);
        let mut network = Network::new(&config).unwrap();
        network
            .apply_weights(&[
                vec![vec![0.8, -0.6, 0.2], vec![-0.7, 0.9, -0.1]],
                vec![vec![0.6, 0.5, -0.3]],
            ])
            .unwrap();
        network
    }

    fn mean_square_error(network: &mut Network, examples: &[Example]) -> f64 {
        let mut error = 0.0;
        for example in examples {
            let out = network.predict(&example.input).unwrap();
            for (a, e) in out.iter().zip(&example.response) {
                error += (a - e) * (a - e);
            }
        }
        error / examples.len() as f64
    }

    /// Three well separated clusters, a 5x5 grid of points around each.
    fn clusters(offsets: &[f64]) -> Examples {
        let centers = [(-2.0, 0.0), (2.0, 0.0), (0.0, 2.5)];
        let mut examples = Vec::new();
        for (class, &(cx, cy)) in centers.iter().enumerate() {
            for &dx in offsets {
                for &dy in offsets {
                    let mut response = vec![0.0; 3];
                    response[class] = 1.0;
                    examples.push(Example::new(vec![cx + dx, cy + dy], response));
                }
            }
        }
        examples.into()
    }

    fn classifier() -> Network {
        let config = Config::new(2, &[3]).mode(Mode::MultiClass).bias(true).seed(17);
        Network::new(&config).unwrap()
    }

    fn class_accuracy(network: &mut Network, examples: &[Example]) -> f64 {
        let hits = examples
            .iter()
            .filter(|e| argmax(&network.predict(&e.input).unwrap()) == argmax(&e.response))
            .count();
        hits as f64 / examples.len() as f64
    }

    #[test]
    fn online_learns_xor() {
        let mut network = xor_network();
        let examples = xor();
        OnlineTrainer::new(Sgd::new(0.5, 0.5, 0.0, false))
            .logging(Logging::Silent)
            .seed(4)
            .train(&mut network, &examples, &examples, 3000)
            .unwrap();
        assert!(mean_square_error(&mut network, &examples) < 0.1);
    }

    #[test]
    fn batch_learns_xor() {
        let mut network = xor_network();
        let examples = xor();
        BatchTrainer::new(Sgd::new(0.5, 0.5, 0.0, false))
            .batch_size(4)
            .parallelism(2)
            .logging(Logging::Silent)
            .seed(4)
            .train(&mut network, &examples, &[], 3000)
            .unwrap();
        assert!(mean_square_error(&mut network, &examples) < 0.1);
    }

    #[test]
    fn online_separates_three_classes() {
        let train = clusters(&[-0.5, -0.25, 0.0, 0.25, 0.5]);
        let validation = clusters(&[-0.4, -0.1, 0.2, 0.45]);
        let mut network = classifier();
        OnlineTrainer::new(Sgd::new(0.1, 0.9, 0.0, false))
            .logging(Logging::Iterations(10))
            .seed(2)
            .train(&mut network, &train, &validation, 50)
            .unwrap();
        assert!(class_accuracy(&mut network, &validation) >= 0.9);
    }

    #[test]
    fn batch_separates_three_classes() {
        let train = clusters(&[-0.5, -0.25, 0.0, 0.25, 0.5]);
        let validation = clusters(&[-0.4, -0.1, 0.2, 0.45]);
        let mut network = classifier();
        BatchTrainer::new(Sgd::new(0.05, 0.9, 0.0, false))
            .batch_size(8)
            .parallelism(3)
            .logging(Logging::Completion)
            .seed(2)
            .train(&mut network, &train, &validation, 50)
            .unwrap();
        assert!(class_accuracy(&mut network, &validation) >= 0.9);
    }

    #[test]
    fn batch_of_one_matches_online() {
        let config = Config::new(3, &[4, 2])
            .activation(Activator::TanH)
            .mode(Mode::MultiClass)
            .bias(true)
            .seed(99);
        let examples = clusters(&[-0.3, 0.3])
            .iter()
            .filter(|e| e.response[2] == 0.0)
            .map(|e| {
                let input = vec![e.input[0], e.input[1], e.input[0] * e.input[1]];
                let response = e.response[..2].to_vec();
                Example::new(input, response)
            })
            .collect::<Examples>();

        let mut online = Network::new(&config).unwrap();
        let mut batched = Network::new(&config).unwrap();
        assert_eq!(online.weights(), batched.weights());

        OnlineTrainer::new(Sgd::new(0.05, 0.8, 1e-3, false))
            .logging(Logging::Silent)
            .seed(5)
            .train(&mut online, &examples, &[], 7)
            .unwrap();
        BatchTrainer::new(Sgd::new(0.05, 0.8, 1e-3, false))
            .batch_size(1)
            .parallelism(1)
            .logging(Logging::Silent)
            .seed(5)
            .train(&mut batched, &examples, &[], 7)
            .unwrap();

        assert_eq!(online.weights(), batched.weights());
    }

    #[test]
    fn malformed_example_fails_before_training() {
        let mut network = xor_network();
        let before = network.weights();
        let mut examples = xor().into_inner();
        examples.push(Example::new(vec![1.0], vec![0.0]));

        let result = OnlineTrainer::new(Sgd::new(0.5, 0.0, 0.0, false))
            .logging(Logging::Silent)
            .train(&mut network, &examples, &[], 10);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { what: "example input", .. })
        ));

        let bad_response = vec![Example::new(vec![1.0, 0.0], vec![0.0, 1.0])];
        let result = BatchTrainer::new(Sgd::new(0.5, 0.0, 0.0, false))
            .logging(Logging::Silent)
            .train(&mut network, &bad_response, &[], 10);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { what: "example response", .. })
        ));
        assert_eq!(network.weights(), before);
    }

    #[test]
    fn cancelled_training_leaves_weights_alone() {
        let flag = Arc::new(AtomicBool::new(true));
        let examples = xor();

        let mut network = xor_network();
        let before = network.weights();
        OnlineTrainer::new(Sgd::new(0.5, 0.0, 0.0, false))
            .logging(Logging::Silent)
            .cancel_flag(flag.clone())
            .train(&mut network, &examples, &[], 100)
            .unwrap();
        assert_eq!(network.weights(), before);

        BatchTrainer::new(Sgd::new(0.5, 0.0, 0.0, false))
            .parallelism(2)
            .logging(Logging::Silent)
            .cancel_flag(flag)
            .train(&mut network, &examples, &[], 100)
            .unwrap();
        assert_eq!(network.weights(), before);
    }

    #[test]
    fn boxed_trainers() {
        let mut trainers: Vec<Box<dyn Trainer>> = vec![
            Box::new(OnlineTrainer::new(Sgd::new(0.1, 0.0, 0.0, false)).logging(Logging::Silent)),
            Box::new(BatchTrainer::new(Sgd::new(0.1, 0.0, 0.0, false)).logging(Logging::Silent)),
        ];
        let examples = xor();
        for trainer in &mut trainers {
            let mut network = xor_network();
            let before = network.weights();
            trainer.train(&mut network, &examples, &[], 1).unwrap();
            assert_ne!(network.weights(), before);
        }
    }
}
