use super::{cancelled, shuffle_rng, validate, Logging, Trainer};
use crate::data::{Example, Examples};
use crate::error::Result;
use crate::feed_forward::Network;
use crate::solver::Solver;
use crate::utils::ZeroOut;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// Trains a network one example at a time, taking a solver step after
/// every example.
///
/// Examples are reshuffled at the start of every epoch.
pub struct OnlineTrainer<S: Solver> {
    solver: S,
    logging: Logging,
    seed: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: Solver> OnlineTrainer<S> {
    /// Creates a new trainer stepping with `solver`.
    pub fn new(solver: S) -> Self {
        OnlineTrainer {
            solver,
            logging: Logging::Completion,
            seed: None,
            cancel: None,
        }
    }

    /// Sets the logging frequency. Defaults to `Logging::Completion`.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Seeds the shuffling between epochs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Training stops before the next example once `flag` is set.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

impl<S: Solver> Trainer for OnlineTrainer<S> {
    fn train(
        &mut self,
        network: &mut Network,
        examples: &[Example],
        validation: &[Example],
        iterations: usize,
    ) -> Result<()> {
        validate(network, examples)?;
        validate(network, validation)?;

        let start_time = Instant::now();
        let mut train: Examples = examples.to_vec().into();
        let mut rng = shuffle_rng(self.seed);
        let mut deltas = network.empty_deltas();
        let mut gradients = vec![0.0; network.num_weights()];
        self.solver.init(gradients.len());

        let mut completed = 0;
        'epochs: for iteration in 1..=iterations {
            train.shuffle(&mut rng);
            for example in train.iter() {
                if cancelled(&self.cancel) {
                    log::debug!("Training cancelled during epoch {}", iteration);
                    break 'epochs;
                }
                network.forward(&example.input)?;
                network.backpropagate(&example.response, &mut deltas);
                gradients.zero_out();
                network.accumulate_gradients(&deltas, &mut gradients);
                network.descend(&mut self.solver, &gradients, iteration);
            }
            completed = iteration;
            self.logging.iteration(network, validation, iteration, start_time)?;
        }

        self.logging.completion(network, validation, completed, start_time)
    }
}
