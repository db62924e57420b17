//! Measuring a network against held-out examples.

use crate::config::Mode;
use crate::data::Example;
use crate::error::Result;
use crate::feed_forward::Network;
use crate::loss::Loss;
use crate::utils::argmax;

use std::fmt;
use std::time::Duration;

/// Computes the network's loss over `validation`.
///
/// Only neuron values are touched; weights are left as they are.
pub fn cross_validate(network: &mut Network, validation: &[Example]) -> Result<f64> {
    let mut predictions = Vec::with_capacity(validation.len());
    for example in validation {
        predictions.push(network.predict(&example.input)?);
    }
    let responses: Vec<&[f64]> = validation.iter().map(|e| e.response.as_slice()).collect();
    network.config().loss_kind().f(&predictions, &responses)
}

/// Returns the fraction of `validation` whose largest output matches the
/// largest expected output. An empty set scores zero.
pub fn accuracy(network: &mut Network, validation: &[Example]) -> Result<f64> {
    if validation.is_empty() {
        return Ok(0.0);
    }
    let mut correct = 0;
    for example in validation {
        let estimate = network.predict(&example.input)?;
        if argmax(&estimate) == argmax(&example.response) {
            correct += 1;
        }
    }
    Ok(correct as f64 / validation.len() as f64)
}

/// A snapshot of training progress.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub epoch: usize,
    pub elapsed: Duration,
    pub loss_kind: Loss,
    pub loss: f64,
    /// Only reported for multi-class networks.
    pub accuracy: Option<f64>,
}

impl Stats {
    /// Measures `network` against `validation`.
    pub fn measure(
        network: &mut Network,
        validation: &[Example],
        epoch: usize,
        elapsed: Duration,
    ) -> Result<Stats> {
        let loss = cross_validate(network, validation)?;
        let accuracy = if network.config().mode == Mode::MultiClass {
            Some(accuracy(network, validation)?)
        } else {
            None
        };
        Ok(Stats {
            epoch,
            elapsed,
            loss_kind: network.config().loss_kind(),
            loss,
            accuracy,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch {}\telapsed {:.2?}\tloss ({}) {:.4}",
            self.epoch, self.elapsed, self.loss_kind, self.loss
        )?;
        if let Some(accuracy) = self.accuracy {
            write!(f, "\taccuracy {:.2}", accuracy)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activator::Activator;
    use crate::config::Config;
    use crate::initializer::WeightInit;

    fn identity_classifier() -> Network {
        let config = Config::new(2, &[2])
            .activation(Activator::Linear)
            .mode(Mode::MultiClass)
            .weight(WeightInit::Constant(0.0));
        let mut network = Network::new(&config).unwrap();
        network
            .apply_weights(&[vec![vec![1.0, 0.0], vec![0.0, 1.0]]])
            .unwrap();
        network
    }

    #[test]
    fn accuracy_counts_argmax_hits() {
        let mut network = identity_classifier();
        let validation = vec![
            Example::new(vec![2.0, 0.0], vec![1.0, 0.0]),
            Example::new(vec![0.0, 2.0], vec![0.0, 1.0]),
            Example::new(vec![0.0, 2.0], vec![1.0, 0.0]),
            Example::new(vec![3.0, 1.0], vec![1.0, 0.0]),
        ];
        assert_eq!(accuracy(&mut network, &validation).unwrap(), 0.75);
        assert_eq!(accuracy(&mut network, &[]).unwrap(), 0.0);
    }

    #[test]
    fn cross_validation_leaves_weights_alone() {
        let mut network = identity_classifier();
        let weights = network.weights();
        let validation = vec![Example::new(vec![1.0, 0.0], vec![1.0, 0.0])];
        let loss = cross_validate(&mut network, &validation).unwrap();
        // softmax([1, 0])[0] = e / (e + 1)
        let expected = -(1f64.exp() / (1f64.exp() + 1.0) + 1e-16).ln();
        assert!((loss - expected).abs() < 1e-12);
        assert_eq!(network.weights(), weights);
    }

    #[test]
    fn malformed_validation_fails() {
        let mut network = identity_classifier();
        let validation = vec![Example::new(vec![1.0], vec![1.0, 0.0])];
        assert!(cross_validate(&mut network, &validation).is_err());
    }

    #[test]
    fn stats_line() {
        let mut network = identity_classifier();
        let validation = vec![Example::new(vec![5.0, 0.0], vec![1.0, 0.0])];
        let elapsed = Duration::from_millis(1500);
        let stats = Stats::measure(&mut network, &validation, 10, elapsed).unwrap();
        assert_eq!(stats.accuracy, Some(1.0));
        let line = stats.to_string();
        assert!(line.starts_with("epoch 10\telapsed 1.50s\tloss (cross_entropy) "), "{}", line);
        assert!(line.ends_with("\taccuracy 1.00"), "{}", line);
    }
}
