//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network).
//!
//! # Example
//!
//! Let's train a simple neural network to compute the XOR function:
//!
//! ```
//! # use neuroflow::activator::Activator;
//! # use neuroflow::config::{Config, Mode};
//! # use neuroflow::data::{Example, Examples};
//! # use neuroflow::feed_forward::Network;
//! # use neuroflow::solver::Sgd;
//! # use neuroflow::trainer::{Logging, OnlineTrainer, Trainer};
//! // Create examples of the XOR function
//! let examples: Examples = vec![
//!     Example::new(vec![0.0, 0.0], vec![0.0]),
//!     Example::new(vec![0.0, 1.0], vec![1.0]),
//!     Example::new(vec![1.0, 0.0], vec![1.0]),
//!     Example::new(vec![1.0, 1.0], vec![0.0]),
//! ]
//! .into();
//!
//! let config = Config::new(2, &[2, 1])
//!     .activation(Activator::Sigmoid)
//!     .mode(Mode::Binary)
//!     .bias(true);
//! let mut network = Network::new(&config).unwrap();
//!
//! // Two hidden neurons can get stuck on XOR, so start from known weights.
//! network
//!     .apply_weights(&[
//!         vec![vec![0.8, -0.6, 0.2], vec![-0.7, 0.9, -0.1]],
//!         vec![vec![0.6, 0.5, -0.3]],
//!     ])
//!     .unwrap();
//!
//! OnlineTrainer::new(Sgd::new(0.5, 0.5, 0.0, false))
//!     .logging(Logging::Silent)
//!     .seed(1)
//!     .train(&mut network, &examples, &[], 3000)
//!     .unwrap();
//!
//! // And verify the network correctly computes XOR!
//! fn classify(out: Vec<f64>) -> bool {
//!     out[0] > 0.5
//! }
//! assert_eq!(classify(network.predict(&[0.0, 0.0]).unwrap()), false);
//! assert_eq!(classify(network.predict(&[0.0, 1.0]).unwrap()), true);
//! assert_eq!(classify(network.predict(&[1.0, 0.0]).unwrap()), true);
//! assert_eq!(classify(network.predict(&[1.0, 1.0]).unwrap()), false);
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::solver::Solver;
use crate::synapse::{SynapseId, Synapses};
use crate::utils::{Back, Front};

use itertools::{multizip, Itertools};
use std::fmt;

/// A three level weight table indexed by `[layer][neuron][incoming synapse]`.
pub type Weights = Vec<Vec<Vec<f64>>>;

/// A Feedforward neural network
#[derive(Clone, Debug)]
pub struct Network {
    /// The resolved configuration the network was built from.
    config: Config,
    synapses: Synapses,
    layers: Vec<Layer>,
    /// Bias synapses per layer; empty for layers without bias.
    biases: Vec<Vec<SynapseId>>,
}

impl Network {
    /// Builds a new, untrained network.
    ///
    /// Every layer is fully connected to the next one. The first layer gets
    /// one incoming synapse per input, and bias synapses are appended after
    /// all other incoming synapses.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let config = config.resolved();
        let mut weights = config.weight.sampler(config.seed);
        let mut synapses = Synapses::new();

        let mut layers: Vec<Layer> = config
            .layout
            .iter()
            .enumerate()
            .map(|(i, &size)| Layer::new(config.layer_activator(i), size))
            .collect();

        for i in 0..layers.len() - 1 {
            let (current, rest) = layers[i..].split_at_mut(1);
            current[0].connect(&mut rest[0], &mut synapses, &mut weights);
        }
        layers[0].attach_inputs(config.inputs, &mut synapses, &mut weights);

        let biases = layers
            .iter_mut()
            .enumerate()
            .map(|(i, layer)| {
                if config.layer_has_bias(i) {
                    layer.apply_bias(&mut synapses, &mut weights)
                } else {
                    Vec::new()
                }
            })
            .collect();

        log::debug!(
            "built network with {} inputs, layout {:?}, {} synapses",
            config.inputs,
            config.layout,
            synapses.len()
        );
        Ok(Network {
            config,
            synapses,
            layers,
            biases,
        })
    }

    /// The resolved configuration the network was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the size of the input layer to the network.
    pub fn input_len(&self) -> usize {
        self.config.inputs
    }

    /// Returns the size of the output layer from the network.
    pub fn output_len(&self) -> usize {
        self.layers.back().len()
    }

    /// Feeds `input` through the network.
    ///
    /// On success every neuron holds its activated value. An input of the
    /// wrong length is rejected before anything in the network changes.
    pub fn forward(&mut self, input: &[f64]) -> Result<()> {
        if input.len() != self.config.inputs {
            return Err(Error::DimensionMismatch {
                what: "input",
                expected: self.config.inputs,
                got: input.len(),
            });
        }
        for neuron in self.layers.front().neurons() {
            for (&id, &x) in neuron.incoming.iter().zip(input) {
                self.synapses[id].fire(x);
            }
        }
        for &id in self.biases.iter().flatten() {
            self.synapses[id].fire(1.0);
        }
        for layer in &mut self.layers {
            layer.fire(&mut self.synapses);
        }
        Ok(())
    }

    /// Runs a forward pass and returns the output layer.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.forward(input)?;
        Ok(self.output())
    }

    /// The output layer values from the last forward pass.
    pub fn output(&self) -> Vec<f64> {
        self.layers.back().values()
    }

    /// Returns the number of weights in the network.
    pub fn num_weights(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|l| l.neurons())
            .map(|n| n.incoming.len())
            .sum()
    }

    /// Returns every weight, ordered by layer, then neuron, then incoming
    /// synapse.
    ///
    /// Flattening this table gives the weight index solvers are called with.
    pub fn weights(&self) -> Weights {
        self.layers
            .iter()
            .map(|layer| {
                layer
                    .neurons()
                    .iter()
                    .map(|n| n.incoming.iter().map(|&id| self.synapses[id].weight).collect())
                    .collect()
            })
            .collect()
    }

    /// Overwrites every weight from a table laid out like [`weights`].
    ///
    /// The table's shape is checked before any weight is written.
    ///
    /// [`weights`]: #method.weights
    pub fn apply_weights(&mut self, weights: &[Vec<Vec<f64>>]) -> Result<()> {
        self.check_shape(weights)?;
        for (layer, layer_weights) in self.layers.iter().zip(weights) {
            for (neuron, neuron_weights) in layer.neurons().iter().zip(layer_weights) {
                for (&id, &w) in neuron.incoming.iter().zip(neuron_weights) {
                    self.synapses[id].weight = w;
                }
            }
        }
        Ok(())
    }

    fn check_shape(&self, weights: &[Vec<Vec<f64>>]) -> Result<()> {
        if weights.len() != self.layers.len() {
            return Err(Error::WeightShape {
                what: "layers",
                expected: self.layers.len(),
                got: weights.len(),
            });
        }
        for (layer, layer_weights) in self.layers.iter().zip(weights) {
            if layer_weights.len() != layer.len() {
                return Err(Error::WeightShape {
                    what: "neurons",
                    expected: layer.len(),
                    got: layer_weights.len(),
                });
            }
            for (neuron, neuron_weights) in layer.neurons().iter().zip(layer_weights) {
                if neuron_weights.len() != neuron.incoming.len() {
                    return Err(Error::WeightShape {
                        what: "synapses",
                        expected: neuron.incoming.len(),
                        got: neuron_weights.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Incoming synapses in weight index order, with their layer and neuron.
    fn incoming(&self) -> impl Iterator<Item = (usize, usize, SynapseId)> + '_ {
        self.layers.iter().enumerate().flat_map(|(i, layer)| {
            layer
                .neurons()
                .iter()
                .enumerate()
                .flat_map(move |(j, n)| n.incoming.iter().map(move |&id| (i, j, id)))
        })
    }

    /// Returns a zeroed per-neuron delta table.
    pub(crate) fn empty_deltas(&self) -> Vec<Vec<f64>> {
        self.layers.iter().map(|l| vec![0.0; l.len()]).collect()
    }

    /// Computes every neuron's error delta for the last forward pass against
    /// the `ideal` output.
    pub(crate) fn backpropagate(&self, ideal: &[f64], deltas: &mut [Vec<f64>]) {
        debug_assert_eq!(ideal.len(), self.output_len());
        let loss = self.config.loss_kind();
        for (neuron, &target, delta) in multizip((
            self.layers.back().neurons().iter(),
            ideal.iter(),
            deltas.mut_back().iter_mut(),
        )) {
            *delta = loss.df(neuron.value, target, neuron.dactivate());
        }

        for i in (0..self.layers.len() - 1).rev() {
            let (current, next) = deltas[i..].split_at_mut(1);
            let (current, next) = (&mut current[0], &next[0]);
            for (neuron, delta) in self.layers[i].neurons().iter().zip(current.iter_mut()) {
                let sum: f64 = neuron
                    .outgoing
                    .iter()
                    .zip(next.iter())
                    .map(|(&id, d)| self.synapses[id].weight * d)
                    .sum();
                *delta = neuron.dactivate() * sum;
            }
        }
    }

    /// Adds each weight's gradient for the current `deltas` into `gradients`,
    /// indexed in weight order.
    pub(crate) fn accumulate_gradients(&self, deltas: &[Vec<f64>], gradients: &mut [f64]) {
        debug_assert_eq!(gradients.len(), self.num_weights());
        for ((i, j, id), gradient) in self.incoming().zip(gradients.iter_mut()) {
            *gradient += deltas[i][j] * self.synapses[id].input;
        }
    }

    /// Applies one solver step to every weight using `gradients`.
    pub(crate) fn descend<S>(&mut self, solver: &mut S, gradients: &[f64], iteration: usize)
    where
        S: Solver + ?Sized,
    {
        let ids: Vec<SynapseId> = self.incoming().map(|(_, _, id)| id).collect();
        for (index, (id, &gradient)) in ids.into_iter().zip(gradients).enumerate() {
            let synapse = &mut self.synapses[id];
            synapse.weight += solver.update(synapse.weight, gradient, iteration, index);
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (layer, weights) in self.layers.iter().zip(self.weights()) {
            writeln!(
                f,
                "{} [{}]",
                layer.activator(),
                weights.iter().map(|n| format!("{:?}", n)).format(", ")
            )?;
        }
        Ok(())
    }
}
