use crate::activator::{self, Activator};
use crate::initializer::WeightSampler;
use crate::neuron::Neuron;
use crate::synapse::{Synapse, SynapseId, Synapses};

/// A wrapper for a single layer of the neural network
///
/// Every neuron in the layer shares one activation function. The synapses the
/// neurons refer to live in the network's arena.
#[derive(Clone, Debug)]
pub struct Layer {
    /// The activation function to be used for every neuron in the layer.
    activator: Activator,
    neurons: Vec<Neuron>,
}

impl Layer {
    /// Initializes a new, unconnected layer of `size` neurons.
    pub fn new(activator: Activator, size: usize) -> Self {
        let neurons = (0..size)
            .map(|_| Neuron::new(activator.for_neuron()))
            .collect();
        Layer { activator, neurons }
    }

    pub fn activator(&self) -> Activator {
        self.activator
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// Fully connects this layer to `next`, drawing each new synapse's weight
    /// from `weights`.
    pub fn connect(
        &mut self,
        next: &mut Layer,
        synapses: &mut Synapses,
        weights: &mut WeightSampler,
    ) {
        for neuron in &mut self.neurons {
            for target in &mut next.neurons {
                let id = synapses.push(Synapse::new(weights.sample()));
                neuron.outgoing.push(id);
                target.incoming.push(id);
            }
        }
    }

    /// Gives every neuron `inputs` incoming synapses with no upstream neuron.
    pub fn attach_inputs(
        &mut self,
        inputs: usize,
        synapses: &mut Synapses,
        weights: &mut WeightSampler,
    ) {
        for neuron in &mut self.neurons {
            for _ in 0..inputs {
                let id = synapses.push(Synapse::new(weights.sample()));
                neuron.incoming.push(id);
            }
        }
    }

    /// Creates and returns a bias synapse for each neuron in the layer.
    pub fn apply_bias(
        &mut self,
        synapses: &mut Synapses,
        weights: &mut WeightSampler,
    ) -> Vec<SynapseId> {
        let mut biases = Vec::with_capacity(self.neurons.len());
        for neuron in &mut self.neurons {
            let mut synapse = Synapse::new(weights.sample());
            synapse.is_bias = true;
            let id = synapses.push(synapse);
            neuron.incoming.push(id);
            biases.push(id);
        }
        biases
    }

    /// Activates every neuron and pushes the results to the next layer.
    ///
    /// A softmax layer normalizes across all of its neurons before anything
    /// is pushed onwards.
    pub fn fire(&mut self, synapses: &mut Synapses) {
        for neuron in &mut self.neurons {
            neuron.activate(synapses);
        }
        if self.activator == Activator::Softmax {
            let mut values = self.values();
            activator::softmax(&mut values);
            for (neuron, value) in self.neurons.iter_mut().zip(values) {
                neuron.value = value;
            }
        }
        for neuron in &self.neurons {
            neuron.propagate(synapses);
        }
    }

    /// The values from the last forward pass.
    pub fn values(&self) -> Vec<f64> {
        self.neurons.iter().map(|n| n.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializer::WeightInit;

    #[test]
    fn connect_shares_synapses() {
        let mut synapses = Synapses::new();
        let mut weights = WeightInit::Constant(0.5).sampler(None);
        let mut a = Layer::new(Activator::Sigmoid, 2);
        let mut b = Layer::new(Activator::Sigmoid, 3);
        a.connect(&mut b, &mut synapses, &mut weights);

        assert_eq!(synapses.len(), 6);
        for (i, neuron) in a.neurons().iter().enumerate() {
            assert_eq!(neuron.outgoing.len(), 3);
            for (j, id) in neuron.outgoing.iter().enumerate() {
                assert_eq!(b.neurons()[j].incoming[i], *id);
            }
        }
    }

    #[test]
    fn bias_is_appended_last() {
        let mut synapses = Synapses::new();
        let mut weights = WeightInit::Constant(0.1).sampler(None);
        let mut layer = Layer::new(Activator::TanH, 2);
        layer.attach_inputs(3, &mut synapses, &mut weights);
        let biases = layer.apply_bias(&mut synapses, &mut weights);

        assert_eq!(biases.len(), 2);
        for (neuron, bias) in layer.neurons().iter().zip(&biases) {
            assert_eq!(neuron.incoming.len(), 4);
            assert_eq!(neuron.incoming[3], *bias);
            assert!(synapses[*bias].is_bias);
        }
    }

    #[test]
    fn softmax_layer_normalizes() {
        let mut synapses = Synapses::new();
        let mut weights = WeightInit::Constant(1.0).sampler(None);
        let mut layer = Layer::new(Activator::Softmax, 3);
        layer.attach_inputs(1, &mut synapses, &mut weights);
        for (i, neuron) in layer.neurons().iter().enumerate() {
            synapses[neuron.incoming[0]].fire(i as f64);
        }
        layer.fire(&mut synapses);

        let values = layer.values();
        assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(values[0] < values[1] && values[1] < values[2]);
        assert!(layer.neurons().iter().all(|n| n.activator == Activator::Linear));
    }
}
