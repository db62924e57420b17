use crate::activator::Activator;
use crate::synapse::{SynapseId, Synapses};

/// A summation and activation unit.
#[derive(Clone, Debug)]
pub struct Neuron {
    pub activator: Activator,
    pub incoming: Vec<SynapseId>,
    pub outgoing: Vec<SynapseId>,
    /// The activated value from the last forward pass.
    pub value: f64,
}

impl Neuron {
    pub fn new(activator: Activator) -> Self {
        Neuron {
            activator,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            value: 0.0,
        }
    }

    /// Sums the incoming synapse outputs and applies the activation.
    pub fn activate(&mut self, synapses: &Synapses) {
        let sum: f64 = self.incoming.iter().map(|&id| synapses[id].output).sum();
        self.value = self.activator.f(sum);
    }

    /// Pushes the current value through every outgoing synapse.
    pub fn propagate(&self, synapses: &mut Synapses) {
        for &id in &self.outgoing {
            synapses[id].fire(self.value);
        }
    }

    /// The activation derivative at the current value.
    pub fn dactivate(&self) -> f64 {
        self.activator.fprime(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synapse::Synapse;

    #[test]
    fn activate_then_propagate() {
        let mut synapses = Synapses::new();
        let a = synapses.push(Synapse::new(0.5));
        let b = synapses.push(Synapse::new(-1.0));
        let out = synapses.push(Synapse::new(2.0));
        synapses[a].fire(4.0);
        synapses[b].fire(1.0);

        let mut neuron = Neuron::new(Activator::ReLU);
        neuron.incoming = vec![a, b];
        neuron.outgoing = vec![out];
        neuron.activate(&synapses);
        assert_eq!(neuron.value, 1.0);

        neuron.propagate(&mut synapses);
        assert_eq!(synapses[out].input, 1.0);
        assert_eq!(synapses[out].output, 2.0);
        assert_eq!(neuron.dactivate(), 1.0);
    }
}
