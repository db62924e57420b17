/// Index of a synapse in its network's synapse arena.
///
/// A synapse is shared by two neurons: it is an outgoing edge of its source
/// and an incoming edge of its destination. Both neurons hold the same id, so
/// a weight written through one side is seen by the other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SynapseId(usize);

/// A weighted edge, remembering the last value fired through it.
#[derive(Clone, Debug, PartialEq)]
pub struct Synapse {
    pub weight: f64,
    /// The last value fired into the synapse.
    pub input: f64,
    /// `input * weight` as of the last firing.
    pub output: f64,
    pub is_bias: bool,
}

impl Synapse {
    pub fn new(weight: f64) -> Self {
        Synapse {
            weight,
            input: 0.0,
            output: 0.0,
            is_bias: false,
        }
    }

    pub fn fire(&mut self, value: f64) {
        self.input = value;
        self.output = value * self.weight;
    }
}

/// Owns every synapse of a network.
#[derive(Clone, Debug, Default)]
pub struct Synapses {
    arena: Vec<Synapse>,
}

impl Synapses {
    pub fn new() -> Self {
        Synapses::default()
    }

    /// Adds a synapse, returning its stable id.
    pub fn push(&mut self, synapse: Synapse) -> SynapseId {
        self.arena.push(synapse);
        SynapseId(self.arena.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }
}

impl std::ops::Index<SynapseId> for Synapses {
    type Output = Synapse;

    fn index(&self, id: SynapseId) -> &Synapse {
        &self.arena[id.0]
    }
}

impl std::ops::IndexMut<SynapseId> for Synapses {
    fn index_mut(&mut self, id: SynapseId) -> &mut Synapse {
        &mut self.arena[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_records_input_and_output() {
        let mut synapse = Synapse::new(0.5);
        synapse.fire(3.0);
        assert_eq!(synapse.input, 3.0);
        assert_eq!(synapse.output, 1.5);
    }

    #[test]
    fn ids_are_shared_handles() {
        let mut synapses = Synapses::new();
        let id = synapses.push(Synapse::new(1.0));
        let (source_side, destination_side) = (id, id);
        synapses[source_side].weight = -2.0;
        assert_eq!(synapses[destination_side].weight, -2.0);
        assert_eq!(synapses.len(), 1);
    }
}
