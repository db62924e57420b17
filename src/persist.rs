//! Saving and restoring trained networks.
//!
//! A [`Dump`] holds the configuration a network was built from together with
//! its weight table. Topology is rebuilt from the configuration on restore,
//! so the weights are the only learned state that is stored.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed_forward::{Network, Weights};

use serde_derive::{Deserialize, Serialize};

/// A serializable snapshot of a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dump {
    pub config: Config,
    /// Laid out like [`Network::weights`].
    pub weights: Weights,
}

impl Network {
    /// Takes a snapshot of the network.
    pub fn dump(&self) -> Dump {
        Dump {
            config: self.config().clone(),
            weights: self.weights(),
        }
    }

    /// Rebuilds a network from `dump`.
    ///
    /// Fails if the configuration is invalid or the weight table doesn't fit
    /// the topology it describes.
    pub fn from_dump(dump: &Dump) -> Result<Network> {
        let mut network = Network::new(&dump.config)?;
        network.apply_weights(&dump.weights)?;
        Ok(network)
    }

    /// Encodes the network as JSON.
    ///
    /// JSON has no NaN or infinity, so a network with a non-finite weight is
    /// refused with [`Error::NonFiniteWeight`] instead of producing a payload
    /// [`unmarshal`](#method.unmarshal) cannot read.
    pub fn marshal(&self) -> Result<Vec<u8>> {
        let dump = self.dump();
        check_finite(&dump.weights)?;
        serde_json::to_vec(&dump).map_err(Error::Serialize)
    }

    /// Decodes a network produced by [`marshal`](#method.marshal).
    pub fn unmarshal(bytes: &[u8]) -> Result<Network> {
        let dump: Dump = serde_json::from_slice(bytes).map_err(Error::Deserialize)?;
        Network::from_dump(&dump)
    }
}

fn check_finite(weights: &Weights) -> Result<()> {
    for (layer, neurons) in weights.iter().enumerate() {
        for (neuron, synapses) in neurons.iter().enumerate() {
            if let Some(synapse) = synapses.iter().position(|w| !w.is_finite()) {
                return Err(Error::NonFiniteWeight {
                    layer,
                    neuron,
                    synapse,
                });
            }
        }
    }
    Ok(())
}
