//! Errors raised while building, running, training or restoring a network.

use std::{
    error,
    fmt::{self, Display},
};

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate's error type.
///
/// Configuration variants are raised at construction time and mean no network
/// can be built for that configuration. The remaining variants are reported
/// per call and leave the network untouched.
#[derive(Debug)]
pub enum Error {
    /// The configuration declares zero inputs.
    NoInputs,
    /// The configuration declares no layers.
    EmptyLayout,
    /// A layer in the layout has zero neurons.
    EmptyLayer { layer: usize },
    /// An activation kind name that is not recognized.
    UnknownActivation(String),
    /// A loss kind name that is not recognized.
    UnknownLoss(String),
    /// An output mode name that is not recognized.
    UnknownMode(String),
    /// Softmax was requested for a layer that is not the output layer.
    HiddenSoftmax,
    /// The weight initializer parameters cannot be sampled from.
    InvalidInitializer(String),
    /// A vector's length does not match what the network expects.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// A weight table does not match the network topology.
    WeightShape {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// A persisted payload could not be decoded.
    Deserialize(serde_json::Error),
    /// A persisted payload could not be encoded.
    Serialize(serde_json::Error),
    /// A weight is NaN or infinite and has no JSON representation.
    NonFiniteWeight {
        layer: usize,
        neuron: usize,
        synapse: usize,
    },
    /// A batch worker stopped responding before the batch completed.
    WorkerDisconnected { worker: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoInputs => {
                f.write_str("invalid configuration: the network needs at least one input")
            }
            Error::EmptyLayout => f.write_str("invalid configuration: the layout has no layers"),
            Error::EmptyLayer { layer } => {
                write!(f, "invalid configuration: layer {layer} has no neurons")
            }
            Error::UnknownActivation(name) => write!(f, "unknown activation kind {name:?}"),
            Error::UnknownLoss(name) => write!(f, "unknown loss kind {name:?}"),
            Error::UnknownMode(name) => write!(f, "unknown output mode {name:?}"),
            Error::HiddenSoftmax => {
                f.write_str("invalid configuration: softmax is only supported on the output layer")
            }
            Error::InvalidInitializer(reason) => {
                write!(f, "invalid weight initializer: {reason}")
            }
            Error::DimensionMismatch {
                what,
                expected,
                got,
            } => write!(f, "invalid {what} dimension - expected: {expected} got: {got}"),
            Error::WeightShape {
                what,
                expected,
                got,
            } => write!(f, "weight table mismatch in {what} - expected: {expected} got: {got}"),
            Error::Deserialize(err) => write!(f, "failed to decode network dump: {err}"),
            Error::Serialize(err) => write!(f, "failed to encode network dump: {err}"),
            Error::NonFiniteWeight {
                layer,
                neuron,
                synapse,
            } => write!(
                f,
                "failed to encode network dump: weight [{layer}][{neuron}][{synapse}] is not finite"
            ),
            Error::WorkerDisconnected { worker } => {
                write!(f, "batch worker {worker} disconnected before finishing its batch")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Deserialize(err) | Error::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl Error {
    /// Returns true for errors raised while validating a configuration.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::NoInputs
                | Error::EmptyLayout
                | Error::EmptyLayer { .. }
                | Error::UnknownActivation(_)
                | Error::UnknownLoss(_)
                | Error::UnknownMode(_)
                | Error::HiddenSoftmax
                | Error::InvalidInitializer(_)
        )
    }
}
