//! Activation function types.

use crate::error::Error;

use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activator {
    /// Identity function
    Linear,
    /// Rectified Linear Unit
    #[serde(rename = "relu")]
    ReLU,
    /// Leaky Rectified Linear Unit
    ///
    /// Takes an `alpha` value to use for negative inputs.
    #[serde(rename = "leaky_relu")]
    LeakyReLU(f64),
    /// Sigmoid function
    Sigmoid,
    /// Hyperbolic tan function
    #[serde(rename = "tanh")]
    TanH,
    /// Softmax over a whole layer.
    ///
    /// Softmax needs every output of the layer, so the neurons themselves
    /// stay linear and the layer normalizes with [`softmax`] after firing.
    Softmax,
}

impl Activator {
    /// Evaluates `f(x)` for the selected the activation function.
    pub fn f(&self, x: f64) -> f64 {
        match *self {
            Activator::Linear | Activator::Softmax => x,
            Activator::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            Activator::LeakyReLU(alpha) => {
                if x > 0.0 {
                    x
                } else {
                    alpha * x
                }
            }
            Activator::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activator::TanH => 2.0 / (1.0 + (-2.0 * x).exp()) - 1.0,
        }
    }

    /// Evaluates the derivative `f'(x)`, where `x = f^{-1}(y)`.
    ///
    /// Note that this function takes in the *output* of the activation
    /// function, rather than the input. This is an optimization that means we
    /// don't have to store the intermediate results before activation.
    pub fn fprime(&self, y: f64) -> f64 {
        match *self {
            Activator::Linear | Activator::Softmax => 1.0,
            Activator::ReLU => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activator::LeakyReLU(alpha) => {
                if y > 0.0 {
                    1.0
                } else {
                    alpha
                }
            }
            Activator::Sigmoid => y * (1.0 - y),
            Activator::TanH => 1.0 - y * y,
        }
    }

    /// The activation each individual neuron of a layer applies.
    pub(crate) fn for_neuron(self) -> Activator {
        match self {
            Activator::Softmax => Activator::Linear,
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activator::Linear => "linear",
            Activator::ReLU => "relu",
            Activator::LeakyReLU(_) => "leaky_relu",
            Activator::Sigmoid => "sigmoid",
            Activator::TanH => "tanh",
            Activator::Softmax => "softmax",
        }
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activator {
    type Err = Error;

    /// Parses an activation kind by name. `leaky_relu` uses an alpha of 0.01.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "identity" => Ok(Activator::Linear),
            "relu" => Ok(Activator::ReLU),
            "leaky_relu" => Ok(Activator::LeakyReLU(0.01)),
            "sigmoid" => Ok(Activator::Sigmoid),
            "tanh" => Ok(Activator::TanH),
            "softmax" => Ok(Activator::Softmax),
            _ => Err(Error::UnknownActivation(s.to_owned())),
        }
    }
}

/// Normalizes `values` in place into a probability distribution.
///
/// The maximum is subtracted before exponentiating so large inputs don't
/// overflow.
pub fn softmax(values: &mut [f64]) {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}
