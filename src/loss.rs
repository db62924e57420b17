//! Loss function types.

use crate::error::Error;

use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clamp applied to predictions before taking logarithms.
const EPSILON: f64 = 1e-16;

/// Loss function types, selected per network.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// Categorical cross entropy, paired with a softmax output layer.
    CrossEntropy,
    /// Binary cross entropy, paired with sigmoid outputs.
    BinaryCrossEntropy,
    /// Mean squared error.
    MeanSquared,
}

impl Loss {
    /// Computes the aggregate loss of `predictions` against `targets`.
    ///
    /// Both are lists of output vectors of equal shape; a count or width
    /// mismatch is reported as [`Error::DimensionMismatch`]. An empty list has
    /// a loss of zero.
    pub fn f<P, T>(&self, predictions: &[P], targets: &[T]) -> crate::error::Result<f64>
    where
        P: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        if predictions.len() != targets.len() {
            return Err(Error::DimensionMismatch {
                what: "loss targets",
                expected: predictions.len(),
                got: targets.len(),
            });
        }
        if predictions.is_empty() {
            return Ok(0.0);
        }
        let width = predictions[0].as_ref().len();
        for (p, t) in predictions.iter().zip(targets) {
            let (p, t) = (p.as_ref(), t.as_ref());
            if p.len() != width {
                return Err(Error::DimensionMismatch {
                    what: "loss prediction",
                    expected: width,
                    got: p.len(),
                });
            }
            if t.len() != width {
                return Err(Error::DimensionMismatch {
                    what: "loss target",
                    expected: width,
                    got: t.len(),
                });
            }
        }
        let pairs = predictions.iter().zip(targets).map(|(p, t)| (p.as_ref(), t.as_ref()));
        let loss = match self {
            Loss::CrossEntropy => {
                let sum: f64 = pairs
                    .map(|(p, t)| {
                        -p.iter()
                            .zip(t)
                            .map(|(&est, &ideal)| ideal * (est + EPSILON).ln())
                            .sum::<f64>()
                    })
                    .sum();
                sum / predictions.len() as f64
            }
            Loss::BinaryCrossEntropy => {
                let sum: f64 = pairs
                    .map(|(p, t)| {
                        -p.iter()
                            .zip(t)
                            .map(|(&est, &ideal)| {
                                ideal * (est + EPSILON).ln()
                                    + (1.0 - ideal) * (1.0 - est + EPSILON).ln()
                            })
                            .sum::<f64>()
                    })
                    .sum();
                sum / predictions.len() as f64
            }
            Loss::MeanSquared => {
                let sum: f64 = pairs
                    .map(|(p, t)| {
                        p.iter()
                            .zip(t)
                            .map(|(&est, &ideal)| (est - ideal) * (est - ideal))
                            .sum::<f64>()
                    })
                    .sum();
                sum / (predictions.len() * width) as f64
            }
        };
        Ok(loss)
    }

    /// Computes the error derivative for a single output neuron.
    ///
    /// `dactivation` is the derivative of the output activation evaluated at
    /// `actual`. The cross entropy losses cancel it out against their own
    /// derivative, leaving `actual - ideal`.
    pub fn df(&self, actual: f64, ideal: f64, dactivation: f64) -> f64 {
        match self {
            Loss::CrossEntropy | Loss::BinaryCrossEntropy => actual - ideal,
            Loss::MeanSquared => dactivation * (actual - ideal),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Loss::CrossEntropy => "cross_entropy",
            Loss::BinaryCrossEntropy => "binary_cross_entropy",
            Loss::MeanSquared => "mean_squared",
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Loss {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cross_entropy" | "ce" => Ok(Loss::CrossEntropy),
            "binary_cross_entropy" | "bce" => Ok(Loss::BinaryCrossEntropy),
            "mean_squared" | "mse" => Ok(Loss::MeanSquared),
            _ => Err(Error::UnknownLoss(s.to_owned())),
        }
    }
}
