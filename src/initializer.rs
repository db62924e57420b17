//! Starting weights for new synapses.

use crate::error::{Error, Result};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde_derive::{Deserialize, Serialize};

/// Describes how the starting weight of every synapse is drawn.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// `(u - 0.5) * std_dev + mean` with `u` uniform in `[0, 1)`.
    Uniform { std_dev: f64, mean: f64 },
    /// `n * std_dev + mean` with `n` drawn from a standard normal.
    Normal { std_dev: f64, mean: f64 },
    /// Every weight starts at the same value.
    Constant(f64),
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::Uniform {
            std_dev: 0.5,
            mean: 0.0,
        }
    }
}

impl WeightInit {
    /// Checks that the parameters describe a samplable distribution.
    pub fn validate(&self) -> Result<()> {
        let (std_dev, mean) = match *self {
            WeightInit::Uniform { std_dev, mean } | WeightInit::Normal { std_dev, mean } => {
                (std_dev, mean)
            }
            WeightInit::Constant(value) => (0.0, value),
        };
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(Error::InvalidInitializer(format!(
                "standard deviation must be finite and non-negative, got {std_dev}"
            )));
        }
        if !mean.is_finite() {
            return Err(Error::InvalidInitializer(format!("mean must be finite, got {mean}")));
        }
        Ok(())
    }

    /// Creates a sampler for this initializer. A `seed` makes the sequence
    /// of weights reproducible.
    pub fn sampler(&self, seed: Option<u64>) -> WeightSampler {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        WeightSampler { init: *self, rng }
    }
}

/// Draws successive starting weights from a [`WeightInit`].
#[derive(Debug)]
pub struct WeightSampler {
    init: WeightInit,
    rng: StdRng,
}

impl WeightSampler {
    pub fn sample(&mut self) -> f64 {
        match self.init {
            WeightInit::Uniform { std_dev, mean } => {
                (self.rng.random::<f64>() - 0.5) * std_dev + mean
            }
            WeightInit::Normal { std_dev, mean } => {
                let n: f64 = self.rng.sample(StandardNormal);
                n * std_dev + mean
            }
            WeightInit::Constant(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_in_range() {
        let mut sampler = WeightInit::Uniform {
            std_dev: 2.0,
            mean: 1.0,
        }
        .sampler(Some(7));
        for _ in 0..1000 {
            let w = sampler.sample();
            assert!((0.0..2.0).contains(&w), "{}", w);
        }
    }

    #[test]
    fn seeded_samplers_repeat() {
        let init = WeightInit::Normal {
            std_dev: 1.0,
            mean: 0.0,
        };
        let mut a = init.sampler(Some(42));
        let mut b = init.sampler(Some(42));
        for _ in 0..16 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn constant() {
        let mut sampler = WeightInit::Constant(0.25).sampler(None);
        assert_eq!(sampler.sample(), 0.25);
    }

    #[test]
    fn rejects_bad_parameters() {
        let init = WeightInit::Normal {
            std_dev: -1.0,
            mean: 0.0,
        };
        assert!(matches!(init.validate(), Err(Error::InvalidInitializer(_))));
        assert!(WeightInit::Constant(f64::NAN).validate().is_err());
        assert!(WeightInit::default().validate().is_ok());
    }
}
