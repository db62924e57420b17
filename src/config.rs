//! Network configuration.

use crate::activator::Activator;
use crate::error::{Error, Result};
use crate::initializer::WeightInit;
use crate::loss::Loss;

use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of output a network produces, which picks the output layer's
/// activation and the default loss.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The output layer uses the configured activation.
    #[default]
    Default,
    /// A single yes/no output.
    Binary,
    /// Exactly one of several classes.
    MultiClass,
    /// Any number of several independent labels.
    MultiLabel,
    /// Unbounded real-valued outputs.
    Regression,
}

impl Mode {
    /// The activation the output layer uses in this mode, if the mode
    /// overrides the configured one.
    pub fn output_activator(&self) -> Option<Activator> {
        match self {
            Mode::Default => None,
            Mode::Binary | Mode::MultiLabel => Some(Activator::Sigmoid),
            Mode::MultiClass => Some(Activator::Softmax),
            Mode::Regression => Some(Activator::Linear),
        }
    }

    /// The loss used when none is configured.
    pub fn default_loss(&self) -> Loss {
        match self {
            Mode::MultiClass | Mode::MultiLabel => Loss::CrossEntropy,
            Mode::Binary => Loss::BinaryCrossEntropy,
            Mode::Default | Mode::Regression => Loss::MeanSquared,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Binary => "binary",
            Mode::MultiClass => "multi_class",
            Mode::MultiLabel => "multi_label",
            Mode::Regression => "regression",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Mode::Default),
            "binary" => Ok(Mode::Binary),
            "multi_class" => Ok(Mode::MultiClass),
            "multi_label" => Ok(Mode::MultiLabel),
            "regression" => Ok(Mode::Regression),
            _ => Err(Error::UnknownMode(s.to_owned())),
        }
    }
}

/// Describes the shape and behaviour of a network.
///
/// ```
/// # use neuroflow::config::{Config, Mode};
/// # use neuroflow::activator::Activator;
/// let config = Config::new(4, &[5, 1])
///     .activation(Activator::Sigmoid)
///     .mode(Mode::Binary)
///     .bias(true)
///     .seed(0);
/// assert_eq!(config.resolved().loss.map(|l| l.name()), Some("binary_cross_entropy"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The number of network inputs.
    pub inputs: usize,
    /// The number of neurons in each layer, output layer last.
    pub layout: Vec<usize>,
    /// Activation for every layer but a mode-overridden output layer.
    /// Sigmoid when unset.
    #[serde(default)]
    pub activation: Option<Activator>,
    #[serde(default)]
    pub mode: Mode,
    /// Derived from `mode` when unset.
    #[serde(default)]
    pub loss: Option<Loss>,
    #[serde(default)]
    pub weight: WeightInit,
    /// Adds a constant-input bias synapse to each neuron.
    #[serde(default)]
    pub bias: bool,
    /// Seeds weight initialization.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Config {
    /// Creates a configuration with `inputs` inputs and the given layer sizes.
    ///
    /// The defaults are:
    ///
    /// * A sigmoid activation function.
    /// * The default output mode.
    /// * Uniform weights with a spread of 0.5 around zero.
    /// * No bias synapses.
    pub fn new(inputs: usize, layout: &[usize]) -> Self {
        Config {
            inputs,
            layout: layout.into(),
            activation: None,
            mode: Mode::Default,
            loss: None,
            weight: WeightInit::default(),
            bias: false,
            seed: None,
        }
    }

    /// Sets the activation function to use in the network.
    pub fn activation(mut self, activation: Activator) -> Self {
        self.activation = Some(activation);
        self
    }

    /// Sets the output mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the mode-derived loss.
    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = Some(loss);
        self
    }

    /// Sets the weight initializer.
    pub fn weight(mut self, weight: WeightInit) -> Self {
        self.weight = weight;
        self
    }

    pub fn bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Makes weight initialization reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns a copy with every defaulted field filled in.
    ///
    /// Resolving an already resolved configuration returns it unchanged, so
    /// restoring a dumped network never changes its activation or loss.
    pub fn resolved(&self) -> Config {
        let mut config = self.clone();
        config.activation.get_or_insert(Activator::Sigmoid);
        config.loss.get_or_insert(config.mode.default_loss());
        config
    }

    /// Verifies that a network can be built from this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.inputs == 0 {
            return Err(Error::NoInputs);
        }
        if self.layout.is_empty() {
            return Err(Error::EmptyLayout);
        }
        if let Some(layer) = self.layout.iter().position(|&size| size == 0) {
            return Err(Error::EmptyLayer { layer });
        }
        let hidden_softmax = self.layout.len() > 1
            && self.activation == Some(Activator::Softmax);
        if hidden_softmax {
            return Err(Error::HiddenSoftmax);
        }
        self.weight.validate()
    }

    /// The activation layer `index` uses.
    ///
    /// Only meaningful on a resolved configuration.
    pub fn layer_activator(&self, index: usize) -> Activator {
        let configured = self.activation.unwrap_or(Activator::Sigmoid);
        if index + 1 == self.layout.len() {
            self.mode.output_activator().unwrap_or(configured)
        } else {
            configured
        }
    }

    /// The loss this configuration trains against.
    pub fn loss_kind(&self) -> Loss {
        self.loss.unwrap_or_else(|| self.mode.default_loss())
    }

    /// Whether layer `index` receives bias synapses.
    ///
    /// Every layer does when biases are enabled, except the output layer of
    /// a regression network.
    pub fn layer_has_bias(&self, index: usize) -> bool {
        self.bias && !(self.mode == Mode::Regression && index + 1 == self.layout.len())
    }
}
