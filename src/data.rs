//! Labelled training data.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_derive::{Deserialize, Serialize};
use std::iter::FromIterator;
use std::ops::{Deref, DerefMut};

/// A single labelled training instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: Vec<f64>,
    pub response: Vec<f64>,
}

impl Example {
    pub fn new(input: Vec<f64>, response: Vec<f64>) -> Self {
        Example { input, response }
    }
}

/// A collection of examples.
///
/// Dereferences to `[Example]`, so it can be passed anywhere a slice of
/// examples is expected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Examples(Vec<Example>);

impl Examples {
    /// Randomizes the order of the examples in place.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.0.shuffle(rng);
    }

    /// Splits the examples into contiguous batches of `size`. The last batch
    /// is shorter when `size` doesn't divide the collection evenly.
    ///
    /// A `size` of zero is treated as one.
    pub fn split_size(&self, size: usize) -> Vec<&[Example]> {
        self.0.chunks(size.max(1)).collect()
    }

    /// Splits off the first `round(p * len)` examples, for example into a
    /// training and a validation set. `p` is clamped to `[0, 1]`.
    pub fn split(mut self, p: f64) -> (Examples, Examples) {
        let p = p.clamp(0.0, 1.0);
        let at = (p * self.0.len() as f64).round() as usize;
        let rest = self.0.split_off(at);
        (self, Examples(rest))
    }

    pub fn into_inner(self) -> Vec<Example> {
        self.0
    }
}

impl Deref for Examples {
    type Target = [Example];

    fn deref(&self) -> &[Example] {
        &self.0
    }
}

impl DerefMut for Examples {
    fn deref_mut(&mut self) -> &mut [Example] {
        &mut self.0
    }
}

impl From<Vec<Example>> for Examples {
    fn from(examples: Vec<Example>) -> Self {
        Examples(examples)
    }
}

impl FromIterator<Example> for Examples {
    fn from_iter<I: IntoIterator<Item = Example>>(iter: I) -> Self {
        Examples(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Examples {
    type Item = &'a Example;
    type IntoIter = std::slice::Iter<'a, Example>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
