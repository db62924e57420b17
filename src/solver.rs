//! Weight update rules.

/// Defines the strategy for turning a weight's gradient into a weight change.
///
/// Solvers may keep per-weight state. The `index` passed to [`update`] is the
/// weight's position in [`Network::weights`] flattened, and stays the same
/// for a weight throughout a training run.
///
/// [`update`]: #tymethod.update
/// [`Network::weights`]: ../feed_forward/struct.Network.html#method.weights
pub trait Solver {
    /// Allocates state for `num_weights` weights, discarding any previous
    /// state.
    fn init(&mut self, num_weights: usize);

    /// Returns the change to apply to weight `index`.
    ///
    /// # Arguments
    /// * `value` - The weight's current value.
    /// * `gradient` - The loss gradient with respect to the weight.
    /// * `iteration` - The current epoch, starting at 1.
    /// * `index` - The weight's position in weight order.
    fn update(&mut self, value: f64, gradient: f64, iteration: usize, index: usize) -> f64;
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn init(&mut self, num_weights: usize) {
        (**self).init(num_weights)
    }

    fn update(&mut self, value: f64, gradient: f64, iteration: usize, index: usize) -> f64 {
        (**self).update(value, gradient, iteration, index)
    }
}

/// Stochastic gradient descent with momentum and learning rate decay.
#[derive(Clone, Debug)]
pub struct Sgd {
    learning_rate: f64,
    momentum: f64,
    decay: f64,
    nesterov: bool,
    velocity: Box<[f64]>,
}

impl Sgd {
    /// Creates a new `Sgd` solver.
    ///
    /// # Arguments
    /// * `learning_rate` - The step size at the first iteration.
    /// * `momentum` - The fraction of the previous step carried into the next.
    /// * `decay` - Shrinks the step size to `learning_rate / (1 + decay * t)`.
    /// * `nesterov` - Use Nesterov's look-ahead momentum.
    pub fn new(learning_rate: f64, momentum: f64, decay: f64, nesterov: bool) -> Self {
        Sgd {
            learning_rate,
            momentum,
            decay,
            nesterov,
            velocity: Box::default(),
        }
    }
}

impl Solver for Sgd {
    fn init(&mut self, num_weights: usize) {
        self.velocity = vec![0.0; num_weights].into_boxed_slice();
    }

    fn update(&mut self, _value: f64, gradient: f64, iteration: usize, index: usize) -> f64 {
        let lr = self.learning_rate / (1.0 + self.decay * iteration as f64);
        let v = &mut self.velocity[index];
        *v = self.momentum * *v - lr * gradient;
        if self.nesterov {
            self.momentum * *v - lr * gradient
        } else {
            *v
        }
    }
}

/// The Adam solver, with bias corrected moment estimates.
#[derive(Clone, Debug)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: Box<[f64]>,
    v: Box<[f64]>,
}

impl Adam {
    /// Creates a new `Adam` solver.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2`, `epsilon` - Hyperparameters to the optimization algorithm.
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m: Box::default(),
            v: Box::default(),
        }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(0.001, 0.9, 0.999, 1e-8)
    }
}

impl Solver for Adam {
    fn init(&mut self, num_weights: usize) {
        self.m = vec![0.0; num_weights].into_boxed_slice();
        self.v = vec![0.0; num_weights].into_boxed_slice();
    }

    fn update(&mut self, _value: f64, gradient: f64, iteration: usize, index: usize) -> f64 {
        let Self {
            learning_rate: lr,
            beta1: b1,
            beta2: b2,
            epsilon: eps,
            ..
        } = *self;
        let t = iteration.max(1) as i32;
        let step_size = lr * (1.0 - b2.powi(t)).sqrt() / (1.0 - b1.powi(t));

        let m = &mut self.m[index];
        *m = b1 * *m + (1.0 - b1) * gradient;
        let v = &mut self.v[index];
        *v = b2 * *v + (1.0 - b2) * gradient * gradient;

        -step_size * self.m[index] / (self.v[index].sqrt() + eps)
    }
}
