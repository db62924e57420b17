use super::{cancelled, shuffle_rng, validate, Logging, Trainer};
use crate::data::Example;
use crate::error::{Error, Result};
use crate::feed_forward::{Network, Weights};
use crate::solver::Solver;
use crate::utils::ZeroOut;

use rand::seq::SliceRandom;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::{mem, thread};
use std::time::Instant;

/// Trains a network in mini-batches spread over a pool of worker threads.
///
/// Every worker owns a replica of the network. At the start of a batch the
/// replicas receive the master's current weights, examples are dealt out
/// round-robin, and each worker accumulates gradients for its share. Once
/// every worker has reported, the gradients are summed in worker order and a
/// single solver step is applied to the master network.
///
/// With a batch size of one the result is identical to the
/// [`OnlineTrainer`](super::OnlineTrainer) given the same seed.
pub struct BatchTrainer<S: Solver> {
    solver: S,
    batch_size: usize,
    parallelism: usize,
    logging: Logging,
    seed: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<S: Solver> BatchTrainer<S> {
    /// Creates a new trainer stepping with `solver`. Batches default to 32
    /// examples spread over as many workers as the machine has cores.
    pub fn new(solver: S) -> Self {
        BatchTrainer {
            solver,
            batch_size: 32,
            parallelism: thread::available_parallelism().map_or(1, |n| n.get()),
            logging: Logging::Completion,
            seed: None,
            cancel: None,
        }
    }

    /// Sets the number of examples per solver step. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the number of worker threads. Zero is treated as one.
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Sets the logging frequency. Defaults to `Logging::Completion`.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Seeds the shuffling between epochs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Training stops before the next batch once `flag` is set.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

impl<S: Solver> Trainer for BatchTrainer<S> {
    fn train(
        &mut self,
        network: &mut Network,
        examples: &[Example],
        validation: &[Example],
        iterations: usize,
    ) -> Result<()> {
        validate(network, examples)?;
        validate(network, validation)?;

        let start_time = Instant::now();
        let mut rng = shuffle_rng(self.seed);
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut gradients = vec![0.0; network.num_weights()];
        self.solver.init(gradients.len());

        let workers: Vec<Worker> = (0..self.parallelism).map(|_| Worker::new(network)).collect();
        log::debug!(
            "Training with {} workers, {} examples per batch",
            workers.len(),
            self.batch_size
        );

        let completed = thread::scope(|scope| -> Result<usize> {
            let mut tasks = Vec::with_capacity(workers.len());
            let mut reports = Vec::with_capacity(workers.len());
            for (id, worker) in workers.into_iter().enumerate() {
                let (task_tx, task_rx) = mpsc::channel();
                let (report_tx, report_rx) = mpsc::channel();
                scope.spawn(move || worker.run(id, task_rx, report_tx));
                tasks.push(task_tx);
                reports.push(report_rx);
            }

            let mut completed = 0;
            let mut spares = vec![vec![0.0; gradients.len()]; tasks.len()];
            for iteration in 1..=iterations {
                order.shuffle(&mut rng);
                for batch in order.chunks(self.batch_size) {
                    if cancelled(&self.cancel) {
                        log::debug!("Training cancelled during epoch {}", iteration);
                        return Ok(completed);
                    }

                    let weights = Arc::new(network.weights());
                    for (id, tx) in tasks.iter().enumerate() {
                        dispatch(tx, id, Task::Sync(weights.clone()))?;
                    }
                    for (k, &index) in batch.iter().enumerate() {
                        let id = k % tasks.len();
                        dispatch(&tasks[id], id, Task::Learn(&examples[index]))?;
                    }
                    for (id, tx) in tasks.iter().enumerate() {
                        dispatch(tx, id, Task::Flush(mem::take(&mut spares[id])))?;
                    }

                    gather(&reports, &mut spares, &mut gradients)?;
                    network.descend(&mut self.solver, &gradients, iteration);
                    gradients.zero_out();
                }
                completed = iteration;
                self.logging.iteration(network, validation, iteration, start_time)?;
            }
            Ok(completed)
        })?;

        self.logging.completion(network, validation, completed, start_time)
    }
}

fn dispatch<'a>(tx: &Sender<Task<'a>>, worker: usize, task: Task<'a>) -> Result<()> {
    tx.send(task).map_err(|_| Error::WorkerDisconnected { worker })
}

/// Waits for every worker's report, in worker order, and adds its gradients
/// into `total`. The returned buffers are zeroed and kept in `spares` for the
/// workers' next flush.
fn gather(reports: &[Receiver<Report>], spares: &mut [Vec<f64>], total: &mut [f64]) -> Result<()> {
    for (worker, (rx, spare)) in reports.iter().zip(spares.iter_mut()).enumerate() {
        let report = rx.recv().map_err(|_| Error::WorkerDisconnected { worker })?;
        let mut partial = report?;
        for (t, g) in total.iter_mut().zip(&partial) {
            *t += g;
        }
        partial.zero_out();
        *spare = partial;
    }
    Ok(())
}

/// Messages from the trainer to a worker.
enum Task<'a> {
    /// Overwrite the replica's weights.
    Sync(Arc<Weights>),
    /// Accumulate the gradients of one example.
    Learn(&'a Example),
    /// Report the accumulated gradients, continuing with the zeroed buffer.
    Flush(Vec<f64>),
}

/// A worker's gradients for one batch.
type Report = Result<Vec<f64>>;

struct Worker {
    network: Network,
    deltas: Vec<Vec<f64>>,
    gradients: Vec<f64>,
}

impl Worker {
    fn new(network: &Network) -> Self {
        Worker {
            network: network.clone(),
            deltas: network.empty_deltas(),
            gradients: vec![0.0; network.num_weights()],
        }
    }

    fn run(mut self, id: usize, tasks: Receiver<Task<'_>>, reports: Sender<Report>) {
        let mut failure = None;
        for task in tasks {
            match task {
                Task::Sync(weights) => {
                    if let Err(e) = self.network.apply_weights(&weights) {
                        failure.get_or_insert(e);
                    }
                }
                Task::Learn(example) => {
                    if failure.is_none() {
                        if let Err(e) = self.learn(example) {
                            failure = Some(e);
                        }
                    }
                }
                Task::Flush(fresh) => {
                    let filled = mem::replace(&mut self.gradients, fresh);
                    let report = match failure.take() {
                        Some(e) => Err(e),
                        None => Ok(filled),
                    };
                    if reports.send(report).is_err() {
                        break;
                    }
                }
            }
        }
        log::trace!("Worker {} finished", id);
    }

    fn learn(&mut self, example: &Example) -> Result<()> {
        self.network.forward(&example.input)?;
        self.network.backpropagate(&example.response, &mut self.deltas);
        self.network.accumulate_gradients(&self.deltas, &mut self.gradients);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Mode};
    use crate::initializer::WeightInit;

    /// Records the gradients it is handed instead of stepping.
    #[derive(Default)]
    struct Recorder {
        steps: Vec<Vec<f64>>,
        current: Vec<f64>,
    }

    impl Solver for Recorder {
        fn init(&mut self, num_weights: usize) {
            self.current = vec![0.0; num_weights];
        }

        fn update(&mut self, _value: f64, gradient: f64, _iteration: usize, index: usize) -> f64 {
            self.current[index] = gradient;
            if index + 1 == self.current.len() {
                self.steps.push(self.current.clone());
            }
            0.0
        }
    }

    fn linear() -> Network {
        let config = Config::new(1, &[1])
            .mode(Mode::Regression)
            .weight(WeightInit::Constant(1.0));
        Network::new(&config).unwrap()
    }

    #[test]
    fn one_step_per_batch_with_summed_gradients() {
        let mut network = linear();
        let examples: Vec<Example> = (1..=5)
            .map(|i| Example::new(vec![i as f64], vec![0.0]))
            .collect();
        let mut trainer = BatchTrainer::new(Recorder::default())
            .batch_size(2)
            .parallelism(3)
            .logging(Logging::Silent)
            .seed(11);
        trainer.train(&mut network, &examples, &[], 2).unwrap();

        // Three batches per epoch: two full, one short.
        let steps = &trainer.solver().steps;
        assert_eq!(steps.len(), 6);
        // Each example contributes x * x to the gradient of the single weight,
        // so an epoch sums to 1 + 4 + 9 + 16 + 25.
        let epoch: f64 = steps[..3].iter().map(|s| s[0]).sum();
        assert!((epoch - 55.0).abs() < 1e-9, "{}", epoch);
        assert_eq!(network.weights(), vec![vec![vec![1.0]]]);
    }

    #[test]
    fn more_workers_than_examples() {
        let mut network = linear();
        let examples = vec![Example::new(vec![2.0], vec![1.0])];
        let mut trainer = BatchTrainer::new(Recorder::default())
            .batch_size(4)
            .parallelism(8)
            .logging(Logging::Silent);
        trainer.train(&mut network, &examples, &[], 3).unwrap();
        let steps = &trainer.solver().steps;
        assert_eq!(steps.len(), 3);
        // (2 - 1) * 2
        assert!(steps.iter().all(|s| (s[0] - 2.0).abs() < 1e-12));
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let trainer = BatchTrainer::new(Recorder::default()).batch_size(0).parallelism(0);
        assert_eq!(trainer.batch_size, 1);
        assert_eq!(trainer.parallelism, 1);
    }

    #[test]
    fn gather_names_the_silent_worker() {
        let (first_tx, first) = mpsc::channel::<Report>();
        let (second_tx, second) = mpsc::channel::<Report>();
        let (third_tx, third) = mpsc::channel::<Report>();
        first_tx.send(Ok(vec![1.0])).unwrap();
        third_tx.send(Ok(vec![3.0])).unwrap();
        drop(second_tx);

        let mut spares = vec![Vec::new(); 3];
        let mut total = vec![0.0];
        assert!(matches!(
            gather(&[first, second, third], &mut spares, &mut total),
            Err(Error::WorkerDisconnected { worker: 1 })
        ));
    }

    #[test]
    fn gather_sums_and_recycles_buffers() {
        let buffers = vec![vec![1.0, 2.0], vec![0.5, -1.0]];
        let addresses: Vec<*const f64> = buffers.iter().map(|b| b.as_ptr()).collect();
        let receivers: Vec<Receiver<Report>> = buffers
            .into_iter()
            .map(|b| {
                let (tx, rx) = mpsc::channel();
                tx.send(Ok(b)).unwrap();
                rx
            })
            .collect();

        let mut spares = vec![Vec::new(); 2];
        let mut total = vec![0.0, 0.0];
        gather(&receivers, &mut spares, &mut total).unwrap();
        assert_eq!(total, vec![1.5, 1.0]);
        assert_eq!(spares, vec![vec![0.0, 0.0]; 2]);
        let recycled: Vec<*const f64> = spares.iter().map(|b| b.as_ptr()).collect();
        assert_eq!(recycled, addresses);
    }

    #[test]
    fn worker_hands_back_its_buffer() {
        let network = linear();
        let example = Example::new(vec![3.0], vec![1.0]);
        let (task_tx, task_rx) = mpsc::channel();
        let (report_tx, report_rx) = mpsc::channel();
        thread::scope(|scope| {
            scope.spawn(|| Worker::new(&network).run(0, task_rx, report_tx));

            let fresh = vec![0.0];
            let address = fresh.as_ptr();
            task_tx.send(Task::Learn(&example)).unwrap();
            task_tx.send(Task::Flush(fresh)).unwrap();
            // (3 - 1) * 3
            assert_eq!(report_rx.recv().unwrap().unwrap(), vec![6.0]);

            task_tx.send(Task::Learn(&example)).unwrap();
            task_tx.send(Task::Flush(vec![0.0])).unwrap();
            let second = report_rx.recv().unwrap().unwrap();
            assert_eq!(second, vec![6.0]);
            assert_eq!(second.as_ptr(), address);
            drop(task_tx);
        });
    }
}
