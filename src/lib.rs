//! A feed-forward neural network engine.
//!
//! Networks are built from a [`Config`](config::Config), trained with either
//! the [`OnlineTrainer`](trainer::OnlineTrainer) or the parallel
//! [`BatchTrainer`](trainer::BatchTrainer), and persisted through
//! [`Dump`](persist::Dump).

pub mod activator;
pub mod config;
pub mod data;
pub mod error;
pub mod feed_forward;
pub mod initializer;
pub mod loss;
pub mod persist;
pub mod progress;
pub mod solver;
pub mod trainer;

mod layer;
mod neuron;
mod synapse;
mod utils;

pub use crate::error::{Error, Result};
