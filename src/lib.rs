//! Churnflow - batch churn scoring and feature drift detection
//!
//! Scores customer batches with the model promoted as champion in an MLflow
//! registry, appends the predictions to Postgres, and compares each day's
//! scored batch against the champion's reference dataset.

#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod data;
pub mod drift;
pub mod error;
pub mod jobs;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::error::{ChurnflowError, Result};

/// Churnflow version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
