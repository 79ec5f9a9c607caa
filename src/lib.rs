pub mod cli;
pub mod config;
pub mod core;
pub mod plugins;
pub mod prompt;
pub mod utils;

// Re-export commonly used types
pub use crate::config::SniperConfig;
pub use crate::core::{PoolReport, RetryWorker, WorkerOutcome, WorkerPool};
pub use utils::error::{AppError, ProbeError};
