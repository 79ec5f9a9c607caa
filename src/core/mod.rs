pub mod pool;
pub mod worker;

pub use pool::{PoolReport, WorkerPool};
pub use worker::{Attempt, AttemptOutcome, RetryWorker, StopSignal, WorkerOutcome};
