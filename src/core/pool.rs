use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::worker::{RetryWorker, StopSignal, WorkerOutcome};
use crate::config::SniperConfig;
use crate::plugins::traits::{NotifierSink, PageProbe};

/// Aggregated result of one pool run, ordered by worker id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolReport {
    pub run_id: Uuid,
    pub outcomes: Vec<WorkerOutcome>,
}

impl PoolReport {
    pub fn new(run_id: Uuid, mut outcomes: Vec<WorkerOutcome>) -> Self {
        outcomes.sort_by_key(|outcome| outcome.worker_id);
        Self { run_id, outcomes }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.success).count()
    }

    pub fn any_success(&self) -> bool {
        self.successful() > 0
    }

    /// The lowest-numbered successful worker, so the answer does not depend
    /// on which task happened to finish first.
    pub fn first_success(&self) -> Option<&WorkerOutcome> {
        self.outcomes.iter().find(|outcome| outcome.success)
    }

    pub fn summary(&self) -> String {
        format!(
            "Search completed. {} of {} workers found a product.",
            self.successful(),
            self.total()
        )
    }
}

/// Races `search.workers` retry loops against the same page.
pub struct WorkerPool {
    config: Arc<SniperConfig>,
    probe: Arc<dyn PageProbe>,
    notifier: Arc<dyn NotifierSink>,
}

impl WorkerPool {
    pub fn new(
        config: Arc<SniperConfig>,
        probe: Arc<dyn PageProbe>,
        notifier: Arc<dyn NotifierSink>,
    ) -> Self {
        Self {
            config,
            probe,
            notifier,
        }
    }

    /// Starts the workers one `start_delay` apart and waits for every one of
    /// them. Siblings keep running after a success unless
    /// `stop_on_first_success` is set.
    pub async fn run_all(&self) -> PoolReport {
        let run_id = Uuid::new_v4();
        let search = &self.config.search;
        let num_workers = search.workers;
        let stop = search.stop_on_first_success.then(StopSignal::new);

        info!(
            %run_id,
            probe = self.probe.name(),
            "Starting {} concurrent search workers for '{}'",
            num_workers,
            search.search_token
        );

        let mut handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            if worker_id > 0 {
                info!(
                    "Waiting {} seconds before starting worker {}",
                    search.start_delay_secs, worker_id
                );
                tokio::time::sleep(search.start_delay()).await;
            }

            let worker = RetryWorker::new(
                worker_id,
                Arc::clone(&self.config),
                Arc::clone(&self.probe),
                Arc::clone(&self.notifier),
            )
            .with_stop_signal(stop.clone());

            handles.push((worker_id, tokio::spawn(async move { worker.run().await })));
        }

        let mut outcomes = Vec::with_capacity(num_workers);
        for (worker_id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(worker_id, "Worker task failed: {}", e);
                    outcomes.push(WorkerOutcome::failed(worker_id, 0));
                }
            }
        }

        let report = PoolReport::new(run_id, outcomes);
        info!(
            %run_id,
            successful = report.successful(),
            total = report.total(),
            "{}",
            report.summary()
        );
        report
    }
}
