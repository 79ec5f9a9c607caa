use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::SniperConfig;
use crate::plugins::traits::{NotifierSink, PageProbe, ProbeResult, PurchaseAlert};
use crate::utils::error::ProbeError;

/// Classification of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(String),
    /// Page answered but nothing to buy yet; retried after the normal delay.
    NoMatch(String),
    /// Infrastructure trouble; retried immediately.
    Transient(String),
}

#[derive(Debug, Clone)]
pub struct Attempt {
    /// 1-based.
    pub index: u32,
    pub timeout: Duration,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    fn log(&self, worker_id: usize, max_attempts: u32) {
        match &self.outcome {
            AttemptOutcome::Success(link) => info!(
                worker_id,
                attempt = self.index,
                max_attempts,
                "Success! Found purchase link: {}",
                link
            ),
            AttemptOutcome::NoMatch(reason) => info!(
                worker_id,
                attempt = self.index,
                max_attempts,
                "{}. Retrying...",
                reason
            ),
            AttemptOutcome::Transient(reason) => warn!(
                worker_id,
                attempt = self.index,
                max_attempts,
                timeout_secs = self.timeout.as_secs(),
                "{}. Retrying...",
                reason
            ),
        }
    }

    fn metric_label(&self) -> &'static str {
        match self.outcome {
            AttemptOutcome::Success(_) => "success",
            AttemptOutcome::NoMatch(_) => "no_match",
            AttemptOutcome::Transient(_) => "transient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerOutcome {
    pub worker_id: usize,
    pub success: bool,
    pub link: Option<String>,
    pub attempts: u32,
}

impl WorkerOutcome {
    pub fn found(worker_id: usize, link: String, attempts: u32) -> Self {
        Self {
            worker_id,
            success: true,
            link: Some(link),
            attempts,
        }
    }

    pub fn failed(worker_id: usize, attempts: u32) -> Self {
        Self {
            worker_id,
            success: false,
            link: None,
            attempts,
        }
    }
}

/// Shared flag that asks workers to stop between attempts.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One independent poll loop against the target page.
pub struct RetryWorker {
    id: usize,
    config: Arc<SniperConfig>,
    probe: Arc<dyn PageProbe>,
    notifier: Arc<dyn NotifierSink>,
    stop: Option<StopSignal>,
}

impl RetryWorker {
    pub fn new(
        id: usize,
        config: Arc<SniperConfig>,
        probe: Arc<dyn PageProbe>,
        notifier: Arc<dyn NotifierSink>,
    ) -> Self {
        Self {
            id,
            config,
            probe,
            notifier,
            stop: None,
        }
    }

    /// Stops the worker before its next attempt once `stop` is raised, and
    /// raises it when this worker succeeds.
    pub fn with_stop_signal(mut self, stop: Option<StopSignal>) -> Self {
        self.stop = stop;
        self
    }

    pub async fn run(&self) -> WorkerOutcome {
        let span = info_span!("worker", worker_id = self.id);
        self.run_loop().instrument(span).await
    }

    async fn run_loop(&self) -> WorkerOutcome {
        let search = &self.config.search;
        let max_attempts = search.max_attempts;
        let mut attempts = 0;

        while attempts < max_attempts {
            if self.stop.as_ref().is_some_and(StopSignal::is_raised) {
                info!(worker_id = self.id, attempts, "Another worker succeeded, stopping");
                return WorkerOutcome::failed(self.id, attempts);
            }

            attempts += 1;
            let attempt = self.attempt(attempts).await;
            attempt.log(self.id, max_attempts);
            metrics::counter!("uatu_sniper_attempts_total", "outcome" => attempt.metric_label())
                .increment(1);

            match attempt.outcome {
                AttemptOutcome::Success(link) => {
                    metrics::counter!("uatu_sniper_successes_total").increment(1);
                    if let Some(stop) = &self.stop {
                        stop.raise();
                    }
                    self.notify(&link, attempts).await;
                    return WorkerOutcome::found(self.id, link, attempts);
                }
                AttemptOutcome::NoMatch(_) => {
                    if attempts < max_attempts {
                        debug!(
                            worker_id = self.id,
                            "Waiting {}ms before next attempt",
                            search.retry_delay_ms
                        );
                        tokio::time::sleep(search.retry_delay()).await;
                    }
                }
                AttemptOutcome::Transient(_) => {}
            }
        }

        warn!(
            worker_id = self.id,
            max_attempts, "Max retries reached, giving up"
        );
        WorkerOutcome::failed(self.id, attempts)
    }

    /// Runs one probe on a fresh session. The session is closed on every
    /// path, and a panic while opening, probing or closing counts as a
    /// transient failure.
    async fn attempt(&self, index: u32) -> Attempt {
        let search = &self.config.search;
        let timeout = search.timeout();

        let opened = AssertUnwindSafe(self.probe.open_session(self.id))
            .catch_unwind()
            .await;

        let outcome = match opened {
            Err(panic) => AttemptOutcome::Transient(format!(
                "Opening session panicked: {}",
                panic_message(panic.as_ref())
            )),
            Ok(Err(e)) => AttemptOutcome::Transient(format!("Failed to open session: {}", e)),
            Ok(Ok(mut session)) => {
                let result = AssertUnwindSafe(session.probe(&search.url, &search.search_token, timeout))
                    .catch_unwind()
                    .await;
                if let Err(panic) = AssertUnwindSafe(session.close()).catch_unwind().await {
                    warn!(
                        worker_id = self.id,
                        "Closing session panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }

                match result {
                    Ok(result) => classify(result),
                    Err(panic) => AttemptOutcome::Transient(format!(
                        "Probe panicked: {}",
                        panic_message(panic.as_ref())
                    )),
                }
            }
        };

        Attempt {
            index,
            timeout,
            outcome,
        }
    }

    async fn notify(&self, link: &str, attempt: u32) {
        let alert = PurchaseAlert::new(
            self.id,
            attempt,
            &self.config.search.search_token,
            link,
            self.config.notifications.alert_duration_ms,
        );

        match AssertUnwindSafe(self.notifier.notify(&alert)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(worker_id = self.id, "Notifier failed: {}", e),
            Err(panic) => warn!(
                worker_id = self.id,
                "Notifier panicked: {}",
                panic_message(panic.as_ref())
            ),
        }
    }
}

fn classify(result: Result<ProbeResult, ProbeError>) -> AttemptOutcome {
    match result {
        Ok(ProbeResult::Found(link)) => AttemptOutcome::Success(link),
        Ok(ProbeResult::NotFoundMatching) => {
            AttemptOutcome::NoMatch("Product data found but no matching product".to_string())
        }
        Ok(ProbeResult::NoDataAvailable) => {
            AttemptOutcome::NoMatch("No product data found".to_string())
        }
        Ok(ProbeResult::TransientError(reason)) => AttemptOutcome::Transient(reason),
        Err(e) if e.is_transient() => AttemptOutcome::Transient(e.to_string()),
        Err(e) => AttemptOutcome::NoMatch(e.to_string()),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
