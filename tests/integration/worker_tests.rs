use super::*;
use std::sync::Arc;
use std::time::Duration;
use uatu_sniper::core::{RetryWorker, StopSignal};
use uatu_sniper::plugins::traits::ProbeResult;

fn worker(
    id: usize,
    config: Arc<SniperConfig>,
    probe: &Arc<ScriptedProbe>,
    notifier: &Arc<RecordingNotifier>,
) -> RetryWorker {
    RetryWorker::new(id, config, probe.clone(), notifier.clone())
}

#[tokio::test(start_paused = true)]
async fn test_worker_gives_up_after_max_attempts() {
    let probe = ScriptedProbe::new(|_, _| no_match());
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 4), &probe, &notifier).run().await;

    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 4);
    assert_eq!(outcome.link, None);
    assert_eq!(probe.log.probes(), 4);
    assert!(notifier.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_found_short_circuits_remaining_attempts() {
    let probe = ScriptedProbe::new(|_, attempt| {
        if attempt == 2 {
            found("https://buy/5080")
        } else {
            no_match()
        }
    });
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 10), &probe, &notifier).run().await;

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.link.as_deref(), Some("https://buy/5080"));
    assert_eq!(probe.log.probes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_notifier_called_once_after_success() {
    let probe = ScriptedProbe::new(|_, _| found("https://buy/5080"));
    let notifier = RecordingNotifier::new();

    let outcome = worker(3, test_config(1, 5), &probe, &notifier).run().await;
    assert!(outcome.success);

    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].worker_id, 3);
    assert_eq!(alerts[0].attempt, 1);
    assert_eq!(alerts[0].purchase_link, "https://buy/5080");
    assert_eq!(alerts[0].search_token, "5080");
}

#[tokio::test(start_paused = true)]
async fn test_notifier_failure_does_not_fail_worker() {
    let probe = ScriptedProbe::new(|_, _| found("https://buy/5080"));
    let notifier = RecordingNotifier::failing();

    let outcome = worker(0, test_config(1, 5), &probe, &notifier).run().await;

    assert!(outcome.success);
    assert_eq!(notifier.alerts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sessions_are_never_leaked() {
    let probe = ScriptedProbe::new(|_, attempt| match attempt % 5 {
        0 => Step::Return(ProbeResult::NoDataAvailable),
        1 => Step::Fail(ProbeError::PageTimeout(Duration::from_secs(5))),
        2 => Step::Fail(ProbeError::Transport("connection reset".to_string())),
        3 => Step::Fail(ProbeError::DataParse("trailing comma".to_string())),
        _ => Step::Panic,
    });
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 10), &probe, &notifier).run().await;

    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 10);
    assert_eq!(probe.log.opened(), 10);
    assert_eq!(probe.log.probes(), 10);
    assert_eq!(probe.log.closed(), probe.log.opened());
}

#[tokio::test(start_paused = true)]
async fn test_session_closed_on_success() {
    let probe = ScriptedProbe::new(|_, _| found("https://buy/5080"));
    let notifier = RecordingNotifier::new();

    worker(0, test_config(1, 3), &probe, &notifier).run().await;

    assert_eq!(probe.log.opened(), 1);
    assert_eq!(probe.log.closed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refused_session_counts_as_attempt() {
    let probe = ScriptedProbe::new(|_, attempt| {
        if attempt < 3 {
            Step::RefuseSession
        } else {
            found("https://buy/5080")
        }
    });
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 5), &probe, &notifier).run().await;

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(probe.log.opened(), 1);
    assert_eq!(probe.log.closed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_probe_is_retried() {
    let probe = ScriptedProbe::new(|_, attempt| {
        if attempt == 1 {
            Step::Panic
        } else {
            found("https://buy/5080")
        }
    });
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 3), &probe, &notifier).run().await;

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(probe.log.closed(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_panic_while_opening_session_is_retried() {
    let probe = ScriptedProbe::new(|_, attempt| {
        if attempt < 3 {
            Step::PanicOnOpen
        } else {
            found("https://buy/5080")
        }
    });
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 5), &probe, &notifier).run().await;

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(probe.log.opened(), 1);
    assert_eq!(probe.log.closed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panic_while_opening_session_uses_whole_budget() {
    let probe = ScriptedProbe::new(|_, _| Step::PanicOnOpen);
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 3), &probe, &notifier).run().await;

    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(probe.log.attempts_for(0), 3);
}

#[tokio::test(start_paused = true)]
async fn test_panic_while_closing_session_is_retried() {
    let probe = ScriptedProbe::new(|_, attempt| {
        if attempt == 1 {
            Step::PanicOnClose
        } else {
            found("https://buy/5080")
        }
    });
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 3), &probe, &notifier).run().await;

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(probe.log.closed(), probe.log.opened());
}

#[tokio::test(start_paused = true)]
async fn test_panicking_notifier_keeps_the_success() {
    let probe = ScriptedProbe::new(|_, _| found("https://buy/5080"));
    let notifier = RecordingNotifier::panicking();

    let outcome = worker(0, test_config(1, 5), &probe, &notifier).run().await;

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.link.as_deref(), Some("https://buy/5080"));
    assert_eq!(notifier.alerts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_no_match_never_flips_to_success() {
    let probe = ScriptedProbe::new(|_, attempt| {
        if attempt % 2 == 0 {
            no_match()
        } else {
            Step::Return(ProbeResult::NoDataAvailable)
        }
    });
    let notifier = RecordingNotifier::new();

    let outcome = worker(0, test_config(1, 25), &probe, &notifier).run().await;

    assert!(!outcome.success);
    assert_eq!(outcome.link, None);
    assert_eq!(outcome.attempts, 25);
    assert!(notifier.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_no_match_waits_retry_delay_but_transient_does_not() {
    let mut config = (*test_config(1, 3)).clone();
    config.search.retry_delay_ms = 1_000;

    // no match: two waits between three attempts
    let probe = ScriptedProbe::new(|_, _| no_match());
    let notifier = RecordingNotifier::new();
    let started = tokio::time::Instant::now();
    worker(0, Arc::new(config.clone()), &probe, &notifier).run().await;
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));

    // transient errors: straight back in
    let probe = ScriptedProbe::new(|_, _| {
        Step::Fail(ProbeError::PageTimeout(Duration::from_secs(5)))
    });
    let started = tokio::time::Instant::now();
    let outcome = worker(0, Arc::new(config), &probe, &notifier).run().await;
    assert_eq!(outcome.attempts, 3);
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_data_parse_error_waits_like_no_match() {
    let mut config = (*test_config(1, 2)).clone();
    config.search.retry_delay_ms = 500;

    let probe = ScriptedProbe::new(|_, _| Step::Fail(ProbeError::DataParse("bad".to_string())));
    let notifier = RecordingNotifier::new();
    let started = tokio::time::Instant::now();

    let outcome = worker(0, Arc::new(config), &probe, &notifier).run().await;

    assert!(!outcome.success);
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(500) && waited < Duration::from_millis(1_000));
}

#[tokio::test(start_paused = true)]
async fn test_raised_stop_signal_halts_worker_before_next_attempt() {
    let probe = ScriptedProbe::new(|_, _| no_match());
    let notifier = RecordingNotifier::new();
    let stop = StopSignal::new();
    stop.raise();

    let outcome = worker(0, test_config(1, 10), &probe, &notifier)
        .with_stop_signal(Some(stop))
        .run()
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 0);
    assert_eq!(probe.log.probes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_success_raises_stop_signal() {
    let probe = ScriptedProbe::new(|_, _| found("https://buy/5080"));
    let notifier = RecordingNotifier::new();
    let stop = StopSignal::new();

    worker(0, test_config(1, 10), &probe, &notifier)
        .with_stop_signal(Some(stop.clone()))
        .run()
        .await;

    assert!(stop.is_raised());
}
