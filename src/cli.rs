use clap::Parser;
use std::path::PathBuf;

use crate::config::SniperConfig;

/// Watches a marketplace listing and opens the purchase link as soon as a
/// matching product drops.
#[derive(Debug, Parser)]
#[command(name = "uatu-sniper", version, about)]
pub struct Cli {
    /// Marketplace listing URL to poll
    #[arg(long)]
    pub url: Option<String>,

    /// Text that must appear in the product title (e.g. 5080)
    #[arg(long = "search")]
    pub search_token: Option<String>,

    /// Number of concurrent search workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-attempt page load timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Delay between starting workers, in seconds
    #[arg(long)]
    pub delay: Option<u64>,

    /// Length of the alert tone in milliseconds
    #[arg(long = "alarm-ms")]
    pub alarm_ms: Option<u64>,

    /// Attempts per worker before it gives up
    #[arg(long = "max-attempts")]
    pub max_attempts: Option<u32>,

    /// Configuration file (defaults to config/default.*)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Run Chrome headless (true) or with a visible window (false)
    #[arg(long)]
    pub headless: Option<bool>,

    /// Stop the remaining workers once one of them finds the product
    #[arg(long = "stop-on-success")]
    pub stop_on_success: bool,

    /// Prompt for every setting, not only the missing URL and search text
    #[arg(long, short)]
    pub interactive: bool,
}

impl Cli {
    /// Overlays flags given on the command line onto the loaded configuration.
    pub fn apply(&self, config: &mut SniperConfig) {
        let search = &mut config.search;

        if let Some(url) = &self.url {
            search.url = url.trim().to_string();
        }
        if let Some(token) = &self.search_token {
            search.search_token = token.trim().to_string();
        }
        if let Some(workers) = self.workers {
            search.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            search.timeout_secs = timeout;
        }
        if let Some(delay) = self.delay {
            search.start_delay_secs = delay;
        }
        if let Some(max_attempts) = self.max_attempts {
            search.max_attempts = max_attempts;
        }
        if self.stop_on_success {
            search.stop_on_first_success = true;
        }
        if let Some(alarm_ms) = self.alarm_ms {
            config.notifications.alert_duration_ms = alarm_ms;
        }
        if let Some(headless) = self.headless {
            config.browser.headless = headless;
        }
    }
}
