use async_trait::async_trait;

use super::notifiers::{BrowserNotifier, DiscordConfig, DiscordNotifier, SoundNotifier};
use super::traits::{NotifierSink, PurchaseAlert};
use crate::config::NotificationsConfig;
use crate::utils::error::AppError;

pub type NotifierSinkBox = Box<dyn NotifierSink>;

/// Fans one purchase alert out to every registered sink, in registration
/// order. A failing sink is logged and skipped.
#[derive(Default)]
pub struct NotifierSet {
    sinks: Vec<NotifierSinkBox>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Builds the sinks enabled in the configuration: browser first so the
    /// checkout page is loading while the tone plays.
    pub fn from_config(config: &NotificationsConfig) -> Self {
        let mut set = Self::new();

        if config.open_browser {
            set.register(Box::new(BrowserNotifier::new()));
        }

        if config.sound {
            set.register(Box::new(SoundNotifier::new()));
        }

        if let Some(webhook_url) = &config.discord_webhook_url {
            let mut discord = DiscordConfig::new(webhook_url.clone());
            discord.username = Some(config.discord_username.clone());
            set.register(Box::new(DiscordNotifier::new(discord)));
        }

        set
    }

    pub fn register(&mut self, sink: NotifierSinkBox) {
        self.sinks.push(sink);
    }

    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl NotifierSink for NotifierSet {
    fn name(&self) -> &str {
        "notifier-set"
    }

    async fn notify(&self, alert: &PurchaseAlert) -> Result<(), AppError> {
        for sink in &self.sinks {
            if let Err(e) = sink.notify(alert).await {
                tracing::warn!(
                    worker_id = alert.worker_id,
                    notifier = sink.name(),
                    "Notifier failed: {}",
                    e
                );
            }
        }
        Ok(())
    }
}
