use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::plugins::traits::{NotifierSink, PurchaseAlert};
use crate::utils::error::AppError;

const EMBED_COLOR: u32 = 0x00ff00;

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub mention_user: Option<String>,
}

impl DiscordConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            username: None,
            avatar_url: None,
            mention_user: None,
        }
    }
}

/// Posts the purchase link to a Discord channel through a webhook.
pub struct DiscordNotifier {
    client: Client,
    config: DiscordConfig,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Self {
        DiscordNotifier {
            client: Client::new(),
            config,
        }
    }

    fn create_embed(&self, alert: &PurchaseAlert) -> serde_json::Value {
        json!({
            "title": format!("🎯 Product found: {}", alert.search_token),
            "url": alert.purchase_link,
            "color": EMBED_COLOR,
            "timestamp": alert.found_at.to_rfc3339(),
            "fields": [
                {
                    "name": "🛒 Purchase link",
                    "value": format!("[Buy now]({})", alert.purchase_link),
                    "inline": false
                },
                {
                    "name": "Worker",
                    "value": alert.worker_id.to_string(),
                    "inline": true
                },
                {
                    "name": "Attempt",
                    "value": alert.attempt.to_string(),
                    "inline": true
                }
            ],
            "footer": {
                "text": "Uatu Sniper"
            }
        })
    }

    fn create_webhook_payload(&self, alert: &PurchaseAlert) -> serde_json::Value {
        let mut payload = json!({
            "embeds": [self.create_embed(alert)]
        });

        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }

        if let Some(avatar_url) = &self.config.avatar_url {
            payload["avatar_url"] = json!(avatar_url);
        }

        if let Some(user) = &self.config.mention_user {
            payload["content"] = json!(format!("<@{}>", user));
        }

        payload
    }
}

#[async_trait]
impl NotifierSink for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, alert: &PurchaseAlert) -> Result<(), AppError> {
        let payload = self.create_webhook_payload(alert);

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Notifier {
                notifier: self.name().to_string(),
                message: format!("webhook returned {}", response.status()),
            });
        }

        Ok(())
    }
}
