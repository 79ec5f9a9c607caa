use config::{Config, ConfigError, Environment, File};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MARKETPLACE_URL: &str = "https://marketplace.nvidia.com/da-dk/consumer/graphics-cards/?locale=da-dk&page=1&limit=12&sorting=fp&manufacturer=NVIDIA&manufacturer_filter=NVIDIA~3,ASUS~12,GAINWARD~1,GIGABYTE~20,INNO3D~13,MSI~11,PALIT~7,PNY~4,ZOTAC~10";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SniperConfig {
    pub search: SearchConfig,
    pub browser: BrowserConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub url: String,
    pub search_token: String,
    pub workers: usize,
    pub timeout_secs: u64,
    pub start_delay_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub stop_on_first_success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub page_wait_secs: u64,
    pub loading_indicator_selector: String,
    pub product_title_selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub alert_duration_ms: u64,
    pub open_browser: bool,
    pub sound: bool,
    pub discord_webhook_url: Option<String>,
    pub discord_username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            search_token: String::new(),
            workers: 1,
            timeout_secs: 60,
            start_delay_secs: 10,
            max_attempts: 99_999,
            retry_delay_ms: 1_000,
            stop_on_first_success: false,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            page_wait_secs: 30,
            loading_indicator_selector: "css-loading-indicator".to_string(),
            product_title_selector: "h2.nv-productTitle".to_string(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            alert_duration_ms: 5_000,
            open_browser: true,
            sound: true,
            discord_webhook_url: None,
            discord_username: "Uatu Sniper".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "uatu-sniper.log".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl BrowserConfig {
    pub fn page_wait(&self) -> Duration {
        Duration::from_secs(self.page_wait_secs)
    }
}

impl SniperConfig {
    /// Layers `config/default` (or the given file), then `UATU_SNIPER__*`
    /// environment variables, over the built-in defaults.
    ///
    /// The result is not validated: command-line flags and prompts may still
    /// fill in the target, so call [`SniperConfig::validate`] once they have.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("config/default").required(false),
        };

        let s = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("UATU_SNIPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: SniperConfig = s.try_deserialize()?;

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let search = &self.search;

        match Url::parse(&search.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => {
                return Err(ConfigError::Message("Target URL must use http or https".into()));
            }
            Err(_) => return Err(ConfigError::Message("Invalid target URL format".into())),
        }

        if search.search_token.trim().is_empty() {
            return Err(ConfigError::Message("Search token must not be empty".into()));
        }

        if search.workers == 0 {
            return Err(ConfigError::Message("Worker count must be greater than 0".into()));
        }

        if search.timeout_secs == 0 {
            return Err(ConfigError::Message("Timeout must be greater than 0".into()));
        }

        if search.max_attempts == 0 {
            return Err(ConfigError::Message("max_attempts must be greater than 0".into()));
        }

        if self.browser.page_wait_secs == 0 {
            return Err(ConfigError::Message("page_wait_secs must be greater than 0".into()));
        }

        if let Some(chrome_path) = &self.browser.chrome_path {
            if !Path::new(chrome_path).exists() {
                return Err(ConfigError::Message(format!(
                    "Chrome executable not found at {}",
                    chrome_path
                )));
            }
        }

        for selector in [
            &self.browser.loading_indicator_selector,
            &self.browser.product_title_selector,
        ] {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::Message(format!("Invalid CSS selector '{}'", selector)));
            }
        }

        if let Some(webhook) = &self.notifications.discord_webhook_url {
            if !webhook.starts_with("https://discord.com/api/webhooks/") {
                return Err(ConfigError::Message("Invalid Discord webhook URL format".into()));
            }
        }

        Ok(())
    }
}
