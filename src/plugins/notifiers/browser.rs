use async_trait::async_trait;
use std::process::Command;

use crate::plugins::traits::{NotifierSink, PurchaseAlert};
use crate::utils::error::AppError;

/// Opens the purchase link in the user's default browser.
pub struct BrowserNotifier {
    program: String,
    args: Vec<String>,
}

impl Default for BrowserNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserNotifier {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        let (program, args) = ("open", Vec::new());

        #[cfg(target_os = "windows")]
        let (program, args) = ("cmd", vec!["/C".to_string(), "start".to_string(), String::new()]);

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let (program, args) = ("xdg-open", Vec::new());

        Self::with_command(program, args)
    }

    /// Uses `program args... <link>` as the opener.
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl NotifierSink for BrowserNotifier {
    fn name(&self) -> &str {
        "browser"
    }

    async fn notify(&self, alert: &PurchaseAlert) -> Result<(), AppError> {
        tracing::info!(worker_id = alert.worker_id, "Opening link: {}", alert.purchase_link);

        Command::new(&self.program)
            .args(&self.args)
            .arg(&alert.purchase_link)
            .spawn()
            .map_err(|e| AppError::Notifier {
                notifier: self.name().to_string(),
                message: format!("Failed to launch {}: {}", self.program, e),
            })?;

        Ok(())
    }
}
