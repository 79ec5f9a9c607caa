use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseAlert {
    pub worker_id: usize,
    pub attempt: u32,
    pub search_token: String,
    pub purchase_link: String,
    pub alert_duration_ms: u64,
    pub found_at: DateTime<Utc>,
}

impl PurchaseAlert {
    pub fn new(
        worker_id: usize,
        attempt: u32,
        search_token: impl Into<String>,
        purchase_link: impl Into<String>,
        alert_duration_ms: u64,
    ) -> Self {
        Self {
            worker_id,
            attempt,
            search_token: search_token.into(),
            purchase_link: purchase_link.into(),
            alert_duration_ms,
            found_at: Utc::now(),
        }
    }
}

/// User-facing action taken once a worker has a purchase link.
///
/// Errors are reported back for logging only; they never turn a found
/// product into a failed worker.
#[async_trait]
pub trait NotifierSink: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, alert: &PurchaseAlert) -> Result<(), AppError>;
}
