use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::error::ProbeError;

/// What one fetch-and-extract attempt saw on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeResult {
    /// A matching product carried a purchase link.
    Found(String),
    /// The page rendered, but no product matched or the match had no link.
    NotFoundMatching,
    /// No product data could be read from the page at all.
    NoDataAvailable,
    /// The session reported a recoverable failure of its own.
    TransientError(String),
}

impl ProbeResult {
    pub fn purchase_link(&self) -> Option<&str> {
        match self {
            ProbeResult::Found(link) => Some(link),
            _ => None,
        }
    }
}

/// Source of isolated probe sessions.
///
/// Every attempt gets its own session so stale page state never carries
/// over; the caller must `close` each session it opens.
#[async_trait]
pub trait PageProbe: Send + Sync {
    fn name(&self) -> &str;

    async fn open_session(&self, worker_id: usize) -> Result<Box<dyn ProbeSession>, ProbeError>;
}

#[async_trait]
pub trait ProbeSession: Send {
    async fn probe(
        &mut self,
        url: &str,
        search_token: &str,
        timeout: Duration,
    ) -> Result<ProbeResult, ProbeError>;

    /// Releases the session. Calling it twice is a no-op.
    async fn close(&mut self);
}
