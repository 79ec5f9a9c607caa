use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Notifier error: {notifier}: {message}")]
    Notifier { notifier: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single fetch-and-extract attempt.
///
/// None of these end a worker on their own; they only decide how soon the
/// next attempt is issued.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Page load timed out after {0:?}")]
    PageTimeout(Duration),

    #[error("Browser transport error: {0}")]
    Transport(String),

    #[error("Malformed product data: {0}")]
    DataParse(String),

    #[error("Unexpected probe error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ProbeError {
    /// Transient errors are retried straight away, without the inter-attempt delay.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProbeError::DataParse(_))
    }
}
