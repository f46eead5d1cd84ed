use thiserror::Error;

/// Errors that abort a scan before or during setup. Transient per-job
/// network failures are never surfaced here; they are retried inside the
/// prober and then dropped.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("failed to resolve base domain {domain}: {reason}")]
    Resolution { domain: String, reason: String },

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
