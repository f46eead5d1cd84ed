use std::time::Duration;

use reqwest::{Client, Method, Response};
use tokio::sync::mpsc;

pub const USER_AGENT: &str = concat!("uncloak/", env!("CARGO_PKG_VERSION"));

const MAX_ATTEMPTS: u32 = 10;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Issues one speculative request. Transport-level failures (DNS,
/// connection refused, timeout) are retried with exponential backoff; an
/// HTTP response of any status is an outcome, never an error. Redirects
/// are not followed here — the strategy layer decides what to do with 3xx.
pub struct Prober {
    client: Client,
    method: Method,
    headers: Vec<(String, String)>,
    busy_tx: Option<mpsc::UnboundedSender<String>>,
}

impl Prober {
    pub fn new(
        client: Client,
        method: Method,
        raw_headers: &[String],
        busy_tx: Option<mpsc::UnboundedSender<String>>,
    ) -> Self {
        Self {
            client,
            method,
            headers: parse_headers(raw_headers),
            busy_tx,
        }
    }

    /// `None` means the target stayed unreachable through every retry; the
    /// job is dropped without surfacing a scan-level error.
    pub async fn probe(&self, target: &str) -> Option<Response> {
        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(tx) = &self.busy_tx {
                let _ = tx.send(target.to_string());
            }

            let mut request = self.client.request(self.method.clone(), target);
            for (name, value) in &self.headers {
                request = request.header(name.as_str(), value.as_str());
            }

            match request.send().await {
                Ok(response) => return Some(response),
                Err(err) => {
                    tracing::debug!("attempt {attempt}/{MAX_ATTEMPTS} for {target} failed: {err}");
                    if attempt == MAX_ATTEMPTS {
                        break;
                    }
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
        None
    }
}

/// `Name: value` pairs; entries without a colon are silently dropped.
fn parse_headers(raw: &[String]) -> Vec<(String, String)> {
    raw.iter()
        .filter_map(|entry| {
            let (name, value) = entry.split_once(':')?;
            Some((name.trim().to_string(), value.trim_start().to_string()))
        })
        .collect()
}
