//! Scan configuration. Every option is an explicit struct field with a
//! documented default; construct with `new` and adjust before handing the
//! struct to a scanner.

use std::net::IpAddr;
use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

use crate::scan::{UrlResult, VhostResult};
use crate::wordlist::Wordlist;

pub const DEFAULT_PARALLELISM: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Status codes treated as "resource exists" unless overridden.
pub fn default_positive_statuses() -> Vec<u16> {
    vec![200, 204, 301, 302, 400, 401, 403, 405, 500]
}

/// File extensions probed for every wordlist entry.
pub fn default_extensions() -> Vec<String> {
    ["php", "htm", "html", "txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Suffixes appended to positive finds to catch editor and backup
/// artifacts left next to real files.
pub fn default_backup_extensions() -> Vec<String> {
    [
        "~", ".bak", ".BAK", ".old", ".backup", ".txt", ".OLD", ".BACKUP", "1", "2", "_", ".1",
        ".2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Options for a path discovery scan.
pub struct UrlScanOptions {
    /// Scan root; words are appended to this URL.
    pub target: Url,
    /// Status codes indicating the probed resource exists.
    pub positive_statuses: Vec<u16>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of parallel workers.
    pub parallelism: usize,
    /// Extensions probed per word, in addition to the bare word.
    pub extensions: Vec<String>,
    /// Backup suffixes appended to positive finds.
    pub backup_extensions: Vec<String>,
    /// When set, probe only `word/filename` per word instead of
    /// extension expansion. Useful when directories report 404.
    pub filename: Option<String>,
    /// HTTP method for probe requests.
    pub method: String,
    /// Extra `Name: value` headers; malformed entries are skipped.
    pub extra_headers: Vec<String>,
    /// Response sizes suppressed as fixed-size soft-404 pages.
    pub negative_lengths: Vec<u64>,
    /// Follow links found in page bodies.
    pub spider: bool,
    /// Skip TLS certificate verification.
    pub skip_tls_verify: bool,
    /// Upstream HTTP proxy.
    pub proxy: Option<Url>,
    /// Word source; the embedded default list when `None`.
    pub wordlist: Option<Wordlist>,
    /// Receives each result as it is classified.
    pub result_tx: Option<mpsc::UnboundedSender<UrlResult>>,
    /// Receives "currently probing" notifications; never blocks the scan.
    pub busy_tx: Option<mpsc::UnboundedSender<String>>,
}

impl UrlScanOptions {
    pub fn new(target: Url) -> Self {
        Self {
            target,
            positive_statuses: default_positive_statuses(),
            timeout: DEFAULT_TIMEOUT,
            parallelism: DEFAULT_PARALLELISM,
            extensions: default_extensions(),
            backup_extensions: default_backup_extensions(),
            filename: None,
            method: "GET".to_string(),
            extra_headers: Vec::new(),
            negative_lengths: Vec::new(),
            spider: false,
            skip_tls_verify: false,
            proxy: None,
            wordlist: None,
            result_tx: None,
            busy_tx: None,
        }
    }
}

/// Options for a virtual host discovery scan.
pub struct VhostScanOptions {
    /// Domain candidates are formed under (`word.basedomain`).
    pub base_domain: String,
    /// Probe this IP instead of resolving the base domain.
    pub ip: Option<IpAddr>,
    /// Port to connect to; scheme default (80/443) when `None`.
    pub port: Option<u16>,
    /// Use HTTPS for candidate requests.
    pub use_ssl: bool,
    /// Also compare body hashes against the baseline, for catch-all
    /// setups that answer every hostname with the same status.
    pub content_hashing: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of parallel workers.
    pub parallelism: usize,
    /// Word source; the embedded default list when `None`.
    pub wordlist: Option<Wordlist>,
    /// Receives each result as it is classified.
    pub result_tx: Option<mpsc::UnboundedSender<VhostResult>>,
    /// Receives "currently probing" notifications; never blocks the scan.
    pub busy_tx: Option<mpsc::UnboundedSender<String>>,
}

impl VhostScanOptions {
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into(),
            ip: None,
            port: None,
            use_ssl: false,
            content_hashing: false,
            timeout: DEFAULT_TIMEOUT,
            parallelism: DEFAULT_PARALLELISM,
            wordlist: None,
            result_tx: None,
            busy_tx: None,
        }
    }
}
