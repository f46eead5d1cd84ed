//! Path discovery: wordlist-driven probing of URIs relative to a target
//! URL, with redirect chasing, backup-file variants and optional spidering
//! feeding discovered work back into the pool.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, Method, Proxy};
use serde::Serialize;
use tokio::sync::mpsc;
use url::Url;

use crate::config::UrlScanOptions;
use crate::error::ScanError;
use crate::scan::pool::JobPool;
use crate::scan::probe::{Prober, USER_AGENT};
use crate::scan::spider::{extract_links, same_host};
use crate::scan::visited::{normalize, Visited};
use crate::wordlist::Wordlist;

/// One schedulable probe. Basic-only jobs were produced from an already
/// classified positive and are excluded from further backup expansion.
#[derive(Debug, Clone)]
pub struct UrlJob {
    pub url: String,
    pub basic_only: bool,
}

/// A discovered resource, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlResult {
    pub url: String,
    pub status: u16,
    pub size: u64,
}

pub struct UrlScanner {
    options: UrlScanOptions,
    prober: Prober,
    visited: Visited,
    results: Mutex<Vec<UrlResult>>,
    result_tx: Option<mpsc::UnboundedSender<UrlResult>>,
}

impl UrlScanner {
    /// Builds the scanner and its HTTP client. Configuration problems
    /// (bad method, bad proxy) surface here, before any request is made.
    pub fn new(mut options: UrlScanOptions) -> Result<Self, ScanError> {
        let method = Method::from_bytes(options.method.as_bytes())
            .map_err(|_| ScanError::InvalidMethod(options.method.clone()))?;

        let mut builder = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(Duration::from_secs(5))
            .redirect(redirect::Policy::none())
            .user_agent(USER_AGENT);
        if options.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }
        let client = builder.build()?;

        let busy_tx = options.busy_tx.take();
        let result_tx = options.result_tx.take();
        let prober = Prober::new(client, method, &options.extra_headers, busy_tx);

        Ok(Self {
            options,
            prober,
            visited: Visited::new(),
            results: Mutex::new(Vec::new()),
            result_tx,
        })
    }

    /// Runs the scan to completion and returns every discovered resource,
    /// in no particular order.
    pub async fn scan(mut self) -> Result<Vec<UrlResult>, ScanError> {
        let words = self.options.wordlist.take().unwrap_or_else(Wordlist::builtin);
        let parallelism = self.options.parallelism.max(1);

        let mut prefix = self.options.target.to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        let scanner = Arc::new(self);
        let (pool, seeder) = JobPool::new(parallelism * 2);

        tracing::debug!("starting {parallelism} workers");
        let workers = Arc::clone(&pool).spawn_workers(parallelism, {
            let scanner = Arc::clone(&scanner);
            let pool = Arc::clone(&pool);
            move |job| {
                let scanner = Arc::clone(&scanner);
                let pool = Arc::clone(&pool);
                async move { scanner.check_url(job, &pool).await }
            }
        });

        tracing::debug!("seeding jobs");
        seeder
            .push(UrlJob {
                url: prefix.clone(),
                basic_only: false,
            })
            .await;
        for word in words {
            if word.is_empty() {
                continue;
            }
            let uri = format!("{prefix}{word}");
            if let Some(filename) = &scanner.options.filename {
                seeder
                    .push(UrlJob {
                        url: format!("{uri}/{filename}"),
                        basic_only: true,
                    })
                    .await;
            } else {
                seeder
                    .push(UrlJob {
                        url: uri.clone(),
                        basic_only: true,
                    })
                    .await;
                if !uri.ends_with(".htaccess") && !uri.ends_with(".htpasswd") {
                    for ext in &scanner.options.extensions {
                        seeder
                            .push(UrlJob {
                                url: format!("{uri}.{ext}"),
                                basic_only: false,
                            })
                            .await;
                    }
                }
            }
        }
        seeder.finish();

        tracing::debug!("waiting for workers");
        futures::future::join_all(workers).await;
        tracing::debug!("scan complete, {} urls visited", scanner.visited.len());

        let results = std::mem::take(&mut *scanner.results.lock());
        Ok(results)
    }

    async fn check_url(&self, job: UrlJob, pool: &Arc<JobPool<UrlJob>>) {
        let target = normalize(&job.url).to_string();
        if !self.visited.claim(&target) {
            return;
        }

        let Some(response) = self.prober.probe(&target).await else {
            return;
        };
        let status = response.status().as_u16();

        let Ok(base) = Url::parse(&target) else { return };

        // a 3xx is data, not something the client follows for us
        if let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        {
            if let Ok(resolved) = base.join(location) {
                if same_host(&resolved, &base) {
                    pool.discover(UrlJob {
                        url: resolved.to_string(),
                        basic_only: false,
                    });
                }
            }
        }

        if !self.options.positive_statuses.contains(&status) {
            return;
        }

        if !job.basic_only && !target.contains("/.htaccess") && !target.contains("/.htpasswd") {
            for suffix in &self.options.backup_extensions {
                pool.discover(UrlJob {
                    url: backup_candidate(&target, suffix),
                    basic_only: true,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let header_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let mut size = None;
        if self.options.spider && (content_type.is_empty() || content_type.contains("html")) {
            if let Ok(body) = response.bytes().await {
                for link in extract_links(&base, &body) {
                    pool.discover(UrlJob {
                        url: link.to_string(),
                        basic_only: false,
                    });
                }
                size = Some(body.len() as u64);
            }
        } else if header_length.is_some() {
            size = header_length;
        } else if let Ok(body) = response.bytes().await {
            size = Some(body.len() as u64);
        }
        let size = size.or(header_length).unwrap_or(0);

        // fixed-size soft-404 pages are filtered out here
        if self.options.negative_lengths.contains(&size) {
            return;
        }

        self.emit(UrlResult {
            url: target,
            status,
            size,
        });
    }

    fn emit(&self, result: UrlResult) {
        if let Some(tx) = &self.result_tx {
            let _ = tx.send(result.clone());
        }
        self.results.lock().push(result);
    }
}

/// Appends a backup suffix, splicing it in before any query string so
/// `/a.php?x=1` becomes `/a.php~?x=1`.
fn backup_candidate(url: &str, suffix: &str) -> String {
    match url.split_once('?') {
        Some((path, query)) => format!("{path}{suffix}?{query}"),
        None => format!("{url}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_suffix_appends_to_plain_urls() {
        assert_eq!(
            backup_candidate("http://h/login.php", "~"),
            "http://h/login.php~"
        );
    }

    #[test]
    fn backup_suffix_splices_before_query() {
        assert_eq!(
            backup_candidate("http://h/login.php?next=/", ".bak"),
            "http://h/login.php.bak?next=/"
        );
    }
}
