//! Virtual host discovery: every candidate hostname is probed against one
//! fixed IP and classified by deviation from the fingerprint of a
//! guaranteed-nonexistent host, which defeats catch-all configurations.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use hyper::client::connect::dns::Name;
use reqwest::dns::{Addrs, Resolve, Resolving};
use reqwest::{redirect, Client, Method};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::VhostScanOptions;
use crate::error::ScanError;
use crate::scan::pool::JobPool;
use crate::scan::probe::{Prober, USER_AGENT};
use crate::scan::visited::Visited;
use crate::wordlist::Wordlist;

/// A hostname whose response deviates from the baseline fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VhostResult {
    pub host: String,
    pub status: u16,
}

/// Response signature of the synthetic nonexistent host; the null
/// hypothesis every candidate is compared against.
struct Baseline {
    status: u16,
    hash: Option<String>,
}

/// Sends every connection to the scan's fixed IP while the candidate
/// hostname still rides in the Host header and SNI. The port always comes
/// from the request URL.
struct ForcedResolver {
    addr: SocketAddr,
}

impl Resolve for ForcedResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        let addr = self.addr;
        Box::pin(async move {
            let addrs: Addrs = Box::new(std::iter::once(addr));
            Ok(addrs)
        })
    }
}

pub struct VhostScanner {
    options: VhostScanOptions,
    visited: Visited,
    results: Mutex<Vec<VhostResult>>,
    result_tx: Option<mpsc::UnboundedSender<VhostResult>>,
}

impl VhostScanner {
    pub fn new(mut options: VhostScanOptions) -> Self {
        let result_tx = options.result_tx.take();
        Self {
            options,
            visited: Visited::new(),
            results: Mutex::new(Vec::new()),
            result_tx,
        }
    }

    /// Runs the scan to completion. Fails fast when the base domain does
    /// not resolve or the baseline request cannot be made at all.
    pub async fn scan(mut self) -> Result<Vec<VhostResult>, ScanError> {
        tracing::debug!("looking up base domain");
        let ip = match self.options.ip {
            Some(ip) => ip,
            None => resolve_domain(&self.options.base_domain).await?,
        };

        let client = self.build_client(ip)?;
        let busy_tx = self.options.busy_tx.take();
        let prober = Arc::new(Prober::new(client.clone(), Method::GET, &[], busy_tx));

        // a hostname hashed from the clock will not exist on any sane setup
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let bad_host = format!(
            "{}.{}",
            md5_hex(now.as_nanos().to_string().as_bytes()),
            self.options.base_domain
        );
        tracing::debug!("fetching baseline fingerprint from {bad_host}");
        let response = client.get(self.url_for(&bad_host)).send().await?;
        let status = response.status().as_u16();
        let hash = if self.options.content_hashing {
            Some(md5_hex(&response.bytes().await?))
        } else {
            None
        };
        let baseline = Arc::new(Baseline { status, hash });

        let mut words = self.options.wordlist.take().unwrap_or_else(Wordlist::builtin);
        let parallelism = self.options.parallelism.max(1);

        let scanner = Arc::new(self);
        let (pool, seeder) = JobPool::new(parallelism * 2);

        tracing::debug!("starting {parallelism} workers");
        let workers = Arc::clone(&pool).spawn_workers(parallelism, {
            let scanner = Arc::clone(&scanner);
            let prober = Arc::clone(&prober);
            let baseline = Arc::clone(&baseline);
            move |host: String| {
                let scanner = Arc::clone(&scanner);
                let prober = Arc::clone(&prober);
                let baseline = Arc::clone(&baseline);
                async move { scanner.check_vhost(host, &prober, &baseline).await }
            }
        });

        tracing::debug!("seeding candidates");
        for word in &mut words {
            if word.is_empty() {
                continue;
            }
            seeder
                .push(format!("{word}.{}", scanner.options.base_domain))
                .await;
        }
        seeder.finish();

        tracing::debug!("waiting for workers");
        futures::future::join_all(workers).await;
        tracing::debug!("scan complete, {} hosts probed", scanner.visited.len());

        let results = std::mem::take(&mut *scanner.results.lock());
        Ok(results)
    }

    async fn check_vhost(&self, host: String, prober: &Prober, baseline: &Baseline) {
        if !self.visited.claim(&host) {
            return;
        }

        let Some(response) = prober.probe(&self.url_for(&host)).await else {
            return;
        };
        let status = response.status().as_u16();
        let hash = if self.options.content_hashing {
            match response.bytes().await {
                Ok(body) => Some(md5_hex(&body)),
                Err(_) => return,
            }
        } else {
            None
        };

        if status != baseline.status || (self.options.content_hashing && hash != baseline.hash) {
            self.emit(VhostResult { host, status });
        }
    }

    fn emit(&self, result: VhostResult) {
        if let Some(tx) = &self.result_tx {
            let _ = tx.send(result.clone());
        }
        self.results.lock().push(result);
    }

    fn url_for(&self, host: &str) -> String {
        let scheme = if self.options.use_ssl { "https" } else { "http" };
        match self.options.port {
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        }
    }

    // certificate names rarely cover vhost candidates; verification is
    // always off in this mode
    fn build_client(&self, ip: IpAddr) -> Result<Client, ScanError> {
        let resolver = Arc::new(ForcedResolver {
            addr: SocketAddr::new(ip, 0),
        });
        let client = Client::builder()
            .timeout(self.options.timeout)
            .connect_timeout(Duration::from_secs(5))
            .redirect(redirect::Policy::none())
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .dns_resolver(resolver)
            .build()?;
        Ok(client)
    }
}

async fn resolve_domain(domain: &str) -> Result<IpAddr, ScanError> {
    let mut addrs = tokio::net::lookup_host((domain, 0))
        .await
        .map_err(|err| ScanError::Resolution {
            domain: domain.to_string(),
            reason: err.to_string(),
        })?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ScanError::Resolution {
            domain: domain.to_string(),
            reason: "no address records".to_string(),
        })
}

fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}
