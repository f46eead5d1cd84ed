use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::cli::{Cli, Commands};
use uncloak::config::{UrlScanOptions, VhostScanOptions};
use uncloak::output::write_jsonl;
use uncloak::scan::{UrlScanner, VhostScanner};
use uncloak::wordlist::Wordlist;

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Keep reqwest/hyper at info so debug runs show our probes, not the
    // connection pool's internals.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter_str = format!("uncloak={crate_level},reqwest=info,hyper=info");
    let env_filter =
        EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Url {
            target,
            wordlist,
            parallelism,
            extensions,
            status_codes,
            headers,
            filename,
            spider,
            insecure,
            proxy,
            method,
            negative_lengths,
            backup_extensions,
            timeout,
            output,
        } => {
            let mut options = UrlScanOptions::new(target);
            options.parallelism = parallelism;
            options.timeout = Duration::from_secs(timeout);
            if !extensions.is_empty() {
                options.extensions = extensions;
            }
            if !status_codes.is_empty() {
                options.positive_statuses = status_codes;
            }
            if !backup_extensions.is_empty() {
                options.backup_extensions = backup_extensions;
            }
            options.extra_headers = headers;
            options.filename = filename;
            options.spider = spider;
            options.skip_tls_verify = insecure;
            options.proxy = proxy;
            options.method = method;
            options.negative_lengths = negative_lengths;
            if let Some(path) = &wordlist {
                options.wordlist = Some(load_wordlist(path)?);
            }
            run_url_scan(options, output, cli.no_progress).await
        }
        Commands::Vhost {
            domain,
            wordlist,
            parallelism,
            ip,
            port,
            ssl,
            content_hashing,
            timeout,
            output,
        } => {
            let mut options = VhostScanOptions::new(domain);
            options.parallelism = parallelism;
            options.timeout = Duration::from_secs(timeout);
            options.ip = ip;
            options.port = port;
            options.use_ssl = ssl;
            options.content_hashing = content_hashing;
            if let Some(path) = &wordlist {
                options.wordlist = Some(load_wordlist(path)?);
            }
            run_vhost_scan(options, output, cli.no_progress).await
        }
    }
}

fn load_wordlist(path: &std::path::Path) -> anyhow::Result<Wordlist> {
    Wordlist::from_file(path).with_context(|| format!("failed to open wordlist {}", path.display()))
}

async fn run_url_scan(
    mut options: UrlScanOptions,
    output: Option<PathBuf>,
    no_progress: bool,
) -> anyhow::Result<()> {
    println!("[>] Target: {}", options.target);
    println!(
        "[~] Workers: {} | Method: {} | Timeout: {}s",
        options.parallelism,
        options.method,
        options.timeout.as_secs()
    );
    println!("[~] Extensions: {}", options.extensions.join(","));
    println!(
        "[~] Positive codes: {}",
        options
            .positive_statuses
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    );
    if options.spider {
        println!("[~] Spidering enabled");
    }
    println!("\n{}\n", "-".repeat(60));

    let (result_tx, mut result_rx) = mpsc::unbounded_channel();
    let (busy_tx, mut busy_rx) = mpsc::unbounded_channel();
    options.result_tx = Some(result_tx);
    options.busy_tx = Some(busy_tx);

    let bar = progress_bar(no_progress);
    let busy_task = tokio::spawn({
        let bar = bar.clone();
        async move {
            while let Some(uri) = busy_rx.recv().await {
                bar.set_message(uri);
            }
        }
    });
    let print_task = tokio::spawn({
        let bar = bar.clone();
        async move {
            while let Some(result) = result_rx.recv().await {
                bar.println(format!(
                    "[{}] {} ({} bytes)",
                    result.status, result.url, result.size
                ));
            }
        }
    });

    let scanner = UrlScanner::new(options)?;
    let results = scanner.scan().await?;

    let _ = busy_task.await;
    let _ = print_task.await;
    bar.finish_and_clear();

    println!("\nScan complete. {} results found.", results.len());
    if let Some(path) = output {
        write_jsonl(&path, &results)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("[=] Results written to {}", path.display());
    }
    Ok(())
}

async fn run_vhost_scan(
    mut options: VhostScanOptions,
    output: Option<PathBuf>,
    no_progress: bool,
) -> anyhow::Result<()> {
    println!("[>] Base domain: {}", options.base_domain);
    if let Some(ip) = options.ip {
        println!("[~] IP override: {ip}");
    }
    println!(
        "[~] Workers: {} | Timeout: {}s | SSL: {} | Content hashing: {}",
        options.parallelism,
        options.timeout.as_secs(),
        options.use_ssl,
        options.content_hashing
    );
    println!("\n{}\n", "-".repeat(60));

    let (result_tx, mut result_rx) = mpsc::unbounded_channel();
    let (busy_tx, mut busy_rx) = mpsc::unbounded_channel();
    options.result_tx = Some(result_tx);
    options.busy_tx = Some(busy_tx);

    let bar = progress_bar(no_progress);
    let busy_task = tokio::spawn({
        let bar = bar.clone();
        async move {
            while let Some(host) = busy_rx.recv().await {
                bar.set_message(host);
            }
        }
    });
    let print_task = tokio::spawn({
        let bar = bar.clone();
        async move {
            while let Some(result) = result_rx.recv().await {
                bar.println(format!("[{}] {}", result.status, result.host));
            }
        }
    });

    let results = VhostScanner::new(options).scan().await?;

    let _ = busy_task.await;
    let _ = print_task.await;
    bar.finish_and_clear();

    println!("\nScan complete. {} virtual hosts found.", results.len());
    if let Some(path) = output {
        write_jsonl(&path, &results)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("[=] Results written to {}", path.display());
    }
    Ok(())
}

fn progress_bar(no_progress: bool) -> ProgressBar {
    if no_progress {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
