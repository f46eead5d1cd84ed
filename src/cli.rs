use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Discover unlinked paths, files and virtual hosts on web servers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Disable the in-place progress line
    #[arg(long, global = true, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Discover URLs relative to the target URL
    Url {
        /// Target URL (e.g. https://example.com)
        target: url::Url,

        /// Path to a wordlist file; the embedded list is used when omitted
        #[arg(short = 'w', long)]
        wordlist: Option<PathBuf>,

        /// Parallel workers sending requests
        #[arg(short = 'p', long, default_value_t = 10)]
        parallelism: usize,

        /// File extensions to probe for each word
        #[arg(short = 'x', long = "extension", value_delimiter = ',')]
        extensions: Vec<String>,

        /// HTTP status codes which indicate a positive find
        #[arg(short = 'c', long = "status-code", value_delimiter = ',')]
        status_codes: Vec<u16>,

        /// Extra header to send with requests (repeatable, `Name: value`)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Filename to seek in each probed directory. Useful when all
        /// directories report 404 status.
        #[arg(short = 'f', long)]
        filename: Option<String>,

        /// Spider links within page content
        #[arg(short = 's', long, default_value_t = false)]
        spider: bool,

        /// Skip TLS certificate verification
        #[arg(short = 'k', long = "skip-tls-verify", default_value_t = false)]
        insecure: bool,

        /// Upstream HTTP proxy URL
        #[arg(long)]
        proxy: Option<url::Url>,

        /// HTTP method for probe requests
        #[arg(short = 'm', long, default_value = "GET")]
        method: String,

        /// Response sizes to suppress as fixed-size soft-404 pages
        #[arg(long = "negative-length", value_delimiter = ',')]
        negative_lengths: Vec<u64>,

        /// Backup suffixes appended to positive finds
        #[arg(long = "backup-extension", value_delimiter = ',')]
        backup_extensions: Vec<String>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,

        /// Write results to this file as JSON lines
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Discover virtual hosts served under a base domain
    Vhost {
        /// Base domain (e.g. example.com)
        domain: String,

        /// Path to a wordlist file; the embedded list is used when omitted
        #[arg(short = 'w', long)]
        wordlist: Option<PathBuf>,

        /// Parallel workers sending requests
        #[arg(short = 'p', long, default_value_t = 10)]
        parallelism: usize,

        /// Probe this IP instead of resolving the base domain
        #[arg(long)]
        ip: Option<IpAddr>,

        /// Port to connect to (default 80, or 443 with --ssl)
        #[arg(long)]
        port: Option<u16>,

        /// Use HTTPS for candidate requests
        #[arg(long, default_value_t = false)]
        ssl: bool,

        /// Compare response body hashes against the baseline, for
        /// catch-all hosts that answer every name with the same status
        #[arg(long, default_value_t = false)]
        content_hashing: bool,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,

        /// Write results to this file as JSON lines
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
