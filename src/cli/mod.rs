// Command-line interface definitions

pub mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Certificate intelligence toolkit: inspect, scan, verify and track
/// SSL/TLS certificates
#[derive(Parser, Debug)]
#[command(name = "certscope", version, about)]
pub struct Cli {
    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a PEM certificate file and print its metadata
    Inspect {
        /// Path to a PEM-encoded certificate
        file: PathBuf,
    },

    /// Retrieve and inspect the certificate a remote host presents
    Scan {
        /// Target as host, host:port or URL (default port 443)
        target: String,

        /// Connect/handshake timeout in seconds
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: u64,

        /// Import the scanned certificate into a record store
        #[arg(long)]
        import: bool,

        /// Record store file (required with --import)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Record name (default: "host:port")
        #[arg(long)]
        name: Option<String>,

        /// Do not overwrite an existing record
        #[arg(long)]
        no_update: bool,
    },

    /// Scan many targets in parallel from a file (one target per line,
    /// '#' comments allowed)
    BulkScan {
        /// File with one target per line
        #[arg(long)]
        input_file: PathBuf,

        /// Maximum concurrent scans
        #[arg(long, default_value_t = 8)]
        max_parallel: usize,

        /// Connect/handshake timeout in seconds
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: u64,
    },

    /// Verify that a CA certificate signed a leaf certificate (one hop)
    VerifyChain {
        /// Path to the leaf certificate PEM
        cert: PathBuf,

        /// Path to the candidate CA certificate PEM
        #[arg(long)]
        ca: PathBuf,
    },

    /// Check that a private key pairs with a certificate
    CheckKey {
        /// Path to the certificate PEM
        cert: PathBuf,

        /// Path to the unencrypted private key PEM
        #[arg(long)]
        key: PathBuf,
    },

    /// Report expiring and expired certificates in a record store
    Check {
        /// Record store file
        #[arg(long)]
        store: PathBuf,

        /// Warn about certificates expiring within this many days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Export a stored certificate as separate files
    Export {
        /// Record name to export
        name: String,

        /// Record store file
        #[arg(long)]
        store: PathBuf,

        /// Directory to write the exported files into
        #[arg(long)]
        out_dir: PathBuf,
    },
}
