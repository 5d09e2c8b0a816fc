// certscope - certificate intelligence toolkit

use anyhow::{Context, Result, bail};
use certscope::certificates::{chain, keymatch, metadata, status};
use certscope::cli::store::JsonFileStore;
use certscope::cli::{Cli, Command};
use certscope::import::{CertificateStore, ScanImporter};
use certscope::scanner::{self, Target, TlsScanner};
use certscope::{CertificateMetadata, CertificateStatus};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging - respect RUST_LOG environment variable
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { file } => inspect(&file, cli.json),
        Command::Scan {
            target,
            timeout,
            import,
            store,
            name,
            no_update,
        } => scan(&target, timeout, import, store.as_deref(), name.as_deref(), no_update, cli.json).await,
        Command::BulkScan {
            input_file,
            max_parallel,
            timeout,
        } => bulk_scan(&input_file, max_parallel, timeout, cli.json).await,
        Command::VerifyChain { cert, ca } => verify_chain(&cert, &ca),
        Command::CheckKey { cert, key } => check_key(&cert, &key),
        Command::Check { store, days } => check(&store, days).await,
        Command::Export {
            name,
            store,
            out_dir,
        } => export(&name, &store, &out_dir).await,
    }
}

fn inspect(file: &Path, json: bool) -> Result<()> {
    let pem_text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let meta = metadata::extract_from_pem(&pem_text, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        print_metadata(&meta);
    }
    Ok(())
}

async fn scan(
    target: &str,
    timeout: u64,
    import: bool,
    store: Option<&Path>,
    name: Option<&str>,
    no_update: bool,
    json: bool,
) -> Result<()> {
    let target = Target::parse(target)?;
    let scanner = TlsScanner::new(Duration::from_secs(timeout));

    if import {
        let Some(store_path) = store else {
            bail!("--import requires --store");
        };
        let store = JsonFileStore::open(store_path)?;
        let importer = ScanImporter::new(scanner, store);

        let outcome = importer
            .import(&target.hostname, target.port, name, !no_update, Utc::now())
            .await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!("{} {}", "✓".green(), outcome.message);
            print_metadata(&outcome.record.metadata);
        }
        return Ok(());
    }

    let result = scanner.scan(&target.hostname, target.port).await?;
    let meta = metadata::extract(&result.leaf_der, Utc::now())?;

    if json {
        let payload = serde_json::json!({
            "scan": result,
            "metadata": meta,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} {} ({}, {})",
            "Scanned".cyan().bold(),
            target,
            result.protocol,
            result.cipher
        );
        if !result.chain_pem.is_empty() {
            println!("Peer offered {} additional chain certificate(s)", result.chain_pem.len());
        }
        print_metadata(&meta);
    }
    Ok(())
}

async fn bulk_scan(input_file: &Path, max_parallel: usize, timeout: u64, json: bool) -> Result<()> {
    let contents = std::fs::read_to_string(input_file)
        .with_context(|| format!("cannot read {}", input_file.display()))?;

    let mut targets = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Target::parse(line) {
            Ok(target) => targets.push(target),
            Err(e) => warn!("Skipping invalid target '{}': {}", line, e),
        }
    }

    if targets.is_empty() {
        bail!("no targets found in {}", input_file.display());
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid template"),
    );
    progress.set_message(format!(
        "Scanning {} targets (max {} concurrent)...",
        targets.len(),
        max_parallel
    ));
    progress.enable_steady_tick(Duration::from_millis(100));

    let scanner = TlsScanner::new(Duration::from_secs(timeout));
    let results = scanner::scan_many(&scanner, &targets, max_parallel).await;
    progress.finish_and_clear();

    if json {
        let now = Utc::now();
        let payload: Vec<serde_json::Value> = results
            .iter()
            .map(|(target, result)| match result {
                Ok(scan) => serde_json::json!({
                    "target": target.identifier(),
                    "success": true,
                    "scan": scan,
                    "metadata": metadata::extract(&scan.leaf_der, now).ok(),
                }),
                Err(e) => serde_json::json!({
                    "target": target.identifier(),
                    "success": false,
                    "error": e.to_string(),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let mut failures = 0usize;
    for (target, result) in &results {
        match result {
            Ok(scan) => match metadata::extract(&scan.leaf_der, Utc::now()) {
                Ok(meta) => println!(
                    "{} {} CN={} expires {} ({})",
                    "✓".green(),
                    target,
                    meta.common_name,
                    meta.valid_until.format("%Y-%m-%d"),
                    status_colored(meta.status)
                ),
                Err(e) => {
                    failures += 1;
                    println!("{} {} {}", "✗".red(), target, e);
                }
            },
            Err(e) => {
                failures += 1;
                println!("{} {} {}", "✗".red(), target, e);
            }
        }
    }

    println!(
        "\n{} scanned, {} failed",
        results.len() - failures,
        failures
    );
    Ok(())
}

fn verify_chain(cert: &Path, ca: &Path) -> Result<()> {
    let leaf_pem = std::fs::read_to_string(cert)
        .with_context(|| format!("cannot read {}", cert.display()))?;
    let ca_pem =
        std::fs::read_to_string(ca).with_context(|| format!("cannot read {}", ca.display()))?;

    let result = chain::verify_chain_pem(&leaf_pem, Some(&ca_pem));
    if result.verified {
        println!("{} {}", "✓".green(), result.message);
    } else {
        println!("{} {}", "✗".red(), result.message);
        std::process::exit(1);
    }
    Ok(())
}

fn check_key(cert: &Path, key: &Path) -> Result<()> {
    let cert_pem = std::fs::read_to_string(cert)
        .with_context(|| format!("cannot read {}", cert.display()))?;
    let key_pem =
        std::fs::read_to_string(key).with_context(|| format!("cannot read {}", key.display()))?;

    keymatch::validate_key_match_pem(&cert_pem, &key_pem)?;
    println!("{} Private key matches certificate", "✓".green());
    Ok(())
}

async fn check(store_path: &Path, days: i64) -> Result<()> {
    let store = JsonFileStore::open(store_path)?;
    let now = Utc::now();

    // Refresh every record's derived fields before reporting
    let mut refreshed = Vec::new();
    for mut record in store.records() {
        match metadata::extract_from_pem(&record.certificate_pem, now) {
            Ok(meta) => {
                record.metadata = meta;
                let record = store.update(record).await?;
                refreshed.push(record);
            }
            Err(e) => warn!("Skipping unparseable record '{}': {}", record.name, e),
        }
    }

    let all_metadata: Vec<&CertificateMetadata> =
        refreshed.iter().map(|r| &r.metadata).collect();
    let expiring = status::expiring_within(all_metadata.iter().copied(), days);
    let expired = status::expired(all_metadata.iter().copied());

    if expiring.is_empty() && expired.is_empty() {
        println!("{}", "All certificates are valid".green());
        return Ok(());
    }

    if !expired.is_empty() {
        println!("{}", "EXPIRED CERTIFICATES:".red().bold());
        for meta in expired.iter().copied() {
            println!(
                "- {} (CN: {}) - expired {} days ago",
                record_name_for(&refreshed, meta),
                meta.common_name,
                meta.days_until_expiry.abs()
            );
        }
    }

    if !expiring.is_empty() {
        println!("{}", "\nEXPIRING SOON:".yellow().bold());
        for meta in expiring.iter().copied() {
            println!(
                "- {} (CN: {}) - expires in {} days",
                record_name_for(&refreshed, meta),
                meta.common_name,
                meta.days_until_expiry
            );
        }
    }

    println!(
        "\nFound {} expiring and {} expired certificates",
        expiring.len(),
        expired.len()
    );
    Ok(())
}

async fn export(name: &str, store_path: &Path, out_dir: &Path) -> Result<()> {
    let store = JsonFileStore::open(store_path)?;

    let Some(record) = store.find_by_name(name).await? else {
        bail!("record '{}' not found in {}", name, store_path.display());
    };
    let ca = match record.ca_name.as_deref() {
        Some(ca_name) => store.find_by_name(ca_name).await?,
        None => None,
    };

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    for file in certscope::export::export_bundle(&record, ca.as_ref()) {
        let path = out_dir.join(&file.file_name);
        std::fs::write(&path, &file.contents)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!("{} {}", "Wrote".cyan(), path.display());
    }
    Ok(())
}

fn record_name_for<'a>(
    records: &'a [certscope::import::CertificateRecord],
    meta: &CertificateMetadata,
) -> &'a str {
    records
        .iter()
        .find(|r| r.metadata.fingerprint_sha256 == meta.fingerprint_sha256)
        .map(|r| r.name.as_str())
        .unwrap_or("<unknown>")
}

fn status_colored(status: CertificateStatus) -> colored::ColoredString {
    match status {
        CertificateStatus::Valid => status.as_str().green(),
        CertificateStatus::ExpiringSoon => status.as_str().yellow(),
        CertificateStatus::Expired => status.as_str().red(),
    }
}

fn print_metadata(meta: &CertificateMetadata) {
    println!("Common Name:         {}", meta.common_name);
    println!("Issuer:              {}", meta.issuer_common_name);
    if meta.subject_alternative_names.is_empty() {
        println!("SANs:                none");
    } else {
        println!("SANs:                {}", meta.subject_alternative_names.join(", "));
    }
    println!("Serial Number:       {}", meta.serial_number);
    println!("Valid From:          {}", meta.valid_from.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Valid Until:         {}", meta.valid_until.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Days Until Expiry:   {}", meta.days_until_expiry);
    println!("Status:              {}", status_colored(meta.status));
    println!("Self-Signed:         {}", if meta.is_self_signed { "yes" } else { "no" });
    println!("Key Size:            {} bits", meta.key_size_bits);
    println!("Signature Algorithm: {}", meta.signature_algorithm);
    println!("SHA-256 Fingerprint: {}", meta.fingerprint_sha256);
}
