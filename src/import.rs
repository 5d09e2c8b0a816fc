// Scan-and-import orchestration - bridge the engine to an injected record store

use crate::certificates::chain::{self, ChainVerificationResult};
use crate::certificates::metadata::{self, CertificateMetadata};
use crate::error::Result;
use crate::scanner::TlsScanner;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A stored certificate record. The engine computes every derived field; the
/// store only keeps them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Unique record name, the import identity key
    pub name: String,
    pub description: String,
    pub certificate_pem: String,
    pub private_key_pem: Option<String>,
    /// Single optional reference to the signing CA's record name. Kept as a
    /// plain reference, not a traversable list; verification is one hop.
    pub ca_name: Option<String>,
    pub metadata: CertificateMetadata,
    pub chain: Option<ChainVerificationResult>,
}

/// Persistence interface the record layer injects into the orchestrator.
/// The engine has no awareness of how records are stored.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<CertificateRecord>>;
    async fn create(&self, record: CertificateRecord) -> Result<CertificateRecord>;
    async fn update(&self, record: CertificateRecord) -> Result<CertificateRecord>;
}

/// What the import did with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportAction {
    Created,
    Updated,
    AlreadyExists,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub record: CertificateRecord,
    pub action: ImportAction,
    pub message: String,
}

/// Composes scan, codec and extraction into one import operation against an
/// injected store.
pub struct ScanImporter<S> {
    scanner: TlsScanner,
    store: S,
}

impl<S: CertificateStore> ScanImporter<S> {
    pub fn new(scanner: TlsScanner, store: S) -> Self {
        Self { scanner, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scan `hostname:port` and create or update the record named `name`
    /// (defaulting to `"hostname:port"`).
    ///
    /// With `update_existing` false an existing record is left untouched and
    /// reported as already existing. Scan failures propagate as errors for
    /// the caller to present; they never leave a half-written record.
    pub async fn import(
        &self,
        hostname: &str,
        port: u16,
        name: Option<&str>,
        update_existing: bool,
        now: DateTime<Utc>,
    ) -> Result<ImportOutcome> {
        let scan = self.scanner.scan(hostname, port).await?;
        self.apply(scan, name, update_existing, now).await
    }

    /// Record bookkeeping for a completed scan.
    async fn apply(
        &self,
        scan: crate::scanner::ScanResult,
        name: Option<&str>,
        update_existing: bool,
        now: DateTime<Utc>,
    ) -> Result<ImportOutcome> {
        let record_name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:{}", scan.hostname, scan.port));
        let description = format!(
            "Auto-imported from {}:{} (Protocol: {}, Cipher: {})",
            scan.hostname, scan.port, scan.protocol, scan.cipher
        );
        let metadata = metadata::extract(&scan.leaf_der, now)?;

        match self.store.find_by_name(&record_name).await? {
            Some(existing) if update_existing => {
                let mut record = existing;
                record.certificate_pem = scan.certificate_pem;
                record.description = description;
                record.metadata = metadata;
                record.chain = self.reverify_chain(&record).await?;

                let record = self.store.update(record).await?;
                info!("Updated certificate: {}", record_name);
                Ok(ImportOutcome {
                    record,
                    action: ImportAction::Updated,
                    message: "Certificate updated".to_string(),
                })
            }
            Some(existing) => Ok(ImportOutcome {
                record: existing,
                action: ImportAction::AlreadyExists,
                message: "Certificate already exists (not updated)".to_string(),
            }),
            None => {
                let record = CertificateRecord {
                    name: record_name.clone(),
                    description,
                    certificate_pem: scan.certificate_pem,
                    private_key_pem: None,
                    ca_name: None,
                    metadata,
                    chain: None,
                };

                let record = self.store.create(record).await?;
                info!("Created new certificate: {}", record_name);
                Ok(ImportOutcome {
                    record,
                    action: ImportAction::Created,
                    message: "Certificate imported".to_string(),
                })
            }
        }
    }

    /// The certificate bytes changed, so any existing chain result is stale
    /// and must be recomputed against the referenced CA record.
    async fn reverify_chain(
        &self,
        record: &CertificateRecord,
    ) -> Result<Option<ChainVerificationResult>> {
        let Some(ca_name) = record.ca_name.as_deref() else {
            return Ok(None);
        };

        let result = match self.store.find_by_name(ca_name).await? {
            Some(ca_record) => chain::verify_chain_pem(
                &record.certificate_pem,
                Some(&ca_record.certificate_pem),
            ),
            None => ChainVerificationResult::load_error(format!(
                "CA certificate record '{}' not found",
                ca_name
            )),
        };

        Ok(Some(result))
    }
}
