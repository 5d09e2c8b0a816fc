// Ingest boundary - accept opaque PEM text and produce derived state
//
// Parsing and key-mismatch failures propagate and must block the record from
// being saved; chain verification failures are captured as a value so the
// record layer can display them without aborting.

use crate::certificates::chain::{self, ChainVerificationResult};
use crate::certificates::keymatch;
use crate::certificates::metadata::{self, CertificateMetadata};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the record layer needs to populate a certificate record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub metadata: CertificateMetadata,
    pub chain: Option<ChainVerificationResult>,
}

/// Parse certificate PEM, optionally validate a private key against it, and
/// optionally verify the one-hop chain against a CA certificate.
///
/// Extraction is all-or-nothing: on error no partial metadata escapes.
pub fn ingest(
    certificate_pem: &str,
    private_key_pem: Option<&str>,
    ca_pem: Option<&str>,
    now: DateTime<Utc>,
) -> Result<IngestReport> {
    let metadata = metadata::extract_from_pem(certificate_pem, now)?;

    if let Some(key_pem) = private_key_pem {
        keymatch::validate_key_match_pem(certificate_pem, key_pem)?;
    }

    let chain = ca_pem.map(|ca| chain::verify_chain_pem(certificate_pem, Some(ca)));

    Ok(IngestReport { metadata, chain })
}
