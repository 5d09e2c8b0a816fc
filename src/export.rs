// Export packaging - named text blobs for a certificate record
//
// The stored PEM text is passed through verbatim so it round-trips
// byte-identically; only the metadata summary is rendered here.

use crate::import::CertificateRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Package a record as separate named files: certificate, optional private
/// key, optional CA certificate, and a human-readable metadata summary.
pub fn export_bundle(record: &CertificateRecord, ca: Option<&CertificateRecord>) -> Vec<ExportFile> {
    let mut files = Vec::new();

    files.push(ExportFile {
        file_name: format!("{}.crt", record.name),
        contents: record.certificate_pem.clone(),
    });

    if let Some(key_pem) = &record.private_key_pem {
        files.push(ExportFile {
            file_name: format!("{}.key", record.name),
            contents: key_pem.clone(),
        });
    }

    if let Some(ca_record) = ca {
        files.push(ExportFile {
            file_name: format!("{}_ca.crt", record.name),
            contents: ca_record.certificate_pem.clone(),
        });
    }

    files.push(ExportFile {
        file_name: format!("{}_info.txt", record.name),
        contents: render_summary(record),
    });

    files
}

fn render_summary(record: &CertificateRecord) -> String {
    let meta = &record.metadata;
    let mut summary = String::new();

    summary.push_str("Certificate Information\n");
    summary.push_str("=======================\n");
    summary.push_str(&format!("Name: {}\n", record.name));
    summary.push_str(&format!("Common Name: {}\n", meta.common_name));
    summary.push_str(&format!("Issuer: {}\n", meta.issuer_common_name));
    summary.push_str(&format!("Serial Number: {}\n", meta.serial_number));
    summary.push_str(&format!(
        "Valid From: {}\n",
        meta.valid_from.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    summary.push_str(&format!(
        "Valid Until: {}\n",
        meta.valid_until.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    summary.push_str(&format!("Status: {}\n", meta.status));
    summary.push_str(&format!("Key Size: {} bits\n", meta.key_size_bits));
    summary.push_str(&format!("Signature Algorithm: {}\n", meta.signature_algorithm));
    summary.push_str(&format!(
        "Fingerprint (SHA-256): {}\n",
        meta.fingerprint_sha256
    ));

    summary.push_str("\nSubject Alternative Names:\n");
    summary.push_str("--------------------------\n");
    if meta.subject_alternative_names.is_empty() {
        summary.push_str("None\n");
    } else {
        for san in &meta.subject_alternative_names {
            summary.push_str(&format!("- {}\n", san));
        }
    }

    if let Some(chain) = &record.chain {
        summary.push_str("\nChain Verification:\n");
        summary.push_str("-------------------\n");
        summary.push_str(&format!("{}\n", chain.message));
    }

    if !record.description.is_empty() {
        summary.push_str("\nDescription:\n");
        summary.push_str("------------\n");
        summary.push_str(&format!("{}\n", record.description));
    }

    summary
}
