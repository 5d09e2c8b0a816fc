// Certificate metadata - extract descriptive fields from a DER certificate

use crate::certificates::status::{self, CertificateStatus};
use crate::certificates::pem;
use crate::error::{CertError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x509_parser::objects::{oid2sn, oid_registry};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Sentinel for a missing Common Name attribute
pub const NOT_AVAILABLE: &str = "N/A";

/// Structured metadata derived from a certificate, never hand-edited.
///
/// `is_expired` and `days_until_expiry` are always computed together from the
/// same evaluation timestamp, as is the stored `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateMetadata {
    pub common_name: String,
    pub issuer_common_name: String,
    pub subject_alternative_names: Vec<String>,
    /// Big-endian unsigned serial as uppercase hex, no leading 0x
    pub serial_number: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    /// SHA-256 over the full DER encoding, colon-separated uppercase pairs
    pub fingerprint_sha256: String,
    /// Issuer DN structurally equals subject DN (encoded-name equality)
    pub is_self_signed: bool,
    pub key_size_bits: usize,
    pub signature_algorithm: String,
    pub is_expired: bool,
    pub days_until_expiry: i64,
    pub status: CertificateStatus,
}

/// Extract metadata from DER certificate bytes at the given evaluation time.
///
/// Extraction is all-or-nothing: any structural failure yields
/// `CertificateParse` and no partial metadata.
pub fn extract(der: &[u8], now: DateTime<Utc>) -> Result<CertificateMetadata> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| CertError::CertificateParse(e.to_string()))?;

    let common_name = first_common_name(cert.subject());
    let issuer_common_name = first_common_name(cert.issuer());
    let subject_alternative_names = subject_alternative_names(&cert)?;

    let serial_number = format!("{:X}", cert.serial);

    let valid_from = to_utc(&cert.validity().not_before)?;
    let valid_until = to_utc(&cert.validity().not_after)?;

    let fingerprint_sha256 = fingerprint(der);

    // Order-sensitive comparison of the encoded names, not a string heuristic
    let is_self_signed =
        cert.tbs_certificate.subject.as_raw() == cert.tbs_certificate.issuer.as_raw();

    let key_size_bits = key_size_bits(&cert);
    let signature_algorithm = signature_algorithm_name(&cert);

    let classification = status::classify(valid_until, now);

    Ok(CertificateMetadata {
        common_name,
        issuer_common_name,
        subject_alternative_names,
        serial_number,
        valid_from,
        valid_until,
        fingerprint_sha256,
        is_self_signed,
        key_size_bits,
        signature_algorithm,
        is_expired: classification.is_expired,
        days_until_expiry: classification.days_until_expiry,
        status: classification.status,
    })
}

/// Decode PEM armor and extract metadata in one step.
pub fn extract_from_pem(pem_text: &str, now: DateTime<Utc>) -> Result<CertificateMetadata> {
    let der = pem::decode_certificate(pem_text)?;
    extract(&der, now)
}

/// SHA-256 fingerprint as 32 colon-separated uppercase hex byte-pairs.
pub fn fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn first_common_name(name: &X509Name) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn subject_alternative_names(cert: &X509Certificate) -> Result<Vec<String>> {
    let extension = cert
        .subject_alternative_name()
        .map_err(|e| CertError::CertificateParse(format!("invalid SAN extension: {}", e)))?;

    let mut names = Vec::new();
    if let Some(san) = extension {
        for general_name in &san.value.general_names {
            match general_name {
                GeneralName::DNSName(dns) => names.push((*dns).to_string()),
                GeneralName::URI(uri) => names.push((*uri).to_string()),
                GeneralName::IPAddress(bytes) => names.push(render_ip_address(bytes)),
                _ => {}
            }
        }
    }
    Ok(names)
}

fn render_ip_address(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().unwrap_or([0; 4]);
            std::net::Ipv4Addr::from(octets).to_string()
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().unwrap_or([0; 16]);
            std::net::Ipv6Addr::from(octets).to_string()
        }
        _ => hex::encode(bytes),
    }
}

fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| CertError::CertificateParse("validity timestamp out of range".to_string()))
}

fn key_size_bits(cert: &X509Certificate) -> usize {
    match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => rsa.key_size(),
        Ok(PublicKey::EC(point)) => point.key_size(),
        Ok(PublicKey::DSA(y)) => y.len() * 8,
        Ok(PublicKey::Unknown(raw)) => raw.len() * 8,
        _ => 0,
    }
}

/// Canonical signature algorithm name, falling back to the dotted OID for
/// algorithms the registry does not know.
fn signature_algorithm_name(cert: &X509Certificate) -> String {
    let oid = &cert.signature_algorithm.algorithm;
    oid2sn(oid, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| oid.to_id_string())
}
