// PEM codec - decode PEM armor into certificates and keys, encode DER back

use crate::error::{CertError, Result};
use openssl::pkey::{PKey, Private};
use ::pem::{EncodeConfig, LineEnding, Pem};
use x509_parser::prelude::*;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Markers that identify an encrypted private key. PKCS#8 uses a dedicated
/// armor tag; PKCS#1 keeps the tag and adds an encryption header.
const ENCRYPTED_PKCS8_TAG: &str = "ENCRYPTED PRIVATE KEY";
const ENCRYPTED_PKCS1_HEADER: &str = "Proc-Type: 4,ENCRYPTED";

/// Decode a single PEM-armored certificate into its DER bytes.
///
/// Fails with `MalformedInput` when the text lacks balanced BEGIN/END
/// markers, carries a block type other than CERTIFICATE, or when the base64
/// payload does not parse as a DER-encoded X.509 certificate.
pub fn decode_certificate(pem_text: &str) -> Result<Vec<u8>> {
    let block = ::pem::parse(pem_text)
        .map_err(|e| CertError::MalformedInput(format!("invalid PEM armor: {}", e)))?;

    if block.tag() != CERTIFICATE_TAG {
        return Err(CertError::MalformedInput(format!(
            "expected a CERTIFICATE block, found {}",
            block.tag()
        )));
    }

    let der = block.into_contents();
    X509Certificate::from_der(&der).map_err(|e| {
        CertError::MalformedInput(format!("PEM payload is not an X.509 certificate: {}", e))
    })?;

    Ok(der)
}

/// Decode every CERTIFICATE block of a PEM bundle, preserving order.
///
/// Non-certificate blocks (keys, parameters) are skipped. A bundle without a
/// single certificate is malformed.
pub fn decode_certificate_chain(pem_text: &str) -> Result<Vec<Vec<u8>>> {
    let blocks = ::pem::parse_many(pem_text)
        .map_err(|e| CertError::MalformedInput(format!("invalid PEM armor: {}", e)))?;

    let mut certificates = Vec::new();
    for block in blocks {
        if block.tag() != CERTIFICATE_TAG {
            continue;
        }
        let der = block.into_contents();
        X509Certificate::from_der(&der).map_err(|e| {
            CertError::MalformedInput(format!("PEM payload is not an X.509 certificate: {}", e))
        })?;
        certificates.push(der);
    }

    if certificates.is_empty() {
        return Err(CertError::MalformedInput(
            "no CERTIFICATE blocks found".to_string(),
        ));
    }

    Ok(certificates)
}

/// Encode DER certificate bytes as PEM armor with 64-column base64 body.
pub fn encode_certificate(der: &[u8]) -> String {
    let block = Pem::new(CERTIFICATE_TAG, der.to_vec());
    ::pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Decode a PEM-armored unencrypted private key (PKCS#8, PKCS#1 or SEC1).
///
/// Encrypted keys fail with `UnsupportedKeyFormat` rather than silently
/// producing wrong bytes; any other undecodable input is `MalformedInput`.
pub fn decode_private_key(pem_text: &str) -> Result<PKey<Private>> {
    if pem_text.contains(ENCRYPTED_PKCS8_TAG) || pem_text.contains(ENCRYPTED_PKCS1_HEADER) {
        return Err(CertError::UnsupportedKeyFormat(
            "encrypted private keys are not supported".to_string(),
        ));
    }

    PKey::private_key_from_pem(pem_text.as_bytes())
        .map_err(|e| CertError::MalformedInput(format!("invalid private key PEM: {}", e)))
}
