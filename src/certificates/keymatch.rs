// Key matching - confirm a private key pairs with a certificate

use crate::certificates::pem;
use crate::error::{CertError, Result};
use openssl::pkey::{PKeyRef, Private};
use openssl::x509::{X509, X509Ref};

/// Validate that the private key's public component equals the certificate's
/// embedded public key, comparing canonical SPKI DER byte-for-byte.
///
/// A key of a different family (RSA against an EC certificate, say) encodes
/// to a different SPKI and therefore reports `KeyMismatch`, not a type error.
pub fn validate_key_match(cert: &X509Ref, key: &PKeyRef<Private>) -> Result<()> {
    let cert_spki = cert.public_key()?.public_key_to_der()?;
    let key_spki = key.public_key_to_der()?;

    if cert_spki != key_spki {
        return Err(CertError::KeyMismatch);
    }

    Ok(())
}

/// PEM-level entry point used by the ingest boundary.
pub fn validate_key_match_pem(cert_pem: &str, key_pem: &str) -> Result<()> {
    let cert = X509::from_pem(cert_pem.as_bytes())
        .map_err(|e| CertError::MalformedInput(format!("invalid certificate PEM: {}", e)))?;
    let key = pem::decode_private_key(key_pem)?;
    validate_key_match(&cert, &key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::pem::encode_certificate;
    use crate::certificates::testutil;

    #[test]
    fn test_matching_key_succeeds() {
        let (cert, key) = testutil::self_signed("match.example.com", 365);
        validate_key_match(&cert, &key).unwrap();
    }

    #[test]
    fn test_different_rsa_key_of_same_size_mismatches() {
        let (cert, _key) = testutil::self_signed("mismatch.example.com", 365);
        let other = testutil::rsa_key(2048);

        let err = validate_key_match(&cert, &other).unwrap_err();
        assert!(matches!(err, CertError::KeyMismatch));
    }

    #[test]
    fn test_ec_key_against_rsa_certificate_is_a_mismatch() {
        let (cert, _key) = testutil::self_signed("family.example.com", 365);
        let ec = testutil::ec_key();

        let err = validate_key_match(&cert, &ec).unwrap_err();
        assert!(matches!(err, CertError::KeyMismatch));
    }

    #[test]
    fn test_pem_entry_point() {
        let (cert, key) = testutil::self_signed("pemmatch.example.com", 365);
        let cert_pem = encode_certificate(&cert.to_der().unwrap());
        let key_pem = String::from_utf8(key.private_key_to_pem_pkcs8().unwrap()).unwrap();

        validate_key_match_pem(&cert_pem, &key_pem).unwrap();
    }

    #[test]
    fn test_pem_entry_point_rejects_encrypted_key() {
        let (cert, key) = testutil::self_signed("pemenc.example.com", 365);
        let cert_pem = encode_certificate(&cert.to_der().unwrap());
        let encrypted = key
            .private_key_to_pem_pkcs8_passphrase(openssl::symm::Cipher::aes_256_cbc(), b"secret")
            .unwrap();
        let key_pem = String::from_utf8(encrypted).unwrap();

        let err = validate_key_match_pem(&cert_pem, &key_pem).unwrap_err();
        assert!(matches!(err, CertError::UnsupportedKeyFormat(_)));
    }
}
