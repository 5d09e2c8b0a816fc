// Chain verification - one-hop signature check of a leaf against a CA key
//
// Verification performs exactly one hop (leaf to CA). It does not walk
// further ancestors, does not check validity-period containment of the CA
// over the leaf, and does not check basic constraints. The CA relation is a
// single optional reference; extending this to multi-hop path building would
// require a visited set of fingerprints to guarantee termination.

use openssl::x509::{X509, X509Ref};
use serde::{Deserialize, Serialize};

pub const CHAIN_VALID: &str = "Certificate chain is valid";
pub const CHAIN_SIGNATURE_FAILED: &str = "Certificate signature verification failed";
pub const CHAIN_NO_CA: &str = "No CA certificate specified";

/// Outcome of chain verification, always a value, never an error.
///
/// Owned by the leaf certificate record and recomputed whenever the CA
/// reference or either certificate's bytes change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerificationResult {
    pub verified: bool,
    pub message: String,
}

impl ChainVerificationResult {
    pub fn valid() -> Self {
        Self {
            verified: true,
            message: CHAIN_VALID.to_string(),
        }
    }

    pub fn signature_failed() -> Self {
        Self {
            verified: false,
            message: CHAIN_SIGNATURE_FAILED.to_string(),
        }
    }

    pub fn no_ca() -> Self {
        Self {
            verified: false,
            message: CHAIN_NO_CA.to_string(),
        }
    }

    /// Verify-stage fault: unsupported algorithm, undecodable CA key, ...
    pub fn verification_error(detail: impl std::fmt::Display) -> Self {
        Self {
            verified: false,
            message: format!("Verification error: {}", detail),
        }
    }

    /// Load-stage fault: either certificate's bytes could not be decoded
    pub fn load_error(detail: impl std::fmt::Display) -> Self {
        Self {
            verified: false,
            message: format!("Chain verification error: {}", detail),
        }
    }
}

/// Verify that `ca`'s key produced the signature over `leaf`'s TBS bytes.
///
/// The padding and hash scheme come from the leaf's own signature algorithm
/// identifier, not from any fixed assumption.
pub fn verify_signed_by(leaf: &X509Ref, ca: &X509Ref) -> ChainVerificationResult {
    let ca_key = match ca.public_key() {
        Ok(key) => key,
        Err(e) => return ChainVerificationResult::verification_error(e),
    };

    match leaf.verify(&ca_key) {
        Ok(true) => ChainVerificationResult::valid(),
        Ok(false) => ChainVerificationResult::signature_failed(),
        Err(e) => ChainVerificationResult::verification_error(e),
    }
}

/// PEM-level entry point. A missing CA reference short-circuits to the
/// fixed "No CA certificate specified" outcome.
pub fn verify_chain_pem(leaf_pem: &str, ca_pem: Option<&str>) -> ChainVerificationResult {
    let Some(ca_pem) = ca_pem else {
        return ChainVerificationResult::no_ca();
    };

    let leaf = match X509::from_pem(leaf_pem.as_bytes()) {
        Ok(cert) => cert,
        Err(e) => return ChainVerificationResult::load_error(e),
    };
    let ca = match X509::from_pem(ca_pem.as_bytes()) {
        Ok(cert) => cert,
        Err(e) => return ChainVerificationResult::load_error(e),
    };

    verify_signed_by(&leaf, &ca)
}
