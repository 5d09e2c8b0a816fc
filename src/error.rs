// Error types for certscope
//
// This module provides structured error types using thiserror. Parsing and
// key-match failures propagate to the caller; chain-verification outcomes and
// scan failures are modeled as values (see certificates::chain and scanner).

use thiserror::Error;

/// Main error type for certscope operations
#[derive(Debug, Error)]
pub enum CertError {
    /// PEM armor or encoding-level failure: missing/unbalanced markers,
    /// wrong block type, or a payload that is not valid DER for the
    /// expected structure
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The private key uses a format we refuse to handle (encrypted keys)
    #[error("Unsupported key format: {0}")]
    UnsupportedKeyFormat(String),

    /// The certificate structure could not be decoded after successful
    /// PEM decoding
    #[error("Failed to parse certificate: {0}")]
    CertificateParse(String),

    /// The private key's public component does not equal the certificate's
    /// public key
    #[error("Private key does not match certificate")]
    KeyMismatch,

    /// Network scan failure (closed tagged set, see scanner::ScanError)
    #[error(transparent)]
    Scan(#[from] crate::scanner::ScanError),

    /// Record store failure reported by the injected persistence layer
    #[error("Store error: {0}")]
    Store(String),

    /// OpenSSL-specific errors
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input from user or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for certscope operations
pub type Result<T> = std::result::Result<T, CertError>;
