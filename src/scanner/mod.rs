// TLS certificate scanner - retrieve the certificate a remote host presents

pub mod mass;
mod verifier;

pub use mass::scan_many;

use crate::certificates::pem;
use crate::error::CertError;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ProtocolVersion};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::info;

const DEFAULT_TLS_PORT: u16 = 443;

/// Scan failure taxonomy. Every branch carries the human-readable cause
/// string from the underlying failure; none is fatal to a caller's workflow.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No response within the caller-supplied timeout (connect or handshake)
    #[error("Connection timeout after {timeout:?} to {addr}")]
    ConnectTimeout { addr: SocketAddr, timeout: Duration },

    /// The hostname does not resolve
    #[error("DNS resolution failed for {hostname}: {detail}")]
    DnsResolutionFailed { hostname: String, detail: String },

    /// Protocol-level TLS error during the handshake
    #[error("TLS handshake failed: {detail}")]
    TlsHandshakeFailed { detail: String },

    /// Any other transport fault
    #[error("Unexpected I/O error: {detail}")]
    UnexpectedIo { detail: String },
}

/// Successful scan outcome, constructed fresh per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub hostname: String,
    pub port: u16,
    /// Leaf certificate exactly as presented by the peer
    #[serde(skip)]
    pub leaf_der: Vec<u8>,
    /// Leaf re-armored as PEM
    pub certificate_pem: String,
    /// Additional chain certificates beyond the leaf, if the peer offered any
    pub chain_pem: Vec<String>,
    pub protocol: String,
    pub cipher: String,
}

/// Scan target, `hostname:port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
}

impl Target {
    /// Parse `host`, `host:port` or a URL. The port must be 1-65535.
    pub fn parse(input: &str) -> crate::Result<Self> {
        let (hostname, port) = if input.contains("://") {
            let url = url::Url::parse(input)
                .map_err(|e| CertError::InvalidInput(format!("invalid target URL: {}", e)))?;
            let host = url
                .host_str()
                .ok_or_else(|| CertError::InvalidInput("no hostname in URL".to_string()))?
                .to_string();
            (host, url.port().unwrap_or(DEFAULT_TLS_PORT))
        } else if let Some((host, port_str)) = input.rsplit_once(':') {
            let port = port_str
                .parse::<u16>()
                .map_err(|e| CertError::InvalidInput(format!("invalid port: {}", e)))?;
            (host.to_string(), port)
        } else {
            (input.to_string(), DEFAULT_TLS_PORT)
        };

        if port == 0 {
            return Err(CertError::InvalidInput("port must be 1-65535".to_string()));
        }
        if hostname.is_empty() {
            return Err(CertError::InvalidInput("empty hostname".to_string()));
        }

        Ok(Self { hostname, port })
    }

    pub fn identifier(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// TLS certificate scanner
///
/// Performs one blocking network round trip per invocation. The timeout
/// applies to connection establishment and to the handshake; the socket is
/// dropped, and therefore closed, on every exit path.
#[derive(Debug, Clone)]
pub struct TlsScanner {
    connect_timeout: Duration,
}

impl TlsScanner {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Retrieve the certificate presented at `hostname:port`.
    pub async fn scan(&self, hostname: &str, port: u16) -> Result<ScanResult, ScanError> {
        info!("Scanning {}:{}", hostname, port);

        let addr = resolve(hostname, port).await?;

        let tcp = match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ScanError::UnexpectedIo {
                    detail: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScanError::ConnectTimeout {
                    addr,
                    timeout: self.connect_timeout,
                })
            }
        };

        let config = client_config().map_err(|e| ScanError::TlsHandshakeFailed {
            detail: e.to_string(),
        })?;
        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(hostname.to_string()).map_err(|e| {
            ScanError::DnsResolutionFailed {
                hostname: hostname.to_string(),
                detail: format!("invalid server name: {}", e),
            }
        })?;

        let stream = match timeout(self.connect_timeout, connector.connect(server_name, tcp)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(classify_handshake_failure(e)),
            Err(_) => {
                return Err(ScanError::ConnectTimeout {
                    addr,
                    timeout: self.connect_timeout,
                })
            }
        };

        let (_, connection) = stream.get_ref();

        let peer_certs =
            connection
                .peer_certificates()
                .ok_or_else(|| ScanError::TlsHandshakeFailed {
                    detail: "peer presented no certificate".to_string(),
                })?;
        let leaf_der = peer_certs
            .first()
            .map(|c| c.as_ref().to_vec())
            .ok_or_else(|| ScanError::TlsHandshakeFailed {
                detail: "peer presented no certificate".to_string(),
            })?;
        let chain_pem: Vec<String> = peer_certs
            .iter()
            .skip(1)
            .map(|c| pem::encode_certificate(c.as_ref()))
            .collect();

        let protocol = connection
            .protocol_version()
            .map(protocol_name)
            .unwrap_or_else(|| "unknown".to_string());
        let cipher = connection
            .negotiated_cipher_suite()
            .map(|suite| format!("{:?}", suite.suite()))
            .unwrap_or_else(|| "unknown".to_string());

        info!("Successfully scanned {}:{}", hostname, port);

        let certificate_pem = pem::encode_certificate(&leaf_der);
        Ok(ScanResult {
            hostname: hostname.to_string(),
            port,
            leaf_der,
            certificate_pem,
            chain_pem,
            protocol,
            cipher,
        })
    }
}

/// Resolve a hostname to its first address; IP literals short-circuit.
async fn resolve(hostname: &str, port: u16) -> Result<SocketAddr, ScanError> {
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    let response =
        resolver
            .lookup_ip(hostname)
            .await
            .map_err(|e| ScanError::DnsResolutionFailed {
                hostname: hostname.to_string(),
                detail: e.to_string(),
            })?;

    match response.iter().next() {
        Some(ip) => Ok(SocketAddr::new(ip, port)),
        None => Err(ScanError::DnsResolutionFailed {
            hostname: hostname.to_string(),
            detail: "no addresses found".to_string(),
        }),
    }
}

fn client_config() -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier::NoVerifier))
        .with_no_client_auth())
}

/// Split handshake-stage failures into protocol-level TLS errors and plain
/// transport faults.
fn classify_handshake_failure(err: std::io::Error) -> ScanError {
    let tls_level = err
        .get_ref()
        .map_or(false, |inner| inner.is::<rustls::Error>());

    if tls_level {
        ScanError::TlsHandshakeFailed {
            detail: err.to_string(),
        }
    } else {
        ScanError::UnexpectedIo {
            detail: err.to_string(),
        }
    }
}

fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1.0".to_string(),
        ProtocolVersion::SSLv3 => "SSLv3".to_string(),
        other => format!("{:?}", other),
    }
}
