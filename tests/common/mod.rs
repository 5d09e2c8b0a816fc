// Shared test helpers - certificate generation and local TLS servers
#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509, X509Builder, X509NameBuilder};
use rustls_pki_types::CertificateDer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

pub fn rsa_key(bits: u32) -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(bits).unwrap()).unwrap()
}

fn random_serial(builder: &mut X509Builder) {
    let mut serial = BigNum::new().unwrap();
    serial.rand(96, MsbOption::MAYBE_ZERO, false).unwrap();
    let serial = serial.to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
}

fn name(common_name: &str) -> openssl::x509::X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder.append_entry_by_text("O", "Certscope Test").unwrap();
    builder.append_entry_by_text("CN", common_name).unwrap();
    builder.build()
}

/// Self-signed certificate with a SAN for the given hostname or IP.
pub fn self_signed(common_name: &str, san: &str, days: u32) -> (X509, PKey<Private>) {
    let key = rsa_key(2048);

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    random_serial(&mut builder);

    let subject = name(common_name);
    builder.set_subject_name(&subject).unwrap();
    builder.set_issuer_name(&subject).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(days).unwrap())
        .unwrap();
    builder.set_pubkey(&key).unwrap();

    let mut san_builder = SubjectAlternativeName::new();
    if san.parse::<std::net::IpAddr>().is_ok() {
        san_builder.ip(san);
    } else {
        san_builder.dns(san);
    }
    let ext = san_builder
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(ext).unwrap();

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

/// Self-signed CA certificate.
pub fn ca(common_name: &str) -> (X509, PKey<Private>) {
    let key = rsa_key(2048);

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    random_serial(&mut builder);

    let subject = name(common_name);
    builder.set_subject_name(&subject).unwrap();
    builder.set_issuer_name(&subject).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(3650).unwrap())
        .unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (builder.build(), key)
}

/// Leaf certificate signed by the given CA.
pub fn issue(
    common_name: &str,
    days: u32,
    leaf_key: &PKey<Private>,
    ca_cert: &X509,
    ca_key: &PKey<Private>,
) -> X509 {
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    random_serial(&mut builder);

    builder.set_subject_name(&name(common_name)).unwrap();
    builder.set_issuer_name(ca_cert.subject_name()).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(days).unwrap())
        .unwrap();
    builder.set_pubkey(leaf_key).unwrap();
    builder.sign(ca_key, MessageDigest::sha256()).unwrap();

    builder.build()
}

/// Spawn a TLS server on 127.0.0.1 presenting the given certificate. The
/// server accepts connections, completes handshakes, and waits for the peer
/// to go away.
pub async fn spawn_tls_server(cert: &X509, key: &PKey<Private>) -> (SocketAddr, JoinHandle<()>) {
    let certs = vec![CertificateDer::from(cert.to_der().unwrap())];

    let key_pem = key.private_key_to_pem_pkcs8().unwrap();
    let key_der = rustls_pemfile::private_key(&mut key_pem.as_slice())
        .unwrap()
        .expect("no private key in PEM");

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(certs, key_der)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let mut buf = [0u8; 1];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });

    (addr, handle)
}

/// Spawn a TCP server that accepts connections but never speaks TLS, holding
/// the socket open silently.
pub async fn spawn_stalling_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        // Hold only the latest connection so the process-wide descriptor
        // count stays stable across repeated scans
        let mut held = None;
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            held = Some(stream);
        }
        drop(held);
    });

    (addr, handle)
}

/// Spawn a TCP server that answers every connection with plaintext garbage.
pub async fn spawn_garbage_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _ = stream.write_all(b"HTTP/1.0 200 OK\r\n\r\nnot tls\n").await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (addr, handle)
}
