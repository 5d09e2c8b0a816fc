// Test helpers - in-memory certificate generation with the openssl builders

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509, X509Builder, X509Name, X509NameBuilder};

pub fn rsa_key(bits: u32) -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(bits).unwrap()).unwrap()
}

pub fn ec_key() -> PKey<Private> {
    let group =
        openssl::ec::EcGroup::from_curve_name(openssl::nid::Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(openssl::ec::EcKey::generate(&group).unwrap()).unwrap()
}

pub fn subject(common_name: Option<&str>) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder.append_entry_by_text("C", "US").unwrap();
    builder.append_entry_by_text("O", "Certscope Test").unwrap();
    if let Some(cn) = common_name {
        builder.append_entry_by_text("CN", cn).unwrap();
    }
    builder.build()
}

fn random_serial(builder: &mut X509Builder) {
    let mut serial = BigNum::new().unwrap();
    serial.rand(96, MsbOption::MAYBE_ZERO, false).unwrap();
    let serial = serial.to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
}

/// Build a self-signed certificate with the given CN, valid from now.
pub fn self_signed(common_name: &str, days: u32) -> (X509, PKey<Private>) {
    let key = rsa_key(2048);
    let cert = build_cert(Some(common_name), &[], days, &key, None, &key);
    (cert, key)
}

/// Build a self-signed CA certificate (CA:true basic constraints).
pub fn ca(common_name: &str) -> (X509, PKey<Private>) {
    let key = rsa_key(2048);

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    random_serial(&mut builder);

    let name = subject(Some(common_name));
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
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

/// Issue a leaf certificate signed by the given CA.
pub fn issue(
    common_name: &str,
    sans: &[&str],
    days: u32,
    leaf_key: &PKey<Private>,
    ca_cert: &X509,
    ca_key: &PKey<Private>,
) -> X509 {
    build_cert(
        Some(common_name),
        sans,
        days,
        leaf_key,
        Some(ca_cert.subject_name()),
        ca_key,
    )
}

/// Build a self-signed certificate with full control over CN and SANs.
pub fn self_signed_with(
    common_name: Option<&str>,
    sans: &[&str],
    days: u32,
    key: &PKey<Private>,
) -> X509 {
    build_cert(common_name, sans, days, key, None, key)
}

fn build_cert(
    common_name: Option<&str>,
    sans: &[&str],
    days: u32,
    key: &PKey<Private>,
    issuer: Option<&openssl::x509::X509NameRef>,
    signing_key: &PKey<Private>,
) -> X509 {
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    random_serial(&mut builder);

    let name = subject(common_name);
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some(issuer_name) => builder.set_issuer_name(issuer_name).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }

    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(days).unwrap())
        .unwrap();
    builder.set_pubkey(key).unwrap();

    if !sans.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for entry in sans {
            if entry.parse::<std::net::IpAddr>().is_ok() {
                san.ip(entry);
            } else {
                san.dns(entry);
            }
        }
        let ext = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(ext).unwrap();
    }

    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    builder.build()
}
