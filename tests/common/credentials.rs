//! Throwaway RSA credentials backed by self-signed certificates.

use cades_signer::SigningCredential;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

/// Key pair and self-signed certificate for `common_name`.
pub fn key_and_certificate(common_name: &str, serial: u32) -> (PKey<Private>, X509) {
    let rsa = Rsa::generate(2048).expect("Should generate RSA key");
    let key = PKey::from_rsa(rsa).expect("Should create PKey");

    let mut name = X509NameBuilder::new().expect("Should create name builder");
    name.append_entry_by_text("O", "Example Org")
        .expect("Should add O");
    name.append_entry_by_text("CN", common_name)
        .expect("Should add CN");
    let name = name.build();

    let mut builder = X509Builder::new().expect("Should create X509 builder");
    builder.set_version(2).expect("Should set version");
    let serial = BigNum::from_u32(serial)
        .expect("Should create serial")
        .to_asn1_integer()
        .expect("Should convert serial");
    builder
        .set_serial_number(&serial)
        .expect("Should set serial");
    builder.set_subject_name(&name).expect("Should set subject");
    builder.set_issuer_name(&name).expect("Should set issuer");

    let not_before = Asn1Time::days_from_now(0).expect("Should create not_before");
    let not_after = Asn1Time::days_from_now(30).expect("Should create not_after");
    builder
        .set_not_before(&not_before)
        .expect("Should set not_before");
    builder
        .set_not_after(&not_after)
        .expect("Should set not_after");
    builder.set_pubkey(&key).expect("Should set pubkey");
    builder
        .sign(&key, MessageDigest::sha256())
        .expect("Should sign");

    (key, builder.build())
}

/// Signing credential for `common_name`.
pub fn credential(common_name: &str, serial: u32) -> SigningCredential {
    let (key, cert) = key_and_certificate(common_name, serial);
    SigningCredential::new(key, vec![cert]).expect("Should create credential")
}
