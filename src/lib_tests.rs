//! Unit tests for the cades-signer facade

use crate::*;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder};

fn credential(common_name: &str) -> SigningCredential {
    let key = PKey::from_rsa(Rsa::generate(2048).expect("Should generate RSA key"))
        .expect("Should create PKey");
    let mut name = X509NameBuilder::new().expect("Should create name builder");
    name.append_entry_by_text("CN", common_name)
        .expect("Should add CN");
    let name = name.build();

    let mut builder = X509Builder::new().expect("Should create X509 builder");
    builder.set_version(2).expect("Should set version");
    let serial = BigNum::from_u32(7)
        .and_then(|bn| bn.to_asn1_integer())
        .expect("Should create serial");
    builder.set_serial_number(&serial).expect("Should set serial");
    builder.set_subject_name(&name).expect("Should set subject");
    builder.set_issuer_name(&name).expect("Should set issuer");
    builder
        .set_not_before(&Asn1Time::days_from_now(0).expect("Should create not_before"))
        .expect("Should set not_before");
    builder
        .set_not_after(&Asn1Time::days_from_now(1).expect("Should create not_after"))
        .expect("Should set not_after");
    builder.set_pubkey(&key).expect("Should set pubkey");
    builder
        .sign(&key, MessageDigest::sha256())
        .expect("Should sign");

    SigningCredential::new(key, vec![builder.build()]).expect("Should create credential")
}

#[test]
fn test_signer_defaults() {
    let signer = CadesSigner::new();
    assert_eq!(signer.content_type(), domain::constants::ID_DATA);
    assert_eq!(signer.cipher_algorithm(), CipherAlgorithm::Aes128Cbc);
    assert_eq!(signer.signed_name("report.pdf"), "report.pdf.csig");
}

#[test]
fn test_signer_from_configuration() {
    let config = CadesConfiguration {
        cipher: CipherAlgorithm::Aes256Cbc,
        signed_name_suffix: ".signed".to_string(),
        ..CadesConfiguration::default()
    };
    let signer = CadesSigner::from_configuration(&config).expect("Should accept defaults");
    assert_eq!(signer.cipher_algorithm(), CipherAlgorithm::Aes256Cbc);
    assert_eq!(signer.signed_name("a.txt"), "a.txt.signed.csig");

    let broken = CadesConfiguration {
        default_envelope_type: "Sealed".to_string(),
        ..CadesConfiguration::default()
    };
    let err = CadesSigner::from_configuration(&broken).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_configured_signing_defaults_are_exposed() {
    let signer = CadesSigner::new();
    assert_eq!(signer.default_algorithm(), "SHA256withRSA");
    assert_eq!(signer.default_sign_config(), &SignConfig::default());

    let config = CadesConfiguration {
        default_algorithm: "SHA512withRSA".to_string(),
        sign: SignConfig::default().with_mode(SignMode::Explicit),
        ..CadesConfiguration::default()
    };
    let signer = CadesSigner::from_configuration(&config).expect("Should accept config");
    assert_eq!(signer.default_algorithm(), "SHA512withRSA");
    assert!(signer.default_sign_config().is_explicit());

    let cred = credential("Defaults");
    let sign = signer
        .sign(
            b"payload",
            signer.default_algorithm(),
            &cred,
            signer.default_sign_config(),
        )
        .expect("Should sign with configured defaults");
    assert!(signer.get_data(&sign).is_err());
    assert!(signer.verify(&sign, Some(b"payload")).expect("Should verify").success());
}

#[test]
fn test_data_file_validity() {
    let signer = CadesSigner::default();
    assert!(signer.is_valid_data_file(b"x"));
    assert!(!signer.is_valid_data_file(b""));
}

#[test]
fn test_empty_content_is_rejected_unwrapped() {
    let signer = CadesSigner::new();
    let cred = credential("Empty");
    let err = signer
        .sign(b"", "SHA256withRSA", &cred, &SignConfig::default())
        .unwrap_err();
    assert!(matches!(err, CadesError::InvalidInput(_)));
}

#[test]
fn test_unknown_algorithm_is_invalid_input() {
    let signer = CadesSigner::new();
    let cred = credential("Algo");
    let err = signer
        .sign(b"data", "MD2withRSA", &cred, &SignConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_cosign_rejects_non_signatures() {
    let signer = CadesSigner::new();
    let cred = credential("Cosigner");
    let data = signer
        .envelop(&b"plain"[..], "SHA256", "Data", None, &[], &SignConfig::default())
        .expect("Should build Data");

    let err = signer
        .cosign(b"plain", &data, "SHA256withRSA", &cred, &SignConfig::default())
        .unwrap_err();
    assert!(matches!(err, CadesError::UnsupportedFormat(_)));

    let err = signer
        .countersign(b"", "SHA256", &CounterSignTarget::Tree, &cred, &SignConfig::default())
        .unwrap_err();
    assert!(matches!(err, CadesError::InvalidInput(_)));
}

#[test]
fn test_sign_info_reports_cades() {
    let signer = CadesSigner::new();
    let cred = credential("Info");
    let sign = signer
        .sign(b"payload", "SHA256withRSA", &cred, &SignConfig::default())
        .expect("Should sign");
    let info = signer.sign_info(&sign).expect("Should read sign info");
    assert_eq!(info.format, "CAdES");
    assert!(info.signing_time.is_some());

    let untimed = signer
        .sign(
            b"payload",
            "SHA256withRSA",
            &cred,
            &SignConfig::default().without_signing_time(),
        )
        .expect("Should sign");
    assert!(signer.sign_info(&untimed).expect("Should read").signing_time.is_none());
}

#[test]
fn test_sign_info_only_reads_signed_data() {
    let signer = CadesSigner::new();
    let cred = credential("Sealer");
    let recipient = cred.chain()[0].clone();
    let sealed = signer
        .envelop(
            &b"payload"[..],
            "SHA256withRSA",
            "SignedAndEnvelopedData",
            Some(&cred),
            &[recipient],
            &SignConfig::default(),
        )
        .expect("Should seal");

    let err = signer.sign_info(&sealed).unwrap_err();
    assert!(matches!(err, CadesError::UnsupportedFormat(_)));
    assert!(matches!(signer.sign_info(b""), Err(CadesError::InvalidInput(_))));
}

#[test]
fn test_signers_structure_is_none_for_garbage() {
    let signer = CadesSigner::new();
    assert!(signer.signers_structure(b"not der").is_none());
    assert!(signer.signers_structure(&[]).is_none());
}

#[test]
fn test_decrypt_requires_encrypted_data() {
    let signer = CadesSigner::new();
    let err = signer.decrypt(b"\x30\x00", "pw").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_encrypt_produces_encrypted_data() {
    let signer = CadesSigner::new();
    let blob = signer
        .encrypt(&b"secret"[..], "SHA-256", "pw")
        .expect("Should encrypt");
    assert_eq!(signer.classify(&blob), ContentTypeTag::EncryptedData);

    let err = signer.encrypt(&b"secret"[..], "SHA-256", "").unwrap_err();
    assert!(matches!(err, CadesError::InvalidInput(_)));
}
