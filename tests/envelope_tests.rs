//! Enveloped, digested and password-encrypted content.

mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cades_signer::domain::cms::{decode_any, decode_content_info, SignedAndEnvelopedData};
use cades_signer::{
    CadesError, CadesSigner, CipherAlgorithm, ContentTypeTag, CounterSignTarget, EnvelopeKind,
    ErrorKind, SignConfig,
};
use der::Encode;

use common::credentials::{credential, key_and_certificate};

const CONTENT: &[u8] = b"confidential quarterly figures";

#[test]
fn data_and_digested_data_expose_content() {
    let signer = CadesSigner::new();

    let data = signer
        .envelop(CONTENT, "SHA1", "Data", None, &[], &SignConfig::default())
        .expect("Should build Data");
    assert_eq!(signer.classify(&data), ContentTypeTag::Data);
    assert!(!signer.is_sign(&data));
    assert_eq!(signer.get_data(&data).expect("Should extract"), CONTENT);

    let digested = signer
        .envelop(CONTENT, "SHA-384", "DigestedData", None, &[], &SignConfig::default())
        .expect("Should build DigestedData");
    assert_eq!(signer.classify(&digested), ContentTypeTag::DigestedData);
    assert!(signer.is_cades_valid_as(&digested, ContentTypeTag::DigestedData));
    assert_eq!(signer.get_data(&digested).expect("Should extract"), CONTENT);
}

#[test]
fn enveloped_data_opens_for_each_recipient() {
    common::init_logging();
    let signer = CadesSigner::new().with_cipher_algorithm(CipherAlgorithm::Aes256Cbc);
    let (key_a, cert_a) = key_and_certificate("Recipient A", 10);
    let (key_b, cert_b) = key_and_certificate("Recipient B", 11);
    let (stranger_key, stranger_cert) = key_and_certificate("Stranger", 12);

    // The empty tag selects the default envelope kind.
    let enveloped = signer
        .envelop(
            CONTENT,
            "SHA256",
            "",
            None,
            &[cert_a.clone(), cert_b.clone()],
            &SignConfig::default(),
        )
        .expect("Should envelop");
    assert_eq!(signer.classify(&enveloped), ContentTypeTag::EnvelopedData);

    assert_eq!(
        signer
            .open_envelope(&enveloped, &key_a, &cert_a)
            .expect("Recipient A should open"),
        CONTENT
    );
    assert_eq!(
        signer
            .open_envelope(&enveloped, &key_b, &cert_b)
            .expect("Recipient B should open"),
        CONTENT
    );
    assert!(signer
        .open_envelope(&enveloped, &stranger_key, &stranger_cert)
        .is_err());
}

#[test]
fn enveloping_requires_recipients() {
    let signer = CadesSigner::new();
    let err = signer
        .envelop(CONTENT, "SHA256", "EnvelopedData", None, &[], &SignConfig::default())
        .unwrap_err();
    assert!(matches!(err, CadesError::InvalidInput(_)));

    let err = signer
        .envelop(CONTENT, "SHA256", "Sealed", None, &[], &SignConfig::default())
        .unwrap_err();
    assert!(matches!(err, CadesError::UnsupportedFormat(_)));
}

#[test]
fn signed_and_enveloped_data_has_signers() {
    common::init_logging();
    let signer = CadesSigner::new().with_default_envelope(EnvelopeKind::SignedAndEnvelopedData);
    let alice = credential("Alice", 1);
    let (key, cert) = key_and_certificate("Recipient", 20);

    let sealed = signer
        .envelop(
            CONTENT,
            "SHA256withRSA",
            "",
            Some(&alice),
            &[cert.clone()],
            &SignConfig::default(),
        )
        .expect("Should seal");
    assert_eq!(signer.classify(&sealed), ContentTypeTag::SignedAndEnvelopedData);
    assert!(!signer.is_sign(&sealed));
    assert!(signer.is_cades_valid(&sealed));

    let tree = signer.signers_structure(&sealed).expect("Should read signers");
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.nodes()[0].common_name(), Some("Alice"));

    let opened = signer
        .open_envelope(&sealed, &key, &cert)
        .expect("Should open");
    assert_eq!(opened, CONTENT);
    assert!(signer
        .verify(&sealed, Some(&opened))
        .expect("Should verify")
        .success());

    let err = signer
        .envelop(
            CONTENT,
            "SHA256",
            "SignedAndEnvelopedData",
            None,
            &[cert],
            &SignConfig::default(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

fn sealed_parts(blob: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let content_info = decode_content_info(blob).expect("Should decode ContentInfo");
    let sealed: SignedAndEnvelopedData =
        decode_any(&content_info.content).expect("Should decode SignedAndEnvelopedData");
    (
        sealed.recip_infos.to_der().expect("Should encode recipients"),
        sealed
            .encrypted_content
            .to_der()
            .expect("Should encode encrypted content"),
    )
}

#[test]
fn signed_and_enveloped_data_accepts_more_signers() {
    common::init_logging();
    let signer = CadesSigner::new();
    let alice = credential("Alice", 1);
    let bob = credential("Bob", 2);
    let carol = credential("Carol", 3);
    let dave = credential("Dave", 4);
    let (key, cert) = key_and_certificate("Recipient", 21);

    let sealed = signer
        .envelop(
            CONTENT,
            "SHA256withRSA",
            "SignedAndEnvelopedData",
            Some(&alice),
            &[cert.clone()],
            &SignConfig::default(),
        )
        .expect("Should seal");
    let original_parts = sealed_parts(&sealed);
    let opened = signer
        .open_envelope(&sealed, &key, &cert)
        .expect("Should open");

    let sealed = signer
        .cosign(&opened, &sealed, "SHA512withRSA", &bob, &SignConfig::default())
        .expect("Should co-sign");
    let sealed = signer
        .cosign_existing(&sealed, "SHA256withRSA", &carol, &SignConfig::default())
        .expect("Should co-sign from the embedded signers");
    let sealed = signer
        .countersign(
            &sealed,
            "SHA256",
            &CounterSignTarget::Signers(vec!["Alice".to_string()]),
            &dave,
            &SignConfig::default(),
        )
        .expect("Should counter-sign");

    assert_eq!(sealed_parts(&sealed), original_parts);
    assert_eq!(signer.classify(&sealed), ContentTypeTag::SignedAndEnvelopedData);
    assert_eq!(
        signer
            .open_envelope(&sealed, &key, &cert)
            .expect("Should still open"),
        CONTENT
    );

    let tree = signer.signers_structure(&sealed).expect("Should read signers");
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.roots().len(), 3);

    let report = signer.verify(&sealed, Some(&opened)).expect("Should verify");
    assert_eq!(report.signers.len(), 4);
    assert!(report.success());
}

#[test]
fn password_encryption_round_trips() {
    common::init_logging();
    let signer = CadesSigner::new();
    let blob = signer
        .encrypt(CONTENT, "SHA256", "correct horse battery staple")
        .expect("Should encrypt");
    assert_eq!(signer.classify(&blob), ContentTypeTag::EncryptedData);
    assert!(!signer.is_sign(&blob));

    let plain = signer
        .decrypt(&blob, "correct horse battery staple")
        .expect("Should decrypt");
    assert_eq!(plain, CONTENT);

    let err = signer.decrypt(&blob, "Tr0ub4dor&3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EncodingFailure);
}

#[test]
fn raw_key_encryption_matches_cipher_length() {
    let signer = CadesSigner::new().with_cipher_algorithm(CipherAlgorithm::DesEde3Cbc);
    let key = BASE64.encode([0x5au8; 24]);

    let blob = signer.encrypt(CONTENT, "SHA1", &key).expect("Should encrypt");
    assert_eq!(signer.decrypt(&blob, &key).expect("Should decrypt"), CONTENT);

    // A string that is not a key for this cipher is treated as a password.
    let err = signer.decrypt(&blob, "not-a-key").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EncodingFailure);
}
