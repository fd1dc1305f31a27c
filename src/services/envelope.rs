//! Envelope builder service.
//!
//! Wraps content as Data, DigestedData, EnvelopedData (RSA key transport to
//! each recipient) or PKCS#7 SignedAndEnvelopedData, and opens enveloped
//! structures again with a recipient key.

use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::CmsVersion;
use cms::digested_data::DigestedData;
use cms::enveloped_data::{
    EncryptedContentInfo, EnvelopedData, KeyTransRecipientInfo, OriginatorInfo,
    RecipientIdentifier, RecipientInfo, RecipientInfos,
};
use cms::signed_data::{CertificateSet, EncapsulatedContentInfo, SignerInfos};
use der::asn1::{Null, ObjectIdentifier, OctetString, SetOfVec};
use der::Any;
use openssl::encrypt::{Decrypter, Encrypter};
use openssl::pkey::{Id, PKey, Private};
use openssl::rsa::Padding;
use openssl::x509::X509;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::Certificate;

use crate::domain::cms::{
    decode_any, decode_content_info, encode_content_info, SignedAndEnvelopedData,
    SignedAttributeSet,
};
use crate::domain::constants;
use crate::domain::crypto::{parse_certificate, CipherAlgorithm, DigestAlgorithm, SigningCredential};
use crate::domain::types::{ContentTypeTag, EnvelopeKind};
use crate::infra::config::SignConfig;
use crate::infra::error::{CadesError, CadesResult};
use crate::services::classifier::ContentTypeClassifier;
use crate::services::signer_info::SignerInfoBuilder;

/// Encrypt `plaintext` under a fresh IV with `cipher`; the IV travels as the
/// algorithm parameter.
pub(crate) fn seal_content(
    cipher: CipherAlgorithm,
    key: &[u8],
    content_type: ObjectIdentifier,
    plaintext: &[u8],
) -> CadesResult<EncryptedContentInfo> {
    let iv = cipher.generate_iv();
    let ciphertext = cipher.encrypt(key, &iv, plaintext)?;
    Ok(EncryptedContentInfo {
        content_type,
        content_enc_alg: AlgorithmIdentifierOwned {
            oid: cipher.oid(),
            parameters: Some(Any::encode_from(&OctetString::new(iv)?)?),
        },
        encrypted_content: Some(OctetString::new(ciphertext)?),
    })
}

/// Reverse of [`seal_content`].
pub(crate) fn unseal_content(eci: &EncryptedContentInfo, key: &[u8]) -> CadesResult<Vec<u8>> {
    let cipher = CipherAlgorithm::from_oid(&eci.content_enc_alg.oid)?;
    let iv: OctetString = eci
        .content_enc_alg
        .parameters
        .as_ref()
        .map(decode_any)
        .transpose()?
        .ok_or_else(|| CadesError::encoding("The content encryption algorithm has no IV"))?;
    let ciphertext = eci
        .encrypted_content
        .as_ref()
        .ok_or_else(|| CadesError::UnsupportedFormat("The encrypted content is detached".to_string()))?;
    cipher.decrypt(key, iv.as_bytes(), ciphertext.as_bytes())
}

/// Builds Data, DigestedData, EnvelopedData and SignedAndEnvelopedData.
pub struct EnvelopeBuilder {
    cipher: CipherAlgorithm,
    content_type: ObjectIdentifier,
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new(constants::ID_DATA)
    }
}

impl EnvelopeBuilder {
    #[must_use]
    pub fn new(content_type: ObjectIdentifier) -> Self {
        Self {
            cipher: CipherAlgorithm::default(),
            content_type,
        }
    }

    #[must_use]
    pub fn with_cipher(mut self, cipher: CipherAlgorithm) -> Self {
        self.cipher = cipher;
        self
    }

    #[must_use]
    pub fn cipher(&self) -> CipherAlgorithm {
        self.cipher
    }

    pub fn build(
        &self,
        kind: EnvelopeKind,
        content: &[u8],
        digest: DigestAlgorithm,
        credential: Option<&SigningCredential>,
        recipients: &[X509],
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        log::info!("Building {kind} ({} content bytes)", content.len());
        match kind {
            EnvelopeKind::Data => self.data(content),
            EnvelopeKind::DigestedData => self.digested_data(content, digest),
            EnvelopeKind::EnvelopedData => {
                self.enveloped_data(content, digest, credential, recipients, config)
            }
            EnvelopeKind::SignedAndEnvelopedData => {
                let credential = credential.ok_or_else(|| {
                    CadesError::InvalidInput(
                        "SignedAndEnvelopedData needs a signing credential".to_string(),
                    )
                })?;
                self.signed_and_enveloped_data(content, digest, credential, recipients, config)
            }
        }
    }

    pub fn data(&self, content: &[u8]) -> CadesResult<Vec<u8>> {
        encode_content_info(constants::ID_DATA, &OctetString::new(content)?)
    }

    pub fn digested_data(&self, content: &[u8], digest: DigestAlgorithm) -> CadesResult<Vec<u8>> {
        let version = if self.content_type == constants::ID_DATA {
            CmsVersion::V0
        } else {
            CmsVersion::V2
        };
        let digested = DigestedData {
            version,
            digest_alg: digest.algorithm_identifier(),
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: self.content_type,
                econtent: Some(Any::encode_from(&OctetString::new(content)?)?),
            },
            digest: OctetString::new(digest.digest(content))?,
        };
        encode_content_info(constants::ID_DIGESTED_DATA, &digested)
    }

    pub fn enveloped_data(
        &self,
        content: &[u8],
        digest: DigestAlgorithm,
        credential: Option<&SigningCredential>,
        recipients: &[X509],
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        let cek = self.cipher.generate_key();
        let recip_infos = recipient_infos(&cek, recipients)?;
        let encrypted_content = seal_content(self.cipher, &cek, self.content_type, content)?;

        let originator_info = match credential {
            Some(credential) => Some(OriginatorInfo {
                certs: Some(certificate_set(&credential.parsed_chain()?)?),
                crls: None,
            }),
            None => None,
        };

        let mut unprotected = SignedAttributeSet::new();
        unprotected.insert_content_type(self.content_type)?;
        unprotected.insert_message_digest(&digest.digest(content))?;
        if let Some(at) = config.effective_signing_time() {
            unprotected.insert_signing_time(at)?;
        }

        let enveloped = EnvelopedData {
            version: CmsVersion::V2,
            originator_info,
            recip_infos,
            encrypted_content,
            unprotected_attrs: Some(unprotected.to_set_of()?),
        };
        log::debug!(
            "EnvelopedData for {} recipient(s) using {}",
            recipients.len(),
            self.cipher
        );
        encode_content_info(constants::ID_ENVELOPED_DATA, &enveloped)
    }

    pub fn signed_and_enveloped_data(
        &self,
        content: &[u8],
        digest: DigestAlgorithm,
        credential: &SigningCredential,
        recipients: &[X509],
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        let cek = self.cipher.generate_key();
        let recip_infos = recipient_infos(&cek, recipients)?;
        let encrypted_content =
            seal_content(self.cipher, &cek, constants::ID_SIGNED_DATA, content)?;

        let signer_info = SignerInfoBuilder::new(credential, digest)
            .with_config(config)
            .build(Some(constants::ID_SIGNED_DATA), &digest.digest(content))?;

        let structure = SignedAndEnvelopedData {
            version: CmsVersion::V1,
            recip_infos,
            digest_algorithms: SetOfVec::try_from(vec![digest.algorithm_identifier()])?,
            encrypted_content,
            certificates: Some(certificate_set(&credential.parsed_chain()?)?),
            crls: None,
            signer_infos: SignerInfos(SetOfVec::try_from(vec![signer_info])?),
        };
        encode_content_info(constants::ID_SIGNED_AND_ENVELOPED_DATA, &structure)
    }

    /// Decrypt an EnvelopedData or SignedAndEnvelopedData addressed to `cert`.
    pub fn open(&self, blob: &[u8], key: &PKey<Private>, cert: &X509) -> CadesResult<Vec<u8>> {
        let content_info = decode_content_info(blob)?;
        let (recip_infos, encrypted_content) = match ContentTypeClassifier::new().classify(blob) {
            ContentTypeTag::EnvelopedData => {
                let enveloped: EnvelopedData = decode_any(&content_info.content)?;
                (enveloped.recip_infos, enveloped.encrypted_content)
            }
            ContentTypeTag::SignedAndEnvelopedData => {
                let structure: SignedAndEnvelopedData = decode_any(&content_info.content)?;
                (structure.recip_infos, structure.encrypted_content)
            }
            other => {
                return Err(CadesError::UnsupportedFormat(format!(
                    "{other} is not an enveloped structure"
                )))
            }
        };

        let recipient = parse_certificate(cert)?;
        let encrypted_key = recip_infos
            .0
            .iter()
            .find_map(|info| match info {
                RecipientInfo::Ktri(ktri) if addresses(ktri, &recipient) => Some(&ktri.enc_key),
                _ => None,
            })
            .ok_or_else(|| {
                CadesError::InvalidInput(
                    "The envelope is not addressed to the given certificate".to_string(),
                )
            })?;

        let cek = rsa_unwrap(key, encrypted_key.as_bytes())?;
        unseal_content(&encrypted_content, &cek)
    }
}

fn addresses(ktri: &KeyTransRecipientInfo, cert: &Certificate) -> bool {
    match &ktri.rid {
        RecipientIdentifier::IssuerAndSerialNumber(ias) => {
            ias.issuer == cert.tbs_certificate.issuer
                && ias.serial_number == cert.tbs_certificate.serial_number
        }
        RecipientIdentifier::SubjectKeyIdentifier(_) => false,
    }
}

fn recipient_infos(cek: &[u8], recipients: &[X509]) -> CadesResult<RecipientInfos> {
    if recipients.is_empty() {
        return Err(CadesError::InvalidInput(
            "At least one recipient certificate is required".to_string(),
        ));
    }
    let infos = recipients
        .iter()
        .map(|cert| key_trans_recipient(cek, cert))
        .collect::<CadesResult<Vec<_>>>()?;
    Ok(RecipientInfos(SetOfVec::try_from(infos)?))
}

fn key_trans_recipient(cek: &[u8], cert: &X509) -> CadesResult<RecipientInfo> {
    let public_key = cert.public_key()?;
    if public_key.id() != Id::RSA {
        return Err(CadesError::UnsupportedFormat(format!(
            "Recipient key type {:?} cannot transport keys; RSA is required",
            public_key.id()
        )));
    }
    let mut encrypter = Encrypter::new(&public_key)?;
    encrypter.set_rsa_padding(Padding::PKCS1)?;
    let mut wrapped = vec![0u8; encrypter.encrypt_len(cek)?];
    let len = encrypter.encrypt(cek, &mut wrapped)?;
    wrapped.truncate(len);

    let parsed = parse_certificate(cert)?;
    Ok(RecipientInfo::Ktri(KeyTransRecipientInfo {
        version: CmsVersion::V0,
        rid: RecipientIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: parsed.tbs_certificate.issuer.clone(),
            serial_number: parsed.tbs_certificate.serial_number.clone(),
        }),
        key_enc_alg: AlgorithmIdentifierOwned {
            oid: constants::RSA_ENCRYPTION,
            parameters: Some(Any::from(Null)),
        },
        enc_key: OctetString::new(wrapped)?,
    }))
}

fn rsa_unwrap(key: &PKey<Private>, wrapped: &[u8]) -> CadesResult<Vec<u8>> {
    let mut decrypter = Decrypter::new(key)?;
    decrypter.set_rsa_padding(Padding::PKCS1)?;
    let mut cek = vec![0u8; decrypter.decrypt_len(wrapped)?];
    let len = decrypter
        .decrypt(wrapped, &mut cek)
        .map_err(|e| CadesError::encoding_with("Could not unwrap the content key", e))?;
    cek.truncate(len);
    Ok(cek)
}

fn certificate_set(chain: &[Certificate]) -> CadesResult<CertificateSet> {
    let mut choices: Vec<CertificateChoices> = Vec::with_capacity(chain.len());
    for cert in chain {
        let choice = CertificateChoices::Certificate(cert.clone());
        if !choices.contains(&choice) {
            choices.push(choice);
        }
    }
    Ok(CertificateSet(SetOfVec::try_from(choices)?))
}
