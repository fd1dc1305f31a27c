//! Symmetric EncryptedData generator.
//!
//! Content is encrypted under a raw key or a password (PBES2 with PBKDF2).
//! The plaintext digest is declared in the unprotected attributes so that
//! decryption can tell a wrong secret from a successful decryption.

use std::time::SystemTime;

use cms::content_info::CmsVersion;
use cms::encrypted_data::EncryptedData;
use cms::enveloped_data::EncryptedContentInfo;
use der::asn1::{Null, ObjectIdentifier, OctetString};
use der::{Any, Sequence};
use openssl::pkcs5::pbkdf2_hmac;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::domain::cms::{
    decode_any, decode_content_info, encode_content_info, find_attribute_value,
    SignedAttributeSet,
};
use crate::domain::constants;
use crate::domain::crypto::{random_bytes, CipherAlgorithm, DigestAlgorithm, KeyMaterial};
use crate::domain::types::ContentTypeTag;
use crate::infra::error::{CadesError, CadesResult};
use crate::services::envelope::{seal_content, unseal_content};

/// PBKDF2 PRF for password sealing. The digest hint only names the
/// declared plaintext digest.
const PASSWORD_PRF: DigestAlgorithm = DigestAlgorithm::Sha256;

/// `PBKDF2-params` (RFC 8018). An absent `prf` means HMAC-SHA1.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Pbkdf2Params {
    pub salt: OctetString,
    pub iteration_count: u32,
    pub key_length: Option<u16>,
    pub prf: Option<AlgorithmIdentifierOwned>,
}

/// `PBES2-params` (RFC 8018).
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Pbes2Params {
    pub key_derivation_func: AlgorithmIdentifierOwned,
    pub encryption_scheme: AlgorithmIdentifierOwned,
}

pub struct EncryptedDataGenerator {
    cipher: CipherAlgorithm,
    content_type: ObjectIdentifier,
}

impl Default for EncryptedDataGenerator {
    fn default() -> Self {
        Self::new(CipherAlgorithm::default())
    }
}

impl EncryptedDataGenerator {
    #[must_use]
    pub fn new(cipher: CipherAlgorithm) -> Self {
        Self {
            cipher,
            content_type: constants::ID_DATA,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ObjectIdentifier) -> Self {
        self.content_type = content_type;
        self
    }

    /// Encrypt `content`. `key` is Base64 raw key material of the cipher's
    /// key length, or a password.
    pub fn encrypt(
        &self,
        content: &[u8],
        digest: DigestAlgorithm,
        key: &str,
    ) -> CadesResult<Vec<u8>> {
        if key.is_empty() {
            return Err(CadesError::InvalidInput(
                "A key or password is required".to_string(),
            ));
        }
        let enc_content_info = match KeyMaterial::resolve(key, self.cipher) {
            KeyMaterial::Encoded(raw) => {
                log::debug!("Encrypting with a raw {} key", self.cipher);
                seal_content(self.cipher, &raw, self.content_type, content)?
            }
            KeyMaterial::Password(password) => {
                log::debug!("Encrypting with a password derived {} key", self.cipher);
                self.seal_with_password(&password, content)?
            }
        };

        let mut unprotected = SignedAttributeSet::new();
        unprotected.insert_content_type(self.content_type)?;
        unprotected.insert_message_digest(&digest.digest(content))?;
        unprotected.insert_signing_time(SystemTime::now())?;

        let encrypted = EncryptedData {
            version: CmsVersion::V2,
            enc_content_info,
            unprotected_attrs: Some(unprotected.to_set_of()?),
        };
        encode_content_info(constants::ID_ENCRYPTED_DATA, &encrypted)
    }

    fn seal_with_password(
        &self,
        password: &str,
        content: &[u8],
    ) -> CadesResult<EncryptedContentInfo> {
        let salt = random_bytes(constants::PBKDF2_SALT_LENGTH);
        let key = derive_key(
            password,
            &salt,
            constants::PBKDF2_ITERATIONS,
            PASSWORD_PRF,
            self.cipher,
        )?;
        let iv = self.cipher.generate_iv();
        let ciphertext = self.cipher.encrypt(&key, &iv, content)?;

        let prf = Some(AlgorithmIdentifierOwned {
            oid: PASSWORD_PRF.hmac_oid(),
            parameters: Some(Any::from(Null)),
        });
        let params = Pbes2Params {
            key_derivation_func: AlgorithmIdentifierOwned {
                oid: constants::ID_PBKDF2,
                parameters: Some(Any::encode_from(&Pbkdf2Params {
                    salt: OctetString::new(salt)?,
                    iteration_count: constants::PBKDF2_ITERATIONS,
                    key_length: None,
                    prf,
                })?),
            },
            encryption_scheme: AlgorithmIdentifierOwned {
                oid: self.cipher.oid(),
                parameters: Some(Any::encode_from(&OctetString::new(iv)?)?),
            },
        };

        Ok(EncryptedContentInfo {
            content_type: self.content_type,
            content_enc_alg: AlgorithmIdentifierOwned {
                oid: constants::ID_PBES2,
                parameters: Some(Any::encode_from(&params)?),
            },
            encrypted_content: Some(OctetString::new(ciphertext)?),
        })
    }

    /// Decrypt an EncryptedData produced by [`Self::encrypt`]. Any failure to
    /// recover the declared plaintext is an EncodingFailure.
    pub fn decrypt(&self, blob: &[u8], key: &str) -> CadesResult<Vec<u8>> {
        let content_info = decode_content_info(blob)?;
        if ContentTypeTag::from_oid(&content_info.content_type) != ContentTypeTag::EncryptedData {
            return Err(CadesError::UnsupportedFormat(format!(
                "Expected EncryptedData, found {}",
                ContentTypeTag::from_oid(&content_info.content_type)
            )));
        }
        let encrypted: EncryptedData = decode_any(&content_info.content)?;
        let eci = &encrypted.enc_content_info;

        let plaintext = if eci.content_enc_alg.oid == constants::ID_PBES2 {
            open_with_password(eci, key)?
        } else {
            let cipher = CipherAlgorithm::from_oid(&eci.content_enc_alg.oid)?;
            match KeyMaterial::resolve(key, cipher) {
                KeyMaterial::Encoded(raw) => unseal_content(eci, &raw)?,
                KeyMaterial::Password(_) => {
                    return Err(CadesError::encoding(format!(
                        "The content is encrypted with a raw {cipher} key"
                    )))
                }
            }
        };

        check_declared_digest(&encrypted, &plaintext)?;
        Ok(plaintext)
    }
}

fn derive_key(
    password: &str,
    salt: &[u8],
    iterations: u32,
    prf: DigestAlgorithm,
    cipher: CipherAlgorithm,
) -> CadesResult<Vec<u8>> {
    let mut key = vec![0u8; cipher.key_len()];
    pbkdf2_hmac(
        password.as_bytes(),
        salt,
        iterations as usize,
        prf.message_digest(),
        &mut key,
    )?;
    Ok(key)
}

fn open_with_password(eci: &EncryptedContentInfo, password: &str) -> CadesResult<Vec<u8>> {
    let params: Pbes2Params = eci
        .content_enc_alg
        .parameters
        .as_ref()
        .map(decode_any::<Pbes2Params>)
        .transpose()?
        .ok_or_else(|| CadesError::encoding("PBES2 parameters are missing"))?;
    if params.key_derivation_func.oid != constants::ID_PBKDF2 {
        return Err(CadesError::UnsupportedFormat(format!(
            "Unsupported key derivation function: {}",
            params.key_derivation_func.oid
        )));
    }
    let kdf: Pbkdf2Params = params
        .key_derivation_func
        .parameters
        .as_ref()
        .map(decode_any::<Pbkdf2Params>)
        .transpose()?
        .ok_or_else(|| CadesError::encoding("PBKDF2 parameters are missing"))?;
    let prf = match &kdf.prf {
        Some(alg) => DigestAlgorithm::from_hmac_oid(&alg.oid)?,
        None => DigestAlgorithm::Sha1,
    };
    let cipher = CipherAlgorithm::from_oid(&params.encryption_scheme.oid)?;
    let key = derive_key(password, kdf.salt.as_bytes(), kdf.iteration_count, prf, cipher)?;

    let inner = EncryptedContentInfo {
        content_type: eci.content_type,
        content_enc_alg: params.encryption_scheme,
        encrypted_content: eci.encrypted_content.clone(),
    };
    unseal_content(&inner, &key)
}

fn check_declared_digest(encrypted: &EncryptedData, plaintext: &[u8]) -> CadesResult<()> {
    let Some(value) = encrypted
        .unprotected_attrs
        .as_ref()
        .and_then(|attrs| find_attribute_value(attrs, &constants::ID_MESSAGE_DIGEST))
    else {
        log::warn!("EncryptedData declares no digest; decrypted content is unverified");
        return Ok(());
    };
    let declared: OctetString = decode_any(value)?;
    let declared = declared.as_bytes();
    let algorithm = match declared.len() {
        20 => DigestAlgorithm::Sha1,
        32 => DigestAlgorithm::Sha256,
        48 => DigestAlgorithm::Sha384,
        64 => DigestAlgorithm::Sha512,
        other => {
            return Err(CadesError::encoding(format!(
                "Declared digest has an unexpected length of {other} bytes"
            )))
        }
    };
    if algorithm.digest(plaintext) != declared {
        return Err(CadesError::encoding(
            "Decrypted content does not match the declared digest; wrong key or password",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    #[test]
    fn password_round_trip() {
        let generator = EncryptedDataGenerator::default();
        let blob = generator
            .encrypt(b"secret payload", DigestAlgorithm::Sha256, "hunter22")
            .unwrap();
        assert_eq!(generator.decrypt(&blob, "hunter22").unwrap(), b"secret payload");
    }

    #[test]
    fn wrong_password_is_encoding_failure() {
        let generator = EncryptedDataGenerator::new(CipherAlgorithm::Aes256Cbc);
        let blob = generator
            .encrypt(b"secret payload", DigestAlgorithm::Sha1, "right")
            .unwrap();
        for attempt in ["wrong", "Right", "right "] {
            let err = generator.decrypt(&blob, attempt).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::EncodingFailure);
        }
    }

    #[test]
    fn raw_key_round_trip() {
        let generator = EncryptedDataGenerator::new(CipherAlgorithm::Aes128Cbc);
        let key = BASE64.encode([0x42u8; 16]);
        let blob = generator
            .encrypt(b"raw keyed", DigestAlgorithm::Sha512, &key)
            .unwrap();
        assert_eq!(generator.decrypt(&blob, &key).unwrap(), b"raw keyed");

        let other = BASE64.encode([0x43u8; 16]);
        assert_eq!(
            generator.decrypt(&blob, &other).unwrap_err().kind(),
            ErrorKind::EncodingFailure
        );
    }

    fn declared_prf(blob: &[u8]) -> Option<ObjectIdentifier> {
        let content_info = decode_content_info(blob).unwrap();
        let encrypted: EncryptedData = decode_any(&content_info.content).unwrap();
        let params: Pbes2Params =
            decode_any(encrypted.enc_content_info.content_enc_alg.parameters.as_ref().unwrap())
                .unwrap();
        let kdf: Pbkdf2Params =
            decode_any(params.key_derivation_func.parameters.as_ref().unwrap()).unwrap();
        kdf.prf.map(|alg| alg.oid)
    }

    #[test]
    fn password_prf_ignores_digest_hint() {
        let generator = EncryptedDataGenerator::default();
        for digest in [DigestAlgorithm::Sha1, DigestAlgorithm::Sha512] {
            let blob = generator.encrypt(b"payload", digest, "hunter22").unwrap();
            assert_eq!(declared_prf(&blob), Some(constants::ID_HMAC_WITH_SHA256));
            assert_eq!(generator.decrypt(&blob, "hunter22").unwrap(), b"payload");
        }
    }

    #[test]
    fn pbkdf2_params_omit_default_prf() {
        let params = Pbkdf2Params {
            salt: OctetString::new(vec![1u8; 16]).unwrap(),
            iteration_count: 2048,
            key_length: None,
            prf: None,
        };
        let der = der::Encode::to_der(&params).unwrap();
        let decoded: Pbkdf2Params = der::Decode::from_der(&der).unwrap();
        assert!(decoded.prf.is_none());
        assert_eq!(decoded.iteration_count, 2048);
    }
}
