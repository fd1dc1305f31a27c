use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use der::asn1::ObjectIdentifier;
use openssl::symm::{self, Cipher};
use serde::{Deserialize, Serialize};

use crate::domain::constants;
use crate::infra::error::{CadesError, CadesResult};

/// Block ciphers available for content encryption. All run in CBC mode with
/// PKCS#5 padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherAlgorithm {
    #[default]
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
    DesEde3Cbc,
}

impl CipherAlgorithm {
    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            CipherAlgorithm::Aes128Cbc => constants::ID_AES128_CBC,
            CipherAlgorithm::Aes192Cbc => constants::ID_AES192_CBC,
            CipherAlgorithm::Aes256Cbc => constants::ID_AES256_CBC,
            CipherAlgorithm::DesEde3Cbc => constants::ID_DES_EDE3_CBC,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> CadesResult<Self> {
        match *oid {
            constants::ID_AES128_CBC => Ok(CipherAlgorithm::Aes128Cbc),
            constants::ID_AES192_CBC => Ok(CipherAlgorithm::Aes192Cbc),
            constants::ID_AES256_CBC => Ok(CipherAlgorithm::Aes256Cbc),
            constants::ID_DES_EDE3_CBC => Ok(CipherAlgorithm::DesEde3Cbc),
            _ => Err(CadesError::UnsupportedFormat(format!(
                "Unsupported content encryption algorithm: {oid}"
            ))),
        }
    }

    #[must_use]
    pub fn key_len(&self) -> usize {
        match self {
            CipherAlgorithm::Aes128Cbc => 16,
            CipherAlgorithm::Aes192Cbc | CipherAlgorithm::DesEde3Cbc => 24,
            CipherAlgorithm::Aes256Cbc => 32,
        }
    }

    #[must_use]
    pub fn iv_len(&self) -> usize {
        match self {
            CipherAlgorithm::DesEde3Cbc => 8,
            _ => 16,
        }
    }

    fn openssl_cipher(&self) -> Cipher {
        match self {
            CipherAlgorithm::Aes128Cbc => Cipher::aes_128_cbc(),
            CipherAlgorithm::Aes192Cbc => Cipher::aes_192_cbc(),
            CipherAlgorithm::Aes256Cbc => Cipher::aes_256_cbc(),
            CipherAlgorithm::DesEde3Cbc => Cipher::des_ede3_cbc(),
        }
    }

    /// Fresh random content-encryption key.
    #[must_use]
    pub fn generate_key(&self) -> Vec<u8> {
        random_bytes(self.key_len())
    }

    /// Fresh random IV.
    #[must_use]
    pub fn generate_iv(&self) -> Vec<u8> {
        random_bytes(self.iv_len())
    }

    pub fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> CadesResult<Vec<u8>> {
        self.check_lengths(key, iv)?;
        Ok(symm::encrypt(self.openssl_cipher(), key, Some(iv), plaintext)?)
    }

    /// Decrypt and strip padding. Wrong keys surface as EncodingFailure.
    pub fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> CadesResult<Vec<u8>> {
        self.check_lengths(key, iv)?;
        symm::decrypt(self.openssl_cipher(), key, Some(iv), ciphertext)
            .map_err(|e| CadesError::encoding_with("Content decryption failed", e))
    }

    fn check_lengths(&self, key: &[u8], iv: &[u8]) -> CadesResult<()> {
        if key.len() != self.key_len() || iv.len() != self.iv_len() {
            return Err(CadesError::encoding(format!(
                "{self} expects a {}-byte key and {}-byte IV, got {} and {}",
                self.key_len(),
                self.iv_len(),
                key.len(),
                iv.len()
            )));
        }
        Ok(())
    }
}

pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::fill(buf.as_mut_slice());
    buf
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CipherAlgorithm::Aes128Cbc => "AES-128-CBC",
            CipherAlgorithm::Aes192Cbc => "AES-192-CBC",
            CipherAlgorithm::Aes256Cbc => "AES-256-CBC",
            CipherAlgorithm::DesEde3Cbc => "DES-EDE3-CBC",
        };
        f.write_str(name)
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CadesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "AES" | "AES128" | "AES128CBC" => Ok(CipherAlgorithm::Aes128Cbc),
            "AES192" | "AES192CBC" => Ok(CipherAlgorithm::Aes192Cbc),
            "AES256" | "AES256CBC" => Ok(CipherAlgorithm::Aes256Cbc),
            "DESEDE" | "3DES" | "DESEDE3CBC" | "TRIPLEDES" => Ok(CipherAlgorithm::DesEde3Cbc),
            _ => Err(CadesError::Configuration(format!(
                "Unknown cipher algorithm: {s}"
            ))),
        }
    }
}

/// Secret protecting an EncryptedData structure.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Passphrase run through PBKDF2.
    Password(String),
    /// Raw content-encryption key.
    Encoded(Vec<u8>),
}

impl KeyMaterial {
    /// Interpret a caller supplied key string for `cipher`: Base64 that
    /// decodes to exactly the cipher key length is a raw key, anything else a
    /// password.
    #[must_use]
    pub fn resolve(input: &str, cipher: CipherAlgorithm) -> Self {
        match BASE64.decode(input.trim()) {
            Ok(raw) if raw.len() == cipher.key_len() => KeyMaterial::Encoded(raw),
            _ => KeyMaterial::Password(input.to_string()),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Password(_) => f.write_str("KeyMaterial::Password(***)"),
            KeyMaterial::Encoded(k) => write!(f, "KeyMaterial::Encoded(len={})", k.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_of_key_length_is_raw_key() {
        let key = BASE64.encode([7u8; 16]);
        assert_eq!(
            KeyMaterial::resolve(&key, CipherAlgorithm::Aes128Cbc),
            KeyMaterial::Encoded(vec![7u8; 16])
        );
        // Same string is too short for AES-256, so it is a password there.
        assert!(matches!(
            KeyMaterial::resolve(&key, CipherAlgorithm::Aes256Cbc),
            KeyMaterial::Password(_)
        ));
        assert!(matches!(
            KeyMaterial::resolve("correct horse", CipherAlgorithm::Aes128Cbc),
            KeyMaterial::Password(_)
        ));
    }

    #[test]
    fn cbc_round_trip() {
        for cipher in [
            CipherAlgorithm::Aes128Cbc,
            CipherAlgorithm::Aes256Cbc,
            CipherAlgorithm::DesEde3Cbc,
        ] {
            let key = cipher.generate_key();
            let iv = cipher.generate_iv();
            let ct = cipher.encrypt(&key, &iv, b"plain text").unwrap();
            assert_eq!(cipher.decrypt(&key, &iv, &ct).unwrap(), b"plain text");
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("aes-256".parse::<CipherAlgorithm>().unwrap(), CipherAlgorithm::Aes256Cbc);
        assert_eq!("DESede".parse::<CipherAlgorithm>().unwrap(), CipherAlgorithm::DesEde3Cbc);
        assert!("rc2".parse::<CipherAlgorithm>().is_err());
    }
}
