use std::fmt;

use der::asn1::{Null, ObjectIdentifier};
use der::Any;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef, Private};
use openssl::sign::{Signer, Verifier};
use x509_cert::spki::AlgorithmIdentifierOwned;

use super::DigestAlgorithm;
use crate::domain::constants;
use crate::infra::error::{CadesError, CadesResult};

/// Public key family of a signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ecdsa,
    Dsa,
}

/// Signature algorithm of a SignerInfo: key family plus digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureAlgorithm {
    family: KeyFamily,
    digest: DigestAlgorithm,
}

impl SignatureAlgorithm {
    /// Derive the signature algorithm from the private key type.
    pub fn for_key(key: &PKey<Private>, digest: DigestAlgorithm) -> CadesResult<Self> {
        let family = match key.id() {
            Id::RSA => KeyFamily::Rsa,
            Id::EC => KeyFamily::Ecdsa,
            Id::DSA => KeyFamily::Dsa,
            other => {
                return Err(CadesError::UnsupportedFormat(format!(
                    "Unsupported signing key type: {other:?}"
                )))
            }
        };
        Ok(Self { family, digest })
    }

    #[must_use]
    pub fn family(&self) -> KeyFamily {
        self.family
    }

    #[must_use]
    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    pub fn oid(&self) -> CadesResult<ObjectIdentifier> {
        let oid = match (self.family, self.digest) {
            (KeyFamily::Rsa, DigestAlgorithm::Sha1) => constants::SHA1_WITH_RSA,
            (KeyFamily::Rsa, DigestAlgorithm::Sha256) => constants::SHA256_WITH_RSA,
            (KeyFamily::Rsa, DigestAlgorithm::Sha384) => constants::SHA384_WITH_RSA,
            (KeyFamily::Rsa, DigestAlgorithm::Sha512) => constants::SHA512_WITH_RSA,
            (KeyFamily::Ecdsa, DigestAlgorithm::Sha1) => constants::ECDSA_WITH_SHA1,
            (KeyFamily::Ecdsa, DigestAlgorithm::Sha256) => constants::ECDSA_WITH_SHA256,
            (KeyFamily::Ecdsa, DigestAlgorithm::Sha384) => constants::ECDSA_WITH_SHA384,
            (KeyFamily::Ecdsa, DigestAlgorithm::Sha512) => constants::ECDSA_WITH_SHA512,
            (KeyFamily::Dsa, DigestAlgorithm::Sha1) => constants::DSA_WITH_SHA1,
            (KeyFamily::Dsa, DigestAlgorithm::Sha256) => constants::DSA_WITH_SHA256,
            (KeyFamily::Dsa, other) => {
                return Err(CadesError::UnsupportedFormat(format!(
                    "DSA signatures with {other} are not supported"
                )))
            }
        };
        Ok(oid)
    }

    /// `SignerInfo.signatureAlgorithm`. RSA carries NULL parameters, ECDSA and
    /// DSA carry none.
    pub fn algorithm_identifier(&self) -> CadesResult<AlgorithmIdentifierOwned> {
        let parameters = match self.family {
            KeyFamily::Rsa => Some(Any::from(Null)),
            KeyFamily::Ecdsa | KeyFamily::Dsa => None,
        };
        Ok(AlgorithmIdentifierOwned {
            oid: self.oid()?,
            parameters,
        })
    }

    /// Sign `data` (the DER of the signed attributes SET).
    pub fn sign(&self, key: &PKey<Private>, data: &[u8]) -> CadesResult<CmsSignature> {
        let mut signer = Signer::new(self.digest.message_digest(), key)?;
        signer.update(data)?;
        let bytes = signer.sign_to_vec()?;
        log::debug!(
            "Produced {:?}/{} signature of {} bytes",
            self.family,
            self.digest,
            bytes.len()
        );
        Ok(CmsSignature::new(self.digest, bytes))
    }
}

/// Verify `signature` over `data` with any public key type openssl understands.
pub fn verify_signature<T: HasPublic>(
    key: &PKeyRef<T>,
    digest: DigestAlgorithm,
    data: &[u8],
    signature: &[u8],
) -> CadesResult<bool> {
    let mut verifier = Verifier::new(digest.message_digest(), key)?;
    verifier.update(data)?;
    Ok(verifier.verify(signature).unwrap_or(false))
}

/// Wrapper over a CMS signature value (raw signature bytes as placed in
/// `SignerInfo.signature`). For ECDSA and DSA the bytes are the DER
/// encoded `r,s` sequence.
#[derive(Clone, Eq, PartialEq)]
pub struct CmsSignature {
    algo: DigestAlgorithm,
    bytes: Box<[u8]>,
}

impl CmsSignature {
    #[must_use]
    pub fn new(algo: DigestAlgorithm, bytes: Vec<u8>) -> Self {
        Self {
            algo,
            bytes: bytes.into_boxed_slice(),
        }
    }
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algo
    }
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for CmsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CmsSignature(algo={:?}, len={})",
            self.algo,
            self.bytes.len()
        )
    }
}
