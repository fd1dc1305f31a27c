//! Digest algorithm domain type.
//!
//! Parses the loose algorithm identifiers callers pass around (`SHA256withRSA`,
//! `SHA-256`, `sha256`, a bare `RSA`, an OID) into a closed enumeration and
//! provides the OIDs, `AlgorithmIdentifier`s and hashing used by the builders.

use std::fmt;
use std::str::FromStr;

use der::asn1::{Null, ObjectIdentifier};
use der::Any;
use openssl::hash::MessageDigest;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::domain::constants;
use crate::infra::error::{CadesError, CadesResult};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Resolve a signature or digest algorithm hint.
    ///
    /// A bare key algorithm (`RSA`, `DSA`) historically means SHA-1.
    pub fn from_hint(hint: &str) -> CadesResult<Self> {
        let normalized = hint.trim().to_ascii_uppercase().replace(['-', '_'], "");
        if normalized.is_empty() {
            return Err(CadesError::InvalidInput(
                "The signature algorithm cannot be empty".to_string(),
            ));
        }

        if let Ok(oid) = ObjectIdentifier::new(hint.trim()) {
            return Self::from_oid(&oid);
        }

        let digest_part = normalized
            .split("WITH")
            .next()
            .unwrap_or(normalized.as_str());

        match digest_part {
            "RSA" | "DSA" | "SHA1" | "SHA" => Ok(DigestAlgorithm::Sha1),
            "SHA256" => Ok(DigestAlgorithm::Sha256),
            "SHA384" => Ok(DigestAlgorithm::Sha384),
            "SHA512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(CadesError::InvalidInput(format!(
                "Unsupported signature algorithm: {hint}"
            ))),
        }
    }

    /// Resolve a digest algorithm OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> CadesResult<Self> {
        match *oid {
            constants::ID_SHA1 => Ok(DigestAlgorithm::Sha1),
            constants::ID_SHA256 => Ok(DigestAlgorithm::Sha256),
            constants::ID_SHA384 => Ok(DigestAlgorithm::Sha384),
            constants::ID_SHA512 => Ok(DigestAlgorithm::Sha512),
            _ => Err(CadesError::UnsupportedFormat(format!(
                "Unsupported digest algorithm OID: {oid}"
            ))),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        }
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha1 => constants::ID_SHA1,
            DigestAlgorithm::Sha256 => constants::ID_SHA256,
            DigestAlgorithm::Sha384 => constants::ID_SHA384,
            DigestAlgorithm::Sha512 => constants::ID_SHA512,
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// `AlgorithmIdentifier` with explicit NULL parameters, as used in
    /// `digestAlgorithms` and `SignerInfo.digestAlgorithm`.
    #[must_use]
    pub fn algorithm_identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(Any::from(Null)),
        }
    }

    /// `AlgorithmIdentifier` without parameters (ESS / policy hashes).
    #[must_use]
    pub fn bare_algorithm_identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: None,
        }
    }

    /// HMAC PRF OID used when this digest drives PBKDF2.
    #[must_use]
    pub fn hmac_oid(&self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha1 => constants::ID_HMAC_WITH_SHA1,
            DigestAlgorithm::Sha256 => constants::ID_HMAC_WITH_SHA256,
            DigestAlgorithm::Sha384 => constants::ID_HMAC_WITH_SHA384,
            DigestAlgorithm::Sha512 => constants::ID_HMAC_WITH_SHA512,
        }
    }

    /// Resolve an HMAC PRF OID back to its digest.
    pub fn from_hmac_oid(oid: &ObjectIdentifier) -> CadesResult<Self> {
        match *oid {
            constants::ID_HMAC_WITH_SHA1 => Ok(DigestAlgorithm::Sha1),
            constants::ID_HMAC_WITH_SHA256 => Ok(DigestAlgorithm::Sha256),
            constants::ID_HMAC_WITH_SHA384 => Ok(DigestAlgorithm::Sha384),
            constants::ID_HMAC_WITH_SHA512 => Ok(DigestAlgorithm::Sha512),
            _ => Err(CadesError::UnsupportedFormat(format!(
                "Unsupported PBKDF2 pseudo random function: {oid}"
            ))),
        }
    }

    /// OpenSSL digest handle for signing and key derivation.
    #[must_use]
    pub fn message_digest(&self) -> MessageDigest {
        match self {
            DigestAlgorithm::Sha1 => MessageDigest::sha1(),
            DigestAlgorithm::Sha256 => MessageDigest::sha256(),
            DigestAlgorithm::Sha384 => MessageDigest::sha384(),
            DigestAlgorithm::Sha512 => MessageDigest::sha512(),
        }
    }

    /// Hash `data` with this algorithm.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CadesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hint(s)
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signature_algorithm_names() {
        assert_eq!(
            DigestAlgorithm::from_hint("SHA256withRSA").unwrap(),
            DigestAlgorithm::Sha256
        );
        assert_eq!(
            DigestAlgorithm::from_hint("SHA512withECDSA").unwrap(),
            DigestAlgorithm::Sha512
        );
        assert_eq!(
            DigestAlgorithm::from_hint("sha-384").unwrap(),
            DigestAlgorithm::Sha384
        );
        assert_eq!(
            DigestAlgorithm::from_hint("2.16.840.1.101.3.4.2.1").unwrap(),
            DigestAlgorithm::Sha256
        );
    }

    #[test]
    fn bare_key_algorithms_mean_sha1() {
        assert_eq!(DigestAlgorithm::from_hint("RSA").unwrap(), DigestAlgorithm::Sha1);
        assert_eq!(DigestAlgorithm::from_hint("dsa").unwrap(), DigestAlgorithm::Sha1);
    }

    #[test]
    fn rejects_unknown_and_empty_hints() {
        assert!(DigestAlgorithm::from_hint("MD5withRSA").is_err());
        assert!(DigestAlgorithm::from_hint("  ").is_err());
    }

    #[test]
    fn digest_sizes_match_output() {
        for alg in [
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ] {
            assert_eq!(alg.digest(b"abc").len(), alg.digest_size());
        }
    }
}
