//! SignerInfo construction shared by the signature, co-signature and
//! counter-signature builders.

use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cms::cert::IssuerAndSerialNumber;
use cms::content_info::CmsVersion;
use cms::signed_data::{SignerIdentifier, SignerInfo};
use der::asn1::{ObjectIdentifier, OctetString};
use der::Encode;

use crate::domain::cms::{normalize_policy_qualifier, SignaturePolicy, SignedAttributeSet};
use crate::domain::crypto::{parse_certificate, DigestAlgorithm, SignatureAlgorithm, SigningCredential};
use crate::infra::config::SignConfig;
use crate::infra::error::CadesResult;

/// Resolve the signature policy described by `config`.
///
/// Returns `None` (with a warning when something was configured) if the
/// qualifier is missing or is not an OID, or if a supplied policy hash
/// cannot be used. Without a supplied hash the policy hash is the digest of
/// the policy identifier URI (or of the qualifier when no URI is set).
#[must_use]
pub fn resolve_signature_policy(
    config: &SignConfig,
    digest: DigestAlgorithm,
) -> Option<SignaturePolicy> {
    let Some(qualifier) = config.policy_qualifier.as_deref() else {
        if config.policy_identifier.is_some() {
            log::warn!("A policy identifier was given without a policy qualifier; no policy attribute is added");
        }
        return None;
    };
    let Some(oid) = normalize_policy_qualifier(qualifier) else {
        log::warn!("Policy qualifier '{qualifier}' is not an OID; no policy attribute is added");
        return None;
    };

    let hash_algorithm = match config.policy_identifier_hash_algorithm.as_deref() {
        Some(name) => match DigestAlgorithm::from_hint(name) {
            Ok(alg) => alg,
            Err(e) => {
                log::warn!("Unusable policy hash algorithm '{name}' ({e}); no policy attribute is added");
                return None;
            }
        },
        None => digest,
    };

    let hash = match config.policy_identifier_hash.as_deref() {
        Some(encoded) => match BASE64.decode(encoded.trim()) {
            Ok(hash) if hash.len() == hash_algorithm.digest_size() => hash,
            Ok(hash) => {
                log::warn!(
                    "Policy hash has {} bytes but {hash_algorithm} needs {}; no policy attribute is added",
                    hash.len(),
                    hash_algorithm.digest_size()
                );
                return None;
            }
            Err(e) => {
                log::warn!("Policy hash is not valid Base64 ({e}); no policy attribute is added");
                return None;
            }
        },
        None => {
            let source = config.policy_identifier.as_deref().unwrap_or(qualifier);
            hash_algorithm.digest(source.as_bytes())
        }
    };

    Some(SignaturePolicy::new(
        oid,
        config.policy_identifier.clone(),
        hash_algorithm,
        hash,
    ))
}

/// Builds and signs one SignerInfo for a credential.
pub struct SignerInfoBuilder<'a> {
    credential: &'a SigningCredential,
    digest: DigestAlgorithm,
    signing_certificate_v2: bool,
    signing_time: Option<SystemTime>,
    policy: Option<SignaturePolicy>,
}

impl<'a> SignerInfoBuilder<'a> {
    #[must_use]
    pub fn new(credential: &'a SigningCredential, digest: DigestAlgorithm) -> Self {
        Self {
            credential,
            digest,
            signing_certificate_v2: false,
            signing_time: None,
            policy: None,
        }
    }

    /// Apply ESS version, signing time and policy from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &SignConfig) -> Self {
        self.signing_certificate_v2 = config.signing_certificate_v2;
        self.signing_time = config.effective_signing_time();
        self.policy = resolve_signature_policy(config, self.digest);
        self
    }

    #[must_use]
    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    /// Signed attributes for a signer. `content_type` is `None` for
    /// counter-signatures.
    pub fn signed_attributes(
        &self,
        content_type: Option<ObjectIdentifier>,
        message_digest: &[u8],
    ) -> CadesResult<SignedAttributeSet> {
        let leaf = parse_certificate(self.credential.leaf())?;
        let mut attrs = SignedAttributeSet::new();
        if let Some(content_type) = content_type {
            attrs.insert_content_type(content_type)?;
        }
        attrs.insert_message_digest(message_digest)?;
        if let Some(at) = self.signing_time {
            attrs.insert_signing_time(at)?;
        }
        if self.signing_certificate_v2 {
            attrs.insert_signing_certificate_v2(&leaf, self.digest)?;
        } else {
            attrs.insert_signing_certificate(&leaf)?;
        }
        if let Some(policy) = &self.policy {
            attrs.insert_signature_policy(policy)?;
        }
        log::debug!("Signed attributes: {attrs:?}");
        Ok(attrs)
    }

    /// Sign `attributes` and assemble the SignerInfo.
    pub fn sign(&self, attributes: &SignedAttributeSet) -> CadesResult<SignerInfo> {
        let leaf = parse_certificate(self.credential.leaf())?;
        let key = self.credential.private_key();
        let algorithm = SignatureAlgorithm::for_key(key, self.digest)?;

        let signed_attrs = attributes.to_set_of()?;
        let signature = algorithm.sign(key, &signed_attrs.to_der()?)?;

        Ok(SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: leaf.tbs_certificate.issuer.clone(),
                serial_number: leaf.tbs_certificate.serial_number.clone(),
            }),
            digest_alg: self.digest.algorithm_identifier(),
            signed_attrs: Some(signed_attrs),
            signature_algorithm: algorithm.algorithm_identifier()?,
            signature: OctetString::new(signature.as_slice())?,
            unsigned_attrs: None,
        })
    }

    pub fn build(
        &self,
        content_type: Option<ObjectIdentifier>,
        message_digest: &[u8],
    ) -> CadesResult<SignerInfo> {
        let attributes = self.signed_attributes(content_type, message_digest)?;
        self.sign(&attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_requires_qualifier() {
        let config = SignConfig {
            policy_identifier: Some("http://example.com/policy.pdf".to_string()),
            ..SignConfig::default()
        };
        assert!(resolve_signature_policy(&config, DigestAlgorithm::Sha256).is_none());
    }

    #[test]
    fn malformed_qualifier_drops_policy() {
        let config = SignConfig::default().with_policy(None, "urn:oid:not.an.oid");
        assert!(resolve_signature_policy(&config, DigestAlgorithm::Sha256).is_none());
    }

    #[test]
    fn urn_and_bare_qualifiers_resolve_identically() {
        let a = SignConfig::default().with_policy(Some("http://example.com/p"), "urn:oid:1.2.3");
        let b = SignConfig::default().with_policy(Some("http://example.com/p"), "1.2.3");
        let pa = resolve_signature_policy(&a, DigestAlgorithm::Sha1).unwrap();
        let pb = resolve_signature_policy(&b, DigestAlgorithm::Sha1).unwrap();
        assert!(pa == pb);
        assert_eq!(pa.oid(), ObjectIdentifier::new_unwrap("1.2.3"));
        assert_eq!(pa.uri(), Some("http://example.com/p"));
    }

    #[test]
    fn supplied_hash_must_match_algorithm() {
        let good = SignConfig::default()
            .with_policy(None, "1.2.3")
            .with_policy_hash(&BASE64.encode([9u8; 20]), "SHA1");
        assert!(resolve_signature_policy(&good, DigestAlgorithm::Sha256).is_some());

        let bad = SignConfig::default()
            .with_policy(None, "1.2.3")
            .with_policy_hash(&BASE64.encode([9u8; 20]), "SHA-256");
        assert!(resolve_signature_policy(&bad, DigestAlgorithm::Sha256).is_none());
    }
}
