//! Signed attribute domain types.
//!
//! ASN.1 structures for the ESS signing-certificate attributes (RFC 2634 and
//! RFC 5035) and the CAdES signature-policy-identifier (ETSI EN 319 122), plus
//! [`SignedAttributeSet`], an OID keyed collection that encodes to a DER
//! `SET OF Attribute`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use der::asn1::{Ia5String, ObjectIdentifier, OctetString, SetOfVec, UtcTime};
use der::{Any, Encode, EncodeValue, Sequence, Tagged};
use x509_cert::attr::Attribute;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::Certificate;

use crate::domain::constants;
use crate::domain::crypto::DigestAlgorithm;
use crate::infra::error::CadesResult;

/// `IssuerSerial ::= SEQUENCE { issuer GeneralNames, serialNumber CertificateSerialNumber }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct IssuerSerial {
    pub issuer: Vec<GeneralName>,
    pub serial_number: SerialNumber,
}

impl IssuerSerial {
    #[must_use]
    pub fn for_certificate(cert: &Certificate) -> Self {
        Self {
            issuer: vec![GeneralName::DirectoryName(cert.tbs_certificate.issuer.clone())],
            serial_number: cert.tbs_certificate.serial_number.clone(),
        }
    }
}

/// `ESSCertID ::= SEQUENCE { certHash Hash, issuerSerial IssuerSerial OPTIONAL }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EssCertId {
    pub cert_hash: OctetString,
    pub issuer_serial: Option<IssuerSerial>,
}

/// `SigningCertificate ::= SEQUENCE { certs SEQUENCE OF ESSCertID, policies ... OPTIONAL }`
///
/// `policies` is never emitted.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SigningCertificate {
    pub certs: Vec<EssCertId>,
}

/// `ESSCertIDv2 ::= SEQUENCE { hashAlgorithm DEFAULT sha256, certHash, issuerSerial OPTIONAL }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EssCertIdV2 {
    pub hash_algorithm: Option<AlgorithmIdentifierOwned>,
    pub cert_hash: OctetString,
    pub issuer_serial: Option<IssuerSerial>,
}

/// `SigningCertificateV2 ::= SEQUENCE { certs SEQUENCE OF ESSCertIDv2, policies ... OPTIONAL }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SigningCertificateV2 {
    pub certs: Vec<EssCertIdV2>,
}

/// `OtherHashAlgAndValue ::= SEQUENCE { hashAlgorithm, hashValue OCTET STRING }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct OtherHashAlgAndValue {
    pub hash_algorithm: AlgorithmIdentifierOwned,
    pub hash_value: OctetString,
}

/// `SigPolicyQualifierInfo ::= SEQUENCE { sigPolicyQualifierId, sigQualifier ANY }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SigPolicyQualifierInfo {
    pub sig_policy_qualifier_id: ObjectIdentifier,
    pub sig_qualifier: Any,
}

/// `SignaturePolicyId ::= SEQUENCE { sigPolicyId, sigPolicyHash, sigPolicyQualifiers OPTIONAL }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SignaturePolicyId {
    pub sig_policy_id: ObjectIdentifier,
    pub sig_policy_hash: OtherHashAlgAndValue,
    pub sig_policy_qualifiers: Option<Vec<SigPolicyQualifierInfo>>,
}

/// Resolved signature policy ready to be encoded as an attribute.
#[derive(Clone, PartialEq, Eq)]
pub struct SignaturePolicy {
    oid: ObjectIdentifier,
    uri: Option<String>,
    hash_algorithm: DigestAlgorithm,
    hash: Vec<u8>,
}

impl SignaturePolicy {
    #[must_use]
    pub fn new(
        oid: ObjectIdentifier,
        uri: Option<String>,
        hash_algorithm: DigestAlgorithm,
        hash: Vec<u8>,
    ) -> Self {
        Self {
            oid,
            uri,
            hash_algorithm,
            hash,
        }
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    fn to_asn1(&self) -> CadesResult<SignaturePolicyId> {
        let qualifiers = match &self.uri {
            Some(uri) => Some(vec![SigPolicyQualifierInfo {
                sig_policy_qualifier_id: constants::ID_SPQ_ETS_URI,
                sig_qualifier: Any::encode_from(&Ia5String::new(uri)?)?,
            }]),
            None => None,
        };
        Ok(SignaturePolicyId {
            sig_policy_id: self.oid,
            sig_policy_hash: OtherHashAlgAndValue {
                hash_algorithm: self.hash_algorithm.bare_algorithm_identifier(),
                hash_value: OctetString::new(self.hash.clone())?,
            },
            sig_policy_qualifiers: qualifiers,
        })
    }
}

impl fmt::Debug for SignaturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignaturePolicy(oid={}, uri={:?}, {}={})",
            self.oid,
            self.uri,
            self.hash_algorithm,
            hex::encode(&self.hash)
        )
    }
}

/// Normalise a policy qualifier (`urn:oid:1.2.3`, `URN:OID:1.2.3` or `1.2.3`)
/// to a bare OID. Returns `None` for anything that is not an OID.
#[must_use]
pub fn normalize_policy_qualifier(qualifier: &str) -> Option<ObjectIdentifier> {
    let trimmed = qualifier.trim();
    let bare = match trimmed.get(..8) {
        Some(prefix) if prefix.eq_ignore_ascii_case("urn:oid:") => &trimmed[8..],
        _ => trimmed,
    };
    ObjectIdentifier::new(bare.trim()).ok()
}

/// OID keyed signed (or unprotected) attribute collection.
///
/// Each OID appears at most once; inserting an existing OID replaces it.
#[derive(Clone, Default)]
pub struct SignedAttributeSet {
    attrs: BTreeMap<ObjectIdentifier, Attribute>,
}

impl SignedAttributeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: Attribute) {
        self.attrs.insert(attribute.oid, attribute);
    }

    #[must_use]
    pub fn contains(&self, oid: &ObjectIdentifier) -> bool {
        self.attrs.contains_key(oid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn insert_content_type(&mut self, content_type: ObjectIdentifier) -> CadesResult<()> {
        self.insert(single_valued(constants::ID_CONTENT_TYPE, &content_type)?);
        Ok(())
    }

    pub fn insert_message_digest(&mut self, digest: &[u8]) -> CadesResult<()> {
        let value = OctetString::new(digest)?;
        self.insert(single_valued(constants::ID_MESSAGE_DIGEST, &value)?);
        Ok(())
    }

    pub fn insert_signing_time(&mut self, at: SystemTime) -> CadesResult<()> {
        let value = UtcTime::from_system_time(at)?;
        self.insert(single_valued(constants::ID_SIGNING_TIME, &value)?);
        Ok(())
    }

    /// ESS signing-certificate v1: SHA-1 hash of the certificate DER.
    pub fn insert_signing_certificate(&mut self, cert: &Certificate) -> CadesResult<()> {
        let cert_der = cert.to_der()?;
        let value = SigningCertificate {
            certs: vec![EssCertId {
                cert_hash: OctetString::new(DigestAlgorithm::Sha1.digest(&cert_der))?,
                issuer_serial: Some(IssuerSerial::for_certificate(cert)),
            }],
        };
        self.insert(single_valued(constants::ID_AA_SIGNING_CERTIFICATE, &value)?);
        Ok(())
    }

    /// ESS signing-certificate v2 hashed with `digest`; SHA-256 is the
    /// implicit default and leaves `hashAlgorithm` out.
    pub fn insert_signing_certificate_v2(
        &mut self,
        cert: &Certificate,
        digest: DigestAlgorithm,
    ) -> CadesResult<()> {
        let cert_der = cert.to_der()?;
        let hash_algorithm = match digest {
            DigestAlgorithm::Sha256 => None,
            other => Some(other.bare_algorithm_identifier()),
        };
        let value = SigningCertificateV2 {
            certs: vec![EssCertIdV2 {
                hash_algorithm,
                cert_hash: OctetString::new(digest.digest(&cert_der))?,
                issuer_serial: Some(IssuerSerial::for_certificate(cert)),
            }],
        };
        self.insert(single_valued(constants::ID_AA_SIGNING_CERTIFICATE_V2, &value)?);
        Ok(())
    }

    pub fn insert_signature_policy(&mut self, policy: &SignaturePolicy) -> CadesResult<()> {
        let value = policy.to_asn1()?;
        self.insert(single_valued(constants::ID_AA_ETS_SIG_POLICY_ID, &value)?);
        Ok(())
    }

    /// Encode as a DER `SET OF Attribute` (sorted by encoding).
    pub fn to_set_of(&self) -> CadesResult<SetOfVec<Attribute>> {
        let attrs: Vec<Attribute> = self.attrs.values().cloned().collect();
        Ok(SetOfVec::try_from(attrs)?)
    }
}

impl fmt::Debug for SignedAttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.attrs.keys().map(ToString::to_string))
            .finish()
    }
}

/// Attribute with exactly one value.
pub fn single_valued<T>(oid: ObjectIdentifier, value: &T) -> CadesResult<Attribute>
where
    T: Tagged + EncodeValue,
{
    let values = SetOfVec::try_from(vec![Any::encode_from(value)?])?;
    Ok(Attribute { oid, values })
}

/// First value of attribute `oid` in `attrs`, if any.
#[must_use]
pub fn find_attribute_value<'a>(
    attrs: &'a SetOfVec<Attribute>,
    oid: &ObjectIdentifier,
) -> Option<&'a Any> {
    attrs
        .iter()
        .find(|attr| attr.oid == *oid)
        .and_then(|attr| attr.values.iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Decode;

    #[test]
    fn qualifier_urn_and_bare_oid_normalise_identically() {
        let a = normalize_policy_qualifier("urn:oid:2.16.724.1.3.1.1.2.1.9").unwrap();
        let b = normalize_policy_qualifier("2.16.724.1.3.1.1.2.1.9").unwrap();
        let c = normalize_policy_qualifier("  URN:OID:2.16.724.1.3.1.1.2.1.9 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(normalize_policy_qualifier("not-an-oid").is_none());
        assert!(normalize_policy_qualifier("").is_none());
    }

    #[test]
    fn inserting_same_oid_replaces_value() {
        let mut set = SignedAttributeSet::new();
        set.insert_message_digest(&[1u8; 32]).unwrap();
        set.insert_message_digest(&[2u8; 32]).unwrap();
        set.insert_content_type(constants::ID_DATA).unwrap();
        assert_eq!(set.len(), 2);

        let encoded = set.to_set_of().unwrap();
        let digest = find_attribute_value(&encoded, &constants::ID_MESSAGE_DIGEST).unwrap();
        let digest = OctetString::from_der(&digest.to_der().unwrap()).unwrap();
        assert_eq!(digest.as_bytes(), &[2u8; 32]);
    }

    #[test]
    fn policy_without_uri_has_no_qualifiers() {
        let policy = SignaturePolicy::new(
            ObjectIdentifier::new_unwrap("1.2.3.4"),
            None,
            DigestAlgorithm::Sha1,
            vec![0u8; 20],
        );
        let asn1 = policy.to_asn1().unwrap();
        assert!(asn1.sig_policy_qualifiers.is_none());

        let der = asn1.to_der().unwrap();
        let decoded = SignaturePolicyId::from_der(&der).unwrap();
        assert_eq!(decoded.sig_policy_id, ObjectIdentifier::new_unwrap("1.2.3.4"));
    }
}
