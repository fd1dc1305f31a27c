//! CMS container domain types.
//!
//! Standard CMS structures come from the `cms` crate. This module adds the
//! PKCS#7 v1.5 `SignedAndEnvelopedData` structure (absent from RFC 5652) and
//! [`SignatureContainer`], the common view over the two container shapes that
//! can carry signers.

pub mod attributes;
pub mod tree;

use cms::cert::CertificateChoices;
use cms::content_info::{CmsVersion, ContentInfo};
use cms::enveloped_data::{EncryptedContentInfo, RecipientInfos};
use cms::revocation::RevocationInfoChoices;
use cms::signed_data::{
    CertificateSet, DigestAlgorithmIdentifiers, SignedData, SignerIdentifier, SignerInfo,
    SignerInfos,
};
use der::asn1::{ObjectIdentifier, OctetString, SetOfVec};
use der::{Any, Decode, Encode, EncodeValue, Sequence, Tagged};
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::Certificate;

use crate::domain::constants;
use crate::domain::types::ContentTypeTag;
use crate::infra::error::{CadesError, CadesResult};

pub use attributes::{
    find_attribute_value, normalize_policy_qualifier, single_valued, SignaturePolicy,
    SignedAttributeSet,
};
pub use tree::{SignerNode, SignerTree};

/// PKCS#7 v1.5 `SignedAndEnvelopedData`.
///
/// ```text
/// SignedAndEnvelopedData ::= SEQUENCE {
///     version Version,
///     recipientInfos RecipientInfos,
///     digestAlgorithms DigestAlgorithmIdentifiers,
///     encryptedContentInfo EncryptedContentInfo,
///     certificates [0] IMPLICIT ExtendedCertificatesAndCertificates OPTIONAL,
///     crls [1] IMPLICIT CertificateRevocationLists OPTIONAL,
///     signerInfos SignerInfos }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SignedAndEnvelopedData {
    pub version: CmsVersion,
    pub recip_infos: RecipientInfos,
    pub digest_algorithms: DigestAlgorithmIdentifiers,
    pub encrypted_content: EncryptedContentInfo,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub certificates: Option<CertificateSet>,
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub crls: Option<RevocationInfoChoices>,
    pub signer_infos: SignerInfos,
}

/// A container that carries signers: plain SignedData or PKCS#7
/// SignedAndEnvelopedData.
#[derive(Clone, Debug)]
pub enum SignatureContainer {
    Signed(SignedData),
    SignedAndEnveloped(SignedAndEnvelopedData),
}

impl SignatureContainer {
    /// Decode a DER ContentInfo. Only the two signer carrying shapes are
    /// accepted.
    pub fn from_der(blob: &[u8]) -> CadesResult<Self> {
        let content_info = decode_content_info(blob)?;
        match ContentTypeTag::from_oid(&content_info.content_type) {
            ContentTypeTag::SignedData => Ok(SignatureContainer::Signed(decode_any(
                &content_info.content,
            )?)),
            ContentTypeTag::SignedAndEnvelopedData => Ok(SignatureContainer::SignedAndEnveloped(
                decode_any(&content_info.content)?,
            )),
            other => Err(CadesError::UnsupportedFormat(format!(
                "{other} does not carry signers"
            ))),
        }
    }

    #[must_use]
    pub fn tag(&self) -> ContentTypeTag {
        match self {
            SignatureContainer::Signed(_) => ContentTypeTag::SignedData,
            SignatureContainer::SignedAndEnveloped(_) => ContentTypeTag::SignedAndEnvelopedData,
        }
    }

    /// Content type the signers attest (eContentType / encrypted content type).
    #[must_use]
    pub fn inner_content_type(&self) -> ObjectIdentifier {
        match self {
            SignatureContainer::Signed(sd) => sd.encap_content_info.econtent_type,
            SignatureContainer::SignedAndEnveloped(sed) => sed.encrypted_content.content_type,
        }
    }

    #[must_use]
    pub fn signer_infos(&self) -> &SignerInfos {
        match self {
            SignatureContainer::Signed(sd) => &sd.signer_infos,
            SignatureContainer::SignedAndEnveloped(sed) => &sed.signer_infos,
        }
    }

    pub fn set_signer_infos(&mut self, signer_infos: SignerInfos) {
        match self {
            SignatureContainer::Signed(sd) => sd.signer_infos = signer_infos,
            SignatureContainer::SignedAndEnveloped(sed) => sed.signer_infos = signer_infos,
        }
    }

    /// Append a SignerInfo as a new top-level signer.
    pub fn push_signer_info(&mut self, signer_info: SignerInfo) -> CadesResult<()> {
        let mut infos: Vec<SignerInfo> = self.signer_infos().0.iter().cloned().collect();
        infos.push(signer_info);
        self.set_signer_infos(SignerInfos(SetOfVec::try_from(infos)?));
        Ok(())
    }

    fn digest_algorithms_mut(&mut self) -> &mut DigestAlgorithmIdentifiers {
        match self {
            SignatureContainer::Signed(sd) => &mut sd.digest_algorithms,
            SignatureContainer::SignedAndEnveloped(sed) => &mut sed.digest_algorithms,
        }
    }

    fn certificates_mut(&mut self) -> &mut Option<CertificateSet> {
        match self {
            SignatureContainer::Signed(sd) => &mut sd.certificates,
            SignatureContainer::SignedAndEnveloped(sed) => &mut sed.certificates,
        }
    }

    /// Add a digest algorithm unless one with the same OID is present.
    pub fn add_digest_algorithm(&mut self, alg: AlgorithmIdentifierOwned) -> CadesResult<()> {
        let algorithms = self.digest_algorithms_mut();
        if algorithms.iter().any(|existing| existing.oid == alg.oid) {
            return Ok(());
        }
        let mut merged: Vec<AlgorithmIdentifierOwned> = algorithms.iter().cloned().collect();
        merged.push(alg);
        *algorithms = SetOfVec::try_from(merged)?;
        Ok(())
    }

    /// Add certificates that are not already present (compared by DER).
    pub fn add_certificates(&mut self, certs: &[Certificate]) -> CadesResult<()> {
        let slot = self.certificates_mut();
        let mut merged: Vec<CertificateChoices> = slot
            .as_ref()
            .map(|set| set.0.iter().cloned().collect())
            .unwrap_or_default();
        let mut known = merged
            .iter()
            .map(Encode::to_der)
            .collect::<Result<Vec<_>, _>>()?;
        for cert in certs {
            let choice = CertificateChoices::Certificate(cert.clone());
            let der = choice.to_der()?;
            if !known.contains(&der) {
                known.push(der);
                merged.push(choice);
            }
        }
        *slot = Some(CertificateSet(SetOfVec::try_from(merged)?));
        Ok(())
    }

    /// Plain X.509 certificates carried by the container.
    #[must_use]
    pub fn certificates(&self) -> Vec<Certificate> {
        let set = match self {
            SignatureContainer::Signed(sd) => sd.certificates.as_ref(),
            SignatureContainer::SignedAndEnveloped(sed) => sed.certificates.as_ref(),
        };
        set.map(|set| {
            set.0
                .iter()
                .filter_map(|choice| match choice {
                    CertificateChoices::Certificate(cert) => Some(cert.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
    }

    /// Embedded plaintext content, if any. SignedAndEnvelopedData never
    /// exposes plaintext here.
    pub fn embedded_content(&self) -> CadesResult<Option<Vec<u8>>> {
        match self {
            SignatureContainer::Signed(sd) => match &sd.encap_content_info.econtent {
                Some(econtent) => {
                    let octets: OctetString = decode_any(econtent)?;
                    Ok(Some(octets.into_bytes()))
                }
                None => Ok(None),
            },
            SignatureContainer::SignedAndEnveloped(_) => Ok(None),
        }
    }

    /// Embed `content` as eContent. Only meaningful for plain SignedData.
    pub fn embed_content(&mut self, content: &[u8]) -> CadesResult<()> {
        match self {
            SignatureContainer::Signed(sd) => {
                let octets = OctetString::new(content)?;
                sd.encap_content_info.econtent = Some(Any::encode_from(&octets)?);
                Ok(())
            }
            SignatureContainer::SignedAndEnveloped(_) => Err(CadesError::UnsupportedFormat(
                "SignedAndEnvelopedData content is encrypted and cannot be replaced".to_string(),
            )),
        }
    }

    /// Wrap in a ContentInfo and encode.
    pub fn to_der(&self) -> CadesResult<Vec<u8>> {
        match self {
            SignatureContainer::Signed(sd) => encode_content_info(constants::ID_SIGNED_DATA, sd),
            SignatureContainer::SignedAndEnveloped(sed) => {
                encode_content_info(constants::ID_SIGNED_AND_ENVELOPED_DATA, sed)
            }
        }
    }
}

/// Parse an outer ContentInfo.
pub fn decode_content_info(blob: &[u8]) -> CadesResult<ContentInfo> {
    ContentInfo::from_der(blob).map_err(|e| {
        CadesError::UnsupportedFormat(format!("Input is not a DER encoded ContentInfo: {e}"))
    })
}

/// Re-decode an `ANY` as a concrete type.
pub fn decode_any<T>(any: &Any) -> CadesResult<T>
where
    T: for<'a> Decode<'a>,
{
    Ok(T::from_der(&any.to_der()?)?)
}

/// Wrap `content` in a ContentInfo of `content_type` and encode it.
pub fn encode_content_info<T: Tagged + EncodeValue>(
    content_type: ObjectIdentifier,
    content: &T,
) -> CadesResult<Vec<u8>> {
    let content_info = ContentInfo {
        content_type,
        content: Any::encode_from(content)?,
    };
    Ok(content_info.to_der()?)
}

/// Counter-signatures stored in a SignerInfo's unsigned attributes, in
/// encoding order.
pub fn countersignatures(signer_info: &SignerInfo) -> CadesResult<Vec<SignerInfo>> {
    let Some(unsigned) = &signer_info.unsigned_attrs else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for attr in unsigned.iter() {
        if attr.oid == constants::ID_COUNTERSIGNATURE {
            for value in attr.values.iter() {
                out.push(decode_any(value)?);
            }
        }
    }
    Ok(out)
}

/// Certificate named by a SignerInfo's issuer and serial number.
#[must_use]
pub fn find_signer_certificate<'a>(
    signer_info: &SignerInfo,
    certs: &'a [Certificate],
) -> Option<&'a Certificate> {
    match &signer_info.sid {
        SignerIdentifier::IssuerAndSerialNumber(ias) => certs.iter().find(|cert| {
            cert.tbs_certificate.issuer == ias.issuer
                && cert.tbs_certificate.serial_number == ias.serial_number
        }),
        SignerIdentifier::SubjectKeyIdentifier(_) => None,
    }
}
