//! Type-safe wrappers for content type tags and counter-signature selectors.

use std::fmt;
use std::str::FromStr;

use der::asn1::ObjectIdentifier;

use crate::domain::constants;
use crate::infra::error::{CadesError, CadesResult};

/// Classification of a blob by its outer ContentInfo object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentTypeTag {
    Data,
    SignedData,
    EnvelopedData,
    SignedAndEnvelopedData,
    DigestedData,
    EncryptedData,
    Unrecognized,
}

impl ContentTypeTag {
    /// Map a content-type OID; anything outside PKCS#7 1..6 is `Unrecognized`.
    #[must_use]
    pub fn from_oid(oid: &ObjectIdentifier) -> Self {
        match *oid {
            constants::ID_DATA => ContentTypeTag::Data,
            constants::ID_SIGNED_DATA => ContentTypeTag::SignedData,
            constants::ID_ENVELOPED_DATA => ContentTypeTag::EnvelopedData,
            constants::ID_SIGNED_AND_ENVELOPED_DATA => ContentTypeTag::SignedAndEnvelopedData,
            constants::ID_DIGESTED_DATA => ContentTypeTag::DigestedData,
            constants::ID_ENCRYPTED_DATA => ContentTypeTag::EncryptedData,
            _ => ContentTypeTag::Unrecognized,
        }
    }

    #[must_use]
    pub fn oid(&self) -> Option<ObjectIdentifier> {
        match self {
            ContentTypeTag::Data => Some(constants::ID_DATA),
            ContentTypeTag::SignedData => Some(constants::ID_SIGNED_DATA),
            ContentTypeTag::EnvelopedData => Some(constants::ID_ENVELOPED_DATA),
            ContentTypeTag::SignedAndEnvelopedData => Some(constants::ID_SIGNED_AND_ENVELOPED_DATA),
            ContentTypeTag::DigestedData => Some(constants::ID_DIGESTED_DATA),
            ContentTypeTag::EncryptedData => Some(constants::ID_ENCRYPTED_DATA),
            ContentTypeTag::Unrecognized => None,
        }
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, ContentTypeTag::Unrecognized)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentTypeTag::Data => "Data",
            ContentTypeTag::SignedData => "SignedData",
            ContentTypeTag::EnvelopedData => "EnvelopedData",
            ContentTypeTag::SignedAndEnvelopedData => "SignedAndEnvelopedData",
            ContentTypeTag::DigestedData => "DigestedData",
            ContentTypeTag::EncryptedData => "EncryptedData",
            ContentTypeTag::Unrecognized => "Unrecognized",
        }
    }
}

impl fmt::Display for ContentTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output structure requested from `envelop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Data,
    DigestedData,
    EnvelopedData,
    SignedAndEnvelopedData,
}

impl EnvelopeKind {
    /// Parse a type tag; an empty tag selects `default`.
    pub fn parse_or(tag: &str, default: EnvelopeKind) -> CadesResult<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(default);
        }
        tag.parse()
    }
}

impl FromStr for EnvelopeKind {
    type Err = CadesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Data" => Ok(EnvelopeKind::Data),
            "DigestedData" => Ok(EnvelopeKind::DigestedData),
            "EnvelopedData" => Ok(EnvelopeKind::EnvelopedData),
            "SignedAndEnvelopedData" => Ok(EnvelopeKind::SignedAndEnvelopedData),
            other => Err(CadesError::UnsupportedFormat(format!(
                "Unknown envelope type: {other}"
            ))),
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnvelopeKind::Data => "Data",
            EnvelopeKind::DigestedData => "DigestedData",
            EnvelopeKind::EnvelopedData => "EnvelopedData",
            EnvelopeKind::SignedAndEnvelopedData => "SignedAndEnvelopedData",
        };
        f.write_str(s)
    }
}

/// Which signer nodes receive a counter-signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterSignTarget {
    /// The whole tree (resolves to the first root).
    Tree,
    /// Leaf signers (resolves to the first root, see DESIGN.md).
    Leafs,
    /// Explicit pre-order node ids.
    Nodes(Vec<usize>),
    /// Signers whose common name or full subject matches.
    Signers(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_through_oid() {
        for tag in [
            ContentTypeTag::Data,
            ContentTypeTag::SignedData,
            ContentTypeTag::EnvelopedData,
            ContentTypeTag::SignedAndEnvelopedData,
            ContentTypeTag::DigestedData,
            ContentTypeTag::EncryptedData,
        ] {
            let oid = tag.oid().unwrap();
            assert_eq!(ContentTypeTag::from_oid(&oid), tag);
        }
        assert_eq!(
            ContentTypeTag::from_oid(&constants::ID_SHA1),
            ContentTypeTag::Unrecognized
        );
    }

    #[test]
    fn envelope_kind_defaults_on_empty_tag() {
        assert_eq!(
            EnvelopeKind::parse_or("", EnvelopeKind::EnvelopedData).unwrap(),
            EnvelopeKind::EnvelopedData
        );
        assert_eq!(
            EnvelopeKind::parse_or("DigestedData", EnvelopeKind::EnvelopedData).unwrap(),
            EnvelopeKind::DigestedData
        );
        let err = EnvelopeKind::parse_or("AuthenticatedData", EnvelopeKind::Data).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::UnsupportedFormat);
    }
}
