//! Co-signature service: adds an independent top-level SignerInfo to an
//! existing SignedData or SignedAndEnvelopedData container.

use der::asn1::OctetString;

use crate::domain::cms::{decode_any, find_attribute_value, SignatureContainer};
use crate::domain::constants;
use crate::domain::crypto::{parse_certificate, DigestAlgorithm, DigestBytes, SigningCredential};
use crate::domain::parameters::ContentSignerParameters;
use crate::domain::types::ContentTypeTag;
use crate::infra::config::SignConfig;
use crate::infra::error::{CadesError, CadesResult};
use crate::services::classifier::ContentTypeClassifier;
use crate::services::signed_data::ContentDigest;
use crate::services::signer_info::SignerInfoBuilder;

/// Decode `blob` as a signer-carrying container, routed by its content type.
pub(crate) fn open_signature_container(blob: &[u8]) -> CadesResult<SignatureContainer> {
    match ContentTypeClassifier::new().classify(blob) {
        ContentTypeTag::SignedData | ContentTypeTag::SignedAndEnvelopedData => {
            SignatureContainer::from_der(blob)
        }
        other => Err(CadesError::UnsupportedFormat(format!(
            "Cannot add signers to {other} content"
        ))),
    }
}

pub struct CoSigner;

impl Default for CoSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl CoSigner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Co-sign content the caller supplies alongside the container.
    pub fn cosign(
        &self,
        params: &ContentSignerParameters,
        sign: &[u8],
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        if params.content().is_empty() {
            return Err(CadesError::InvalidInput(
                "The data to co-sign cannot be empty".to_string(),
            ));
        }
        let mut container = open_signature_container(sign)?;
        let resolved = ContentDigest::resolve(params, config)?;

        let embedded = container.embedded_content()?;
        match (&embedded, resolved.precalculated) {
            (Some(existing), false) if existing.as_slice() != params.content() => {
                return Err(CadesError::InvalidInput(
                    "The supplied data differs from the data embedded in the signature"
                        .to_string(),
                ));
            }
            (Some(existing), true)
                if resolved.algorithm().digest(existing) != resolved.digest.as_slice() =>
            {
                return Err(CadesError::InvalidInput(
                    "The supplied digest does not match the data embedded in the signature"
                        .to_string(),
                ));
            }
            _ => {}
        }

        let embed = embedded.is_none()
            && !resolved.precalculated
            && !config.is_explicit()
            && container.tag() == ContentTypeTag::SignedData;

        log::info!(
            "Co-signing {} with {} (content {})",
            container.tag(),
            resolved.algorithm(),
            if embed { "embedded now" } else { "left as is" }
        );

        self.append_signer(
            &mut container,
            &resolved.digest,
            params
                .signer_certificate_chain()
                .iter()
                .map(parse_certificate)
                .collect::<CadesResult<Vec<_>>>()?,
            credential,
            config,
        )?;
        if embed {
            container.embed_content(params.content())?;
        }
        container.to_der()
    }

    /// Co-sign using only the container: the digest comes from the embedded
    /// content or from an existing signer using the same digest algorithm.
    pub fn cosign_existing(
        &self,
        sign: &[u8],
        digest: DigestAlgorithm,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        let mut container = open_signature_container(sign)?;
        let message_digest = match container.embedded_content()? {
            Some(content) => DigestBytes::compute(digest, &content),
            None => existing_message_digest(&container, digest)?.ok_or_else(|| {
                CadesError::UnsupportedFormat(format!(
                    "The signature holds no data and no {digest} signer to take the digest from"
                ))
            })?,
        };

        let config = SignConfig {
            precalculated_hash_algorithm: None,
            ..config.clone()
        };
        log::info!("Co-signing {} from the container alone", container.tag());
        self.append_signer(
            &mut container,
            &message_digest,
            credential.parsed_chain()?,
            credential,
            &config,
        )?;
        container.to_der()
    }

    fn append_signer(
        &self,
        container: &mut SignatureContainer,
        digest: &DigestBytes,
        chain: Vec<x509_cert::Certificate>,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<()> {
        let signer_info = SignerInfoBuilder::new(credential, digest.algorithm())
            .with_config(config)
            .build(Some(container.inner_content_type()), digest.as_slice())?;
        container.push_signer_info(signer_info)?;
        container.add_digest_algorithm(digest.algorithm().algorithm_identifier())?;
        container.add_certificates(&chain)?;
        Ok(())
    }
}

/// messageDigest of the first top-level signer using `digest`.
fn existing_message_digest(
    container: &SignatureContainer,
    digest: DigestAlgorithm,
) -> CadesResult<Option<DigestBytes>> {
    for signer_info in container.signer_infos().0.iter() {
        if signer_info.digest_alg.oid != digest.oid() {
            continue;
        }
        let Some(attrs) = &signer_info.signed_attrs else {
            continue;
        };
        if let Some(value) = find_attribute_value(attrs, &constants::ID_MESSAGE_DIGEST) {
            let octets: OctetString = decode_any(value)?;
            return Ok(Some(DigestBytes::new(digest, octets.into_bytes())?));
        }
    }
    Ok(None)
}
