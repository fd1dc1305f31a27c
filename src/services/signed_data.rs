//! SignedData builder service.
//!
//! Produces a DER `ContentInfo { signedData }` carrying one SignerInfo, the
//! signer's full certificate chain and, in implicit mode, the content itself.

use cms::content_info::CmsVersion;
use cms::signed_data::{EncapsulatedContentInfo, SignedData, SignerInfos};
use der::asn1::{ObjectIdentifier, SetOfVec};

use crate::domain::cms::SignatureContainer;
use crate::domain::constants;
use crate::domain::crypto::{parse_certificate, DigestAlgorithm, DigestBytes, SigningCredential};
use crate::domain::parameters::ContentSignerParameters;
use crate::infra::config::SignConfig;
use crate::infra::error::{CadesError, CadesResult};
use crate::services::signer_info::SignerInfoBuilder;

/// Digest to sign over, resolved from the parameters and the options.
#[derive(Debug)]
pub(crate) struct ContentDigest {
    pub digest: DigestBytes,
    /// The caller passed a digest instead of content.
    pub precalculated: bool,
}

impl ContentDigest {
    /// With `precalculatedHashAlgorithm` set the content *is* the digest and
    /// must have that algorithm's length; otherwise the content is hashed.
    pub fn resolve(params: &ContentSignerParameters, config: &SignConfig) -> CadesResult<Self> {
        match config.precalculated_digest()? {
            Some(algorithm) => {
                let digest = DigestBytes::new(algorithm, params.content().to_vec())?;
                log::debug!("Using pre-computed digest {digest:?}");
                Ok(Self {
                    digest,
                    precalculated: true,
                })
            }
            None => Ok(Self {
                digest: DigestBytes::compute(params.digest_algorithm(), params.content()),
                precalculated: false,
            }),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.digest.algorithm()
    }
}

/// Builds new SignedData containers.
pub struct SignedDataBuilder {
    content_type: ObjectIdentifier,
}

impl Default for SignedDataBuilder {
    fn default() -> Self {
        Self::new(constants::ID_DATA)
    }
}

impl SignedDataBuilder {
    /// `content_type` is the eContentType attested by the signer.
    #[must_use]
    pub fn new(content_type: ObjectIdentifier) -> Self {
        Self { content_type }
    }

    pub fn build(
        &self,
        params: &ContentSignerParameters,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        let container = self.build_container(params, credential, config)?;
        container.to_der()
    }

    pub(crate) fn build_container(
        &self,
        params: &ContentSignerParameters,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<SignatureContainer> {
        if params.content().is_empty() {
            return Err(CadesError::InvalidInput(
                "The data to sign cannot be empty".to_string(),
            ));
        }

        let resolved = ContentDigest::resolve(params, config)?;
        let omit_content = resolved.precalculated || config.is_explicit();
        let digest = resolved.algorithm();
        log::info!(
            "Building SignedData ({}, {digest}, content type {})",
            if omit_content { "explicit" } else { "implicit" },
            self.content_type
        );

        let signer_info = SignerInfoBuilder::new(credential, digest)
            .with_config(config)
            .build(Some(self.content_type), resolved.digest.as_slice())?;

        let version = if self.content_type == constants::ID_DATA {
            CmsVersion::V1
        } else {
            CmsVersion::V3
        };

        let mut container = SignatureContainer::Signed(SignedData {
            version,
            digest_algorithms: SetOfVec::try_from(vec![digest.algorithm_identifier()])?,
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: self.content_type,
                econtent: None,
            },
            certificates: None,
            crls: None,
            signer_infos: SignerInfos(SetOfVec::try_from(vec![signer_info])?),
        });

        let chain = params
            .signer_certificate_chain()
            .iter()
            .map(parse_certificate)
            .collect::<CadesResult<Vec<_>>>()?;
        container.add_certificates(&chain)?;

        if !omit_content {
            container.embed_content(params.content())?;
        }
        Ok(container)
    }
}
