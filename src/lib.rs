//! CAdES Signer Library
//!
//! Builds, extends and inspects CMS/CAdES signature containers: SignedData
//! with CAdES signed attributes, co-signatures, hierarchical
//! counter-signatures, enveloped, digested and password-encrypted content.
//!
//! The [`CadesSigner`] facade is the entry point; the `services` layer holds
//! the individual builders.

pub mod domain;
pub mod infra;
pub mod services;

#[cfg(test)]
mod lib_tests;

use std::fmt;
use std::io::Read;
use std::time::SystemTime;

use der::asn1::ObjectIdentifier;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;

pub use domain::cms::{SignerNode, SignerTree};
pub use domain::crypto::{CipherAlgorithm, DigestAlgorithm, SigningCredential};
pub use domain::parameters::ContentSignerParameters;
pub use domain::types::{ContentTypeTag, CounterSignTarget, EnvelopeKind};
pub use domain::verification::{SignerVerification, VerificationReport};
pub use infra::config::{CadesConfiguration, ConfigManager, ExportFormat, SignConfig, SignMode};
pub use infra::error::{CadesError, CadesResult, ErrorKind};

use domain::cms::SignatureContainer;
use domain::constants;
use services::{
    extract_content, CoSigner, ContentTypeClassifier, CounterSigner, EncryptedDataGenerator,
    EnvelopeBuilder, SignedDataBuilder, VerificationService,
};

/// Format name and first signing time of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInfo {
    pub format: String,
    pub signing_time: Option<SystemTime>,
}

/// CAdES signer facade.
///
/// The attested inner content type, the cipher and the default envelope kind
/// are fixed at construction, so one instance can be shared across threads.
#[derive(Clone)]
pub struct CadesSigner {
    content_type: ObjectIdentifier,
    cipher: CipherAlgorithm,
    default_envelope: EnvelopeKind,
    signed_name_suffix: String,
    default_algorithm: String,
    default_sign: SignConfig,
}

impl Default for CadesSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CadesSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CadesSigner")
            .field("content_type", &self.content_type.to_string())
            .field("cipher", &self.cipher)
            .field("default_envelope", &self.default_envelope)
            .field("default_algorithm", &self.default_algorithm)
            .finish()
    }
}

impl CadesSigner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            content_type: constants::ID_DATA,
            cipher: CipherAlgorithm::default(),
            default_envelope: EnvelopeKind::EnvelopedData,
            signed_name_suffix: String::new(),
            default_algorithm: constants::DEFAULT_SIGNATURE_ALGORITHM.to_string(),
            default_sign: SignConfig::default(),
        }
    }

    /// Build a signer from a persisted configuration.
    pub fn from_configuration(config: &CadesConfiguration) -> CadesResult<Self> {
        Ok(Self {
            content_type: config.content_type()?,
            cipher: config.cipher,
            default_envelope: config.envelope_kind()?,
            signed_name_suffix: config.signed_name_suffix.clone(),
            default_algorithm: config.default_algorithm.clone(),
            default_sign: config.sign.clone(),
        })
    }

    #[must_use]
    pub fn with_cipher_algorithm(mut self, cipher: CipherAlgorithm) -> Self {
        self.cipher = cipher;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ObjectIdentifier) -> Self {
        self.content_type = content_type;
        self
    }

    #[must_use]
    pub fn with_default_envelope(mut self, kind: EnvelopeKind) -> Self {
        self.default_envelope = kind;
        self
    }

    #[must_use]
    pub fn with_signed_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.signed_name_suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn content_type(&self) -> ObjectIdentifier {
        self.content_type
    }

    #[must_use]
    pub fn cipher_algorithm(&self) -> CipherAlgorithm {
        self.cipher
    }

    /// Algorithm hint to pass when the caller has no preference.
    #[must_use]
    pub fn default_algorithm(&self) -> &str {
        &self.default_algorithm
    }

    /// Signing options loaded with the configuration.
    #[must_use]
    pub fn default_sign_config(&self) -> &SignConfig {
        &self.default_sign
    }

    /// Sign `content` into a new SignedData. `algorithm` is a digest or
    /// signature algorithm hint such as `SHA256withRSA`.
    pub fn sign(
        &self,
        content: &[u8],
        algorithm: &str,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        let params = ContentSignerParameters::new(
            content.to_vec(),
            algorithm,
            credential.chain().to_vec(),
        )?;
        if params.content().is_empty() {
            return Err(CadesError::InvalidInput(
                "The data to sign cannot be empty".to_string(),
            ));
        }
        SignedDataBuilder::new(self.content_type)
            .build(&params, credential, config)
            .map_err(wrap_unless_argument(CadesError::signing))
    }

    /// Add an independent signer over `content` to an existing signature.
    pub fn cosign(
        &self,
        content: &[u8],
        sign: &[u8],
        algorithm: &str,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        self.require_signature(sign)?;
        let params = ContentSignerParameters::new(
            content.to_vec(),
            algorithm,
            credential.chain().to_vec(),
        )?;
        CoSigner::new()
            .cosign(&params, sign, credential, config)
            .map_err(wrap_unless_argument(CadesError::co_signing))
    }

    /// Add an independent signer using only what the signature holds.
    pub fn cosign_existing(
        &self,
        sign: &[u8],
        algorithm: &str,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        self.require_signature(sign)?;
        let digest = DigestAlgorithm::from_hint(algorithm)?;
        CoSigner::new()
            .cosign_existing(sign, digest, credential, config)
            .map_err(wrap_unless_argument(CadesError::co_signing))
    }

    /// Counter-sign the signers selected by `target`.
    pub fn countersign(
        &self,
        sign: &[u8],
        algorithm: &str,
        target: &CounterSignTarget,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        self.require_signature(sign)?;
        let digest = DigestAlgorithm::from_hint(algorithm)?;
        CounterSigner::new()
            .countersign(sign, digest, target, credential, config)
            .map_err(wrap_unless_argument(CadesError::counter_signing))
    }

    /// Wrap the content read from `reader` into the envelope named by
    /// `type_tag`. An empty tag selects the configured default.
    pub fn envelop<R: Read>(
        &self,
        mut reader: R,
        algorithm: &str,
        type_tag: &str,
        credential: Option<&SigningCredential>,
        recipients: &[X509],
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        let digest = DigestAlgorithm::from_hint(algorithm)?;
        let kind = EnvelopeKind::parse_or(type_tag, self.default_envelope)?;
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        drop(reader);

        EnvelopeBuilder::new(self.content_type)
            .with_cipher(self.cipher)
            .build(kind, &content, digest, credential, recipients, config)
            .map_err(wrap_unless_argument(CadesError::enveloping))
    }

    /// Encrypt the content read from `reader` under a Base64 raw key or a
    /// password.
    pub fn encrypt<R: Read>(
        &self,
        mut reader: R,
        algorithm: &str,
        key: &str,
    ) -> CadesResult<Vec<u8>> {
        let digest = DigestAlgorithm::from_hint(algorithm)?;
        if key.is_empty() {
            return Err(CadesError::InvalidInput(
                "A key or password is required".to_string(),
            ));
        }
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        drop(reader);

        EncryptedDataGenerator::new(self.cipher)
            .with_content_type(self.content_type)
            .encrypt(&content, digest, key)
            .map_err(CadesError::encryption)
    }

    pub fn decrypt(&self, blob: &[u8], key: &str) -> CadesResult<Vec<u8>> {
        if !self.is_cades_valid_as(blob, ContentTypeTag::EncryptedData) {
            return Err(CadesError::UnsupportedFormat(
                "The data is not an EncryptedData structure".to_string(),
            ));
        }
        EncryptedDataGenerator::new(self.cipher).decrypt(blob, key)
    }

    /// Recover the content of an EnvelopedData or SignedAndEnvelopedData
    /// addressed to `certificate`.
    pub fn open_envelope(
        &self,
        blob: &[u8],
        key: &PKey<Private>,
        certificate: &X509,
    ) -> CadesResult<Vec<u8>> {
        match self.classify(blob) {
            ContentTypeTag::EnvelopedData | ContentTypeTag::SignedAndEnvelopedData => {
                EnvelopeBuilder::new(self.content_type).open(blob, key, certificate)
            }
            other => Err(CadesError::UnsupportedFormat(format!(
                "Cannot open {other} as an envelope"
            ))),
        }
    }

    #[must_use]
    pub fn classify(&self, blob: &[u8]) -> ContentTypeTag {
        ContentTypeClassifier::new().classify(blob)
    }

    #[must_use]
    pub fn is_sign(&self, blob: &[u8]) -> bool {
        ContentTypeClassifier::new().is_signature(blob)
    }

    #[must_use]
    pub fn is_cades_valid(&self, blob: &[u8]) -> bool {
        ContentTypeClassifier::new().is_valid_container(blob)
    }

    #[must_use]
    pub fn is_cades_valid_as(&self, blob: &[u8], tag: ContentTypeTag) -> bool {
        ContentTypeClassifier::new().is_valid_container_of(blob, tag)
    }

    /// Any non-empty input can be signed.
    #[must_use]
    pub fn is_valid_data_file(&self, data: &[u8]) -> bool {
        if data.is_empty() {
            log::warn!("Empty input is not signable data");
            return false;
        }
        true
    }

    /// Plaintext embedded in a Data, implicit SignedData or DigestedData.
    pub fn get_data(&self, blob: &[u8]) -> CadesResult<Vec<u8>> {
        if blob.is_empty() {
            return Err(CadesError::InvalidInput(
                "The signature cannot be empty".to_string(),
            ));
        }
        extract_content(blob)
    }

    /// Signer tree of a signature, or `None` when it cannot be read.
    #[must_use]
    pub fn signers_structure(&self, sign: &[u8]) -> Option<SignerTree> {
        let result = SignatureContainer::from_der(sign).and_then(|container| {
            SignerTree::build(container.signer_infos().0.iter(), &container.certificates())
        });
        match result {
            Ok(tree) => Some(tree),
            Err(err) => {
                log::warn!("Unable to read the signers of the signature: {err}");
                None
            }
        }
    }

    pub fn verify(&self, sign: &[u8], detached: Option<&[u8]>) -> CadesResult<VerificationReport> {
        self.require_signature(sign)?;
        VerificationService::new().verify(sign, detached)
    }

    /// Format and signing time of a SignedData. Enveloped signatures are
    /// not reported.
    pub fn sign_info(&self, sign: &[u8]) -> CadesResult<SignInfo> {
        if sign.is_empty() {
            return Err(CadesError::InvalidInput(
                "The signature cannot be empty".to_string(),
            ));
        }
        if !self.is_sign(sign) {
            return Err(CadesError::UnsupportedFormat(
                "The data is not a CAdES signature".to_string(),
            ));
        }
        let signing_time = self
            .signers_structure(sign)
            .and_then(|tree| tree.nodes().first().and_then(SignerNode::signing_time));
        Ok(SignInfo {
            format: constants::SIGN_FORMAT_CADES.to_string(),
            signing_time,
        })
    }

    /// Output file name for a signature over `original_name`.
    #[must_use]
    pub fn signed_name(&self, original_name: &str) -> String {
        format!(
            "{original_name}{}{}",
            self.signed_name_suffix,
            constants::SIGNED_FILE_EXTENSION
        )
    }

    fn require_signature(&self, sign: &[u8]) -> CadesResult<()> {
        if sign.is_empty() {
            return Err(CadesError::InvalidInput(
                "The signature cannot be empty".to_string(),
            ));
        }
        match self.classify(sign) {
            ContentTypeTag::SignedData | ContentTypeTag::SignedAndEnvelopedData => Ok(()),
            other => Err(CadesError::UnsupportedFormat(format!(
                "Expected a CAdES signature, found {other}"
            ))),
        }
    }
}

/// Wrap build failures with the operation, passing argument errors through.
fn wrap_unless_argument(
    wrap: fn(CadesError) -> CadesError,
) -> impl Fn(CadesError) -> CadesError {
    move |err| match err {
        CadesError::InvalidInput(_) | CadesError::UnsupportedFormat(_) => err,
        other => wrap(other),
    }
}
