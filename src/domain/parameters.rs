use std::fmt;

use openssl::x509::X509;

use crate::domain::crypto::DigestAlgorithm;
use crate::infra::error::{CadesError, CadesResult};

/// Immutable input bundle for one signing operation: the content (or its
/// pre-computed digest), the digest algorithm and the signer chain.
#[derive(Clone)]
pub struct ContentSignerParameters {
    content: Vec<u8>,
    digest_algorithm: DigestAlgorithm,
    chain: Vec<X509>,
}

impl ContentSignerParameters {
    /// `algorithm` accepts signature names (`SHA256withRSA`), digest names
    /// (`SHA-256`) or a bare key algorithm (`RSA`, meaning SHA-1).
    pub fn new(content: Vec<u8>, algorithm: &str, chain: Vec<X509>) -> CadesResult<Self> {
        let digest_algorithm = DigestAlgorithm::from_hint(algorithm)?;
        Self::with_digest(content, digest_algorithm, chain)
    }

    pub fn with_digest(
        content: Vec<u8>,
        digest_algorithm: DigestAlgorithm,
        chain: Vec<X509>,
    ) -> CadesResult<Self> {
        if chain.is_empty() {
            return Err(CadesError::InvalidInput(
                "The signer certificate chain cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            content,
            digest_algorithm,
            chain,
        })
    }

    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    #[must_use]
    pub fn signer_certificate_chain(&self) -> &[X509] {
        &self.chain
    }
}

impl fmt::Debug for ContentSignerParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentSignerParameters(content_len={}, digest={}, chain_len={})",
            self.content.len(),
            self.digest_algorithm,
            self.chain.len()
        )
    }
}
