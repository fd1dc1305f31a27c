use std::fmt;

use super::DigestAlgorithm;
use crate::infra::error::CadesError;

/// Digest value paired with the algorithm that produced it.
///
/// Invariant: `bytes.len() == algo.digest_size()`.
#[derive(Clone, Eq, PartialEq)]
pub struct DigestBytes {
    algo: DigestAlgorithm,
    bytes: Box<[u8]>,
}

impl DigestBytes {
    /// Wrap a digest computed elsewhere (a pre-calculated content hash or a
    /// `messageDigest` attribute value).
    pub fn new(algo: DigestAlgorithm, bytes: Vec<u8>) -> Result<Self, DigestBytesError> {
        if bytes.len() != algo.digest_size() {
            return Err(DigestBytesError::LengthMismatch {
                algorithm: algo,
                expected: algo.digest_size(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            algo,
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Hash `data` and wrap the result.
    #[must_use]
    pub fn compute(algo: DigestAlgorithm, data: &[u8]) -> Self {
        Self {
            algo,
            bytes: algo.digest(data).into_boxed_slice(),
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
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into()
    }
}

impl fmt::Debug for DigestBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DigestBytes(algo={}, hex={})",
            self.algo,
            hex::encode(&self.bytes)
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestBytesError {
    #[error("{algorithm} digest length mismatch (expected {expected}, actual {actual})")]
    LengthMismatch {
        algorithm: DigestAlgorithm,
        expected: usize,
        actual: usize,
    },
}

impl From<DigestBytesError> for CadesError {
    fn from(error: DigestBytesError) -> Self {
        CadesError::InvalidInput(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = DigestBytes::new(DigestAlgorithm::Sha256, vec![0u8; 20]).unwrap_err();
        assert_eq!(
            err,
            DigestBytesError::LengthMismatch {
                algorithm: DigestAlgorithm::Sha256,
                expected: 32,
                actual: 20
            }
        );
    }

    #[test]
    fn compute_matches_algorithm() {
        let d = DigestBytes::compute(DigestAlgorithm::Sha1, b"data");
        assert_eq!(d.as_slice().len(), 20);
        assert_eq!(d.algorithm(), DigestAlgorithm::Sha1);
    }
}
