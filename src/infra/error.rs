//! Error types for CAdES container operations.

use thiserror::Error;

/// Result type for container operations
pub type CadesResult<T> = Result<T, CadesError>;

/// Boxed low-level cause carried by [`CadesError::EncodingFailure`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Root classification of a [`CadesError`], looking through operation wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedFormat,
    EncodingFailure,
    Configuration,
}

/// Comprehensive error types for container operations
#[derive(Error, Debug, miette::Diagnostic)]
pub enum CadesError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Encoding failure: {message}")]
    EncodingFailure {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Error generating the CAdES signature")]
    Signing(#[source] Box<CadesError>),

    #[error("Error generating the CAdES co-signature")]
    CoSigning(#[source] Box<CadesError>),

    #[error("Error generating the CAdES counter-signature")]
    CounterSigning(#[source] Box<CadesError>),

    #[error("Error generating the CAdES envelope")]
    Enveloping(#[source] Box<CadesError>),

    #[error("Error generating the CAdES encrypted data")]
    Encryption(#[source] Box<CadesError>),
}

impl CadesError {
    /// Encoding failure without an underlying library error.
    pub fn encoding(message: impl Into<String>) -> Self {
        CadesError::EncodingFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Encoding failure that keeps the original cause for diagnostics.
    pub fn encoding_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CadesError::EncodingFailure {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Root kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CadesError::InvalidInput(_) => ErrorKind::InvalidInput,
            CadesError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            CadesError::EncodingFailure { .. } => ErrorKind::EncodingFailure,
            CadesError::Configuration(_) => ErrorKind::Configuration,
            CadesError::Signing(inner)
            | CadesError::CoSigning(inner)
            | CadesError::CounterSigning(inner)
            | CadesError::Enveloping(inner)
            | CadesError::Encryption(inner) => inner.kind(),
        }
    }

    pub(crate) fn signing(cause: CadesError) -> Self {
        CadesError::Signing(Box::new(cause))
    }

    pub(crate) fn co_signing(cause: CadesError) -> Self {
        CadesError::CoSigning(Box::new(cause))
    }

    pub(crate) fn counter_signing(cause: CadesError) -> Self {
        CadesError::CounterSigning(Box::new(cause))
    }

    pub(crate) fn enveloping(cause: CadesError) -> Self {
        CadesError::Enveloping(Box::new(cause))
    }

    pub(crate) fn encryption(cause: CadesError) -> Self {
        CadesError::Encryption(Box::new(cause))
    }
}

impl From<der::Error> for CadesError {
    fn from(error: der::Error) -> Self {
        CadesError::encoding_with("ASN.1 encoding/decoding error", error)
    }
}

impl From<openssl::error::ErrorStack> for CadesError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        CadesError::encoding_with("Cryptographic provider error", error)
    }
}

impl From<std::io::Error> for CadesError {
    fn from(error: std::io::Error) -> Self {
        CadesError::InvalidInput(format!("Could not read the data to process: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let error = CadesError::InvalidInput("empty content".to_string());
        assert_eq!(error.to_string(), "Invalid input: empty content");

        let error = CadesError::UnsupportedFormat("not a signature".to_string());
        assert_eq!(error.to_string(), "Unsupported format: not a signature");
    }

    #[test]
    fn wrapped_errors_keep_root_kind_and_cause() {
        let root = CadesError::encoding("bad length");
        let wrapped = CadesError::co_signing(root);
        assert_eq!(wrapped.kind(), ErrorKind::EncodingFailure);
        assert_eq!(wrapped.to_string(), "Error generating the CAdES co-signature");
        let source = wrapped.source().expect("wrapper exposes its cause");
        assert_eq!(source.to_string(), "Encoding failure: bad length");
    }

    #[test]
    fn der_errors_become_encoding_failures() {
        let der_error = der::Error::from(der::ErrorKind::Length {
            tag: der::Tag::Sequence,
        });
        let error = CadesError::from(der_error);
        assert_eq!(error.kind(), ErrorKind::EncodingFailure);
        assert!(error.source().is_some());
    }
}
