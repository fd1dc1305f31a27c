//! Foundational cryptographic domain types.
//!
//! Provides strongly-typed wrappers for:
//! - Digest algorithms and digest values with size validation
//! - Signing credentials (private key plus certificate chain)
//! - Signature algorithms derived from the key type
//! - Content-encryption ciphers and key material
//!
//! Everything here is stateless; the service layer composes these into CMS
//! structures.

mod cipher;
mod credential;
mod digest_bytes;
mod hash;
mod signature;

pub(crate) use cipher::random_bytes;
pub use cipher::{CipherAlgorithm, KeyMaterial};
pub use credential::{parse_certificate, SigningCredential};
pub use digest_bytes::{DigestBytes, DigestBytesError};
pub use hash::DigestAlgorithm;
pub use signature::{verify_signature, CmsSignature, KeyFamily, SignatureAlgorithm};
