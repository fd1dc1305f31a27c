//! Verification domain types for CMS signature containers.
//!
//! Aggregates per-signer outcomes; the cryptographic checks live in the
//! verification service. Certificate path validation is not part of this
//! report.

/// Outcome for one node of the signer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerVerification {
    /// Pre-order node id.
    pub node_id: usize,
    /// 0 for top-level signers, 1+ for counter-signatures.
    pub depth: usize,
    pub common_name: Option<String>,
    /// The signer certificate was found in the container.
    pub certificate_found: bool,
    /// messageDigest matches the signed content (or, for counter-signatures,
    /// the parent's signature value). `None` when the content is unavailable.
    pub digest_ok: Option<bool>,
    /// Signature value validates over the DER of the signed attributes.
    pub signature_ok: bool,
}

impl SignerVerification {
    #[must_use]
    pub fn success(&self) -> bool {
        self.certificate_found && self.signature_ok && self.digest_ok == Some(true)
    }
}

/// Result of verifying every signer of a container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationReport {
    pub signers: Vec<SignerVerification>,
}

impl VerificationReport {
    #[must_use]
    pub fn new(signers: Vec<SignerVerification>) -> Self {
        Self { signers }
    }

    /// True only if there is at least one signer and all of them verify.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.signers.is_empty() && self.signers.iter().all(SignerVerification::success)
    }

    #[must_use]
    pub fn node(&self, id: usize) -> Option<&SignerVerification> {
        self.signers.iter().find(|s| s.node_id == id)
    }
}
