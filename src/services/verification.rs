//! Verification service: checks every signer and counter-signer of a
//! SignedData or SignedAndEnvelopedData container.
//!
//! Signature values are checked against the public key of the signer
//! certificate carried in the container; certificate trust is not evaluated.

use der::asn1::OctetString;
use der::Encode;
use openssl::x509::X509;

use crate::domain::cms::{decode_any, find_attribute_value, SignerNode, SignerTree};
use crate::domain::constants;
use crate::domain::crypto::{verify_signature, DigestAlgorithm};
use crate::domain::verification::{SignerVerification, VerificationReport};
use crate::infra::error::CadesResult;
use crate::services::cosign::open_signature_container;

/// Service performing cryptographic verification of signer trees.
pub struct VerificationService;

impl Default for VerificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Verify all signers. `detached` supplies the content of explicit
    /// signatures; embedded content takes precedence.
    pub fn verify(&self, sign: &[u8], detached: Option<&[u8]>) -> CadesResult<VerificationReport> {
        let container = open_signature_container(sign)?;
        let content = container
            .embedded_content()?
            .or_else(|| detached.map(<[u8]>::to_vec));
        let tree = SignerTree::build(container.signer_infos().0.iter(), &container.certificates())?;

        let mut signers = Vec::with_capacity(tree.len());
        for node in tree.nodes() {
            let signed_over = match node.parent() {
                Some(parent) => tree
                    .get(parent)
                    .map(|p| p.signer_info().signature.as_bytes().to_vec()),
                None => content.clone(),
            };
            signers.push(self.verify_node(node, signed_over.as_deref())?);
        }

        let report = VerificationReport::new(signers);
        log::info!(
            "Verified {} signer(s): {}",
            report.signers.len(),
            if report.success() { "valid" } else { "INVALID" }
        );
        Ok(report)
    }

    fn verify_node(&self, node: &SignerNode, signed_over: Option<&[u8]>) -> CadesResult<SignerVerification> {
        let signer_info = node.signer_info();
        let digest = DigestAlgorithm::from_oid(&signer_info.digest_alg.oid)?;

        let declared = match &signer_info.signed_attrs {
            Some(attrs) => match find_attribute_value(attrs, &constants::ID_MESSAGE_DIGEST) {
                Some(value) => Some(decode_any::<OctetString>(value)?.into_bytes()),
                None => None,
            },
            None => None,
        };
        let digest_ok = signed_over.map(|data| declared.as_deref() == Some(digest.digest(data).as_slice()));

        let signature_ok = match (node.certificate(), &signer_info.signed_attrs) {
            (Some(cert), Some(attrs)) => {
                let public_key = X509::from_der(&cert.to_der()?)?.public_key()?;
                verify_signature(
                    &public_key,
                    digest,
                    &attrs.to_der()?,
                    signer_info.signature.as_bytes(),
                )?
            }
            _ => false,
        };

        if !signature_ok || digest_ok == Some(false) {
            log::warn!(
                "Signer node {} ({:?}) failed verification: digest_ok={digest_ok:?}, signature_ok={signature_ok}",
                node.id(),
                node.common_name()
            );
        }

        Ok(SignerVerification {
            node_id: node.id(),
            depth: node.depth(),
            common_name: node.common_name().map(str::to_string),
            certificate_found: node.certificate().is_some(),
            digest_ok,
            signature_ok,
        })
    }
}
