//! Service layer module root.
//! Builders, extenders and inspectors for CMS/CAdES containers.

pub mod classifier;
pub mod content;
pub mod cosign;
pub mod countersign;
pub mod encrypted_data;
pub mod envelope;
pub mod node_resolver;
pub mod signed_data;
pub mod signer_info;
pub mod verification;

pub use classifier::ContentTypeClassifier;
pub use content::extract_content;
pub use cosign::CoSigner;
pub use countersign::CounterSigner;
pub use encrypted_data::EncryptedDataGenerator;
pub use envelope::EnvelopeBuilder;
pub use node_resolver::resolve_targets;
pub use signed_data::SignedDataBuilder;
pub use signer_info::{resolve_signature_policy, SignerInfoBuilder};
pub use verification::VerificationService;
