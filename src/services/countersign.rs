//! Counter-signature service.
//!
//! Each resolved node gets a new SignerInfo over its signature value, stored
//! in its `countersignature` unsigned attribute. The tree is rebuilt
//! bottom-up along the touched paths only; untouched SignerInfos keep their
//! original encoding and no signature value is ever recomputed.

use std::collections::BTreeSet;

use cms::signed_data::{SignerInfo, SignerInfos};
use der::asn1::SetOfVec;
use der::Any;
use x509_cert::attr::Attribute;

use crate::domain::cms::{decode_any, SignerTree};
use crate::domain::constants;
use crate::domain::crypto::{DigestAlgorithm, SigningCredential};
use crate::domain::types::CounterSignTarget;
use crate::infra::config::SignConfig;
use crate::infra::error::CadesResult;
use crate::services::cosign::open_signature_container;
use crate::services::node_resolver::resolve_targets;
use crate::services::signer_info::SignerInfoBuilder;

pub struct CounterSigner;

impl Default for CounterSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSigner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn countersign(
        &self,
        sign: &[u8],
        digest: DigestAlgorithm,
        target: &CounterSignTarget,
        credential: &SigningCredential,
        config: &SignConfig,
    ) -> CadesResult<Vec<u8>> {
        let mut container = open_signature_container(sign)?;
        let tree = SignerTree::build(container.signer_infos().0.iter(), &container.certificates())?;
        let targets: BTreeSet<usize> = resolve_targets(&tree, target).into_iter().collect();
        if targets.is_empty() {
            log::info!("Counter-signature target {target:?} resolved to no signers; nothing to do");
            return Ok(sign.to_vec());
        }
        log::info!(
            "Counter-signing nodes {targets:?} of a {}-signer {}",
            tree.len(),
            container.tag()
        );

        let builder = SignerInfoBuilder::new(credential, digest).with_config(config);
        let mut next_id = 0;
        let mut rebuilt = Vec::with_capacity(container.signer_infos().0.len());
        for signer_info in container.signer_infos().0.iter() {
            let (signer_info, _) = rebuild(signer_info, &mut next_id, &targets, &builder)?;
            rebuilt.push(signer_info);
        }

        container.set_signer_infos(SignerInfos(SetOfVec::try_from(rebuilt)?));
        container.add_digest_algorithm(digest.algorithm_identifier())?;
        container.add_certificates(&credential.parsed_chain()?)?;
        container.to_der()
    }
}

/// Rebuild `signer_info` (pre-order id `*next_id`) and its counter-signature
/// subtree. Returns the node and whether anything below it changed.
fn rebuild(
    signer_info: &SignerInfo,
    next_id: &mut usize,
    targets: &BTreeSet<usize>,
    builder: &SignerInfoBuilder<'_>,
) -> CadesResult<(SignerInfo, bool)> {
    let id = *next_id;
    *next_id += 1;

    let mut attrs: Vec<Attribute> = signer_info
        .unsigned_attrs
        .as_ref()
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default();
    let mut changed = false;

    for attr in attrs
        .iter_mut()
        .filter(|attr| attr.oid == constants::ID_COUNTERSIGNATURE)
    {
        let mut values = Vec::with_capacity(attr.values.len());
        let mut attr_changed = false;
        for value in attr.values.iter() {
            let child: SignerInfo = decode_any(value)?;
            let (child, child_changed) = rebuild(&child, next_id, targets, builder)?;
            if child_changed {
                values.push(Any::encode_from(&child)?);
                attr_changed = true;
            } else {
                values.push(value.clone());
            }
        }
        if attr_changed {
            attr.values = SetOfVec::try_from(values)?;
            changed = true;
        }
    }

    if targets.contains(&id) {
        let message_digest = builder.digest().digest(signer_info.signature.as_bytes());
        let counter = builder.build(None, &message_digest)?;
        let value = Any::encode_from(&counter)?;
        match attrs
            .iter_mut()
            .find(|attr| attr.oid == constants::ID_COUNTERSIGNATURE)
        {
            Some(attr) => {
                let mut values: Vec<Any> = attr.values.iter().cloned().collect();
                values.push(value);
                attr.values = SetOfVec::try_from(values)?;
            }
            None => attrs.push(Attribute {
                oid: constants::ID_COUNTERSIGNATURE,
                values: SetOfVec::try_from(vec![value])?,
            }),
        }
        log::debug!("Added counter-signature to node {id}");
        changed = true;
    }

    if !changed {
        return Ok((signer_info.clone(), false));
    }
    let mut updated = signer_info.clone();
    updated.unsigned_attrs = Some(SetOfVec::try_from(attrs)?);
    Ok((updated, true))
}
