//! Resolves a counter-signature target selector into signer tree node ids.

use std::collections::BTreeSet;

use crate::domain::cms::SignerTree;
use crate::domain::types::CounterSignTarget;

/// Node ids that receive a counter-signature, in the order they are signed.
///
/// An empty result is a valid outcome and means nothing is counter-signed.
#[must_use]
pub fn resolve_targets(tree: &SignerTree, target: &CounterSignTarget) -> Vec<usize> {
    if tree.is_empty() {
        log::warn!("The signature has no signers to counter-sign");
        return Vec::new();
    }
    match target {
        CounterSignTarget::Tree | CounterSignTarget::Leafs => vec![0],
        CounterSignTarget::Nodes(ids) => resolve_nodes(tree, ids),
        CounterSignTarget::Signers(names) => resolve_signers(tree, names),
    }
}

fn resolve_nodes(tree: &SignerTree, ids: &[usize]) -> Vec<usize> {
    let mut unique = BTreeSet::new();
    for &id in ids {
        if tree.get(id).is_some() {
            unique.insert(id);
        } else {
            log::warn!("Node {id} does not exist in a tree of {} signers; ignored", tree.len());
        }
    }
    unique
        .iter()
        .copied()
        .filter(|&id| !unique.iter().any(|&other| tree.is_descendant(id, other)))
        .collect()
}

fn resolve_signers(tree: &SignerTree, names: &[String]) -> Vec<usize> {
    let resolved: Vec<usize> = tree
        .nodes()
        .iter()
        .filter(|node| names.iter().any(|name| node.matches_name(name)))
        .map(|node| node.id())
        .collect();
    if resolved.is_empty() {
        log::info!("No signer matches {names:?}");
    }
    resolved
}
