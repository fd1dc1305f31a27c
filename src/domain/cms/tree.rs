//! Signer tree: the SignerInfos of a container seen as a forest.
//!
//! Top-level SignerInfos are roots, each countersignature value is a child of
//! the SignerInfo carrying it. Nodes are numbered in pre-order, siblings in
//! encoding order, starting at 0.

use std::fmt;
use std::time::SystemTime;

use cms::signed_data::SignerInfo;
use x509_cert::name::Name;
use x509_cert::time::Time;
use x509_cert::Certificate;

use super::{countersignatures, decode_any, find_attribute_value, find_signer_certificate};
use crate::domain::constants;
use crate::infra::error::CadesResult;

/// One signer (or counter-signer) in the tree.
#[derive(Clone)]
pub struct SignerNode {
    id: usize,
    parent: Option<usize>,
    depth: usize,
    children: Vec<usize>,
    common_name: Option<String>,
    subject: Option<String>,
    signing_time: Option<SystemTime>,
    certificate: Option<Certificate>,
    signer_info: SignerInfo,
}

impl SignerNode {
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
    /// Common name of the signer certificate subject.
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }
    /// Full RFC 4514 subject of the signer certificate.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
    #[must_use]
    pub fn signing_time(&self) -> Option<SystemTime> {
        self.signing_time
    }
    /// Signer certificate, when the container carries it.
    #[must_use]
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }
    #[must_use]
    pub fn signer_info(&self) -> &SignerInfo {
        &self.signer_info
    }

    /// Name matches the common name or the full subject.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.common_name.as_deref() == Some(name) || self.subject.as_deref() == Some(name)
    }
}

impl fmt::Debug for SignerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerNode")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("depth", &self.depth)
            .field("children", &self.children)
            .field("common_name", &self.common_name)
            .finish_non_exhaustive()
    }
}

/// Pre-order indexed forest of signers.
#[derive(Clone, Debug, Default)]
pub struct SignerTree {
    nodes: Vec<SignerNode>,
    roots: Vec<usize>,
}

impl SignerTree {
    /// Build the tree for `signer_infos`, resolving signer certificates
    /// against `certs`.
    pub fn build<'a, I>(signer_infos: I, certs: &[Certificate]) -> CadesResult<Self>
    where
        I: IntoIterator<Item = &'a SignerInfo>,
    {
        let mut tree = SignerTree::default();
        for signer_info in signer_infos {
            let id = tree.push(signer_info, None, 0, certs)?;
            tree.roots.push(id);
        }
        Ok(tree)
    }

    fn push(
        &mut self,
        signer_info: &SignerInfo,
        parent: Option<usize>,
        depth: usize,
        certs: &[Certificate],
    ) -> CadesResult<usize> {
        let id = self.nodes.len();
        let certificate = find_signer_certificate(signer_info, certs).cloned();
        let subject = certificate
            .as_ref()
            .map(|cert| cert.tbs_certificate.subject.to_string());
        let common_name = certificate
            .as_ref()
            .and_then(|cert| common_name(&cert.tbs_certificate.subject));
        self.nodes.push(SignerNode {
            id,
            parent,
            depth,
            children: Vec::new(),
            common_name,
            subject,
            signing_time: signing_time(signer_info),
            certificate,
            signer_info: signer_info.clone(),
        });

        for counter in countersignatures(signer_info)? {
            let child = self.push(&counter, Some(id), depth + 1, certs)?;
            self.nodes[id].children.push(child);
        }
        Ok(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&SignerNode> {
        self.nodes.get(id)
    }

    /// All nodes in pre-order.
    #[must_use]
    pub fn nodes(&self) -> &[SignerNode] {
        &self.nodes
    }

    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Ids of nodes without counter-signatures, in pre-order.
    #[must_use]
    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(SignerNode::id)
            .collect()
    }

    /// True when `node` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, node: usize, ancestor: usize) -> bool {
        let mut current = self.nodes.get(node).and_then(SignerNode::parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(SignerNode::parent);
        }
        false
    }
}

fn common_name(name: &Name) -> Option<String> {
    name.0.iter().flat_map(|rdn| rdn.0.iter()).find_map(|atv| {
        (atv.oid == constants::ID_AT_COMMON_NAME)
            .then(|| String::from_utf8_lossy(atv.value.value()).into_owned())
    })
}

fn signing_time(signer_info: &SignerInfo) -> Option<SystemTime> {
    let attrs = signer_info.signed_attrs.as_ref()?;
    let value = find_attribute_value(attrs, &constants::ID_SIGNING_TIME)?;
    let time: Time = decode_any(value).ok()?;
    Some(time.to_system_time())
}
