#![forbid(unsafe_code)]

//! Node sets for document-subset canonicalization.
//!
//! A `NodeSet` names the nodes of a parsed document that are "visible" to
//! the canonicalizer. Signing only ever needs subtree sets (the Body or a
//! SignedInfo element together with its descendants), so the XPath node-set
//! algebra of full XML-DSig is out of scope here.

use std::collections::HashSet;

/// A set of XML document nodes identified by `NodeId`.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<roxmltree::NodeId>,
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The subtree rooted at `root`, excluding comment nodes.
    ///
    /// This is the node set a same-document `#id` reference selects per the
    /// XML-DSig dereferencing rules.
    pub fn tree_without_comments(root: roxmltree::Node<'_, '_>) -> Self {
        Self::tree(root, false)
    }

    /// The subtree rooted at `root`, including comment nodes.
    pub fn tree_with_comments(root: roxmltree::Node<'_, '_>) -> Self {
        Self::tree(root, true)
    }

    fn tree(root: roxmltree::Node<'_, '_>, include_comments: bool) -> Self {
        let mut nodes = HashSet::new();
        for node in root.descendants() {
            if !include_comments && node.is_comment() {
                continue;
            }
            nodes.insert(node.id());
        }
        Self { nodes }
    }

    /// Check whether a node is in this set.
    pub fn contains(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    /// Add a node to this set.
    pub fn insert(&mut self, node: roxmltree::Node<'_, '_>) {
        self.nodes.insert(node.id());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
