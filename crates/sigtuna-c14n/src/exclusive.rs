#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! The key difference from inclusive C14N: only "visibly utilized"
//! namespace declarations are output. A namespace is visibly utilized if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes, OR
//! 3. The prefix appears in the InclusiveNamespaces PrefixList, OR
//! 4. It's the default namespace and the element is in that namespace.
//!
//! Element and attribute prefixes are read back out of the source text via
//! the node's byte range; the parsed tree only carries resolved namespace
//! URIs.

use crate::escape;
use sigtuna_core::{ns, Error, Result};
use sigtuna_xml::{span, NodeSet};
use std::collections::{BTreeMap, HashSet};

/// Canonicalize using Exclusive C14N 1.0.
///
/// `source` must be the exact text `doc` was parsed from.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    source: &str,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>> {
    let ctx = ExcC14n {
        source,
        with_comments,
        node_set,
        inclusive_prefixes: inclusive_prefixes.iter().cloned().collect(),
    };
    let mut output = Vec::new();
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct ExcC14n<'a> {
    source: &'a str,
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    inclusive_prefixes: HashSet<String>,
}

impl ExcC14n<'_> {
    fn is_visible(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.node_set.map_or(true, |set| set.contains(node))
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<()> {
        match node.node_type() {
            roxmltree::NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, rendered_ns)?;
                }
            }
            roxmltree::NodeType::Element => {
                self.process_element(node, output, rendered_ns)?;
            }
            roxmltree::NodeType::Text => {
                if self.is_visible(node) {
                    let text = node.text().unwrap_or("");
                    output.extend_from_slice(escape::escape_text(text).as_bytes());
                }
            }
            roxmltree::NodeType::Comment => {
                if self.with_comments && self.is_visible(node) {
                    let text = node.text().unwrap_or("");
                    let at_doc_level = node.parent().is_some_and(|p| p.is_root());
                    if at_doc_level && has_preceding_element(node) {
                        output.push(b'\n');
                    }
                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(text.as_bytes());
                    output.extend_from_slice(b"-->");
                    if at_doc_level && has_following_element(node) {
                        output.push(b'\n');
                    }
                }
            }
            roxmltree::NodeType::PI => {
                if self.is_visible(node) {
                    let Some(pi) = node.pi() else {
                        return Ok(());
                    };
                    let at_doc_level = node.parent().is_some_and(|p| p.is_root());
                    if at_doc_level && has_preceding_element(node) {
                        output.push(b'\n');
                    }
                    output.extend_from_slice(b"<?");
                    output.extend_from_slice(pi.target.as_bytes());
                    if let Some(value) = pi.value {
                        if !value.is_empty() {
                            output.push(b' ');
                            output.extend_from_slice(escape::escape_pi(value).as_bytes());
                        }
                    }
                    output.extend_from_slice(b"?>");
                    if at_doc_level && has_following_element(node) {
                        output.push(b'\n');
                    }
                }
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<()> {
        if !self.is_visible(node) {
            // In exclusive C14N, namespace declarations are rendered only on
            // visible start tags; an invisible element just passes the
            // rendered-namespace context through to its children.
            for child in node.children() {
                self.process_node(child, output, rendered_ns)?;
            }
            return Ok(());
        }

        let tag = span::start_tag(self.source, node.range().start)?;

        // Determine which namespace prefixes are visibly utilized.
        let mut utilized: HashSet<String> = HashSet::new();
        utilized.insert(tag.prefix().to_owned());
        for (attr_qname, _) in &tag.attrs {
            if *attr_qname == "xmlns" || attr_qname.starts_with("xmlns:") {
                continue;
            }
            let (prefix, _) = span::split_qname(attr_qname);
            if !prefix.is_empty() {
                utilized.insert(prefix.to_owned());
            }
        }
        for prefix in &self.inclusive_prefixes {
            if prefix == "#default" {
                utilized.insert(String::new());
            } else {
                utilized.insert(prefix.clone());
            }
        }

        let inscope = inscope_namespaces(node);

        // Decide which namespace declarations to output on this start tag.
        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for prefix in &utilized {
            if prefix == "xml" {
                continue;
            }
            if let Some(uri) = inscope.get(prefix.as_str()) {
                if rendered_ns.get(prefix.as_str()) != Some(uri) {
                    ns_decls.push(NsDecl {
                        prefix: prefix.clone(),
                        uri: uri.clone(),
                    });
                }
            } else if prefix.is_empty() {
                // The default namespace was undeclared here but an ancestor
                // rendered a non-empty one: emit xmlns="".
                if rendered_ns.get("").is_some_and(|uri| !uri.is_empty()) {
                    ns_decls.push(NsDecl {
                        prefix: String::new(),
                        uri: String::new(),
                    });
                }
            }
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = Vec::new();
        for attr in node.attributes() {
            let ns_uri = attr.namespace().unwrap_or("");
            let qualified_name = attribute_qname(&tag, &inscope, ns_uri, attr.name())?;
            attrs.push(Attr {
                ns_uri: ns_uri.to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name,
                value: attr.value().to_owned(),
            });
        }
        attrs.sort();

        output.push(b'<');
        output.extend_from_slice(tag.qname.as_bytes());
        for decl in &ns_decls {
            decl.render_into(output);
        }
        for attr in &attrs {
            attr.render_into(output);
        }
        output.push(b'>');

        let mut child_rendered = rendered_ns.clone();
        for decl in &ns_decls {
            child_rendered.insert(decl.prefix.clone(), decl.uri.clone());
        }
        for child in node.children() {
            self.process_node(child, output, &child_rendered)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(tag.qname.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// Collect the in-scope namespace bindings of an element.
///
/// The implicit `xml` binding is left out (never re-declared) and an empty
/// URI counts as "no default namespace in scope".
fn inscope_namespaces(node: roxmltree::Node<'_, '_>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for decl in node.namespaces() {
        let prefix = decl.name().unwrap_or("");
        if prefix == "xml" || decl.uri().is_empty() {
            continue;
        }
        map.insert(prefix.to_owned(), decl.uri().to_owned());
    }
    map
}

/// Reconstruct an attribute's qualified name.
///
/// The parsed tree only knows (namespace URI, local name); the prefix as
/// written is recovered from the scanned start tag, falling back to any
/// in-scope binding of the same URI.
fn attribute_qname(
    tag: &span::StartTag<'_>,
    inscope: &BTreeMap<String, String>,
    ns_uri: &str,
    local: &str,
) -> Result<String> {
    if ns_uri.is_empty() {
        return Ok(local.to_owned());
    }
    if ns_uri == ns::XML {
        return Ok(format!("xml:{local}"));
    }
    for (attr_qname, _) in &tag.attrs {
        if *attr_qname == "xmlns" || attr_qname.starts_with("xmlns:") {
            continue;
        }
        let (prefix, attr_local) = span::split_qname(attr_qname);
        if !prefix.is_empty()
            && attr_local == local
            && inscope.get(prefix).map(String::as_str) == Some(ns_uri)
        {
            return Ok(format!("{prefix}:{local}"));
        }
    }
    if let Some((prefix, _)) = inscope
        .iter()
        .find(|(prefix, uri)| !prefix.is_empty() && uri.as_str() == ns_uri)
    {
        return Ok(format!("{prefix}:{local}"));
    }
    Err(Error::Canonicalization(format!(
        "no prefix in scope for attribute namespace {ns_uri}"
    )))
}

/// Check whether any preceding sibling is an element.
fn has_preceding_element(node: roxmltree::Node<'_, '_>) -> bool {
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.is_element() {
            return true;
        }
        sibling = s.prev_sibling();
    }
    false
}

/// Check whether any following sibling is an element.
fn has_following_element(node: roxmltree::Node<'_, '_>) -> bool {
    let mut sibling = node.next_sibling();
    while let Some(s) = sibling {
        if s.is_element() {
            return true;
        }
        sibling = s.next_sibling();
    }
    false
}

// ── Output rendering ─────────────────────────────────────────────────

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NsDecl {
    /// The prefix ("" for the default namespace).
    prefix: String,
    uri: String,
}

impl NsDecl {
    fn render_into(&self, output: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            output.extend_from_slice(b" xmlns=\"");
        } else {
            output.extend_from_slice(b" xmlns:");
            output.extend_from_slice(self.prefix.as_bytes());
            output.extend_from_slice(b"=\"");
        }
        output.extend_from_slice(escape::escape_attr(&self.uri).as_bytes());
        output.push(b'"');
    }
}

impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // The default namespace (empty prefix) sorts first, then by prefix.
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attr {
    ns_uri: String,
    local_name: String,
    qualified_name: String,
    value: String,
}

impl Attr {
    fn render_into(&self, output: &mut Vec<u8>) {
        output.push(b' ');
        output.extend_from_slice(self.qualified_name.as_bytes());
        output.extend_from_slice(b"=\"");
        output.extend_from_slice(escape::escape_attr(&self.value).as_bytes());
        output.push(b'"');
    }
}

impl Ord for Attr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Unqualified attributes come first, ordered by local name; then
        // qualified ones ordered by (namespace URI, local name).
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then(self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
