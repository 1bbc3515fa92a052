#![forbid(unsafe_code)]

//! Namespace-aware element lookup and ID attribute registration.

use std::collections::HashMap;

fn matches(node: &roxmltree::Node<'_, '_>, ns: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns
}

/// Find the first descendant element with the given local name and namespace.
pub fn find_element<'a>(
    doc: &'a roxmltree::Document<'a>,
    ns: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    doc.descendants().find(|n| matches(n, ns, local_name))
}

/// Find all descendant elements with the given local name and namespace.
pub fn find_elements<'a>(
    doc: &'a roxmltree::Document<'a>,
    ns: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'a>> {
    doc.descendants()
        .filter(|n| matches(n, ns, local_name))
        .collect()
}

/// Find the first direct child element with the given local name and namespace.
pub fn find_child<'a>(
    parent: roxmltree::Node<'a, 'a>,
    ns: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    parent.children().find(|n| matches(n, ns, local_name))
}

/// Find all direct child elements with the given local name and namespace.
pub fn find_children<'a>(
    parent: roxmltree::Node<'a, 'a>,
    ns: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'a>> {
    parent
        .children()
        .filter(|n| matches(n, ns, local_name))
        .collect()
}

/// Build the ID → NodeId mapping for a parsed document.
///
/// The unqualified `Id`, `ID` and `id` attributes are always registered.
/// `extra_id_attrs` registers namespace-qualified ID attributes as
/// `(namespace_uri, local_name)` pairs, e.g. the wsu `Id`.
pub fn build_id_map<'a>(
    doc: &'a roxmltree::Document<'a>,
    extra_id_attrs: &[(&str, &str)],
) -> HashMap<String, roxmltree::NodeId> {
    let default_attrs = ["Id", "ID", "id"];
    let mut map = HashMap::new();
    for node in doc.descendants() {
        if !node.is_element() {
            continue;
        }
        for attr_name in &default_attrs {
            if let Some(val) = node.attribute(*attr_name) {
                map.insert(val.to_owned(), node.id());
            }
        }
        for (ns, local) in extra_id_attrs {
            if let Some(val) = node.attribute((*ns, *local)) {
                map.insert(val.to_owned(), node.id());
            }
        }
    }
    map
}

/// Resolve an element by its registered ID value.
pub fn find_by_id<'a>(
    doc: &'a roxmltree::Document<'a>,
    id_map: &HashMap<String, roxmltree::NodeId>,
    id: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    let node_id = id_map.get(id)?;
    doc.get_node(*node_id)
}

/// Parse a same-document reference (`#foo` → `foo`).
pub fn same_document_ref(uri: &str) -> Option<&str> {
    uri.strip_prefix('#')
}
