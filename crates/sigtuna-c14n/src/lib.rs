#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N) for signature computation.
//!
//! Only the exclusive variants are implemented; that is the
//! canonicalization method WS-Security profiles use for both the reference
//! transform and the SignedInfo digest input.

pub mod escape;
pub mod exclusive;

use sigtuna_core::{algorithm, Error, Result};
use sigtuna_xml::NodeSet;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveWithComments)
    }
}

/// Canonicalize a subset of a pre-parsed document.
///
/// `source` must be the exact text `doc` was parsed from; element layout is
/// read back out of it by byte range. `node_set` selects the visible nodes
/// (`None` canonicalizes the whole document). `inclusive_prefixes` is the
/// exc-C14N `InclusiveNamespaces PrefixList`.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    source: &str,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>> {
    exclusive::canonicalize(doc, source, mode.with_comments(), node_set, inclusive_prefixes)
}

/// Canonicalize a whole XML document given as text.
pub fn canonicalize(xml: &str, mode: C14nMode, inclusive_prefixes: &[String]) -> Result<Vec<u8>> {
    let doc = roxmltree::Document::parse_with_options(xml, sigtuna_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    canonicalize_doc(&doc, xml, mode, None, inclusive_prefixes)
}
