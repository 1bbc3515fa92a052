#![forbid(unsafe_code)]

//! Start-tag scanning and splice-offset computation over raw XML text.
//!
//! roxmltree exposes the byte range of every node in the original text but
//! not the layout inside a start tag. The signer needs exactly that: where
//! to splice new attributes into the Body tag, and where a Header's content
//! ends. These helpers scan the source directly; they are only ever called
//! on text that roxmltree has already validated.

use sigtuna_core::{Error, Result};

/// The parsed layout of one element start tag in the source text.
#[derive(Debug)]
pub struct StartTag<'a> {
    /// Qualified name exactly as written (`soapenv:Body`, `Body`, ...).
    pub qname: &'a str,
    /// Attributes in document order as (qualified name, raw value) pairs.
    /// Namespace declarations (`xmlns`, `xmlns:p`) are included.
    pub attrs: Vec<(&'a str, &'a str)>,
    /// Offset where additional attribute text may be spliced in, just
    /// before the closing `>` or `/>`.
    pub attr_insert: usize,
    /// Offset one past the closing `>` of the start tag.
    pub tag_end: usize,
    /// Whether this is an empty-element tag (`<a/>`).
    pub self_closing: bool,
}

impl<'a> StartTag<'a> {
    /// The element's namespace prefix ("" when unprefixed).
    pub fn prefix(&self) -> &'a str {
        split_qname(self.qname).0
    }

    /// Look up an attribute's raw value by its qualified name.
    pub fn attr(&self, qname: &str) -> Option<&'a str> {
        self.attrs
            .iter()
            .find(|(q, _)| *q == qname)
            .map(|(_, v)| *v)
    }
}

/// Split a qualified name into (prefix, local name); prefix is "" when absent.
pub fn split_qname(qname: &str) -> (&str, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", qname),
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Scan the start tag of the element beginning at byte offset `start`.
pub fn start_tag(source: &str, start: usize) -> Result<StartTag<'_>> {
    let bytes = source.as_bytes();
    let fail = |msg: &str| Error::XmlStructure(format!("{msg} at offset {start}"));

    if bytes.get(start) != Some(&b'<') {
        return Err(fail("expected a start tag"));
    }
    let mut i = start + 1;
    let name_start = i;
    while i < bytes.len() && !is_space(bytes[i]) && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let qname = &source[name_start..i];
    if qname.is_empty() {
        return Err(fail("empty element name"));
    }

    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && is_space(bytes[i]) {
            i += 1;
        }
        match bytes.get(i) {
            None => return Err(fail("unterminated start tag")),
            Some(b'>') => {
                return Ok(StartTag {
                    qname,
                    attrs,
                    attr_insert: i,
                    tag_end: i + 1,
                    self_closing: false,
                })
            }
            Some(b'/') => {
                if bytes.get(i + 1) != Some(&b'>') {
                    return Err(fail("malformed empty-element tag"));
                }
                return Ok(StartTag {
                    qname,
                    attrs,
                    attr_insert: i,
                    tag_end: i + 2,
                    self_closing: true,
                });
            }
            Some(_) => {
                let aname_start = i;
                while i < bytes.len() && !is_space(bytes[i]) && bytes[i] != b'=' {
                    i += 1;
                }
                let aname = &source[aname_start..i];
                while i < bytes.len() && is_space(bytes[i]) {
                    i += 1;
                }
                if bytes.get(i) != Some(&b'=') {
                    return Err(fail("attribute without a value"));
                }
                i += 1;
                while i < bytes.len() && is_space(bytes[i]) {
                    i += 1;
                }
                let quote = match bytes.get(i) {
                    Some(q @ (b'"' | b'\'')) => *q,
                    _ => return Err(fail("unquoted attribute value")),
                };
                i += 1;
                let val_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(fail("unterminated attribute value"));
                }
                attrs.push((aname, &source[val_start..i]));
                i += 1;
            }
        }
    }
}

/// Offset of the element's end tag (`</...>`) within its byte range.
///
/// For a well-formed element the last `</` inside its range opens its own
/// end tag. Returns `None` for an empty-element tag.
pub fn end_tag_offset(source: &str, range: std::ops::Range<usize>) -> Option<usize> {
    source[range.clone()].rfind("</").map(|pos| range.start + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_plain_tag() {
        let src = "<a:Body>text</a:Body>";
        let tag = start_tag(src, 0).unwrap();
        assert_eq!(tag.qname, "a:Body");
        assert_eq!(tag.prefix(), "a");
        assert!(tag.attrs.is_empty());
        assert!(!tag.self_closing);
        assert_eq!(tag.tag_end, 8);
        assert_eq!(&src[tag.attr_insert..tag.tag_end], ">");
    }

    #[test]
    fn scans_attributes_with_angle_bracket_in_value() {
        let src = r#"<x one="a>b" two='c"d'/>"#;
        let tag = start_tag(src, 0).unwrap();
        assert_eq!(tag.attrs, vec![("one", "a>b"), ("two", "c\"d")]);
        assert!(tag.self_closing);
        assert_eq!(tag.attr("one"), Some("a>b"));
        assert_eq!(tag.attr("missing"), None);
    }

    #[test]
    fn self_closing_with_space() {
        let src = "<Header />";
        let tag = start_tag(src, 0).unwrap();
        assert!(tag.self_closing);
        assert_eq!(&src[tag.attr_insert..], "/>");
        assert_eq!(tag.tag_end, src.len());
    }

    #[test]
    fn scans_at_offset_within_document() {
        let src = "<r><Body Id=\"b\">x</Body></r>";
        let doc = roxmltree::Document::parse(src).unwrap();
        let body = doc.descendants().find(|n| n.has_tag_name("Body")).unwrap();
        let tag = start_tag(src, body.range().start).unwrap();
        assert_eq!(tag.qname, "Body");
        assert_eq!(tag.attrs, vec![("Id", "b")]);
        assert_eq!(
            end_tag_offset(src, body.range()),
            Some(src.find("</Body>").unwrap())
        );
    }

    #[test]
    fn rejects_truncated_tag() {
        assert!(start_tag("<a foo=", 0).is_err());
        assert!(start_tag("<a foo=bar>", 0).is_err());
    }
}
