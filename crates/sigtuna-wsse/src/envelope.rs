#![forbid(unsafe_code)]

//! SOAP envelope location: find the Body and Header of a parsed envelope.

use sigtuna_core::{ns, Error, Result};
use sigtuna_xml::document;

/// The located parts of a SOAP envelope.
///
/// Pure lookup over a parsed document; nothing is mutated.
pub struct EnvelopeParts<'a> {
    /// The `Envelope` root element.
    pub envelope: roxmltree::Node<'a, 'a>,
    /// The single `Body` child.
    pub body: roxmltree::Node<'a, 'a>,
    /// The `Header` child, if present.
    pub header: Option<roxmltree::Node<'a, 'a>>,
}

/// Locate Envelope, Body and Header in a parsed SOAP 1.1 document.
///
/// The root must be `Envelope` in the SOAP envelope namespace with exactly
/// one direct `Body` child and at most one direct `Header` child; anything
/// else is a malformed envelope.
pub fn locate<'a>(doc: &'a roxmltree::Document<'a>) -> Result<EnvelopeParts<'a>> {
    let envelope = doc.root_element();
    if envelope.tag_name().name() != ns::node::ENVELOPE
        || envelope.tag_name().namespace() != Some(ns::SOAP)
    {
        return Err(Error::MalformedEnvelope(format!(
            "root element is not a SOAP Envelope: {}",
            envelope.tag_name().name()
        )));
    }

    let bodies = document::find_children(envelope, ns::SOAP, ns::node::BODY);
    let body = match bodies.as_slice() {
        [] => return Err(Error::MalformedEnvelope("no Body element".into())),
        [body] => *body,
        _ => {
            return Err(Error::MalformedEnvelope(
                "more than one Body element".into(),
            ))
        }
    };

    let headers = document::find_children(envelope, ns::SOAP, ns::node::HEADER);
    let header = match headers.as_slice() {
        [] => None,
        [header] => Some(*header),
        _ => {
            return Err(Error::MalformedEnvelope(
                "more than one Header element".into(),
            ))
        }
    };

    Ok(EnvelopeParts {
        envelope,
        body,
        header,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> roxmltree::Document<'_> {
        roxmltree::Document::parse(xml).unwrap()
    }

    #[test]
    fn locates_body_and_header() {
        let doc = parse(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Header/><s:Body><op/></s:Body></s:Envelope>"#,
        );
        let parts = locate(&doc).unwrap();
        assert_eq!(parts.body.tag_name().name(), "Body");
        assert!(parts.header.is_some());
    }

    #[test]
    fn header_is_optional() {
        let doc = parse(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body/></s:Envelope>"#,
        );
        assert!(locate(&doc).unwrap().header.is_none());
    }

    #[test]
    fn missing_body_is_malformed() {
        let doc = parse(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Header/></s:Envelope>"#,
        );
        assert!(matches!(locate(&doc), Err(Error::MalformedEnvelope(_))));
    }

    #[test]
    fn wrong_root_namespace_is_malformed() {
        let doc = parse(r#"<Envelope><Body/></Envelope>"#);
        assert!(matches!(locate(&doc), Err(Error::MalformedEnvelope(_))));
    }

    #[test]
    fn body_outside_soap_namespace_does_not_count() {
        let doc = parse(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><Body/></s:Envelope>"#,
        );
        assert!(matches!(locate(&doc), Err(Error::MalformedEnvelope(_))));
    }
}
