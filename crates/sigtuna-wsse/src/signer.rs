#![forbid(unsafe_code)]

//! The signature builder: turn an envelope into a signed envelope.
//!
//! The pass is a sequence of pure construction steps over the envelope
//! text, with two splices into it: the Body gets its `Id`/`wsu:Id` pair,
//! and the finished `wsse:Security` block lands in the Header. Everything
//! between the splices (canonicalization, digest, SignedInfo, RSA
//! signature) is computed from standalone fragments, so no intermediate
//! tree state leaks into the output. Whitespace outside the splices is
//! preserved byte-for-byte; the signed Body therefore canonicalizes to
//! exactly the bytes that were digested.

use base64::Engine;
use sigtuna_c14n::C14nMode;
use sigtuna_core::{algorithm, ns, Error, Result};
use sigtuna_xml::{document, span, NodeSet};

use crate::credential::SigningCredential;
use crate::envelope::{self, EnvelopeParts};
use crate::token::{self, BinarySecurityToken};

/// The signature and digest algorithm pair used for the XML signature.
///
/// RSA-SHA1 is kept for legacy WS-Security peers; everything else should
/// use the SHA-2 suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureSuite {
    RsaSha1,
    #[default]
    RsaSha256,
    RsaSha384,
    RsaSha512,
}

impl SignatureSuite {
    /// XML-DSig SignatureMethod algorithm URI.
    pub fn signature_uri(&self) -> &'static str {
        match self {
            Self::RsaSha1 => algorithm::RSA_SHA1,
            Self::RsaSha256 => algorithm::RSA_SHA256,
            Self::RsaSha384 => algorithm::RSA_SHA384,
            Self::RsaSha512 => algorithm::RSA_SHA512,
        }
    }

    /// XML-DSig DigestMethod algorithm URI.
    pub fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha1 => algorithm::SHA1,
            Self::RsaSha256 => algorithm::SHA256,
            Self::RsaSha384 => algorithm::SHA384,
            Self::RsaSha512 => algorithm::SHA512,
        }
    }
}

/// What to do when the envelope has no Header to host the Security block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Create a Header as the first child of the Envelope.
    #[default]
    Create,
    /// Fail with [`Error::MissingHeader`].
    Require,
}

/// Options for a signing pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigningOptions {
    pub suite: SignatureSuite,
    pub header: HeaderPolicy,
}

/// Sign a serialized SOAP 1.1 envelope.
///
/// Returns the new envelope text with the Body identified and digested, a
/// BinarySecurityToken carrying the credential's certificate, and an XML
/// signature over the Body whose KeyInfo points at the token. On any
/// error nothing is returned; the caller must not send the unsigned
/// original.
pub fn sign_envelope(
    text: &str,
    credential: &SigningCredential,
    options: &SigningOptions,
) -> Result<String> {
    let doc = parse(text)?;
    let parts = envelope::locate(&doc)?;

    if let Some(header) = parts.header {
        if document::find_child(header, ns::WSSE, ns::node::SECURITY).is_some() {
            return Err(Error::XmlStructure(
                "envelope already carries a Security header".into(),
            ));
        }
    } else if options.header == HeaderPolicy::Require {
        return Err(Error::MissingHeader);
    }

    // Give the Body its identity, resolvable both by namespace-naive
    // (unqualified Id) and namespace-aware (wsu:Id) reference lookups.
    let body_id = token::fresh_id("id-");
    let with_ids = splice_body_ids(text, parts.body, &body_id)?;

    // Digest the canonical Body subtree as it will appear in the output.
    let doc = parse(&with_ids)?;
    let parts = envelope::locate(&doc)?;
    let body_set = NodeSet::tree_without_comments(parts.body);
    let body_c14n = sigtuna_c14n::canonicalize_doc(
        &doc,
        &with_ids,
        C14nMode::Exclusive,
        Some(&body_set),
        &[],
    )?;
    let digest = sigtuna_crypto::digest(options.suite.digest_uri(), &body_c14n)?;
    let digest_b64 = base64::engine::general_purpose::STANDARD.encode(digest);

    let bst = BinarySecurityToken::build(credential);
    let signed_info = build_signed_info(options.suite, &body_id, &digest_b64);
    let signed_info_c14n = canonicalize_signed_info(&signed_info)?;
    let signature = credential.sign(options.suite.signature_uri(), &signed_info_c14n)?;
    let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature);

    let security = build_security_block(&bst, &signed_info, &signature_b64);
    let signed = attach_security(&with_ids, &parts, &security, options.header)?;

    tracing::debug!(
        suite = ?options.suite,
        body_id = %body_id,
        token_id = %bst.id,
        "signed SOAP envelope"
    );
    Ok(signed)
}

fn parse(text: &str) -> Result<roxmltree::Document<'_>> {
    roxmltree::Document::parse_with_options(text, sigtuna_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

/// Splice `Id` and `wsu:Id` (and, when needed, the wsu namespace
/// declaration) into the Body start tag.
fn splice_body_ids(text: &str, body: roxmltree::Node<'_, '_>, body_id: &str) -> Result<String> {
    if body.attribute(ns::attr::ID).is_some()
        || body.attribute("ID").is_some()
        || body.attribute("id").is_some()
        || body.attribute((ns::WSU, ns::attr::ID)).is_some()
    {
        return Err(Error::XmlStructure(
            "Body already carries an Id attribute".into(),
        ));
    }

    let tag = span::start_tag(text, body.range().start)?;

    let mut wsu_prefix: Option<String> = None;
    for decl in body.namespaces() {
        if decl.uri() == ns::WSU {
            if let Some(prefix) = decl.name() {
                if !prefix.is_empty() {
                    wsu_prefix = Some(prefix.to_owned());
                    break;
                }
            }
        }
    }
    let (wsu_prefix, ns_decl) = match wsu_prefix {
        Some(prefix) => (prefix, String::new()),
        None => {
            if tag.attr("xmlns:wsu").is_some() {
                return Err(Error::XmlStructure(
                    "Body binds the wsu prefix to a different namespace".into(),
                ));
            }
            ("wsu".to_owned(), format!(r#" xmlns:wsu="{}""#, ns::WSU))
        }
    };

    let insertion = format!(r#"{ns_decl} Id="{body_id}" {wsu_prefix}:Id="{body_id}""#);
    let mut out = String::with_capacity(text.len() + insertion.len());
    out.push_str(&text[..tag.attr_insert]);
    out.push_str(&insertion);
    out.push_str(&text[tag.attr_insert..]);
    Ok(out)
}

/// Build the `ds:SignedInfo` fragment.
///
/// One reference, `#bodyId`, with a single exclusive-C14N transform. The
/// enveloped-signature transform is deliberately absent: the reference
/// targets the Body, which never contains the signature.
fn build_signed_info(suite: SignatureSuite, body_id: &str, digest_b64: &str) -> String {
    format!(
        "<ds:SignedInfo>\
         <ds:CanonicalizationMethod Algorithm=\"{c14n}\"></ds:CanonicalizationMethod>\
         <ds:SignatureMethod Algorithm=\"{sig}\"></ds:SignatureMethod>\
         <ds:Reference URI=\"#{body_id}\">\
         <ds:Transforms>\
         <ds:Transform Algorithm=\"{c14n}\"></ds:Transform>\
         </ds:Transforms>\
         <ds:DigestMethod Algorithm=\"{dig}\"></ds:DigestMethod>\
         <ds:DigestValue>{digest_b64}</ds:DigestValue>\
         </ds:Reference>\
         </ds:SignedInfo>",
        c14n = algorithm::EXC_C14N,
        sig = suite.signature_uri(),
        dig = suite.digest_uri(),
    )
}

/// Canonicalize the SignedInfo fragment as it will canonicalize inside the
/// final document.
///
/// Exclusive C14N renders the `ds` declaration on SignedInfo from the
/// nearest in-scope binding, which in both the fragment and the final
/// document is the enclosing `ds:Signature`; the two canonical forms are
/// identical.
fn canonicalize_signed_info(signed_info: &str) -> Result<Vec<u8>> {
    let wrapped = format!(
        r#"<ds:Signature xmlns:ds="{}">{}</ds:Signature>"#,
        ns::DSIG,
        signed_info
    );
    let doc = parse(&wrapped)?;
    let si = document::find_element(&doc, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::XmlStructure("SignedInfo fragment did not parse".into()))?;
    let set = NodeSet::tree_without_comments(si);
    sigtuna_c14n::canonicalize_doc(&doc, &wrapped, C14nMode::Exclusive, Some(&set), &[])
}

/// Assemble the complete `wsse:Security` block: the token first, then the
/// signature with its SecurityTokenReference KeyInfo.
fn build_security_block(
    bst: &BinarySecurityToken,
    signed_info: &str,
    signature_b64: &str,
) -> String {
    format!(
        "<wsse:Security xmlns:wsse=\"{wsse}\" xmlns:wsu=\"{wsu}\">\
         {token}\
         <ds:Signature xmlns:ds=\"{dsig}\">\
         {signed_info}\
         <ds:SignatureValue>{signature_b64}</ds:SignatureValue>\
         <ds:KeyInfo>\
         <wsse:SecurityTokenReference>\
         <wsse:Reference URI=\"#{token_id}\" ValueType=\"{x509}\"></wsse:Reference>\
         </wsse:SecurityTokenReference>\
         </ds:KeyInfo>\
         </ds:Signature>\
         </wsse:Security>",
        wsse = ns::WSSE,
        wsu = ns::WSU,
        dsig = ns::DSIG,
        token = bst.xml,
        token_id = bst.id,
        x509 = ns::X509V3_VALUE_TYPE,
    )
}

/// Splice the Security block into the Header, creating the Header when the
/// policy allows and none exists.
fn attach_security(
    source: &str,
    parts: &EnvelopeParts<'_>,
    security: &str,
    policy: HeaderPolicy,
) -> Result<String> {
    match parts.header {
        Some(header) => {
            let tag = span::start_tag(source, header.range().start)?;
            if tag.self_closing {
                // Expand <Header/> into an open/close pair around the block.
                let mut out = String::with_capacity(source.len() + security.len() + 16);
                out.push_str(&source[..header.range().start]);
                out.push_str(&source[header.range().start..tag.attr_insert]);
                out.push('>');
                out.push_str(security);
                out.push_str("</");
                out.push_str(tag.qname);
                out.push('>');
                out.push_str(&source[tag.tag_end..]);
                Ok(out)
            } else {
                let pos = span::end_tag_offset(source, header.range()).ok_or_else(|| {
                    Error::XmlStructure("Header element has no end tag".into())
                })?;
                let mut out = String::with_capacity(source.len() + security.len());
                out.push_str(&source[..pos]);
                out.push_str(security);
                out.push_str(&source[pos..]);
                Ok(out)
            }
        }
        None => {
            if policy == HeaderPolicy::Require {
                return Err(Error::MissingHeader);
            }
            let env_tag = span::start_tag(source, parts.envelope.range().start)?;
            let qname = if env_tag.prefix().is_empty() {
                ns::node::HEADER.to_owned()
            } else {
                format!("{}:{}", env_tag.prefix(), ns::node::HEADER)
            };
            let mut out = String::with_capacity(source.len() + security.len() + 32);
            out.push_str(&source[..env_tag.tag_end]);
            out.push('<');
            out.push_str(&qname);
            out.push('>');
            out.push_str(security);
            out.push_str("</");
            out.push_str(&qname);
            out.push('>');
            out.push_str(&source[env_tag.tag_end..]);
            Ok(out)
        }
    }
}
