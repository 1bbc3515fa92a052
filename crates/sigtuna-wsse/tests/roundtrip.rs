//! End-to-end: sign an envelope, then verify the signature independently
//! using only what a WS-Security consumer sees in the output — the Body
//! bytes, the SignedInfo bytes, and the certificate embedded in the
//! BinarySecurityToken.

use base64::Engine;
use sigtuna_c14n::C14nMode;
use sigtuna_core::{algorithm, ns};
use sigtuna_crypto::sign::{self, SigningKey};
use sigtuna_wsse::credential::certificate_public_key;
use sigtuna_wsse::{
    sign_envelope, HeaderPolicy, SignatureSuite, SigningCredential, SigningOptions,
};
use sigtuna_xml::{document, NodeSet};

const CERT_PEM: &str = include_str!("../testdata/cert.pem");
const KEY_PEM: &str = include_str!("../testdata/key.pem");

const ENVELOPE: &str = "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\n  <soapenv:Header></soapenv:Header>\n  <soapenv:Body>\n    <ns:GetQuote xmlns:ns=\"urn:example:quotes\">\n      <ns:Symbol>SIGT</ns:Symbol>\n    </ns:GetQuote>\n  </soapenv:Body>\n</soapenv:Envelope>";

fn credential() -> SigningCredential {
    SigningCredential::from_pem(CERT_PEM, KEY_PEM).unwrap()
}

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Re-verify a signed envelope the way an independent consumer would:
/// recompute the Body digest over the canonical subtree, canonicalize
/// SignedInfo, and check the RSA signature against the public key of the
/// certificate decoded out of the BinarySecurityToken.
fn verify_signed_envelope(signed: &str) {
    let doc =
        roxmltree::Document::parse_with_options(signed, sigtuna_xml::parsing_options()).unwrap();

    // Resolve the reference target through the same-document id.
    let reference = document::find_element(&doc, ns::DSIG, ns::node::REFERENCE).unwrap();
    let uri = reference.attribute(ns::attr::URI).unwrap();
    let target_id = document::same_document_ref(uri).unwrap();
    let id_map = document::build_id_map(&doc, &[(ns::WSU, ns::attr::ID)]);
    let body = document::find_by_id(&doc, &id_map, target_id).unwrap();
    assert_eq!(body.tag_name().name(), ns::node::BODY);

    // Recompute the digest over the canonical Body subtree.
    let digest_uri = document::find_element(&doc, ns::DSIG, ns::node::DIGEST_METHOD)
        .unwrap()
        .attribute(ns::attr::ALGORITHM)
        .unwrap();
    let body_set = NodeSet::tree_without_comments(body);
    let body_c14n =
        sigtuna_c14n::canonicalize_doc(&doc, signed, C14nMode::Exclusive, Some(&body_set), &[])
            .unwrap();
    let expected_digest = b64().encode(sigtuna_crypto::digest(digest_uri, &body_c14n).unwrap());
    let digest_value = document::find_element(&doc, ns::DSIG, ns::node::DIGEST_VALUE)
        .unwrap()
        .text()
        .unwrap();
    assert_eq!(digest_value, expected_digest);

    // Pull the verification key out of the embedded token.
    let bst = document::find_element(&doc, ns::WSSE, ns::node::BINARY_SECURITY_TOKEN).unwrap();
    let cert_der = b64().decode(bst.text().unwrap()).unwrap();
    let public_key = certificate_public_key(&cert_der).unwrap();

    // Verify the signature over canonical SignedInfo.
    let signed_info = document::find_element(&doc, ns::DSIG, ns::node::SIGNED_INFO).unwrap();
    let si_set = NodeSet::tree_without_comments(signed_info);
    let si_c14n =
        sigtuna_c14n::canonicalize_doc(&doc, signed, C14nMode::Exclusive, Some(&si_set), &[])
            .unwrap();
    let signature_uri = document::find_element(&doc, ns::DSIG, ns::node::SIGNATURE_METHOD)
        .unwrap()
        .attribute(ns::attr::ALGORITHM)
        .unwrap();
    let signature = b64()
        .decode(
            document::find_element(&doc, ns::DSIG, ns::node::SIGNATURE_VALUE)
                .unwrap()
                .text()
                .unwrap(),
        )
        .unwrap();
    let alg = sign::from_uri(signature_uri).unwrap();
    assert!(alg
        .verify(&SigningKey::RsaPublic(public_key), &si_c14n, &signature)
        .unwrap());
}

#[test]
fn signed_envelope_verifies_with_default_suite() {
    let signed = sign_envelope(ENVELOPE, &credential(), &SigningOptions::default()).unwrap();
    verify_signed_envelope(&signed);
}

#[test]
fn signed_envelope_verifies_with_legacy_rsa_sha1() {
    let options = SigningOptions {
        suite: SignatureSuite::RsaSha1,
        ..Default::default()
    };
    let signed = sign_envelope(ENVELOPE, &credential(), &options).unwrap();
    let doc =
        roxmltree::Document::parse_with_options(&signed, sigtuna_xml::parsing_options()).unwrap();
    let method = document::find_element(&doc, ns::DSIG, ns::node::SIGNATURE_METHOD).unwrap();
    assert_eq!(method.attribute(ns::attr::ALGORITHM), Some(algorithm::RSA_SHA1));
    verify_signed_envelope(&signed);
}

#[test]
fn signed_envelope_verifies_with_rsa_sha512() {
    let options = SigningOptions {
        suite: SignatureSuite::RsaSha512,
        ..Default::default()
    };
    let signed = sign_envelope(ENVELOPE, &credential(), &options).unwrap();
    verify_signed_envelope(&signed);
}

#[test]
fn created_header_envelope_still_verifies() {
    let headerless = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><op/></s:Body></s:Envelope>"#;
    let options = SigningOptions {
        header: HeaderPolicy::Create,
        ..Default::default()
    };
    let signed = sign_envelope(headerless, &credential(), &options).unwrap();
    verify_signed_envelope(&signed);
}

#[test]
fn token_content_is_the_exact_certificate() {
    let cred = credential();
    let signed = sign_envelope(ENVELOPE, &cred, &SigningOptions::default()).unwrap();
    let doc =
        roxmltree::Document::parse_with_options(&signed, sigtuna_xml::parsing_options()).unwrap();
    let bst = document::find_element(&doc, ns::WSSE, ns::node::BINARY_SECURITY_TOKEN).unwrap();
    assert_eq!(
        bst.attribute(ns::attr::ENCODING_TYPE),
        Some(ns::BASE64_ENCODING_TYPE)
    );
    let decoded = b64().decode(bst.text().unwrap()).unwrap();
    assert_eq!(decoded, cred.cert_der());
}

#[test]
fn two_passes_use_fresh_identifiers_and_both_verify() {
    let cred = credential();
    let first = sign_envelope(ENVELOPE, &cred, &SigningOptions::default()).unwrap();
    let second = sign_envelope(ENVELOPE, &cred, &SigningOptions::default()).unwrap();
    assert_ne!(first, second);

    let id_of = |text: &str| {
        let doc =
            roxmltree::Document::parse_with_options(text, sigtuna_xml::parsing_options()).unwrap();
        let body = document::find_element(&doc, ns::SOAP, ns::node::BODY).unwrap();
        body.attribute(ns::attr::ID).unwrap().to_owned()
    };
    assert_ne!(id_of(&first), id_of(&second));

    verify_signed_envelope(&first);
    verify_signed_envelope(&second);
}
