#![forbid(unsafe_code)]

//! BinarySecurityToken construction and identifier generation.

use base64::Engine;
use sigtuna_core::ns;

use crate::credential::SigningCredential;

/// A built `wsse:BinarySecurityToken` fragment and its `wsu:Id`.
///
/// The fragment uses the `wsse` and `wsu` prefixes without declaring them;
/// the `wsse:Security` wrapper it is attached under binds both. Tokens are
/// single-use: one is built per signing pass and never reused across
/// messages.
pub struct BinarySecurityToken {
    /// The generated `wsu:Id` value (`X509-` + 32 hex chars).
    pub id: String,
    /// The serialized element.
    pub xml: String,
}

impl BinarySecurityToken {
    /// Build a token carrying the credential's DER certificate,
    /// base64-encoded. Pure construction; nothing is attached to any
    /// document.
    pub fn build(credential: &SigningCredential) -> Self {
        let id = fresh_id("X509-");
        let cert_b64 = base64::engine::general_purpose::STANDARD.encode(credential.cert_der());
        let xml = format!(
            r#"<wsse:BinarySecurityToken EncodingType="{encoding}" ValueType="{value}" wsu:Id="{id}">{cert_b64}</wsse:BinarySecurityToken>"#,
            encoding = ns::BASE64_ENCODING_TYPE,
            value = ns::X509V3_VALUE_TYPE,
        );
        Self { id, xml }
    }
}

/// Generate a document identifier: `prefix` + 32 lowercase hex characters.
///
/// 128 bits of randomness; collision-resistant within a document without
/// needing any uniqueness bookkeeping.
pub fn fresh_id(prefix: &str) -> String {
    format!("{prefix}{:032x}", rand::random::<u128>())
}
