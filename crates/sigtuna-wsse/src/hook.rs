#![forbid(unsafe_code)]

//! Request interception: the transport-facing surface.

use sigtuna_core::Result;

use crate::credential::SigningCredential;
use crate::signer::{self, SigningOptions};

/// Signs outgoing request bodies before the transport sends them.
///
/// The only contract with the surrounding client is "intercept before
/// send, replace the body": call [`process_request`](Self::process_request)
/// with the serialized envelope and send what it returns. On error the
/// request must be aborted; the unsigned body must never go out.
#[derive(Debug)]
pub struct SigningHook {
    credential: SigningCredential,
    options: SigningOptions,
}

impl SigningHook {
    /// A hook with the default options (RSA-SHA256, create Header on
    /// demand).
    pub fn new(credential: SigningCredential) -> Self {
        Self::with_options(credential, SigningOptions::default())
    }

    pub fn with_options(credential: SigningCredential, options: SigningOptions) -> Self {
        Self {
            credential,
            options,
        }
    }

    /// Sign a request body, returning the replacement body.
    pub fn process_request(&self, body: &str) -> Result<String> {
        tracing::debug!(bytes = body.len(), "signing outbound SOAP request");
        signer::sign_envelope(body, &self.credential, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{HeaderPolicy, SignatureSuite};
    use sigtuna_core::Error;

    fn hook() -> SigningHook {
        let credential = SigningCredential::from_pem(
            include_str!("../testdata/cert.pem"),
            include_str!("../testdata/key.pem"),
        )
        .unwrap();
        SigningHook::new(credential)
    }

    #[test]
    fn replaces_the_body_with_a_signed_envelope() {
        let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Header/><s:Body><op/></s:Body></s:Envelope>"#;
        let signed = hook().process_request(body).unwrap();
        assert_ne!(signed, body);
        assert!(signed.contains("<wsse:Security"));
    }

    #[test]
    fn non_xml_body_is_an_error() {
        assert!(matches!(
            hook().process_request("this is not xml"),
            Err(Error::XmlParse(_))
        ));
    }

    #[test]
    fn options_are_honored() {
        let credential = SigningCredential::from_pem(
            include_str!("../testdata/cert.pem"),
            include_str!("../testdata/key.pem"),
        )
        .unwrap();
        let hook = SigningHook::with_options(
            credential,
            SigningOptions {
                suite: SignatureSuite::RsaSha1,
                header: HeaderPolicy::Require,
            },
        );
        let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><op/></s:Body></s:Envelope>"#;
        assert!(matches!(
            hook.process_request(body),
            Err(Error::MissingHeader)
        ));
    }
}
