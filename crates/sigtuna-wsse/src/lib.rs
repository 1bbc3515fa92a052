#![forbid(unsafe_code)]

//! WS-Security BinarySecurityToken signing for outbound SOAP envelopes.
//!
//! Given a serialized SOAP 1.1 envelope and an X.509 certificate with its
//! RSA private key, this crate embeds the certificate as a
//! `wsse:BinarySecurityToken`, signs the Body with an XML signature whose
//! KeyInfo points back at the token through a `wsse:SecurityTokenReference`,
//! and returns the envelope with a `wsse:Security` header added. All
//! whitespace outside the edits is preserved byte-for-byte, so the signed
//! Body canonicalizes to exactly what was digested.
//!
//! The usual entry point is [`SigningHook`], to be called from a transport
//! layer just before a request is sent:
//!
//! ```no_run
//! use sigtuna_wsse::{SigningCredential, SigningHook};
//!
//! # fn main() -> Result<(), sigtuna_core::Error> {
//! let cert_pem = std::fs::read_to_string("cert.pem")?;
//! let key_pem = std::fs::read_to_string("key.pem")?;
//! let credential = SigningCredential::from_pem(&cert_pem, &key_pem)?;
//! let hook = SigningHook::new(credential);
//!
//! let signed = hook.process_request("<soapenv:Envelope>...</soapenv:Envelope>")?;
//! # Ok(())
//! # }
//! ```

pub mod credential;
pub mod envelope;
pub mod hook;
pub mod signer;
pub mod token;

pub use credential::SigningCredential;
pub use hook::SigningHook;
pub use signer::{sign_envelope, HeaderPolicy, SignatureSuite, SigningOptions};
pub use token::BinarySecurityToken;
