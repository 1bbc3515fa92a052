#![forbid(unsafe_code)]

//! Sign outbound SOAP envelopes with the WS-Security
//! BinarySecurityToken profile.

pub use sigtuna_core as core;
pub use sigtuna_xml as xml;
pub use sigtuna_c14n as c14n;
pub use sigtuna_crypto as crypto;
pub use sigtuna_wsse as wsse;

pub use sigtuna_core::{Error, Result};
pub use sigtuna_wsse::{
    sign_envelope, HeaderPolicy, SignatureSuite, SigningCredential, SigningHook, SigningOptions,
};
