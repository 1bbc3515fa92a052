#![forbid(unsafe_code)]

/// Errors produced by the Sigtuna WS-Security library.
///
/// Every variant is fatal for the request being signed: the caller must
/// not dispatch the original, unsigned envelope when signing fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("envelope has no Header to host the Security element")]
    MissingHeader,

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
