#![forbid(unsafe_code)]

//! Digest and signature primitives for XML signature computation.
//!
//! Everything is selected by XML-DSig algorithm URI so the layer above can
//! stay free of crypto crate types.

pub mod digest;
pub mod sign;

pub use digest::{digest, DigestAlgorithm};
pub use sign::{SignatureAlgorithm, SigningKey};
