#![forbid(unsafe_code)]

//! Shared pieces of the Sigtuna WS-Security library: the error type plus
//! the namespace and algorithm URI constants.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
