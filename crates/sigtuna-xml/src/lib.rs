#![forbid(unsafe_code)]

//! XML building blocks for the Sigtuna WS-Security library.
//!
//! `roxmltree` gives us a read-only tree plus byte ranges back into the
//! original text. Lookup and node-set selection live in [`document`] and
//! [`nodeset`]; [`span`] handles the text-level surgery (scanning start
//! tags, computing splice offsets) that lets the signer mutate an envelope
//! without re-serializing it.

pub mod document;
pub mod nodeset;
pub mod span;

pub use nodeset::NodeSet;

/// Return roxmltree parsing options that allow a DTD.
///
/// roxmltree never expands external entities and only substitutes the five
/// predefined XML entities, so accepting a DTD does not open an entity
/// expansion hole. Some SOAP toolkits emit a harmless internal subset.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
