//! URL handling: canonical identity, authority globs, and skip patterns
//!
//! This module provides:
//! - Canonicalization rules that give every destination a stable identity
//! - Authority pattern matching for classifying URLs as internal/external
//! - Skip patterns that exclude whole URL families from the crawl

mod canonical;
mod glob;
mod skipper;

pub use canonical::{authority_of, canonicalize};
pub use glob::UriGlob;
pub use skipper::UrlSkipper;
