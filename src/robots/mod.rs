//! robots.txt support
//!
//! This module wraps the robotstxt crate behind the `Bouncer` type: a
//! per-host predicate over paths, plus Crawl-delay extraction.

mod bouncer;

pub use bouncer::Bouncer;
