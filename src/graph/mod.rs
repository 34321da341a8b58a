//! The link graph produced by a crawl
//!
//! This module defines:
//! - Destinations: URLs with their discovered attributes and outcomes
//! - Links: directed edges between destinations, with anchor context
//! - The immutable crawl result handed back to callers

mod destination;
mod link;

pub use destination::Destination;
pub use link::Link;

/// Immutable outcome of a crawl
///
/// `destinations` holds every closed destination; `links` holds every
/// discovered link (including skipped ones), each retargeted to the
/// canonical destination for its URL where one exists.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub links: Vec<Link>,
    pub destinations: Vec<Destination>,
}

impl CrawlResult {
    /// Iterates over destinations whose check failed
    pub fn broken_destinations(&self) -> impl Iterator<Item = &Destination> {
        self.destinations
            .iter()
            .filter(|d| d.is_broken || d.did_not_connect)
    }
}
