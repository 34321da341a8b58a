use crate::url::authority_of;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// A URL (fragment stripped) with its discovered attributes and outcome
///
/// Identity is the canonical URL string: two destinations are equal exactly
/// when their canonical URLs are equal, regardless of how far each has
/// progressed through the crawl.
///
/// Unparseable hrefs still become destinations (with `is_invalid` set) so
/// that links can point at them in the final report; they are never placed
/// in a queue.
#[derive(Debug, Clone)]
pub struct Destination {
    /// Canonical URL: scheme + authority + path + query, no fragment.
    /// For invalid destinations this is the raw href.
    url: String,

    /// Parsed form; None when the URL is invalid or its scheme unsupported
    uri: Option<Url>,

    /// `host` or `host:port`; empty when `uri` is None
    authority: String,

    /// The destination was given as an input seed
    pub is_seed: bool,

    /// The destination was a page links were extracted from, not just a
    /// link target
    pub is_source: bool,

    /// The destination's authority matches no configured host pattern
    pub is_external: bool,

    /// The href could not be parsed as a URL
    pub is_invalid: bool,

    /// The URL parsed but its scheme is not http/https
    pub is_unsupported_scheme: bool,

    /// A skip pattern matched; the destination was never queued
    pub was_skipped: bool,

    /// The destination's host could not be connected to
    pub did_not_connect: bool,

    /// robots.txt on the destination's host disallows its path
    pub was_denied_by_robots_txt: bool,

    /// A fetch was actually attempted
    pub was_tried: bool,

    /// HTTP status code of the response, when one arrived
    pub status_code: Option<u16>,

    /// Final URL after redirects
    pub final_url: Option<String>,

    /// Content-Type header of the response
    pub content_type: Option<String>,

    /// Human-readable outcome: status reason phrase or error description
    pub status_description: Option<String>,

    /// The check failed: non-success status or transport error
    pub is_broken: bool,
}

impl Destination {
    fn blank(url: String, uri: Option<Url>) -> Self {
        let authority = uri.as_ref().map(authority_of).unwrap_or_default();
        Self {
            url,
            uri,
            authority,
            is_seed: false,
            is_source: false,
            is_external: false,
            is_invalid: false,
            is_unsupported_scheme: false,
            was_skipped: false,
            did_not_connect: false,
            was_denied_by_robots_txt: false,
            was_tried: false,
            status_code: None,
            final_url: None,
            content_type: None,
            status_description: None,
            is_broken: false,
        }
    }

    /// Creates a destination for a seed URL
    ///
    /// Seeds are sources: links will be extracted from them.
    pub fn seed(mut uri: Url) -> Self {
        uri.set_fragment(None);
        let mut destination = Self::blank(uri.to_string(), Some(uri));
        destination.is_seed = true;
        destination.is_source = true;
        destination
    }

    /// Creates a destination for a discovered href
    ///
    /// The href must already be absolute (relative hrefs are resolved at
    /// extraction time). The fragment is stripped; unparseable hrefs yield
    /// an `is_invalid` destination, parseable non-http(s) ones an
    /// `is_unsupported_scheme` destination.
    pub fn discovered(raw: &str) -> Self {
        let raw = raw.trim();
        match Url::parse(raw) {
            Ok(mut uri) => {
                uri.set_fragment(None);
                if uri.scheme() == "http" || uri.scheme() == "https" {
                    Self::blank(uri.to_string(), Some(uri))
                } else {
                    let mut destination = Self::blank(uri.to_string(), None);
                    destination.is_unsupported_scheme = true;
                    destination
                }
            }
            Err(_) => {
                let mut destination = Self::blank(raw.to_string(), None);
                destination.is_invalid = true;
                destination
            }
        }
    }

    /// The canonical URL string (identity)
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The parsed URL, when the destination is valid and http(s)
    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    /// The authority (`host` or `host:port`); empty for invalid or
    /// unsupported-scheme destinations
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path plus query string, as checked against robots.txt
    pub fn path_and_query(&self) -> String {
        match &self.uri {
            Some(uri) => match uri.query() {
                Some(query) => format!("{}?{}", uri.path(), query),
                None => uri.path().to_string(),
            },
            None => String::new(),
        }
    }

    /// Copies the result fields from a worker-checked copy onto this one
    pub fn apply_result(&mut self, checked: &Destination) {
        self.was_tried = checked.was_tried;
        self.is_source = checked.is_source;
        self.did_not_connect = checked.did_not_connect;
        self.status_code = checked.status_code;
        self.final_url = checked.final_url.clone();
        self.content_type = checked.content_type.clone();
        self.status_description = checked.status_description.clone();
        self.is_broken = checked.is_broken;
    }
}

impl PartialEq for Destination {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Destination {}

impl Hash for Destination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed() {
        let uri = Url::parse("https://example.com/").unwrap();
        let destination = Destination::seed(uri);
        assert!(destination.is_seed);
        assert!(destination.is_source);
        assert!(!destination.is_external);
        assert_eq!(destination.url(), "https://example.com/");
        assert_eq!(destination.authority(), "example.com");
    }

    #[test]
    fn test_discovered_strips_fragment() {
        let destination = Destination::discovered("https://example.com/page#section");
        assert_eq!(destination.url(), "https://example.com/page");
        assert!(!destination.is_invalid);
        assert!(!destination.is_unsupported_scheme);
    }

    #[test]
    fn test_discovered_invalid() {
        let destination = Destination::discovered(":::not-a-url");
        assert!(destination.is_invalid);
        assert!(destination.uri().is_none());
        assert_eq!(destination.authority(), "");
        assert_eq!(destination.url(), ":::not-a-url");
    }

    #[test]
    fn test_discovered_unsupported_scheme() {
        let destination = Destination::discovered("mailto:someone@example.com");
        assert!(destination.is_unsupported_scheme);
        assert!(!destination.is_invalid);
        assert!(destination.uri().is_none());

        let destination = Destination::discovered("ftp://example.com/file");
        assert!(destination.is_unsupported_scheme);
    }

    #[test]
    fn test_equality_by_url() {
        let a = Destination::discovered("https://example.com/page");
        let mut b = Destination::discovered("https://example.com/page#other");
        b.was_tried = true;
        b.is_broken = true;
        assert_eq!(a, b);

        let c = Destination::discovered("https://example.com/page2");
        assert_ne!(a, c);
    }

    #[test]
    fn test_path_and_query() {
        let destination = Destination::discovered("https://example.com/search?q=1");
        assert_eq!(destination.path_and_query(), "/search?q=1");

        let destination = Destination::discovered("https://example.com/page");
        assert_eq!(destination.path_and_query(), "/page");
    }

    #[test]
    fn test_apply_result() {
        let mut local = Destination::discovered("https://example.com/page");
        let mut checked = local.clone();
        checked.was_tried = true;
        checked.is_source = true;
        checked.status_code = Some(404);
        checked.status_description = Some("Not Found".to_string());
        checked.is_broken = true;

        local.apply_result(&checked);
        assert!(local.was_tried);
        assert!(local.is_source);
        assert_eq!(local.status_code, Some(404));
        assert!(local.is_broken);
    }
}
