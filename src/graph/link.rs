use super::Destination;
use std::fmt;

/// A directed edge from one destination to another, with anchor context
///
/// The target fragment is kept separately from the target destination
/// (whose identity has the fragment stripped) so skip patterns can match
/// the URL as it appeared in the page.
#[derive(Debug, Clone)]
pub struct Link {
    /// Canonical URL of the page the link was found on
    pub origin_url: String,

    /// Anchor text, or other context identifying the link in the page
    pub anchor: String,

    /// Fragment of the target href, when it had one
    pub fragment: Option<String>,

    /// The link's target; retargeted to the canonical destination for its
    /// URL when the crawl finishes
    pub target: Destination,

    /// A skip pattern matched the target; no destination was queued for it
    pub was_skipped: bool,
}

impl Link {
    pub fn new(
        origin_url: String,
        anchor: String,
        target: Destination,
        fragment: Option<String>,
    ) -> Self {
        Self {
            origin_url,
            anchor,
            fragment,
            target,
            was_skipped: false,
        }
    }

    /// The target URL as it appeared in the page, fragment included
    pub fn target_url_with_fragment(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{}#{}", self.target.url(), fragment),
            None => self.target.url().to_string(),
        }
    }

    /// True if following this link would hit a failing destination
    pub fn is_broken(&self) -> bool {
        !self.was_skipped && (self.target.is_broken || self.target.did_not_connect)
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.origin_url == other.origin_url
            && self.anchor == other.anchor
            && self.target.url() == other.target.url()
    }
}

impl Eq for Link {}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin_url, self.target_url_with_fragment())
    }
}
