use crate::UrlError;

use super::glob::glob_match;

/// Pattern-based predicate that excludes URLs from the crawl entirely
///
/// Patterns are globs matched against the full URL string, including the
/// fragment (so `*#draft*` works). A skipped link is still recorded in the
/// crawl result, but no destination is created for its target.
#[derive(Debug, Clone, Default)]
pub struct UrlSkipper {
    patterns: Vec<String>,
}

impl UrlSkipper {
    /// Builds a skipper from a list of glob patterns
    ///
    /// # Arguments
    ///
    /// * `patterns` - Glob patterns over full URL strings, e.g. `*/ignore*`
    ///
    /// # Returns
    ///
    /// * `Ok(UrlSkipper)` - Compiled skipper
    /// * `Err(UrlError)` - A pattern was empty
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, UrlError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                return Err(UrlError::EmptyPattern);
            }
            compiled.push(pattern.to_string());
        }
        Ok(Self { patterns: compiled })
    }

    /// A skipper that skips nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if any pattern matches the URL
    pub fn skips(&self, url: &str) -> bool {
        self.explain(url).is_some()
    }

    /// Returns the first pattern that matches the URL, if any
    ///
    /// Used for diagnostics: verbose output names the pattern responsible
    /// for each skipped link.
    pub fn explain(&self, url: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| glob_match(pattern, url))
            .map(String::as_str)
    }
}
