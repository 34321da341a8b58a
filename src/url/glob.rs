use crate::UrlError;
use url::Url;

use super::canonical::authority_of;

/// Matches a glob pattern against a text, where `*` matches any run of
/// characters (including none)
///
/// Matching is case-sensitive; callers lowercase both sides where needed.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut p = 0;
    let mut t = 0;
    // Position of the last `*` seen, and where its match currently ends.
    let mut star: Option<usize> = None;
    let mut star_text = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_text = t;
            p += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last `*` swallow one more character.
            p = s + 1;
            star_text += 1;
            t = star_text;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

/// A host/authority pattern for classifying URLs as internal
///
/// Supported forms:
/// - Exact match: `example.com` matches only `example.com`
/// - Subdomain wildcard: `*.example.com` matches `example.com`,
///   `blog.example.com`, `api.v2.example.com`
/// - General globs: `localhost:*`, `127.0.0.1:*`
///
/// Patterns are matched against the URL authority (`host` or `host:port`).
#[derive(Debug, Clone)]
pub struct UriGlob {
    pattern: String,
}

impl UriGlob {
    /// Compiles a pattern, rejecting empty ones
    pub fn new(pattern: &str) -> Result<Self, UrlError> {
        let pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() {
            return Err(UrlError::EmptyPattern);
        }
        Ok(Self { pattern })
    }

    /// Returns the original pattern string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Checks whether this pattern matches the URL's authority
    pub fn matches(&self, url: &Url) -> bool {
        self.matches_authority(&authority_of(url))
    }

    /// Checks whether this pattern matches an authority string
    ///
    /// A `*.base` pattern also matches the bare `base`, so one pattern
    /// covers a domain and all of its subdomains.
    pub fn matches_authority(&self, authority: &str) -> bool {
        let authority = authority.to_lowercase();

        if let Some(base) = self.pattern.strip_prefix("*.") {
            if authority == base {
                return true;
            }
        }

        glob_match(&self.pattern, &authority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_exact() {
        assert!(glob_match("example.com", "example.com"));
        assert!(!glob_match("example.com", "other.com"));
        assert!(!glob_match("example.com", "example.com.org"));
    }

    #[test]
    fn test_glob_star_prefix() {
        assert!(glob_match("*.example.com", "blog.example.com"));
        assert!(glob_match("*.example.com", "api.v2.example.com"));
        assert!(!glob_match("*.example.com", "example.org"));
        assert!(!glob_match("*.example.com", "myexample.com"));
    }

    #[test]
    fn test_glob_star_suffix() {
        assert!(glob_match("localhost:*", "localhost:8080"));
        assert!(glob_match("127.0.0.1:*", "127.0.0.1:49152"));
        assert!(!glob_match("localhost:*", "localghost:8080"));
    }

    #[test]
    fn test_glob_star_middle() {
        assert!(glob_match("a*c", "abc"));
        assert!(glob_match("a*c", "ac"));
        assert!(glob_match("a*c", "axxxc"));
        assert!(!glob_match("a*c", "ab"));
    }

    #[test]
    fn test_glob_multiple_stars() {
        assert!(glob_match("*/ignore*", "http://a/ignore/me"));
        assert!(glob_match("**", "anything"));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(UriGlob::new("").is_err());
        assert!(UriGlob::new("   ").is_err());
    }

    #[test]
    fn test_matches_exact_authority() {
        let glob = UriGlob::new("example.com").unwrap();
        assert!(glob.matches_authority("example.com"));
        assert!(glob.matches_authority("EXAMPLE.COM"));
        assert!(!glob.matches_authority("blog.example.com"));
        assert!(!glob.matches_authority("example.com:8080"));
    }

    #[test]
    fn test_wildcard_matches_bare_domain() {
        let glob = UriGlob::new("*.example.com").unwrap();
        assert!(glob.matches_authority("example.com"));
        assert!(glob.matches_authority("blog.example.com"));
        assert!(glob.matches_authority("deep.nested.example.com"));
        assert!(!glob.matches_authority("example.org"));
    }

    #[test]
    fn test_port_wildcard() {
        let glob = UriGlob::new("127.0.0.1:*").unwrap();
        assert!(glob.matches_authority("127.0.0.1:3000"));
        assert!(glob.matches_authority("127.0.0.1:65535"));
        assert!(!glob.matches_authority("127.0.0.2:3000"));
    }

    #[test]
    fn test_matches_url() {
        let glob = UriGlob::new("*.example.com").unwrap();
        let url = Url::parse("https://docs.example.com/page").unwrap();
        assert!(glob.matches(&url));

        let url = Url::parse("https://example.net/page").unwrap();
        assert!(!glob.matches(&url));
    }
}
