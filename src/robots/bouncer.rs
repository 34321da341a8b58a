//! robots.txt matcher implementation
//!
//! Parsing is delegated to the robotstxt crate; Crawl-delay is extracted
//! separately since the matcher does not expose it.

use robotstxt::DefaultMatcher;

/// Per-host predicate derived from robots.txt
///
/// Decides whether a path may be fetched for the user agent the bouncer was
/// built with. Empty contents allow everything.
#[derive(Debug, Clone)]
pub struct Bouncer {
    /// Raw robots.txt content
    content: String,
    /// The user agent robots groups are selected for
    user_agent: String,
}

impl Bouncer {
    /// Creates a bouncer from raw robots.txt content
    pub fn new(content: &str, user_agent: &str) -> Self {
        Self {
            content: content.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Checks if a path is allowed for this bouncer's user agent
    ///
    /// # Arguments
    ///
    /// * `path` - The URL path to check (e.g., "/page.html")
    pub fn allows(&self, path: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, &self.user_agent, path)
    }

    /// Gets the Crawl-delay in seconds for this bouncer's user agent
    ///
    /// A delay in a group naming our agent wins over one in a wildcard
    /// group. Returns None when no applicable delay is specified.
    pub fn crawl_delay(&self) -> Option<f64> {
        if self.content.is_empty() {
            return None;
        }

        let normalized_agent = self.user_agent.to_lowercase();

        let mut current_agents: Vec<String> = Vec::new();
        let mut in_directives = false;
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        for line in self.content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A User-agent line after directives starts a new group;
                    // consecutive User-agent lines share one group.
                    if in_directives {
                        current_agents.clear();
                        in_directives = false;
                    }
                    current_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_directives = true;
                    let Ok(seconds) = value.parse::<f64>() else {
                        continue;
                    };
                    for agent in &current_agents {
                        if agent == "*" {
                            wildcard_delay = Some(seconds);
                        } else if normalized_agent.contains(agent.as_str()) {
                            agent_delay = Some(seconds);
                        }
                    }
                }
                _ => {
                    in_directives = true;
                }
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allows_all() {
        let bouncer = Bouncer::new("", "testbot");
        assert!(bouncer.allows("/"));
        assert!(bouncer.allows("/private"));
        assert!(bouncer.crawl_delay().is_none());
    }

    #[test]
    fn test_disallow() {
        let bouncer = Bouncer::new("User-agent: *\nDisallow: /private", "testbot");
        assert!(!bouncer.allows("/private"));
        assert!(!bouncer.allows("/private/deeper"));
        assert!(bouncer.allows("/"));
        assert!(bouncer.allows("/public"));
    }

    #[test]
    fn test_disallow_all() {
        let bouncer = Bouncer::new("User-agent: *\nDisallow: /", "testbot");
        assert!(!bouncer.allows("/"));
        assert!(!bouncer.allows("/anything"));
    }

    #[test]
    fn test_wildcard_crawl_delay() {
        let bouncer = Bouncer::new("User-agent: *\nCrawl-delay: 5", "testbot");
        assert_eq!(bouncer.crawl_delay(), Some(5.0));
    }

    #[test]
    fn test_specific_agent_delay_wins() {
        let content = "User-agent: testbot\nCrawl-delay: 10\n\nUser-agent: *\nCrawl-delay: 2";
        let bouncer = Bouncer::new(content, "testbot");
        assert_eq!(bouncer.crawl_delay(), Some(10.0));

        let other = Bouncer::new(content, "otherbot");
        assert_eq!(other.crawl_delay(), Some(2.0));
    }

    #[test]
    fn test_fractional_delay() {
        let bouncer = Bouncer::new("User-agent: *\nCrawl-delay: 0.5", "testbot");
        assert_eq!(bouncer.crawl_delay(), Some(0.5));
    }

    #[test]
    fn test_grouped_agents_share_delay() {
        let content = "User-agent: a\nUser-agent: testbot\nCrawl-delay: 3";
        let bouncer = Bouncer::new(content, "testbot");
        assert_eq!(bouncer.crawl_delay(), Some(3.0));
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let content = "# politeness\n\nUser-agent: *\n# five seconds\nCrawl-delay: 5";
        let bouncer = Bouncer::new(content, "testbot");
        assert_eq!(bouncer.crawl_delay(), Some(5.0));
    }
}
