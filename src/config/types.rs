use crate::url::{authority_of, canonicalize};
use serde::Deserialize;

/// Main configuration structure for linkpatrol
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URLs the crawl starts from
    pub seeds: Vec<String>,

    /// Authority patterns that count as internal
    /// (e.g. "example.com", "*.example.com", "localhost:*")
    #[serde(default)]
    pub hosts: Vec<String>,

    /// URL patterns excluded from the crawl entirely
    #[serde(default)]
    pub skip: Vec<String>,

    /// Whether external links are checked (one hop, never crawled)
    #[serde(rename = "check-external", default)]
    pub check_external: bool,

    /// Minimum gap between requests to the same host (milliseconds)
    #[serde(rename = "min-request-gap-ms", default = "default_request_gap_ms")]
    pub min_request_gap_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_gap_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Version of the crawler
    #[serde(default = "default_agent_version")]
    pub version: String,

    /// URL with information about the crawler, appended to the UA string
    #[serde(rename = "contact-url", default)]
    pub contact_url: String,
}

fn default_agent_name() -> String {
    "linkpatrol".to_string()
}

fn default_agent_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            version: default_agent_version(),
            contact_url: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Composes the User-Agent header value
    pub fn user_agent_string(&self) -> String {
        if self.contact_url.is_empty() {
            format!("{}/{}", self.name, self.version)
        } else {
            format!("{}/{} (+{})", self.name, self.version, self.contact_url)
        }
    }
}

impl Config {
    /// The host patterns defining "internal"
    ///
    /// When the `hosts` list is empty, the seed authorities are used, so a
    /// minimal config still confines the crawl to its own sites.
    pub fn host_patterns(&self) -> Vec<String> {
        if !self.crawler.hosts.is_empty() {
            return self.crawler.hosts.clone();
        }
        let mut patterns = Vec::new();
        for seed in &self.crawler.seeds {
            if let Ok(uri) = canonicalize(seed) {
                let authority = authority_of(&uri);
                if !patterns.contains(&authority) {
                    patterns.push(authority);
                }
            }
        }
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                seeds: vec![
                    "https://example.com/".to_string(),
                    "https://example.com/docs".to_string(),
                    "https://other.org/".to_string(),
                ],
                hosts: vec![],
                skip: vec![],
                check_external: false,
                min_request_gap_ms: 250,
                request_timeout_secs: 10,
            },
            user_agent: UserAgentConfig::default(),
        }
    }

    #[test]
    fn test_host_patterns_default_to_seed_authorities() {
        let config = minimal_config();
        assert_eq!(config.host_patterns(), vec!["example.com", "other.org"]);
    }

    #[test]
    fn test_explicit_hosts_win() {
        let mut config = minimal_config();
        config.crawler.hosts = vec!["*.example.com".to_string()];
        assert_eq!(config.host_patterns(), vec!["*.example.com"]);
    }

    #[test]
    fn test_user_agent_string() {
        let agent = UserAgentConfig {
            name: "testbot".to_string(),
            version: "2.0".to_string(),
            contact_url: String::new(),
        };
        assert_eq!(agent.user_agent_string(), "testbot/2.0");

        let agent = UserAgentConfig {
            contact_url: "https://example.com/bot".to_string(),
            ..agent
        };
        assert_eq!(
            agent.user_agent_string(),
            "testbot/2.0 (+https://example.com/bot)"
        );
    }
}
