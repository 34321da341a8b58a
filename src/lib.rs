//! Linkpatrol: a link-checking crawler
//!
//! This crate implements a crawler that discovers the reachable pages of a
//! site from a set of seed URLs, follows links one hop across the site
//! boundary, and reports which links are broken. It respects robots.txt
//! and per-host request pacing.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for linkpatrol operations
#[derive(Debug, Error)]
pub enum LinkpatrolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing authority in URL")]
    MissingAuthority,

    #[error("Empty pattern")]
    EmptyPattern,
}

/// Result type alias for linkpatrol operations
pub type Result<T> = std::result::Result<T, LinkpatrolError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use graph::{CrawlResult, Destination, Link};
pub use state::{Bin, ServerInfo};
pub use url::{authority_of, canonicalize, UriGlob, UrlSkipper};
