//! Configuration loading and validation
//!
//! Configuration is a TOML file with a `[crawler]` table (seeds, host
//! patterns, skip patterns, pacing) and an optional `[user-agent]` table.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, CrawlerConfig, UserAgentConfig};
pub use validation::validate;
