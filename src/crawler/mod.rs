//! Crawler module: the coordinator and its workers
//!
//! This module contains the core crawling machinery:
//! - The coordinator loop that owns all crawl state
//! - The worker pool and its request/result channels
//! - HTTP fetching and server probing
//! - HTML link extraction

mod coordinator;
mod fetcher;
mod parser;
mod pool;

pub use coordinator::{crawl, CrawlOptions};
pub use fetcher::{build_http_client, ServerProbe};
pub use parser::{extract_links, ExtractedLink};
pub use pool::{FetchResults, PoolStreams, ServerInfoUpdate, WorkerMessage, WorkerPool};
