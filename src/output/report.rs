//! Crawl report generation
//!
//! Computes summary statistics from a finished crawl and prints them,
//! together with the list of broken links, to stdout. Nothing is
//! persisted.

use crate::graph::{CrawlResult, Link};

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Total destinations discovered (closed)
    pub total_destinations: usize,

    /// Destinations actually fetched
    pub checked: usize,

    /// Destinations whose check failed
    pub broken: usize,

    /// Destinations closed because robots.txt disallows them
    pub denied_by_robots: usize,

    /// Destinations closed because their host never connected
    pub not_connected: usize,

    /// External destinations that were recorded but not checked
    pub external_unchecked: usize,

    /// Link targets with a scheme the crawler does not fetch
    pub unsupported_scheme: usize,

    /// Total links discovered, skipped ones included
    pub total_links: usize,

    /// Links excluded by skip patterns
    pub skipped_links: usize,

    /// One row per link whose target failed its check
    pub broken_links: Vec<BrokenLink>,
}

/// A broken link row in the report
#[derive(Debug, Clone)]
pub struct BrokenLink {
    /// Page the link was found on
    pub origin: String,

    /// Anchor text of the link
    pub anchor: String,

    /// Target URL, fragment included
    pub target: String,

    /// Why the target failed
    pub reason: String,
}

/// Builds a report from a crawl result
pub fn build_report(result: &CrawlResult) -> CrawlReport {
    let mut report = CrawlReport {
        total_destinations: result.destinations.len(),
        checked: 0,
        broken: 0,
        denied_by_robots: 0,
        not_connected: 0,
        external_unchecked: 0,
        unsupported_scheme: 0,
        total_links: result.links.len(),
        skipped_links: 0,
        broken_links: Vec::new(),
    };

    for destination in &result.destinations {
        if destination.was_tried {
            report.checked += 1;
        }
        if destination.is_broken || destination.did_not_connect {
            report.broken += 1;
        }
        if destination.was_denied_by_robots_txt {
            report.denied_by_robots += 1;
        }
        if destination.did_not_connect {
            report.not_connected += 1;
        }
        if destination.is_unsupported_scheme {
            report.unsupported_scheme += 1;
        }
        if destination.is_external && !destination.was_tried && !destination.did_not_connect {
            report.external_unchecked += 1;
        }
    }

    for link in &result.links {
        if link.was_skipped {
            report.skipped_links += 1;
        }
        if link.is_broken() {
            report.broken_links.push(broken_row(link));
        }
    }

    report
}

fn broken_row(link: &Link) -> BrokenLink {
    let reason = if link.target.did_not_connect {
        "did not connect".to_string()
    } else {
        match (link.target.status_code, &link.target.status_description) {
            (Some(code), Some(description)) => format!("HTTP {} {}", code, description),
            (Some(code), None) => format!("HTTP {}", code),
            (None, Some(description)) => description.clone(),
            (None, None) => "failed".to_string(),
        }
    };
    BrokenLink {
        origin: link.origin_url.clone(),
        anchor: link.anchor.clone(),
        target: link.target_url_with_fragment(),
        reason,
    }
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===");
    println!(
        "Finished: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    println!("Overview:");
    println!("  Destinations discovered: {}", report.total_destinations);
    println!("  Destinations checked:    {}", report.checked);
    println!("  Links found:             {}", report.total_links);
    if report.skipped_links > 0 {
        println!("  Links skipped:           {}", report.skipped_links);
    }
    if report.denied_by_robots > 0 {
        println!("  Denied by robots.txt:    {}", report.denied_by_robots);
    }
    if report.not_connected > 0 {
        println!("  Hosts not connected:     {}", report.not_connected);
    }
    if report.external_unchecked > 0 {
        println!("  External (not checked):  {}", report.external_unchecked);
    }
    if report.unsupported_scheme > 0 {
        println!("  Unsupported schemes:     {}", report.unsupported_scheme);
    }
    println!();

    if report.broken_links.is_empty() {
        println!("No broken links found.");
    } else {
        println!("Broken links ({}):", report.broken_links.len());
        for row in &report.broken_links {
            println!("  {} -> {}", row.origin, row.target);
            if row.anchor.is_empty() {
                println!("      {}", row.reason);
            } else {
                println!("      \"{}\": {}", row.anchor, row.reason);
            }
        }
    }
}
