//! Crawl coordinator - the control loop that owns all crawl state
//!
//! The coordinator is single-threaded and cooperative: every mutation of
//! URL bins, queues, the server registry, and the link set happens on this
//! loop, while workers fetch in parallel and report back over channels.
//! The loop:
//! - Seeds the open queue and the server registry
//! - Dispatches work to idle workers (server checks first, then pages)
//! - Enforces per-host gating: reachability, robots.txt, request pacing
//! - Consumes results, discovers new destinations, and re-dispatches
//! - Terminates on quiescence or an external stop signal
//! - Collapses duplicate destinations in a final dedup pass

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use url::Url;

use crate::crawler::fetcher::build_http_client;
use crate::crawler::pool::{
    FetchResults, PoolStreams, ServerInfoUpdate, WorkerMessage, WorkerPool,
};
use crate::graph::{CrawlResult, Destination, Link};
use crate::state::{Bin, ServerInfo};
use crate::url::{UriGlob, UrlSkipper};
use crate::LinkpatrolError;

/// Worker pool size when external hosts may be contacted
const DEFAULT_WORKERS: usize = 8;

/// Worker pool size when every seed points at the local machine
const LOCALHOST_WORKERS: usize = 4;

/// Tuning knobs for a crawl, derived from configuration
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// User agent sent with every request and matched against robots.txt
    pub user_agent: String,

    /// Minimum gap between request starts on the same host
    pub min_request_gap: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("linkpatrol/", env!("CARGO_PKG_VERSION")).to_string(),
            min_request_gap: Duration::from_millis(250),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Runs a complete crawl
///
/// This is the single public entry point of the core. It drives the crawl
/// from the given seeds to quiescence and returns every discovered link and
/// destination. The crawl itself never fails: fetch problems are recorded
/// on destinations. Errors are only possible during setup.
///
/// # Arguments
///
/// * `seeds` - Absolute URLs the crawl starts from, in order
/// * `host_globs` - Authority patterns that count as internal
/// * `should_check_external` - Whether external links are checked (one hop)
/// * `skipper` - URL patterns excluded from the crawl
/// * `verbose` - Emit per-request progress
/// * `stop` - One-shot cancellation signal (fires with `true`)
/// * `options` - User agent, pacing, and timeout settings
pub async fn crawl(
    seeds: Vec<Url>,
    host_globs: &[String],
    should_check_external: bool,
    skipper: UrlSkipper,
    verbose: bool,
    stop: watch::Receiver<bool>,
    options: CrawlOptions,
) -> Result<CrawlResult, LinkpatrolError> {
    let mut coordinator = Coordinator::new(
        seeds,
        host_globs,
        should_check_external,
        skipper,
        verbose,
        options,
    )?;
    Ok(coordinator.run(stop).await)
}

/// What dispatch decided to do with a queued destination
#[derive(Debug, Clone, Copy)]
enum Disposition {
    /// The host never connected; close without fetching
    NotConnected,
    /// robots.txt disallows the path; close without fetching
    DeniedByRobots,
    /// Handed to a worker; now in progress
    Dispatched,
}

/// An event the coordinator loop woke up for
enum Event {
    ServerCheck(ServerInfoUpdate),
    Fetch(FetchResults),
    Message(WorkerMessage),
    /// The throttle wakeup timer fired
    ThrottleExpired,
    /// The stop channel changed (value checked after the select)
    StopChanged(bool),
    /// A result stream closed: the pool died underneath us
    PoolClosed,
}

struct Coordinator {
    host_globs: Vec<UriGlob>,
    should_check_external: bool,
    skipper: UrlSkipper,
    verbose: bool,
    user_agent: String,
    min_request_gap: Duration,

    pool: WorkerPool,
    streams: PoolStreams,

    /// URL -> current bin, for every URL ever seen
    bin: HashMap<String, Bin>,
    /// Internal destinations waiting for dispatch
    open: VecDeque<Destination>,
    /// External destinations waiting for dispatch (one-hop checks)
    open_external: VecDeque<Destination>,
    /// Destinations currently out with a worker
    in_progress: Vec<Destination>,
    /// Finished destinations
    closed: Vec<Destination>,
    /// Every discovered link, skipped ones included
    links: Vec<Link>,

    /// Hosts whose server check has completed
    servers: HashMap<String, ServerInfo>,
    /// Hosts waiting for a server check
    unknown_servers: VecDeque<String>,
    /// Hosts whose server check is out with a worker
    servers_in_progress: HashSet<String>,

    all_done: bool,
    cancelled: bool,
    /// Armed when a dispatch round deferred throttled work while the pool
    /// was otherwise idle; without it the loop would have nothing to wake
    /// it up
    throttle_deadline: Option<tokio::time::Instant>,
    /// Completed checks, for progress reporting
    progress: u64,
}

impl Coordinator {
    fn new(
        seeds: Vec<Url>,
        host_globs: &[String],
        should_check_external: bool,
        skipper: UrlSkipper,
        verbose: bool,
        options: CrawlOptions,
    ) -> Result<Self, LinkpatrolError> {
        let host_globs = host_globs
            .iter()
            .map(|pattern| UriGlob::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let worker_count = worker_count_for(&seeds, should_check_external);
        let client = build_http_client(&options.user_agent, options.request_timeout)?;
        let (pool, streams) = WorkerPool::spawn(worker_count, client, verbose);
        tracing::info!(
            workers = worker_count,
            seeds = seeds.len(),
            check_external = should_check_external,
            "starting crawl"
        );

        let mut coordinator = Self {
            host_globs,
            should_check_external,
            skipper,
            verbose,
            user_agent: options.user_agent,
            min_request_gap: options.min_request_gap,
            pool,
            streams,
            bin: HashMap::new(),
            open: VecDeque::new(),
            open_external: VecDeque::new(),
            in_progress: Vec::new(),
            closed: Vec::new(),
            links: Vec::new(),
            servers: HashMap::new(),
            unknown_servers: VecDeque::new(),
            servers_in_progress: HashSet::new(),
            all_done: false,
            cancelled: false,
            throttle_deadline: None,
            progress: 0,
        };

        // Seed the open queue in input order, dropping duplicates.
        for uri in seeds {
            let destination = Destination::seed(uri);
            let url = destination.url().to_string();
            if coordinator.bin.contains_key(&url) {
                tracing::debug!(url = %url, "duplicate seed ignored");
                continue;
            }
            if coordinator.skipper.skips(&url) {
                let mut destination = destination;
                destination.was_skipped = true;
                tracing::debug!(url = %url, "seed matches a skip pattern");
                coordinator.close_destination(destination);
                continue;
            }
            let authority = destination.authority().to_string();
            if !coordinator.unknown_servers.contains(&authority) {
                coordinator.unknown_servers.push_back(authority);
            }
            coordinator.bin.insert(url, Bin::Open);
            coordinator.open.push_back(destination);
        }

        Ok(coordinator)
    }

    /// Runs the crawl loop until quiescence or cancellation
    async fn run(&mut self, mut stop: watch::Receiver<bool>) -> CrawlResult {
        self.dispatch();

        let mut stop_live = true;
        while !self.all_done {
            let deadline = self.throttle_deadline;
            let event = tokio::select! {
                changed = stop.changed(), if stop_live => Event::StopChanged(changed.is_ok()),
                update = self.streams.server_check_results.recv() => match update {
                    Some(update) => Event::ServerCheck(update),
                    None => Event::PoolClosed,
                },
                results = self.streams.fetch_results.recv() => match results {
                    Some(results) => Event::Fetch(results),
                    None => Event::PoolClosed,
                },
                message = self.streams.messages.recv() => match message {
                    Some(message) => Event::Message(message),
                    None => Event::PoolClosed,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)),
                    if deadline.is_some() => Event::ThrottleExpired,
            };

            match event {
                Event::ServerCheck(update) => self.handle_server_check(update),
                Event::Fetch(results) => self.handle_fetch_results(results),
                Event::Message(message) => {
                    if self.verbose {
                        tracing::info!(worker = message.worker_id, "{}", message.text);
                    } else {
                        tracing::debug!(worker = message.worker_id, "{}", message.text);
                    }
                }
                Event::ThrottleExpired => {
                    self.throttle_deadline = None;
                    self.dispatch();
                }
                Event::StopChanged(true) => {
                    if *stop.borrow() {
                        self.handle_stop();
                    }
                }
                Event::StopChanged(false) => {
                    // The stop sender is gone; no cancellation can arrive.
                    stop_live = false;
                }
                Event::PoolClosed => {
                    if !self.cancelled {
                        tracing::warn!("worker pool closed unexpectedly; ending crawl");
                    }
                    self.all_done = true;
                }
            }
        }

        self.finish()
    }

    /// The core scheduling routine
    ///
    /// Never re-entered: it is only called from handlers on the coordinator
    /// loop. Issues server checks first, then walks a fair interleave of
    /// the internal and external queues handing pages to idle workers.
    /// Throttled destinations stay in their queue; everything else that was
    /// inspected is removed (closed or moved to in-progress). Finally,
    /// tests for quiescence.
    fn dispatch(&mut self) {
        // Step 1: server checks, while workers are available.
        while self.pool.any_idle() {
            let Some(host) = self.unknown_servers.pop_front() else {
                break;
            };
            if self.pool.check_server(host.clone()).is_some() {
                tracing::debug!(host = %host, "server check dispatched");
                self.servers_in_progress.insert(host);
            } else {
                self.unknown_servers.push_front(host);
                break;
            }
        }

        // Step 2: page fetches, alternating between the internal and
        // external queues so neither starves the other.
        let now = Instant::now();
        let mut remove_open: Vec<(usize, Disposition)> = Vec::new();
        let mut remove_external: Vec<(usize, Disposition)> = Vec::new();
        let mut deferred: Option<Duration> = None;

        let mut open_cursor = 0;
        let mut external_cursor = 0;
        let mut take_open = true;

        while self.pool.any_idle() {
            let open_left = open_cursor < self.open.len();
            let external_left = external_cursor < self.open_external.len();
            if !open_left && !external_left {
                break;
            }
            let from_open = if open_left && external_left {
                let pick = take_open;
                take_open = !take_open;
                pick
            } else {
                open_left
            };
            let index = if from_open {
                open_cursor += 1;
                open_cursor - 1
            } else {
                external_cursor += 1;
                external_cursor - 1
            };

            let (authority, path) = {
                let destination = if from_open {
                    &self.open[index]
                } else {
                    &self.open_external[index]
                };
                (
                    destination.authority().to_string(),
                    destination.path_and_query(),
                )
            };

            // Hosts whose check has not completed stay queued for a later
            // round.
            if self.servers_in_progress.contains(&authority)
                || self.unknown_servers.iter().any(|host| *host == authority)
            {
                continue;
            }

            let disposition = match self.servers.get(&authority) {
                // A host missing from the registry entirely is treated the
                // same as one that failed to connect.
                None => Disposition::NotConnected,
                Some(server) if server.has_not_connected => Disposition::NotConnected,
                Some(server) if server.denies(&path) => Disposition::DeniedByRobots,
                Some(server) => {
                    let delay = server.throttling_duration(now);
                    if delay > ServerInfo::MINIMUM_DELAY {
                        // Leave it in place: it stays the queue's business
                        // until its host quiets down, and blocks later
                        // same-host candidates without blocking other hosts.
                        deferred = Some(match deferred {
                            Some(current) => current.min(delay),
                            None => delay,
                        });
                        continue;
                    }

                    let destination = if from_open {
                        self.open[index].clone()
                    } else {
                        self.open_external[index].clone()
                    };
                    let url = destination.url().to_string();
                    match self.pool.check_page(destination, delay) {
                        Some(worker) => {
                            tracing::debug!(url = %url, worker, "page fetch dispatched");
                            if let Some(server) = self.servers.get_mut(&authority) {
                                server.mark_request_start(delay, now);
                            }
                            Disposition::Dispatched
                        }
                        None => break,
                    }
                }
            };

            if from_open {
                remove_open.push((index, disposition));
            } else {
                remove_external.push((index, disposition));
            }
        }

        self.apply_dispositions(true, remove_open);
        self.apply_dispositions(false, remove_external);

        // Arm the wakeup timer only when throttling is the sole thing left
        // that could produce progress.
        self.throttle_deadline = match deferred {
            Some(delay) if self.pool.all_idle() => Some(tokio::time::Instant::now() + delay),
            _ => None,
        };

        // Step 3: termination test.
        if self.unknown_servers.is_empty()
            && self.open.is_empty()
            && self.open_external.is_empty()
            && self.pool.all_idle()
        {
            tracing::debug!("no work left and all workers idle; crawl complete");
            self.all_done = true;
        }
    }

    /// Removes inspected destinations from their queue, in reverse index
    /// order so earlier indices stay valid, and moves each to its new bin
    fn apply_dispositions(&mut self, from_open: bool, removals: Vec<(usize, Disposition)>) {
        for (index, disposition) in removals.into_iter().rev() {
            let removed = if from_open {
                self.open.remove(index)
            } else {
                self.open_external.remove(index)
            };
            let Some(mut destination) = removed else {
                continue;
            };
            match disposition {
                Disposition::NotConnected => {
                    destination.did_not_connect = true;
                    tracing::debug!(url = %destination.url(), "host unreachable; closed without fetching");
                    self.close_destination(destination);
                }
                Disposition::DeniedByRobots => {
                    destination.was_denied_by_robots_txt = true;
                    tracing::debug!(url = %destination.url(), "denied by robots.txt; closed without fetching");
                    self.close_destination(destination);
                }
                Disposition::Dispatched => {
                    self.bin
                        .insert(destination.url().to_string(), Bin::InProgress);
                    self.in_progress.push(destination);
                }
            }
        }
    }

    /// Handles a completed server check
    fn handle_server_check(&mut self, update: ServerInfoUpdate) {
        self.pool.mark_idle(update.worker_id);

        if !self.servers_in_progress.remove(&update.host) {
            tracing::warn!(host = %update.host, "server check completed for a host not in progress");
        }

        let info = if update.did_not_connect {
            ServerInfo::unreachable(&update.host)
        } else {
            ServerInfo::reachable(
                &update.host,
                update.robots_txt_contents.as_deref(),
                &self.user_agent,
                self.min_request_gap,
            )
        };
        tracing::debug!(
            host = %update.host,
            reachable = !update.did_not_connect,
            robots = update.robots_txt_contents.is_some(),
            "server check complete"
        );
        self.servers.insert(update.host, info);
        self.progress += 1;

        self.dispatch();
    }

    /// Handles a completed page fetch
    fn handle_fetch_results(&mut self, results: FetchResults) {
        self.pool.mark_idle(results.worker_id);
        let FetchResults {
            checked, mut links, ..
        } = results;
        let url = checked.url().to_string();

        // A result for a destination we do not consider in progress means a
        // bug or a race with cancellation; drop it rather than corrupt state.
        match self.bin.get(&url) {
            Some(Bin::InProgress) => {}
            other => {
                tracing::warn!(
                    url = %url,
                    bin = other.map(Bin::as_str).unwrap_or("unseen"),
                    "fetch result for a destination not in progress; dropped"
                );
                return;
            }
        }

        let matches: Vec<usize> = self
            .in_progress
            .iter()
            .enumerate()
            .filter(|(_, destination)| destination.url() == url)
            .map(|(index, _)| index)
            .collect();
        if matches.len() != 1 {
            tracing::warn!(
                url = %url,
                matches = matches.len(),
                "expected exactly one in-progress destination; result dropped"
            );
            return;
        }

        let mut destination = self.in_progress.swap_remove(matches[0]);
        destination.apply_result(&checked);
        self.progress += 1;
        if self.verbose {
            tracing::info!(
                url = %url,
                status = destination.status_code.unwrap_or(0),
                broken = destination.is_broken,
                "checked ({} done)",
                self.progress
            );
        }
        self.close_destination(destination);

        // Walk the page's links: mark skips, collect never-seen targets.
        let mut new_urls: Vec<String> = Vec::new();
        let mut new_destinations: HashMap<String, Destination> = HashMap::new();
        for link in &mut links {
            let with_fragment = link.target_url_with_fragment();
            if self.skipper.skips(&with_fragment) {
                link.was_skipped = true;
                if let Some(pattern) = self.skipper.explain(&with_fragment) {
                    tracing::debug!(url = %with_fragment, pattern = %pattern, "link skipped");
                }
                continue;
            }
            let target_url = link.target.url().to_string();
            if !self.bin.contains_key(&target_url) && !new_destinations.contains_key(&target_url) {
                new_urls.push(target_url.clone());
                new_destinations.insert(target_url, link.target.clone());
            }
        }
        self.links.extend(links);

        // Place the new destinations and register their hosts.
        for target_url in new_urls {
            let Some(mut destination) = new_destinations.remove(&target_url) else {
                continue;
            };
            if destination.is_invalid {
                tracing::debug!(url = %target_url, "invalid link target discarded");
                continue;
            }
            destination.is_external = !self
                .host_globs
                .iter()
                .any(|glob| glob.matches_authority(destination.authority()));

            if destination.is_unsupported_scheme {
                self.close_destination(destination);
            } else if destination.is_external {
                if self.should_check_external {
                    self.register_host(&destination);
                    self.bin.insert(target_url, Bin::OpenExternal);
                    self.open_external.push_back(destination);
                } else {
                    self.close_destination(destination);
                }
            } else {
                self.register_host(&destination);
                self.bin.insert(target_url, Bin::Open);
                if destination.is_source {
                    self.open.push_front(destination);
                } else {
                    self.open.push_back(destination);
                }
            }
        }

        self.dispatch();
    }

    /// Handles the external stop signal: one cancellation pass
    fn handle_stop(&mut self) {
        tracing::info!("stop signal received; shutting down");
        self.cancelled = true;
        self.pool.close();
        self.all_done = true;
    }

    /// Moves a destination into `closed`
    fn close_destination(&mut self, destination: Destination) {
        self.bin
            .insert(destination.url().to_string(), Bin::Closed);
        self.closed.push(destination);
    }

    /// Queues a host for a server check unless it is already known,
    /// in progress, or queued
    fn register_host(&mut self, destination: &Destination) {
        let host = destination.authority();
        if host.is_empty()
            || self.servers.contains_key(host)
            || self.servers_in_progress.contains(host)
            || self.unknown_servers.iter().any(|known| known == host)
        {
            return;
        }
        self.unknown_servers.push_back(host.to_string());
    }

    /// Final pass: retarget links to canonical destinations and build the
    /// result
    ///
    /// Workers mint fresh Destination values at discovery, so several link
    /// targets may share a URL; the canonical one is the closed destination
    /// for that URL.
    fn finish(&mut self) -> CrawlResult {
        let canonical: HashMap<&str, &Destination> = self
            .closed
            .iter()
            .map(|destination| (destination.url(), destination))
            .collect();

        let mut links = std::mem::take(&mut self.links);
        for link in &mut links {
            if let Some(destination) = canonical.get(link.target.url()) {
                link.target = (*destination).clone();
            }
        }

        self.pool.close();

        if !self.cancelled {
            debug_assert!(self.open.is_empty(), "open queue not drained");
            debug_assert!(self.open_external.is_empty(), "external queue not drained");
            debug_assert!(self.in_progress.is_empty(), "fetches still in progress");
            for destination in &self.closed {
                debug_assert!(
                    destination.was_tried
                        || destination.is_unsupported_scheme
                        || destination.was_skipped
                        || destination.did_not_connect
                        || destination.was_denied_by_robots_txt
                        || (destination.is_external && !self.should_check_external),
                    "closed destination is not terminal: {}",
                    destination.url()
                );
            }
        }

        tracing::info!(
            destinations = self.closed.len(),
            links = links.len(),
            cancelled = self.cancelled,
            "crawl finished"
        );

        CrawlResult {
            links,
            destinations: std::mem::take(&mut self.closed),
        }
    }
}

/// Picks the pool size for a crawl
///
/// Crawls confined to the local machine get a smaller pool.
fn worker_count_for(seeds: &[Url], should_check_external: bool) -> usize {
    let all_local = seeds
        .iter()
        .all(|seed| matches!(seed.host_str(), Some("localhost") | Some("127.0.0.1")));
    if should_check_external || !all_local {
        DEFAULT_WORKERS
    } else {
        LOCALHOST_WORKERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_worker_count_local_seeds() {
        let seeds = vec![url("http://localhost:8000/"), url("http://127.0.0.1:9000/")];
        assert_eq!(worker_count_for(&seeds, false), LOCALHOST_WORKERS);
    }

    #[test]
    fn test_worker_count_external_checking() {
        let seeds = vec![url("http://localhost:8000/")];
        assert_eq!(worker_count_for(&seeds, true), DEFAULT_WORKERS);
    }

    #[test]
    fn test_worker_count_remote_seed() {
        let seeds = vec![url("http://localhost:8000/"), url("https://example.com/")];
        assert_eq!(worker_count_for(&seeds, false), DEFAULT_WORKERS);
    }

    #[test]
    fn test_worker_count_no_seeds() {
        assert_eq!(worker_count_for(&[], false), LOCALHOST_WORKERS);
    }
}
