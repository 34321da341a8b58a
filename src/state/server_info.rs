use crate::robots::Bouncer;
use std::time::{Duration, Instant};

/// Per-host state used for gating and politeness
///
/// One record exists per authority the crawl has completed a server check
/// for. The coordinator is the only mutator: it creates the record when the
/// check result arrives and updates the throttle schedule on every dispatch
/// to the host.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// The authority this record describes (`host` or `host:port`)
    host: String,

    /// True if the connection attempt during the server check failed;
    /// every destination on such a host closes without being fetched
    pub has_not_connected: bool,

    /// robots.txt gate, when one was fetched and parsed
    bouncer: Option<Bouncer>,

    /// When the most recently dispatched request to this host starts
    /// (dispatch time plus the delay handed to the worker)
    last_request_start: Option<Instant>,

    /// Minimum gap between request starts on this host
    min_request_gap: Duration,
}

impl ServerInfo {
    /// Throttling waits at or below this threshold are folded into the
    /// worker-side delay; longer waits defer the destination in its queue.
    pub const MINIMUM_DELAY: Duration = Duration::from_millis(100);

    /// Creates the record for a host whose server check could not connect
    pub fn unreachable(host: &str) -> Self {
        Self {
            host: host.to_string(),
            has_not_connected: true,
            bouncer: None,
            last_request_start: None,
            min_request_gap: Duration::ZERO,
        }
    }

    /// Creates the record for a reachable host
    ///
    /// # Arguments
    ///
    /// * `host` - The authority
    /// * `robots_txt` - Raw robots.txt contents, when one was served
    /// * `user_agent` - Crawler user agent, for robots group selection
    /// * `default_gap` - Configured minimum gap between requests
    ///
    /// The effective gap is the larger of the configured gap and the
    /// robots.txt `Crawl-delay` for our user agent.
    pub fn reachable(
        host: &str,
        robots_txt: Option<&str>,
        user_agent: &str,
        default_gap: Duration,
    ) -> Self {
        let bouncer = robots_txt.map(|content| Bouncer::new(content, user_agent));

        let robots_gap = bouncer
            .as_ref()
            .and_then(Bouncer::crawl_delay)
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::ZERO);

        Self {
            host: host.to_string(),
            has_not_connected: false,
            bouncer,
            last_request_start: None,
            min_request_gap: default_gap.max(robots_gap),
        }
    }

    /// Returns the authority this record describes
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if robots.txt disallows the given path for our agent
    ///
    /// Hosts without a bouncer (no robots.txt, or one that could not be
    /// fetched) deny nothing.
    pub fn denies(&self, path: &str) -> bool {
        match &self.bouncer {
            Some(bouncer) => !bouncer.allows(path),
            None => false,
        }
    }

    /// Computes the wait a new request to this host should take
    ///
    /// Zero when no request has been dispatched yet or the gap has already
    /// elapsed.
    pub fn throttling_duration(&self, now: Instant) -> Duration {
        match self.last_request_start {
            Some(start) => (start + self.min_request_gap).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Records that a request was dispatched with the given worker-side delay
    ///
    /// The request starts at `now + delay`, so the next gap is measured from
    /// there.
    pub fn mark_request_start(&mut self, delay: Duration, now: Instant) {
        self.last_request_start = Some(now + delay);
    }
}
