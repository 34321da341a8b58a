//! Worker pool
//!
//! A fixed set of tokio tasks, each owning a private request channel. The
//! coordinator dispatches a request to one idle worker at a time and
//! consumes results from three shared streams. Busy/idle accounting lives
//! here and is driven entirely by the coordinator: a worker becomes busy
//! when a request is handed to it and idle again when the coordinator
//! consumes its result (results carry the worker id).

use crate::crawler::fetcher;
use crate::crawler::parser;
use crate::graph::{Destination, Link};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// Request dispatched to a single worker
#[derive(Debug)]
pub enum WorkerRequest {
    /// Probe a host: connectivity plus robots.txt
    CheckServer { host: String },

    /// Fetch a page after waiting `delay`
    CheckPage {
        destination: Destination,
        delay: Duration,
    },
}

/// Result of a server probe, tagged with the worker that produced it
#[derive(Debug)]
pub struct ServerInfoUpdate {
    pub worker_id: usize,
    pub host: String,
    pub did_not_connect: bool,
    pub robots_txt_contents: Option<String>,
}

/// Result of a page fetch: the checked destination plus the links found on it
#[derive(Debug)]
pub struct FetchResults {
    pub worker_id: usize,
    pub checked: Destination,
    pub links: Vec<Link>,
}

/// Informational message from a worker (verbose mode only)
#[derive(Debug)]
pub struct WorkerMessage {
    pub worker_id: usize,
    pub text: String,
}

/// Receiver ends of the pool's three result streams
///
/// The coordinator takes sole ownership of these; each stream delivers
/// results in the order workers complete them, not dispatch order.
pub struct PoolStreams {
    pub server_check_results: mpsc::UnboundedReceiver<ServerInfoUpdate>,
    pub fetch_results: mpsc::UnboundedReceiver<FetchResults>,
    pub messages: mpsc::UnboundedReceiver<WorkerMessage>,
}

struct WorkerHandle {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    task: JoinHandle<()>,
    busy: bool,
}

/// Fixed-size pool of fetch workers
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    shutting_down: bool,
}

impl WorkerPool {
    /// Spawns `count` workers sharing one HTTP client
    ///
    /// Returns the pool (request side) and the result streams.
    pub fn spawn(count: usize, client: Client, verbose: bool) -> (Self, PoolStreams) {
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let workers = (0..count)
            .map(|worker_id| {
                let (request_tx, request_rx) = mpsc::unbounded_channel();
                let task = tokio::spawn(worker_loop(
                    worker_id,
                    request_rx,
                    client.clone(),
                    server_tx.clone(),
                    fetch_tx.clone(),
                    message_tx.clone(),
                    verbose,
                ));
                WorkerHandle {
                    requests: request_tx,
                    task,
                    busy: false,
                }
            })
            .collect();

        let pool = Self {
            workers,
            shutting_down: false,
        };
        let streams = PoolStreams {
            server_check_results: server_rx,
            fetch_results: fetch_rx,
            messages: message_rx,
        };
        (pool, streams)
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// True if at least one worker has no outstanding request
    pub fn any_idle(&self) -> bool {
        self.workers.iter().any(|worker| !worker.busy)
    }

    /// True if no worker has an outstanding request
    pub fn all_idle(&self) -> bool {
        self.workers.iter().all(|worker| !worker.busy)
    }

    /// True if every worker has an outstanding request
    pub fn all_busy(&self) -> bool {
        !self.any_idle()
    }

    /// Enqueues a server probe on an idle worker
    ///
    /// Returns the chosen worker's id, or None when no worker is idle or
    /// the pool is shutting down.
    pub fn check_server(&mut self, host: String) -> Option<usize> {
        self.dispatch(WorkerRequest::CheckServer { host })
    }

    /// Enqueues a page fetch on an idle worker; the worker waits `delay`
    /// before starting
    pub fn check_page(&mut self, destination: Destination, delay: Duration) -> Option<usize> {
        self.dispatch(WorkerRequest::CheckPage { destination, delay })
    }

    fn dispatch(&mut self, request: WorkerRequest) -> Option<usize> {
        if self.shutting_down {
            return None;
        }
        let (worker_id, worker) = self
            .workers
            .iter_mut()
            .enumerate()
            .find(|(_, worker)| !worker.busy)?;
        if worker.requests.send(request).is_err() {
            tracing::warn!(worker_id, "worker is gone; request dropped");
            return None;
        }
        worker.busy = true;
        Some(worker_id)
    }

    /// Marks a worker idle again; called by the coordinator when it
    /// consumes that worker's result
    pub fn mark_idle(&mut self, worker_id: usize) {
        if let Some(worker) = self.workers.get_mut(worker_id) {
            worker.busy = false;
        }
    }

    /// Initiates shutdown: in-flight requests are aborted, best effort
    ///
    /// Idempotent.
    pub fn close(&mut self) {
        if self.shutting_down {
            return;
        }
        self.shutting_down = true;
        for worker in &self.workers {
            worker.task.abort();
        }
        tracing::debug!(workers = self.workers.len(), "worker pool closed");
    }

    /// True once `close` has been called
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}

async fn worker_loop(
    worker_id: usize,
    mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    client: Client,
    server_tx: mpsc::UnboundedSender<ServerInfoUpdate>,
    fetch_tx: mpsc::UnboundedSender<FetchResults>,
    message_tx: mpsc::UnboundedSender<WorkerMessage>,
    verbose: bool,
) {
    while let Some(request) = requests.recv().await {
        match request {
            WorkerRequest::CheckServer { host } => {
                if verbose {
                    let _ = message_tx.send(WorkerMessage {
                        worker_id,
                        text: format!("probing server {}", host),
                    });
                }
                let probe = fetcher::probe_server(&client, &host).await;
                let _ = server_tx.send(ServerInfoUpdate {
                    worker_id,
                    host: probe.host,
                    did_not_connect: probe.did_not_connect,
                    robots_txt_contents: probe.robots_txt_contents,
                });
            }
            WorkerRequest::CheckPage { destination, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if verbose {
                    let _ = message_tx.send(WorkerMessage {
                        worker_id,
                        text: format!("fetching {}", destination.url()),
                    });
                }
                let fallback_base = destination.uri().cloned();
                let (checked, body) = fetcher::fetch_page(&client, destination).await;
                let links = match body {
                    Some(body) => extract_page_links(&checked, fallback_base, &body),
                    None => Vec::new(),
                };
                let _ = fetch_tx.send(FetchResults {
                    worker_id,
                    checked,
                    links,
                });
            }
        }
    }
}

/// Builds Link values for every href found in a fetched page
///
/// Hrefs are resolved against the final URL after redirects, falling back
/// to the request URL.
fn extract_page_links(
    checked: &Destination,
    fallback_base: Option<Url>,
    body: &str,
) -> Vec<Link> {
    let base = checked
        .final_url
        .as_deref()
        .and_then(|url| Url::parse(url).ok())
        .or(fallback_base);
    let Some(base) = base else {
        return Vec::new();
    };

    let origin_url = checked.url().to_string();
    parser::extract_links(body, &base)
        .into_iter()
        .map(|extracted| {
            Link::new(
                origin_url.clone(),
                extracted.anchor,
                Destination::discovered(&extracted.url),
                extracted.fragment,
            )
        })
        .collect()
}
