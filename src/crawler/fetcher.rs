//! HTTP fetching for workers
//!
//! This module handles all HTTP requests made during a crawl:
//! - Building the shared HTTP client with a proper user agent
//! - Server probes: connectivity check plus robots.txt retrieval
//! - Page fetches: status, final URL, content type, and body for pages
//!   that will have links extracted

use crate::graph::Destination;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client shared by all workers
///
/// Redirects are followed with reqwest's default policy (up to 10 hops);
/// the final URL after redirects is recorded on each checked destination.
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout)
        .build()
}

/// Outcome of probing a host for connectivity and robots.txt
#[derive(Debug, Clone)]
pub struct ServerProbe {
    pub host: String,
    pub did_not_connect: bool,
    pub robots_txt_contents: Option<String>,
}

/// Probes a host: can it be connected to, and what does robots.txt say?
///
/// The probe requests `/robots.txt` over http, falling back to https when
/// the plain connection fails. A response of any status counts as
/// connected; only transport failures on both schemes mark the host
/// unreachable. A non-success robots response means "no robots.txt",
/// which allows everything.
pub async fn probe_server(client: &Client, host: &str) -> ServerProbe {
    for scheme in ["http", "https"] {
        let robots_url = format!("{}://{}/robots.txt", scheme, host);
        match client.get(&robots_url).send().await {
            Ok(response) => {
                let robots_txt_contents = if response.status().is_success() {
                    response.text().await.ok()
                } else {
                    None
                };
                return ServerProbe {
                    host: host.to_string(),
                    did_not_connect: false,
                    robots_txt_contents,
                };
            }
            Err(error) => {
                tracing::trace!(host = %host, scheme = %scheme, error = %error, "robots probe failed");
            }
        }
    }

    ServerProbe {
        host: host.to_string(),
        did_not_connect: true,
        robots_txt_contents: None,
    }
}

/// Fetches a destination and records the outcome on it
///
/// Returns the checked destination and, when the page is an internal HTML
/// document worth parsing, its body. External destinations are checked one
/// hop: the response is inspected but never parsed for links.
pub async fn fetch_page(client: &Client, mut destination: Destination) -> (Destination, Option<String>) {
    destination.was_tried = true;

    let Some(uri) = destination.uri().cloned() else {
        destination.is_broken = true;
        destination.status_description = Some("invalid URL".to_string());
        return (destination, None);
    };

    match client.get(uri).send().await {
        Ok(response) => {
            let status = response.status();
            destination.status_code = Some(status.as_u16());
            destination.status_description = Some(
                status
                    .canonical_reason()
                    .unwrap_or("unrecognized status")
                    .to_string(),
            );
            destination.final_url = Some(response.url().to_string());
            destination.content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(String::from);
            destination.is_broken = !status.is_success();

            let parse_body = status.is_success()
                && !destination.is_external
                && is_html(destination.content_type.as_deref());

            if parse_body {
                match response.text().await {
                    Ok(body) => {
                        destination.is_source = true;
                        return (destination, Some(body));
                    }
                    Err(error) => {
                        destination.is_broken = true;
                        destination.status_description =
                            Some(format!("failed to read body: {}", error));
                    }
                }
            }
            (destination, None)
        }
        Err(error) => {
            destination.is_broken = true;
            if error.is_connect() {
                destination.did_not_connect = true;
            }
            destination.status_code = error.status().map(|status| status.as_u16());
            destination.status_description = Some(describe_error(&error));
            (destination, None)
        }
    }
}

/// Returns true if a Content-Type header value denotes an HTML document
fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        Some(value) => {
            let value = value.to_ascii_lowercase();
            value.starts_with("text/html") || value.starts_with("application/xhtml")
        }
        None => false,
    }
}

/// Short, stable description of a transport-level failure
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error.is_redirect() {
        "redirect policy exceeded".to_string()
    } else {
        format!("request failed: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html() {
        assert!(is_html(Some("text/html")));
        assert!(is_html(Some("text/html; charset=utf-8")));
        assert!(is_html(Some("TEXT/HTML")));
        assert!(is_html(Some("application/xhtml+xml")));
        assert!(!is_html(Some("application/json")));
        assert!(!is_html(Some("image/png")));
        assert!(!is_html(None));
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client("testbot/1.0", Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_invalid_destination_is_broken() {
        let client = build_http_client("testbot/1.0", Duration::from_secs(5)).unwrap();
        let destination = Destination::discovered(":::nope");
        let (checked, body) = fetch_page(&client, destination).await;
        assert!(checked.was_tried);
        assert!(checked.is_broken);
        assert!(body.is_none());
    }
}
