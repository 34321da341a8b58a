use crate::UrlError;
use url::Url;

/// Canonicalizes a URL string into the form used as a destination identity
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme
/// 3. Require an authority (host)
/// 4. Remove the fragment (everything after #)
///
/// Hosts are lowercased by the parser itself. Unlike a full normalizer,
/// this deliberately does not rewrite the scheme, strip `www.`, or touch
/// query parameters: two spellings of a link are two destinations unless
/// they differ only in fragment.
///
/// # Arguments
///
/// * `url_str` - The URL string to canonicalize
///
/// # Returns
///
/// * `Ok(Url)` - Canonical URL
/// * `Err(UrlError)` - Failed to parse, or unsupported scheme
///
/// # Examples
///
/// ```
/// use linkpatrol::url::canonicalize;
///
/// let url = canonicalize("HTTP://Example.COM/page#section").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingAuthority);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Returns the authority (`host` or `host:port`) of a URL
///
/// Default ports are omitted, matching how the `url` crate reports them.
pub fn authority_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
