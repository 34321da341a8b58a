//! HTML parser for extracting links
//!
//! This module handles parsing fetched pages to extract the hrefs the
//! coordinator will consider, together with their anchor text and target
//! fragments.

use scraper::{Html, Selector};
use url::Url;

/// A single href extracted from a page
#[derive(Debug, Clone)]
pub struct ExtractedLink {
    /// Absolute URL when the href resolved, the raw href otherwise
    /// (the raw form becomes an invalid destination downstream)
    pub url: String,

    /// Fragment of the resolved href, stripped from `url`
    pub fragment: Option<String>,

    /// Anchor text, or a short marker for non-anchor links
    pub anchor: String,
}

/// Extracts links from HTML content
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags without a `download` attribute
/// - `<link rel="canonical" href="...">`
/// - hrefs with non-http(s) schemes such as `mailto:` (they surface as
///   unsupported-scheme destinations in the report)
///
/// **Exclude:**
/// - `javascript:` and `data:` hrefs
/// - Fragment-only hrefs (same-page anchors)
/// - Empty hrefs
///
/// Relative hrefs are resolved against `base_url`, which should be the
/// final URL of the page after redirects.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let anchor = element.text().collect::<String>().trim().to_string();
            if let Some(link) = resolve_href(href, base_url, anchor) {
                links.push(link);
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(link) = resolve_href(href, base_url, "(canonical)".to_string()) {
                    links.push(link);
                }
            }
        }
    }

    links
}

/// Resolves an href against the page URL
///
/// Returns None for hrefs that are excluded outright; unresolvable hrefs
/// are passed through raw so they can be reported as invalid.
fn resolve_href(href: &str, base_url: &Url, anchor: String) -> Option<ExtractedLink> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("data:") {
        return None;
    }

    match base_url.join(href) {
        Ok(mut resolved) => {
            let fragment = resolved.fragment().map(String::from);
            resolved.set_fragment(None);
            Some(ExtractedLink {
                url: resolved.to_string(),
                fragment,
                anchor,
            })
        }
        Err(_) => Some(ExtractedLink {
            url: href.to_string(),
            fragment: None,
            anchor,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/dir/page").unwrap()
    }

    fn extract(html: &str) -> Vec<ExtractedLink> {
        extract_links(html, &base())
    }

    #[test]
    fn test_extracts_absolute_link() {
        let links = extract(r#"<a href="https://other.com/x">Other</a>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://other.com/x");
        assert_eq!(links[0].anchor, "Other");
        assert!(links[0].fragment.is_none());
    }

    #[test]
    fn test_resolves_relative_link() {
        let links = extract(r#"<a href="sibling">S</a><a href="/root">R</a>"#);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://example.com/dir/sibling");
        assert_eq!(links[1].url, "https://example.com/root");
    }

    #[test]
    fn test_separates_fragment() {
        let links = extract(r##"<a href="/page#section">Jump</a>"##);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/page");
        assert_eq!(links[0].fragment.as_deref(), Some("section"));
    }

    #[test]
    fn test_skips_fragment_only() {
        let links = extract(r##"<a href="#top">Top</a>"##);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skips_javascript_and_data() {
        let links = extract(
            r#"<a href="javascript:void(0)">J</a><a href="data:text/plain,x">D</a>"#,
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_keeps_mailto_as_link() {
        let links = extract(r#"<a href="mailto:a@b.c">Mail</a>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "mailto:a@b.c");
    }

    #[test]
    fn test_skips_download_links() {
        let links = extract(r#"<a href="/file.zip" download>Get</a>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_extracts_canonical() {
        let links = extract(r#"<link rel="canonical" href="https://example.com/page">"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].anchor, "(canonical)");
    }

    #[test]
    fn test_anchor_text_collected() {
        let links = extract(r#"<a href="/x"><b>Bold</b> text</a>"#);
        assert_eq!(links[0].anchor, "Bold text");
    }

    #[test]
    fn test_empty_href_skipped() {
        let links = extract(r#"<a href="">Empty</a><a href="   ">Blank</a>"#);
        assert!(links.is_empty());
    }
}
