//! Favicon discovery when the view never reports one.

use std::collections::VecDeque;

use url::Url;

use crate::services::url_normalizer::{host_of, resolve_against};

/// Collects the `href` of every icon link in the current document.
pub const FAVICON_PROBE_SCRIPT: &str = r#"(() => {
  const links = document.querySelectorAll(
    'link[rel~="icon"], link[rel="shortcut icon"], link[rel="apple-touch-icon"]'
  );
  return Array.from(links).map((l) => l.getAttribute('href')).filter(Boolean);
})()"#;

const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

/// Public favicon service URL for `host`.
pub fn service_url(host: &str) -> String {
    format!("{}?domain={}&sz=64", FAVICON_SERVICE, urlencoding::encode(host))
}

/// `<origin>/favicon.ico` for an http(s) page.
pub fn root_favicon(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.join("/favicon.ico").ok().map(|u| u.to_string())
}

/// Reads the probe result: an array of strings, or a single string.
pub fn parse_probe_result(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        serde_json::Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// First non-empty entry of a favicon-updated payload.
pub fn first_reported(favicons: &[serde_json::Value]) -> Option<String> {
    favicons
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Ordered, de-duplicated candidates for `page_url`: declared icons resolved
/// against the page, then the root `favicon.ico`, then the public service.
pub fn candidates(page_url: &str, declared: &[String]) -> VecDeque<String> {
    let mut out: VecDeque<String> = VecDeque::new();
    let mut push = |candidate: String| {
        if !out.contains(&candidate) {
            out.push_back(candidate);
        }
    };

    for href in declared {
        if let Some(resolved) = resolve_against(page_url, href) {
            push(resolved);
        }
    }
    if let Some(root) = root_favicon(page_url) {
        push(root);
    }
    if let Some(host) = host_of(page_url) {
        push(service_url(&host));
    }
    out
}
