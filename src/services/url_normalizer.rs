//! URL Normalizer: turns address-bar input into navigable targets.
//!
//! Every function here is pure: no network, no state. The reconciler and the
//! session store rely on that to call them from any event handler.

use url::{Host, Url};

/// Sentinel produced for empty input. Recognized by [`is_blank`] and never
/// handed to a content view as a load target.
pub const BLANK_PAGE: &str = "about:blank";

/// Search endpoint used for anything that does not look like an address.
pub const SEARCH_ENDPOINT: &str = "https://www.google.com/search?q=";

/// How raw input was interpreted before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Blank,
    /// Has a scheme separator or a dot.
    LikelyUrl,
    /// Neither; normalized into a search query.
    Ambiguous,
}

/// Returns true for empty input and for the blank-page placeholder.
pub fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(BLANK_PAGE)
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Builds a search-engine query URL for `query` (percent-encoded).
pub fn search_url(query: &str) -> String {
    format!("{}{}", SEARCH_ENDPOINT, urlencoding::encode(query.trim()))
}

/// Normalizes user or programmatic input into a navigable URL.
///
/// - empty → [`BLANK_PAGE`]
/// - explicit `http(s)://` → unchanged
/// - contains whitespace → search query
/// - contains a dot → `https://` prefixed
/// - anything else → search query
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_blank(trimmed) {
        return BLANK_PAGE.to_string();
    }
    if has_http_scheme(trimmed) {
        return trimmed.to_string();
    }
    if trimmed.chars().any(char::is_whitespace) {
        return search_url(trimmed);
    }
    if trimmed.contains('.') {
        return format!("https://{}", trimmed);
    }
    search_url(trimmed)
}

/// Canonicalizes a URL string for the tab record.
///
/// Blank input becomes `""`. Anything `url::Url` accepts is returned in its
/// canonical serialization; anything else is returned trimmed.
pub fn sanitize_for_storage(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_blank(trimmed) {
        return String::new();
    }
    match Url::parse(trimmed) {
        Ok(url) => url.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Classifies raw input without normalizing it.
pub fn classify_input(raw: &str) -> InputKind {
    let trimmed = raw.trim();
    if is_blank(trimmed) {
        InputKind::Blank
    } else if trimmed.contains("://") || trimmed.contains('.') {
        InputKind::LikelyUrl
    } else {
        InputKind::Ambiguous
    }
}

/// Lowercased host of an absolute URL.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()?
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_ascii_lowercase())
}

/// Host without a leading `www.`, for titles and fallback glyphs.
pub fn display_host(url: &str) -> Option<String> {
    host_of(url).map(|h| h.strip_prefix("www.").map(str::to_string).unwrap_or(h))
}

/// Returns `url` with `www.` prepended to its host, when that is a sensible
/// alternate: the host has a dot, is not an IP literal and lacks the prefix.
pub fn with_www_prefix(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url.trim()).ok()?;
    let host = match parsed.host()? {
        Host::Domain(domain) => domain.to_ascii_lowercase(),
        Host::Ipv4(_) | Host::Ipv6(_) => return None,
    };
    if host.starts_with("www.") || !host.contains('.') {
        return None;
    }
    parsed.set_host(Some(&format!("www.{}", host))).ok()?;
    Some(parsed.to_string())
}

/// Resolves a possibly relative reference against `base`.
pub fn resolve_against(base: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Ok(absolute) = Url::parse(reference) {
        return Some(absolute.to_string());
    }
    let base = Url::parse(base.trim()).ok()?;
    base.join(reference).ok().map(|u| u.to_string())
}

/// `true` when `url` parses as an absolute URL with a scheme.
pub fn is_absolute(url: &str) -> bool {
    Url::parse(url.trim()).is_ok()
}
