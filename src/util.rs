//! URL and text helpers shared by the orchestrator, fetchers and writers.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Basic well-formedness check for navigation targets and result links.
///
/// Accepts absolute `http`/`https` URLs whose host contains at least one dot
/// (or is `localhost`/an IP literal).
pub fn is_url(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate.trim()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match url.host() {
        Some(url::Host::Domain(host)) => host == "localhost" || host.contains('.'),
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => true,
        None => false,
    }
}

/// Returns the host part of `link`, or an empty string if it has none.
pub fn domain(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Percent-decodes a link. Invalid sequences leave the input untouched.
pub fn unquote_url(link: &str) -> String {
    urlencoding::decode(link)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| link.to_string())
}

/// Canonical form of a query: percent-escapes decoded, whitespace collapsed.
pub fn normalize_query(raw: &str) -> String {
    let decoded = if raw.contains('%') {
        unquote_url(raw)
    } else {
        raw.to_string()
    };
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unsafe_file_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).expect("static regex"))
}

/// Builds a file stem from query text: words joined by `_`, path-unsafe
/// characters removed.
pub fn sanitize_file_stem(query: &str) -> String {
    let joined = query.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_file_chars().replace_all(&joined, "");
    if cleaned.is_empty() {
        "results".to_string()
    } else {
        cleaned.into_owned()
    }
}
