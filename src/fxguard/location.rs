//! URL normalization and resolution of the visitor-facing request URL.

use axum::http::{header::HOST, HeaderMap, Uri};
use url::{ParseError, Url};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Normalize a URL string so cosmetic differences never cause redirect loops.
///
/// Trims whitespace, drops one trailing slash and collapses extra slashes
/// after the scheme separator.
#[must_use]
pub fn clean_url(dirty: &str) -> String {
    let trimmed = dirty.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    match trimmed.split_once("://") {
        Some((scheme, rest)) => format!("{scheme}://{}", rest.trim_start_matches('/')),
        None => trimmed.to_string(),
    }
}

/// Compare two URLs after normalization.
#[must_use]
pub fn same_location(a: &str, b: &str) -> bool {
    clean_url(a) == clean_url(b)
}

/// Rebuild the URL the visitor requested, as seen from outside the gateway.
///
/// # Errors
/// Returns an error if the resulting URL does not parse.
pub fn public_url(headers: &HeaderMap, uri: &Uri, fallback_host: &str) -> Result<Url, ParseError> {
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");

    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
        .unwrap_or(fallback_host);

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    Url::parse(&format!("{scheme}://{host}{path_and_query}"))
}

/// Resolve the configured login location against the current URL.
///
/// # Errors
/// Returns an error if `login` is neither absolute nor a valid relative reference.
pub fn resolve_login(login: &str, current: &Url) -> Result<Url, ParseError> {
    current.join(login)
}
