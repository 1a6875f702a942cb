//! Cookie parsing and `Set-Cookie` construction.

use axum::http::{header::COOKIE, HeaderMap};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;

/// Cookie carrying the customer session token.
pub const JWT_COOKIE: &str = "fx.customer.jwt";

/// Cookie remembering where an anonymous visitor was headed.
pub const DESTINATION_COOKIE: &str = "fx.cf.guard.destination";

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:01 GMT";

// Bytes outside cookie-octet, plus `%` so decoding is unambiguous.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// Find `name` in a `Cookie` header value.
///
/// Pairs are split on the first `=`; names are trimmed, values are returned
/// as-is. Pairs without `=` are skipped.
#[must_use]
pub fn get_cookie<'a>(header: Option<&'a str>, name: &str) -> Option<&'a str> {
    header?.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then_some(value)
    })
}

/// Look up a cookie across every `Cookie` header of a request.
#[must_use]
pub fn cookie_from_headers<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| get_cookie(Some(value), name))
}

#[must_use]
pub fn build_cookie(name: &str, value: &str) -> String {
    format!("{name}={value}; Path=/")
}

/// Escape a value for use inside a cookie; URLs keep their `:` and `/`.
#[must_use]
pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, COOKIE_VALUE).to_string()
}

/// Reverse [`encode_value`]. `None` if the bytes are not UTF-8.
#[must_use]
pub fn decode_value(value: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(value).decode_utf8().ok()
}

#[must_use]
pub fn expire_cookie(name: &str) -> String {
    format!("{name}=deleted; Expires={EXPIRED}; Path=/")
}
