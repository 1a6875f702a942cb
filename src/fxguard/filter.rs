//! Single-pass HTML filter applied to origin responses for anonymous visitors.
//!
//! Handlers are bound per selector on a streaming rewriter:
//! - `[data-restricted]` elements are removed with their subtree,
//! - login-capable elements mark the request's [`LoginPresence`],
//! - optionally, a reload script is appended after each login-capable element.

use axum::http::{
    header::{CONTENT_ENCODING, CONTENT_TYPE},
    HeaderMap,
};
use lol_html::{
    element,
    html_content::ContentType,
    send::{HtmlRewriter, Settings},
    OutputSink,
};
use std::sync::atomic::{AtomicBool, Ordering};

pub const RESTRICTED_SELECTOR: &str = "[data-restricted]";

pub const LOGIN_SELECTORS: [&str; 2] = ["foxy-customer-portal", "[data-login]"];

/// Reloads the page when the portal reports a sign in or sign out.
pub const RELOAD_SCRIPT: &str = include_str!("assets/reload.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub omit_restricted: bool,
    pub reload_on_auth: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            omit_restricted: true,
            reload_on_auth: false,
        }
    }
}

/// Whether login-capable markup was seen while rewriting one response.
///
/// Owned by the request that runs the filter and lent to the handlers; only
/// meaningful once the rewriter has been ended.
#[derive(Debug, Default)]
pub struct LoginPresence(AtomicBool);

impl LoginPresence {
    fn mark(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn observed(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Build a streaming rewriter writing filtered bytes to `output`.
///
/// Feed it with `write` chunk by chunk and call `end`; `presence` is final
/// after `end` returns.
pub fn rewriter<'h, O: OutputSink>(
    options: FilterOptions,
    presence: &'h LoginPresence,
    output: O,
) -> HtmlRewriter<'h, O> {
    let mut handlers = Vec::with_capacity(5);

    for selector in LOGIN_SELECTORS {
        handlers.push(element!(selector, move |_el| {
            presence.mark();
            Ok(())
        }));

        if options.reload_on_auth {
            handlers.push(element!(selector, |el| {
                el.after(RELOAD_SCRIPT, ContentType::Html);
                Ok(())
            }));
        }
    }

    if options.omit_restricted {
        handlers.push(element!(RESTRICTED_SELECTOR, |el| {
            el.remove();
            Ok(())
        }));
    }

    HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::new_send()
        },
        output,
    )
}

/// Only HTML bodies go through the rewriter.
#[must_use]
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("text/html")
                || mime.eq_ignore_ascii_case("application/xhtml+xml")
        })
}

/// A `Content-Encoding` still applied to the body, if any.
///
/// The rewriter only understands identity-encoded markup, so a body reported
/// here can neither be filtered nor relayed to an anonymous visitor.
#[must_use]
pub fn remaining_encoding(headers: &HeaderMap) -> Option<String> {
    let encodings: Vec<String> = headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .map(|value| value.to_str().unwrap_or("invalid"))
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|coding| !coding.is_empty() && !coding.eq_ignore_ascii_case("identity"))
        .map(str::to_ascii_lowercase)
        .collect();

    (!encodings.is_empty()).then(|| encodings.join(", "))
}
