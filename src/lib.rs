//! # fxguard (Edge access-control gateway)
//!
//! `fxguard` sits in front of an origin web server and decides, per request,
//! whether the visitor holds a valid customer session before any origin HTML
//! reaches them.
//!
//! ## Sessions
//!
//! The session credential is an HS256 signed token carried in the
//! `fx.customer.jwt` cookie. Verification is stateless and fails closed: a
//! missing, malformed or wrongly signed token, and a missing secret, all
//! route the request through the anonymous branch.
//!
//! ## Anonymous visitors
//!
//! Origin HTML is rewritten in a single streaming pass. Elements marked
//! `data-restricted` are removed, and the pass records whether the page offers
//! a login affordance (`foxy-customer-portal` or `data-login`). Pages without
//! one send the visitor to the configured login location with `302 Found`,
//! remembering the requested URL in the `fx.cf.guard.destination` cookie.
//!
//! ## Returning visitors
//!
//! An authenticated visit to the login location while a destination is
//! pending answers `303 See Other` back to that destination and expires the
//! cookie in the same response.

pub mod cli;
pub mod fxguard;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
