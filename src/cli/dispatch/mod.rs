//! Maps validated CLI matches to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{
    gateway::{ARG_JWT_SECRET, ARG_LOGIN_URL, ARG_OMIT_RESTRICTED, ARG_RELOAD_ON_AUTH},
    ARG_ORIGIN_URL, ARG_PORT,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if the origin URL is missing, unparsable or not http(s).
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let origin_url = matches
        .get_one::<String>(ARG_ORIGIN_URL)
        .context("missing required argument: --origin-url")?;
    let origin_url = parse_origin(origin_url)?;

    let login_url = matches
        .get_one::<String>(ARG_LOGIN_URL)
        .map(|login| login.trim().to_string())
        .filter(|login| !login.is_empty());

    let jwt_secret = matches
        .get_one::<String>(ARG_JWT_SECRET)
        .filter(|secret| !secret.is_empty())
        .map(|secret| SecretString::from(secret.clone()));

    Ok(Action::Server(Args {
        port,
        origin_url,
        login_url,
        jwt_secret,
        omit_restricted: matches
            .get_one::<bool>(ARG_OMIT_RESTRICTED)
            .copied()
            .unwrap_or(true),
        reload_on_auth: matches
            .get_one::<bool>(ARG_RELOAD_ON_AUTH)
            .copied()
            .unwrap_or(false),
    }))
}

fn parse_origin(origin_url: &str) -> Result<Url> {
    let url =
        Url::parse(origin_url).with_context(|| format!("Invalid origin URL: {origin_url}"))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(anyhow!("Origin URL must include a host: {origin_url}")),
        scheme => Err(anyhow!("Unsupported origin URL scheme {scheme}: {origin_url}")),
    }
}
