//! Per-request decision engine.
//!
//! The origin fetch and the session check run concurrently. Authenticated
//! visitors get the origin response untouched, unless they land on the login
//! location with a pending destination, in which case they are sent back
//! there with `303 See Other`. Anonymous visitors get the filtered body, or a
//! `302 Found` to the login location when the page offers no way to sign in.

use super::{
    cookie::{
        build_cookie, cookie_from_headers, decode_value, encode_value, expire_cookie,
        DESTINATION_COOKIE, JWT_COOKIE,
    },
    filter::{self, FilterOptions, LoginPresence},
    location::{clean_url, public_url, resolve_login, same_location},
    origin::{self, Origin},
    token::{self, Verification},
};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{InvalidHeaderValue, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, Request, StatusCode,
    },
    response::{IntoResponse, Response},
};
use lol_html::errors::RewritingError;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Upper bound for request bodies relayed to the origin.
pub const MAX_REQUEST_BODY: usize = 16 * 1024 * 1024;

/// Default upper bound for origin HTML buffered while filtering.
pub const MAX_RESPONSE_BODY: usize = 32 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request URL: {0}")]
    RequestUrl(#[from] url::ParseError),
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),
    #[error("origin request failed: {0}")]
    Origin(#[from] reqwest::Error),
    #[error("failed to rewrite origin response: {0}")]
    Rewrite(#[from] RewritingError),
    #[error("origin response uses an encoding the filter cannot read: {0}")]
    Encoding(String),
    #[error("origin response exceeds {0} bytes")]
    ResponseTooLarge(usize),
    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl GatewayError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::RequestUrl(_) | Self::RequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Origin(_)
            | Self::Rewrite(_)
            | Self::Encoding(_)
            | Self::ResponseTooLarge(_) => StatusCode::BAD_GATEWAY,
            Self::Header(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("{self}");
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

#[derive(Debug)]
pub struct GatewayConfig {
    pub origin_url: Url,
    pub login_url: Option<String>,
    pub jwt_secret: Option<SecretString>,
    pub filter: FilterOptions,
}

#[derive(Debug)]
pub struct Gateway {
    origin: Origin,
    login_url: Option<String>,
    jwt_secret: Option<SecretString>,
    filter: FilterOptions,
    max_response_body: usize,
}

impl Gateway {
    /// # Errors
    /// Returns an error if the origin HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            origin: Origin::new(config.origin_url)?,
            login_url: config
                .login_url
                .map(|login| login.trim().to_string())
                .filter(|login| !login.is_empty()),
            jwt_secret: config.jwt_secret,
            filter: config.filter,
            max_response_body: MAX_RESPONSE_BODY,
        })
    }

    /// Cap the origin HTML buffered for anonymous visitors; larger pages fail with 502.
    #[must_use]
    pub const fn with_response_limit(mut self, limit: usize) -> Self {
        self.max_response_body = limit;
        self
    }

    #[must_use]
    pub fn origin_host(&self) -> &str {
        self.origin.host()
    }

    #[must_use]
    pub const fn login_configured(&self) -> bool {
        self.login_url.is_some()
    }

    /// False when no usable secret is configured; every session then fails closed.
    #[must_use]
    pub fn verifies_sessions(&self) -> bool {
        self.jwt_secret
            .as_ref()
            .is_some_and(|secret| !secret.expose_secret().is_empty())
    }

    /// Answer one visitor request.
    ///
    /// # Errors
    /// Origin transport and rewriting failures are returned unchanged.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.uri().path()))]
    pub async fn handle(&self, request: Request<Body>) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();
        let current = public_url(&parts.headers, &parts.uri, self.origin.host())?;
        let body = to_bytes(body, MAX_REQUEST_BODY)
            .await
            .map_err(GatewayError::RequestBody)?;
        let token = cookie_from_headers(&parts.headers, JWT_COOKIE).unwrap_or_default();

        let (origin, session) = tokio::join!(
            self.origin
                .fetch(&parts.method, &parts.uri, &parts.headers, body),
            async { self.verify_session(token) },
        );

        if session.is_valid() {
            self.authenticated(&parts.headers, &current, origin)
        } else {
            self.anonymous(&current, origin).await
        }
    }

    fn verify_session(&self, token: &str) -> Verification {
        if token.is_empty() {
            return Verification::Invalid;
        }

        let verification = token::verify(token, self.jwt_secret.as_ref());
        match &verification {
            Verification::Valid(claims) => {
                debug!(subject = claims.subject().unwrap_or("-"), "session verified");
            }
            Verification::Invalid => debug!("session token rejected"),
            Verification::Unavailable => debug!("session verification unavailable"),
        }
        verification
    }

    fn login_location(&self, current: &Url) -> Option<Url> {
        let login = self.login_url.as_deref()?;
        match resolve_login(login, current) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Invalid login location {login}: {e}");
                None
            }
        }
    }

    fn authenticated(
        &self,
        headers: &HeaderMap,
        current: &Url,
        origin: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Response, GatewayError> {
        let on_login = self
            .login_location(current)
            .is_some_and(|login| same_location(current.as_str(), login.as_str()));

        if on_login {
            if let Some(destination) = cookie_from_headers(headers, DESTINATION_COOKIE)
                .and_then(decode_value)
                .filter(|d| !d.is_empty())
            {
                info!("Returning customer to {destination}");
                return redirect(
                    StatusCode::SEE_OTHER,
                    &destination,
                    &expire_cookie(DESTINATION_COOKIE),
                );
            }
        }

        Ok(origin::pass_through(origin?))
    }

    async fn anonymous(
        &self,
        current: &Url,
        origin: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Response, GatewayError> {
        let mut origin = origin?;

        // the login location the visitor would be sent to if the page has no login markup
        let login = self
            .login_location(current)
            .filter(|login| !same_location(current.as_str(), login.as_str()));

        if !filter::is_html(origin.headers()) {
            return match login {
                Some(login) => to_login(current, &login),
                None => Ok(origin::pass_through(origin)),
            };
        }

        if let Some(encoding) = filter::remaining_encoding(origin.headers()) {
            warn!("Origin HTML is {encoding} encoded and cannot be filtered");
            return match login {
                Some(login) => to_login(current, &login),
                None => Err(GatewayError::Encoding(encoding)),
            };
        }

        let presence = LoginPresence::default();
        let mut body = Vec::new();
        let mut rewriter = filter::rewriter(self.filter, &presence, |chunk: &[u8]| {
            body.extend_from_slice(chunk);
        });
        let mut read = 0_usize;
        while let Some(chunk) = origin.chunk().await? {
            read = read.saturating_add(chunk.len());
            if read > self.max_response_body {
                return Err(GatewayError::ResponseTooLarge(self.max_response_body));
            }
            rewriter.write(&chunk)?;
        }
        rewriter.end()?;

        match login {
            Some(login) if !presence.observed() => to_login(current, &login),
            _ => Ok(origin::with_body(&origin, body)),
        }
    }
}

fn to_login(current: &Url, login: &Url) -> Result<Response, GatewayError> {
    let destination = clean_url(current.as_str());
    info!("Sending anonymous visitor to {login}, remembering {destination}");
    redirect(
        StatusCode::FOUND,
        login.as_str(),
        &build_cookie(DESTINATION_COOKIE, &encode_value(&destination)),
    )
}

fn redirect(status: StatusCode, location: &str, cookie: &str) -> Result<Response, GatewayError> {
    let mut response = status.into_response();
    let headers = response.headers_mut();
    headers.insert(LOCATION, HeaderValue::from_str(location)?);
    headers.insert(SET_COOKIE, HeaderValue::from_str(cookie)?);
    Ok(response)
}
