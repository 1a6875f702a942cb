use crate::APP_USER_AGENT;
use axum::{
    body::{Body, Bytes},
    http::{
        header::{
            ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, HOST, PROXY_AUTHENTICATE,
            PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
        },
        HeaderMap, HeaderName, HeaderValue, Method, Uri,
    },
    response::Response,
};
use reqwest::{redirect::Policy, Client};
use tracing::{debug, instrument};
use url::Url;

const HOP_BY_HOP: [HeaderName; 7] = [
    CONNECTION,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

const KEEP_ALIVE: &str = "keep-alive";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// HTTP client bound to the origin server.
///
/// Redirects are never followed so origin redirects reach the visitor as-is.
/// gzip, brotli, deflate and zstd bodies are decoded on arrival, and their
/// `Content-Encoding` and `Content-Length` headers dropped.
#[derive(Debug, Clone)]
pub struct Origin {
    client: Client,
    base: Url,
    host: String,
}

impl Origin {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: Url) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .redirect(Policy::none())
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .zstd(true)
            .build()?;

        let host = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::from("localhost"),
        };

        Ok(Self { client, base, host })
    }

    /// `host[:port]` of the origin, used when the visitor sent no `Host`.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Origin URL for the visitor's path and query.
    #[must_use]
    pub fn url_for(&self, uri: &Uri) -> Url {
        let mut url = self.base.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        url
    }

    /// Forward the visitor's request to the origin.
    ///
    /// # Errors
    /// Returns the transport error unchanged; nothing is retried.
    #[instrument(skip(self, headers, body), fields(origin = %self.host))]
    pub async fn fetch(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = self.url_for(uri);
        let mut forwarded = headers.clone();
        strip_hop_by_hop(&mut forwarded);
        forwarded.remove(HOST);
        // the client negotiates the encodings it can decode for the content filter
        forwarded.remove(ACCEPT_ENCODING);
        if let Some(host) = headers.get(HOST) {
            forwarded.insert(HeaderName::from_static(X_FORWARDED_HOST), host.clone());
        }

        debug!("Forwarding {} {}", method, url);

        let response = self
            .client
            .request(method.clone(), url)
            .headers(forwarded)
            .body(body)
            .send()
            .await?;

        debug!("Origin answered {}", response.status());

        Ok(response)
    }
}

/// Drop connection-scoped headers, including those named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove(KEEP_ALIVE);
}

/// Relay an origin response untouched, streaming its body.
#[must_use]
pub fn pass_through(origin: reqwest::Response) -> Response {
    let status = origin.status();
    let mut headers = origin.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(origin.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Origin status and headers around a body the gateway rewrote.
#[must_use]
pub fn with_body(origin: &reqwest::Response, body: Vec<u8>) -> Response {
    let mut headers = origin.headers().clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(CONTENT_LENGTH);
    if let Ok(length) = HeaderValue::from_str(&body.len().to_string()) {
        headers.insert(CONTENT_LENGTH, length);
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = origin.status();
    *response.headers_mut() = headers;
    response
}
