use crate::{fxguard::Gateway, GIT_COMMIT_HASH};
use axum::{
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Serialize;
use std::sync::Arc;

const X_APP: &str = "x-app";

#[derive(Debug, Serialize)]
pub struct Health {
    name: &'static str,
    version: &'static str,
    build: &'static str,
    origin: String,
    login_configured: bool,
    sessions_verified: bool,
}

/// Liveness of the gateway itself; the origin is never contacted.
pub async fn health(Extension(gateway): Extension<Arc<Gateway>>) -> impl IntoResponse {
    let body = Health {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        build: GIT_COMMIT_HASH,
        origin: gateway.origin_host().to_string(),
        login_configured: gateway.login_configured(),
        sessions_verified: gateway.verifies_sessions(),
    };

    let short_hash = GIT_COMMIT_HASH.get(0..7).unwrap_or_default();

    let mut headers = HeaderMap::new();
    if let Ok(app) = HeaderValue::from_str(&format!("{}:{}:{short_hash}", body.name, body.version))
    {
        headers.insert(HeaderName::from_static(X_APP), app);
    }

    (headers, Json(body))
}
