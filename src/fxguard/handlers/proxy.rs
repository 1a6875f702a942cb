use crate::fxguard::{Gateway, GatewayError};
use axum::{body::Body, extract::Extension, http::Request, response::Response};
use std::sync::Arc;

// axum fallback handler, every visitor request ends up here
pub async fn proxy(
    Extension(gateway): Extension<Arc<Gateway>>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    gateway.handle(request).await
}
