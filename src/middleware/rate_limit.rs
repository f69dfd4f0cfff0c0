use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;

/// Rate limiter middleware, the first check every request goes through
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = client_identity(&request, state.config.api.trust_proxy_headers);

    if !state.limiter.allow(&identity) {
        tracing::warn!(
            "Rate limit exceeded for {} ({} requests per {}s)",
            identity,
            state.limiter.limit(),
            state.config.api.rate_limit_window_secs
        );
        return Err(AuthError::RateLimited.into());
    }

    Ok(next.run(request).await)
}

/// Client address used as the rate-limit key.
///
/// With `trust_proxy_headers` the rightmost `X-Forwarded-For` entry is used, since that is
/// the one appended by the proxy in front of us; entries to its left are client-supplied.
pub fn client_identity(request: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let headers = request.headers();
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let real_ip = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded.or(real_ip) {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
