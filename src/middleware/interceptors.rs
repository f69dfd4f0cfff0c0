//! Cross-cutting request interceptors, applied from an explicit ordered list.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::{from_fn_with_state, Next},
    response::Response,
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::rate_limit::{client_identity, rate_limit_middleware};

pub const PROCESS_TIME_HEADER: &str = "x-process-time";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interceptor {
    /// Sliding-window throttle per client identity
    RateLimit,
    /// Entry/exit logging plus the processing-time header
    RequestLog,
    /// Fixed hardening headers on every response
    SecurityHeaders,
    Cors,
}

/// Outermost first. `Cors` wraps everything so throttled and rejected responses stay
/// readable cross-origin; preflights are answered there without reaching the limiter.
/// Every other request meets `RateLimit` before any processing.
pub const DEFAULT_CHAIN: [Interceptor; 4] = [
    Interceptor::Cors,
    Interceptor::RateLimit,
    Interceptor::RequestLog,
    Interceptor::SecurityHeaders,
];

/// Wrap `router` so that `chain[0]` is the outermost interceptor
pub fn apply(chain: &[Interceptor], router: Router, state: &AppState) -> Router {
    // Axum treats the last added layer as outermost, so add in reverse
    chain.iter().rev().fold(router, |router, interceptor| match interceptor {
        Interceptor::RateLimit => router.layer(from_fn_with_state(state.clone(), rate_limit_middleware)),
        Interceptor::RequestLog => router.layer(from_fn_with_state(state.clone(), request_log)),
        Interceptor::SecurityHeaders => security_headers()
            .into_iter()
            .fold(router, |router, (name, value)| router.layer(SetResponseHeaderLayer::overriding(name, value))),
        Interceptor::Cors => router.layer(cors_layer(&state.config.security.cors_origins)),
    })
}

async fn request_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_identity(&request, state.config.api.trust_proxy_headers);

    let span = tracing::info_span!("request", id = %request_id);
    async move {
        tracing::info!("Request {} {} from {}", method, path, client);

        let mut response = next.run(request).await;

        let elapsed = start.elapsed().as_secs_f64();
        tracing::info!("Response {} for {} {} in {:.3}s", response.status().as_u16(), method, path, elapsed);

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&format!("{:.6}", elapsed)) {
            headers.insert(HeaderName::from_static(PROCESS_TIME_HEADER), value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Hardening headers set on every response, overriding any set by handlers
pub fn security_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ),
    ]
}

/// `*` allows any origin without credentials; explicit origins allow credentials
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
