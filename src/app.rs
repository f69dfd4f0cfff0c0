use std::sync::Arc;

use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::auth::{CredentialVerifier, RateLimiter, TokenService};
use crate::clock::SharedClock;
use crate::config::AppConfig;
use crate::database::Repository;
use crate::handlers;
use crate::middleware::{interceptors, jwt_auth_middleware, DEFAULT_CHAIN};

/// Shared services handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<dyn Repository>,
    pub tokens: Arc<TokenService>,
    pub credentials: CredentialVerifier,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, db: Arc<dyn Repository>, clock: SharedClock) -> anyhow::Result<Self> {
        let tokens = TokenService::from_config(&config, clock.clone())?;
        let credentials = CredentialVerifier::from_config(&config.security)?;
        let limiter = RateLimiter::from_config(&config.api, clock);

        Ok(Self {
            config: Arc::new(config),
            db,
            tokens: Arc::new(tokens),
            credentials,
            limiter,
        })
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(&state))
        .with_state(state.clone());

    interceptors::apply(&DEFAULT_CHAIN, router, &state).layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::public;

    Router::new()
        .route("/login", post(public::login_post))
        .route("/register", post(public::register_post))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::{data, users};

    Router::new()
        .route("/data", get(data::items_list).post(data::item_create))
        .route(
            "/data/:id",
            get(data::item_get).put(data::item_update).delete(data::item_delete),
        )
        .route("/users", get(users::users_list))
        .route("/me", get(users::me_get))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Secure Data API",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/login, /register (public - token acquisition)",
                "data": "/data[/:id] (protected)",
                "users": "/users (protected, admin only)",
                "me": "/me (protected)",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "healthy",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
