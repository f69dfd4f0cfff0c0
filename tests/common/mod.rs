#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use secure_data_api::app::{app, AppState};
use secure_data_api::clock::ManualClock;
use secure_data_api::config::AppConfig;
use secure_data_api::database::{seed_admin, MemoryDatabase};

pub const PASSWORD: &str = "Secret123";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    /// Drives token expiry and the rate-limit window
    pub clock: Arc<ManualClock>,
    pub client: reqwest::Client,
}

/// Development preset with a cheap password hash so the suite stays fast
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.password_hash_memory_kib = 8;
    config.security.password_hash_iterations = 1;
    config.api.rate_limit_requests = 1000;
    config
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(test_config()).await
}

/// Serve the app in-process on an unused port, one server per test
pub async fn spawn_server_with(config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let bootstrap = config.bootstrap.clone();
    let state = AppState::new(config, Arc::new(MemoryDatabase::new()), clock.clone())?;
    seed_admin(state.db.as_ref(), &state.credentials, &bootstrap).await?;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await;
    });

    let server = TestServer {
        port,
        base_url,
        clock,
        client: reqwest::Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str, user_type: &str) -> Result<reqwest::Response> {
        let res = self
            .client
            .post(self.url("/register"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
                "user_type": user_type,
            }))
            .send()
            .await?;
        Ok(res)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<reqwest::Response> {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Ok(res)
    }

    /// Register `username` and return a bearer token for it
    pub async fn token_for(&self, username: &str, user_type: &str) -> Result<String> {
        let res = self.register(username, user_type).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = self.login(username, PASSWORD).await?.json().await?;
        body["data"]["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no access_token")
    }
}
